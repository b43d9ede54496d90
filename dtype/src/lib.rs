//! Value types for the strata loop-nest representation.
//!
//! Every value in the IR carries one of these types. The linalg layer only
//! ever needs to distinguish scalar indices, ranges, views and the buffers
//! views are taken over.


/// Type of an IR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[derive(strum::AsRefStr, strum::EnumDiscriminants)]
#[strum_discriminants(name(DTypeKind), derive(Hash, strum::AsRefStr))]
pub enum DType {
    /// Scalar index (loop bounds, affine results, fixed view positions).
    #[display("index")]
    Index,

    /// `[min, max, step)` triple describing one loop dimension.
    #[display("range")]
    Range,

    /// Multi-dimensional view. `rank` counts the free (range-indexed) dimensions.
    #[display("view<{rank}>")]
    View { rank: usize },

    /// Backing storage that views index into.
    #[display("buffer<{rank}>")]
    Buffer { rank: usize },

    /// No value (loops, generic operations with side effects only).
    #[display("void")]
    Void,
}

impl DType {
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index)
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range)
    }

    pub fn is_view(&self) -> bool {
        matches!(self, Self::View { .. })
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, Self::Buffer { .. })
    }

    /// Whether a value of this type may appear in a view's indexing list.
    pub fn is_indexing(&self) -> bool {
        matches!(self, Self::Index | Self::Range)
    }

    /// Rank of shaped types, `None` for scalars.
    ///
    /// ```rust
    /// # use strata_dtype::DType;
    /// assert_eq!(DType::View { rank: 2 }.rank(), Some(2));
    /// assert_eq!(DType::Index.rank(), None);
    /// ```
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::View { rank } | Self::Buffer { rank } => Some(*rank),
            Self::Index | Self::Range | Self::Void => None,
        }
    }

    pub fn kind(&self) -> DTypeKind {
        self.into()
    }
}
