//! Operation enum and producer queries.
//!
//! Each [`Op`] variant encodes its operands directly. The `as_*` accessors are
//! the queries the linalg layer uses to look through a value to the operation
//! that built it.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::affine::AffineMap;
use crate::value::Value;

/// Operation with typed operands.
///
/// Variable-arity operand lists use `SmallVec`; loops and views rarely go past
/// four entries.
#[derive(Debug, Clone, strum::IntoStaticStr)]
pub enum Op {
    /// Parameter of the compilation unit. Has no producer.
    Argument { index: usize },

    /// Integer literal of index type.
    ConstantIndex(i64),

    /// Loop induction variable. Bound by a `For`, has no producer.
    InductionVar,

    /// Range construction: `[min, max)` walked by `step`.
    Range { min: Rc<Value>, max: Rc<Value>, step: Rc<Value> },

    /// View over a buffer, one indexing (range or index) per buffer dimension.
    View { buffer: Rc<Value>, indexings: SmallVec<[Rc<Value>; 4]> },

    /// Re-indexing of a view, one indexing per free dimension of `base`.
    Slice { base: Rc<Value>, indexings: SmallVec<[Rc<Value>; 4]> },

    /// Evaluation of a single-result affine map against index operands.
    AffineApply { map: AffineMap, operands: SmallVec<[Rc<Value>; 4]> },

    /// Loop with static step. `body` holds the operations nested in it, in order.
    For { iv: Rc<Value>, lower: Rc<Value>, upper: Rc<Value>, step: i64, body: Vec<Rc<Value>> },

    /// Any other operation, identified by name.
    Generic { name: String, operands: SmallVec<[Rc<Value>; 4]> },
}

/// Operands of a range construction.
#[derive(Debug, Clone, Copy)]
pub struct RangeOperands<'a> {
    pub min: &'a Rc<Value>,
    pub max: &'a Rc<Value>,
    pub step: &'a Rc<Value>,
}

impl Op {
    /// Variant name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Operand values in positional order. Loop bodies are regions, not operands.
    pub fn operands(&self) -> SmallVec<[&Rc<Value>; 4]> {
        match self {
            Self::Argument { .. } | Self::ConstantIndex(_) | Self::InductionVar => SmallVec::new(),
            Self::Range { min, max, step } => SmallVec::from_slice(&[min, max, step]),
            Self::View { buffer: base, indexings } | Self::Slice { base, indexings } => {
                let mut operands = SmallVec::from_slice(&[base]);
                operands.extend(indexings.iter());
                operands
            }
            Self::AffineApply { operands, .. } | Self::Generic { operands, .. } => operands.iter().collect(),
            Self::For { iv, lower, upper, .. } => SmallVec::from_slice(&[iv, lower, upper]),
        }
    }

    pub fn as_range(&self) -> Option<RangeOperands<'_>> {
        match self {
            Self::Range { min, max, step } => Some(RangeOperands { min, max, step }),
            _ => None,
        }
    }

    /// `(buffer, indexings)` of a view construction.
    pub fn as_view(&self) -> Option<(&Rc<Value>, &[Rc<Value>])> {
        match self {
            Self::View { buffer, indexings } => Some((buffer, indexings.as_slice())),
            _ => None,
        }
    }

    /// `(base view, indexings)` of a slice.
    pub fn as_slice(&self) -> Option<(&Rc<Value>, &[Rc<Value>])> {
        match self {
            Self::Slice { base, indexings } => Some((base, indexings.as_slice())),
            _ => None,
        }
    }

    pub fn as_affine_apply(&self) -> Option<(&AffineMap, &[Rc<Value>])> {
        match self {
            Self::AffineApply { map, operands } => Some((map, operands.as_slice())),
            _ => None,
        }
    }
}
