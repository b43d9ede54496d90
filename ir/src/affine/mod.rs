//! Affine index algebra.
//!
//! - [`expr`] - Affine expressions with simplifying constructors
//! - [`map`] - Multi-result affine maps over dimensions and symbols
//! - [`compose`] - Inlining of producer affine computations into a consumer map

pub mod compose;
pub mod expr;
pub mod map;

pub use compose::{DEFAULT_COMPOSE_LIMIT, fully_compose};
pub use expr::{AffineBinaryOp, AffineExpr};
pub use map::AffineMap;
