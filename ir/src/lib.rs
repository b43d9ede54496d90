//! Host representation for the strata loop-nest code generator.
//!
//! This crate defines the value graph that the `strata-linalg` layer reads and
//! appends to.
//!
//! # Module Organization
//!
//! - [`value`] - Value nodes and identity-based keys
//! - [`op`] - Operation enum and producer queries (range, view, slice)
//! - [`affine`] - Affine expressions, maps and map/operand composition
//! - [`builder`] - Per-unit function builder with loop scaffolding
//! - [`error`] - Error types and result handling

pub mod affine;
pub mod builder;
pub mod error;
pub mod op;
pub mod value;


pub use affine::{AffineBinaryOp, AffineExpr, AffineMap, DEFAULT_COMPOSE_LIMIT, fully_compose};
pub use builder::{Function, FunctionBuilder};
pub use error::{Error, Result};
pub use op::{Op, RangeOperands};
pub use value::{Value, ValueKey};

pub use strata_dtype::DType;
