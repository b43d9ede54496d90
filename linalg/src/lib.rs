//! Affine-index algebra and structural sharing for loop-nest code generation.
//!
//! The primitives here are called by tiling, fusion and lowering code to
//! compute loop bounds and restricted views without bloating the IR: affine
//! computations fold into existing values or pooled constants whenever
//! possible, views are only re-sliced when something actually changes, and
//! loop nests are opened and closed in strict LIFO order.
//!
//! # Module Organization
//!
//! - [`range`] - Range accessor (min, max, step of a range)
//! - [`constants`] - Per-unit constant pool
//! - [`affine`] - Fold-or-emit of affine computations, maps over range parts
//! - [`view`] - View/slice elision
//! - [`collect`] - Range collection through views, slices and their users
//! - [`loops`] - Loop nest builder
//! - [`config`] - Tunables with environment fallbacks
//! - [`error`] - Error types and result handling

pub mod affine;
pub mod collect;
pub mod config;
pub mod constants;
pub mod error;
pub mod loops;
pub mod range;
pub mod view;


pub use affine::{apply_map_to_range_part, emit_or_fold, try_fold};
pub use collect::get_ranges;
pub use config::LinalgConfig;
pub use constants::ConstantPool;
pub use error::{Error, Result};
pub use loops::LoopNestBuilder;
pub use range::{RangePart, extract_range_part, range_parts};
pub use view::create_or_return_view;
