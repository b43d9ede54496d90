//! Fold-or-emit of affine computations.
//!
//! Loop steps must be static, so constants have to propagate through
//! arbitrarily long chains of affine computations before a loop is built.
//! [`emit_or_fold`] composes a map with everything that feeds it and only
//! materialises a computation when the composed expression is neither a
//! plain operand nor a literal.

use std::rc::Rc;

use smallvec::SmallVec;
use snafu::ensure;
use strata_ir::{AffineExpr, AffineMap, FunctionBuilder, Value, fully_compose};

use crate::config::LinalgConfig;
use crate::constants::ConstantPool;
use crate::error::*;
use crate::range::{RangePart, extract_range_part};

/// Resolve a single-result map to an existing value or a pooled constant.
///
/// Returns `None` when the result expression is an arithmetic combination.
/// Only the pool may create something, and only for a literal it has not seen.
pub fn try_fold(
    b: &mut FunctionBuilder,
    map: &AffineMap,
    operands: &[Rc<Value>],
    pool: &mut ConstantPool,
) -> Result<Option<Rc<Value>>> {
    let [expr] = map.results() else {
        return SingleResultExpectedSnafu { results: map.num_results() }.fail();
    };
    if operands.len() != map.num_inputs() {
        return Err(strata_ir::Error::AffineArityMismatch { expected: map.num_inputs(), actual: operands.len() }.into());
    }
    Ok(match expr {
        AffineExpr::Dim(position) => Some(operands[*position as usize].clone()),
        AffineExpr::Symbol(position) => Some(operands[map.num_dims() + *position as usize].clone()),
        AffineExpr::Constant(literal) => Some(pool.get_or_create_index(b, *literal)?),
        AffineExpr::Binary(..) => None,
    })
}

/// Compose `map` with the producers of `operands`, then fold or emit one computation.
pub fn emit_or_fold(
    b: &mut FunctionBuilder,
    map: &AffineMap,
    operands: &[Rc<Value>],
    pool: &mut ConstantPool,
) -> Result<Rc<Value>> {
    emit_or_fold_with_config(b, map, operands, pool, LinalgConfig::global())
}

pub fn emit_or_fold_with_config(
    b: &mut FunctionBuilder,
    map: &AffineMap,
    operands: &[Rc<Value>],
    pool: &mut ConstantPool,
    config: &LinalgConfig,
) -> Result<Rc<Value>> {
    let (composed, operands) = fully_compose(map, operands, config.compose_limit)?;
    if let Some(folded) = try_fold(b, &composed, &operands, pool)? {
        tracing::debug!(map = %composed, value.id = folded.id, "affine computation folded");
        return Ok(folded);
    }
    let applied = b.affine_apply(composed, &operands)?;
    tracing::debug!(value.id = applied.id, num_operands = operands.len(), "affine computation emitted");
    Ok(applied)
}

/// Apply every result of `map` to the `part` of each range.
///
/// `map` has one dimension per range and no symbols. Results come back in
/// result order, each folded where possible.
pub fn apply_map_to_range_part(
    b: &mut FunctionBuilder,
    map: &AffineMap,
    ranges: &[Rc<Value>],
    part: RangePart,
    pool: &mut ConstantPool,
) -> Result<SmallVec<[Rc<Value>; 4]>> {
    apply_map_to_range_part_with_config(b, map, ranges, part, pool, LinalgConfig::global())
}

pub fn apply_map_to_range_part_with_config(
    b: &mut FunctionBuilder,
    map: &AffineMap,
    ranges: &[Rc<Value>],
    part: RangePart,
    pool: &mut ConstantPool,
    config: &LinalgConfig,
) -> Result<SmallVec<[Rc<Value>; 4]>> {
    ensure!(map.num_dims() == ranges.len(), RangeArityMismatchSnafu { dims: map.num_dims(), ranges: ranges.len() });
    ensure!(map.num_symbols() == 0, UnexpectedSymbolsSnafu { symbols: map.num_symbols() });

    let parts = ranges.iter().map(|range| extract_range_part(range, part)).collect::<Result<SmallVec<[_; 4]>>>()?;
    (0..map.num_results())
        .filter_map(|index| map.sub_map(index))
        .map(|sub_map| emit_or_fold_with_config(b, &sub_map, &parts, pool, config))
        .collect()
}
