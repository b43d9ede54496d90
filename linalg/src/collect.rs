//! Range collection.
//!
//! Recovers the ordered ranges that parameterise a view, a slice, or an
//! operation consuming views. Views are walked back to their producers; the
//! graph is acyclic so the walk always terminates.

use std::rc::Rc;

use smallvec::SmallVec;
use strata_ir::Value;

use crate::config::LinalgConfig;
use crate::error::*;

/// Ranges parameterising `op`.
///
/// - View: its full indexing list, index-typed entries included.
/// - Slice: only its range-typed indexings.
/// - Anything else: the ranges of every view-typed operand, in operand order.
pub fn get_ranges(op: &Rc<Value>) -> Result<SmallVec<[Rc<Value>; 8]>> {
    get_ranges_with_config(op, LinalgConfig::global())
}

pub fn get_ranges_with_config(op: &Rc<Value>, config: &LinalgConfig) -> Result<SmallVec<[Rc<Value>; 8]>> {
    let mut ranges = SmallVec::new();
    collect_ranges(op, 0, config, &mut ranges)?;
    Ok(ranges)
}

fn collect_ranges(
    value: &Rc<Value>,
    depth: usize,
    config: &LinalgConfig,
    ranges: &mut SmallVec<[Rc<Value>; 8]>,
) -> Result<()> {
    debug_assert!(depth <= config.max_view_depth, "view chain deeper than {}", config.max_view_depth);
    let op = value.op();
    if let Some((_, indexings)) = op.as_view() {
        ranges.extend(indexings.iter().cloned());
    } else if let Some((_, indexings)) = op.as_slice() {
        ranges.extend(indexings.iter().filter(|indexing| indexing.dtype().is_range()).cloned());
    } else {
        for operand in op.operands().into_iter().filter(|operand| operand.dtype().is_view()) {
            if !operand.has_producer() {
                tracing::error!(view.id = operand.id, user.id = value.id, "view without producer");
                return MissingViewProducerSnafu { id: operand.id }.fail();
            }
            collect_ranges(operand, depth + 1, config, ranges)?;
        }
    }
    Ok(())
}
