//! Range accessor.
//!
//! Every range value is expected to come straight from a range construction;
//! its parts are returned as they are, nothing new is created.

use std::rc::Rc;

use snafu::ensure;
use strata_ir::{RangeOperands, Value};

use crate::error::*;

/// Component of a `[min, max, step)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, derive_more::Display)]
pub enum RangePart {
    #[display("min")]
    Min,
    #[display("max")]
    Max,
    #[display("step")]
    Step,
}

fn range_operands(range: &Rc<Value>) -> Result<RangeOperands<'_>> {
    ensure!(range.dtype().is_range(), NotARangeSnafu { id: range.id, actual: range.dtype() });
    if !range.has_producer() {
        tracing::error!(range.id = range.id, "range without producer");
        return MissingRangeProducerSnafu { id: range.id }.fail();
    }
    match range.op().as_range() {
        Some(operands) => Ok(operands),
        None => {
            tracing::error!(range.id = range.id, op = range.op().name(), "range not built by a range construction");
            UnrecognizedRangeProducerSnafu { id: range.id, op: range.op().name() }.fail()
        }
    }
}

/// Return the `part` operand of the construction that built `range`.
pub fn extract_range_part(range: &Rc<Value>, part: RangePart) -> Result<Rc<Value>> {
    let operands = range_operands(range)?;
    let value = match part {
        RangePart::Min => operands.min,
        RangePart::Max => operands.max,
        RangePart::Step => operands.step,
    };
    Ok(value.clone())
}

/// `(min, max, step)` of `range`.
pub fn range_parts(range: &Rc<Value>) -> Result<(Rc<Value>, Rc<Value>, Rc<Value>)> {
    let RangeOperands { min, max, step } = range_operands(range)?;
    Ok((min.clone(), max.clone(), step.clone()))
}
