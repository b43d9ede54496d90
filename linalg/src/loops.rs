//! Loop nest builder.

use std::rc::Rc;

use smallvec::SmallVec;
use snafu::ensure;
use strata_ir::{FunctionBuilder, Value, fully_compose};

use crate::config::LinalgConfig;
use crate::error::*;
use crate::range::range_parts;

#[derive(Debug, Clone)]
struct LoopBounds {
    iv: Rc<Value>,
    lower: Rc<Value>,
    upper: Rc<Value>,
    step: i64,
}

/// Nest of loops, one per range, opened on construction.
///
/// Every range is validated before the first loop is opened, so a failing
/// construction leaves the builder untouched. [`LoopNestBuilder::run`] then
/// executes the body once at the innermost level and closes the loops
/// innermost first.
///
/// ```rust,ignore
/// let nest = LoopNestBuilder::new(&mut b, &[i, j], &[rows, cols])?;
/// let outer = nest.run(&mut b, |b| {
///     b.generic("store", &[i.clone(), j.clone()], DType::Void);
///     Ok(())
/// })?;
/// ```
#[derive(Debug)]
#[must_use = "opened loops stay open until `run` or `finish` closes them"]
pub struct LoopNestBuilder {
    loops: SmallVec<[LoopBounds; 4]>,
}

impl LoopNestBuilder {
    pub fn new(b: &mut FunctionBuilder, ivs: &[Rc<Value>], ranges: &[Rc<Value>]) -> Result<Self> {
        Self::with_config(b, ivs, ranges, LinalgConfig::global())
    }

    #[tracing::instrument(skip_all, fields(depth = ranges.len()))]
    pub fn with_config(
        b: &mut FunctionBuilder,
        ivs: &[Rc<Value>],
        ranges: &[Rc<Value>],
        config: &LinalgConfig,
    ) -> Result<Self> {
        ensure!(ivs.len() == ranges.len(), LoopArityMismatchSnafu { ivs: ivs.len(), ranges: ranges.len() });

        let mut loops: SmallVec<[LoopBounds; 4]> = SmallVec::with_capacity(ranges.len());
        for (iv, range) in ivs.iter().zip(ranges) {
            if !iv.is_induction_var() {
                return Err(strata_ir::Error::NotAnInductionVar { id: iv.id }.into());
            }
            if b.binds(iv) || loops.iter().any(|bounds| Rc::ptr_eq(&bounds.iv, iv)) {
                return Err(strata_ir::Error::InductionVarInUse { id: iv.id }.into());
            }
            let (lower, upper, step) = range_parts(range)?;
            let step = static_step(&step, config)?;
            if step <= 0 {
                return Err(strata_ir::Error::NonPositiveStep { step }.into());
            }
            loops.push(LoopBounds { iv: iv.clone(), lower, upper, step });
        }

        for bounds in &loops {
            b.open_loop(&bounds.iv, &bounds.lower, &bounds.upper, bounds.step)?;
        }
        Ok(Self { loops })
    }

    /// Run `body` once inside the innermost loop, then close the nest.
    ///
    /// Returns the outermost loop, or `None` for an empty nest.
    pub fn run<F>(self, b: &mut FunctionBuilder, body: F) -> Result<Option<Rc<Value>>>
    where
        F: FnOnce(&mut FunctionBuilder) -> Result<()>,
    {
        body(b)?;
        self.finish(b)
    }

    /// Close the nest without emitting a body.
    pub fn finish(self, b: &mut FunctionBuilder) -> Result<Option<Rc<Value>>> {
        let mut outermost = None;
        for bounds in self.loops.iter().rev() {
            let closed = b.close_loop()?;
            tracing::trace!(iv = bounds.iv.id, loop_id = closed.id, "loop closed");
            outermost = Some(closed);
        }
        Ok(outermost)
    }
}

/// Literal step of a loop.
///
/// A constant is taken as is; an affine computation must compose down to a literal.
fn static_step(step: &Rc<Value>, config: &LinalgConfig) -> Result<i64> {
    if let Some(literal) = step.constant_index() {
        return Ok(literal);
    }
    if let Some((map, operands)) = step.op().as_affine_apply() {
        let (composed, _) = fully_compose(map, operands, config.compose_limit)?;
        if let Some(literal) = composed.as_single_constant() {
            return Ok(literal);
        }
    }
    tracing::error!(step.id = step.id, op = step.op().name(), "loop step is not a static constant");
    NonConstantStepSnafu { id: step.id }.fail()
}
