//! Per-unit function builder.
//!
//! A [`FunctionBuilder`] owns one compilation unit while it is being built.
//! Operations are appended at the insertion point: the body of the innermost
//! open loop, or the entry block when no loop is open. Loops are opened and
//! closed explicitly and must nest; closing moves the finished loop into the
//! enclosing block.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use strata_dtype::DType;

use crate::affine::AffineMap;
use crate::error::*;
use crate::op::Op;
use crate::value::{Value, ValueKey};

static UNIT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A finished compilation unit.
#[derive(Debug)]
pub struct Function {
    id: u64,
    name: String,
    arguments: Vec<Rc<Value>>,
    body: Vec<Rc<Value>>,
}

impl Function {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Rc<Value>] {
        &self.arguments
    }

    /// Top-level operations in program order.
    pub fn body(&self) -> &[Rc<Value>] {
        &self.body
    }
}

#[derive(Debug)]
struct LoopFrame {
    iv: Rc<Value>,
    lower: Rc<Value>,
    upper: Rc<Value>,
    step: i64,
    body: Vec<Rc<Value>>,
}

/// Builder for one compilation unit.
///
/// Not `Send`: a unit is built on one thread, and any per-unit caches layered
/// on top of the builder share that restriction.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    /// Number of operations hoisted to the top of the entry block.
    prologue_len: usize,
    frames: Vec<LoopFrame>,
    /// Every induction variable a loop of this unit has bound, open or closed.
    bound: HashSet<ValueKey>,
    num_ops: usize,
}

fn check_operand(op: &'static str, position: usize, value: &Value, expected: &'static str, ok: bool) -> Result<()> {
    ensure!(ok, OperandTypeMismatchSnafu { op, position, expected, actual: value.dtype() });
    Ok(())
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let id = UNIT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            function: Function { id, name: name.into(), arguments: Vec::new(), body: Vec::new() },
            prologue_len: 0,
            frames: Vec::new(),
            bound: HashSet::new(),
            num_ops: 0,
        }
    }

    /// Id of the unit under construction, unique within the process.
    pub fn unit_id(&self) -> u64 {
        self.function.id
    }

    /// Operations created so far, including hoisted ones and closed loops.
    pub fn num_ops(&self) -> usize {
        self.num_ops
    }

    /// Number of currently open loops.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether `iv` is already bound by a loop of this unit, open or closed.
    pub fn binds(&self, iv: &Rc<Value>) -> bool {
        self.bound.contains(&ValueKey(iv.clone()))
    }

    /// Add a unit parameter.
    pub fn argument(&mut self, dtype: DType) -> Rc<Value> {
        let value = Value::new(Op::Argument { index: self.function.arguments.len() }, dtype);
        self.function.arguments.push(value.clone());
        value
    }

    /// Fresh induction variable, bound later by [`FunctionBuilder::open_loop`].
    pub fn induction_var(&mut self) -> Rc<Value> {
        Value::new(Op::InductionVar, DType::Index)
    }

    fn insert(&mut self, op: Op, dtype: DType) -> Rc<Value> {
        let value = Value::new(op, dtype);
        match self.frames.last_mut() {
            Some(frame) => frame.body.push(value.clone()),
            None => self.function.body.push(value.clone()),
        }
        self.num_ops += 1;
        value
    }

    /// Create an operation at the unit's entry point, ahead of everything
    /// inserted at the regular insertion point. Unchecked.
    pub(crate) fn create_at_entry(&mut self, op: Op, dtype: DType) -> Rc<Value> {
        let value = Value::new(op, dtype);
        self.function.body.insert(self.prologue_len, value.clone());
        self.prologue_len += 1;
        self.num_ops += 1;
        value
    }

    pub fn constant_index(&mut self, value: i64) -> Rc<Value> {
        self.insert(Op::ConstantIndex(value), DType::Index)
    }

    /// Index constant hoisted to the entry point, visible from every loop of the unit.
    pub fn constant_index_at_entry(&mut self, value: i64) -> Rc<Value> {
        self.create_at_entry(Op::ConstantIndex(value), DType::Index)
    }

    pub fn range(&mut self, min: &Rc<Value>, max: &Rc<Value>, step: &Rc<Value>) -> Result<Rc<Value>> {
        for (position, value) in [min, max, step].into_iter().enumerate() {
            check_operand("range", position, value, "index", value.dtype().is_index())?;
        }
        Ok(self.insert(Op::Range { min: min.clone(), max: max.clone(), step: step.clone() }, DType::Range))
    }

    /// View over `buffer` with one indexing per buffer dimension.
    pub fn view(&mut self, buffer: &Rc<Value>, indexings: &[Rc<Value>]) -> Result<Rc<Value>> {
        let rank = buffer.dtype().rank().filter(|_| buffer.dtype().is_buffer());
        let rank = rank.context(OperandTypeMismatchSnafu {
            op: "view",
            position: 0usize,
            expected: "buffer",
            actual: buffer.dtype(),
        })?;
        let dtype = Self::indexed_dtype("view", rank, indexings)?;
        Ok(self.insert(Op::View { buffer: buffer.clone(), indexings: indexings.iter().cloned().collect() }, dtype))
    }

    /// Slice of a view-typed `base` with one indexing per free dimension of `base`.
    pub fn slice(&mut self, base: &Rc<Value>, indexings: &[Rc<Value>]) -> Result<Rc<Value>> {
        let rank = base.dtype().rank().filter(|_| base.dtype().is_view());
        let rank = rank.context(OperandTypeMismatchSnafu {
            op: "slice",
            position: 0usize,
            expected: "view",
            actual: base.dtype(),
        })?;
        let dtype = Self::indexed_dtype("slice", rank, indexings)?;
        Ok(self.insert(Op::Slice { base: base.clone(), indexings: indexings.iter().cloned().collect() }, dtype))
    }

    /// Result type of a view or slice: one free dimension per range indexing.
    fn indexed_dtype(op: &'static str, rank: usize, indexings: &[Rc<Value>]) -> Result<DType> {
        ensure!(indexings.len() == rank, IndexingCountMismatchSnafu { op, rank, actual: indexings.len() });
        for (position, indexing) in indexings.iter().enumerate() {
            check_operand(op, position + 1, indexing, "range or index", indexing.dtype().is_indexing())?;
        }
        Ok(DType::View { rank: indexings.iter().filter(|v| v.dtype().is_range()).count() })
    }

    /// Materialise a single-result affine map applied to index operands.
    pub fn affine_apply(&mut self, map: AffineMap, operands: &[Rc<Value>]) -> Result<Rc<Value>> {
        ensure!(map.num_results() == 1, MultiResultAffineApplySnafu { results: map.num_results() });
        ensure!(
            map.num_inputs() == operands.len(),
            AffineArityMismatchSnafu { expected: map.num_inputs(), actual: operands.len() }
        );
        for (position, operand) in operands.iter().enumerate() {
            check_operand("affine_apply", position, operand, "index", operand.dtype().is_index())?;
        }
        let operands: SmallVec<[Rc<Value>; 4]> = operands.iter().cloned().collect();
        Ok(self.insert(Op::AffineApply { map, operands }, DType::Index))
    }

    /// Any other operation. No operand checks.
    pub fn generic(&mut self, name: impl Into<String>, operands: &[Rc<Value>], dtype: DType) -> Rc<Value> {
        self.insert(Op::Generic { name: name.into(), operands: operands.iter().cloned().collect() }, dtype)
    }

    /// Open a loop binding `iv` over `[lower, upper)` with a static positive step.
    ///
    /// Subsequent operations go into the loop body until the matching
    /// [`FunctionBuilder::close_loop`].
    pub fn open_loop(&mut self, iv: &Rc<Value>, lower: &Rc<Value>, upper: &Rc<Value>, step: i64) -> Result<()> {
        ensure!(iv.is_induction_var(), NotAnInductionVarSnafu { id: iv.id });
        ensure!(!self.binds(iv), InductionVarInUseSnafu { id: iv.id });
        check_operand("for", 1, lower, "index", lower.dtype().is_index())?;
        check_operand("for", 2, upper, "index", upper.dtype().is_index())?;
        ensure!(step > 0, NonPositiveStepSnafu { step });

        tracing::trace!(iv = iv.id, lower = lower.id, upper = upper.id, step, depth = self.frames.len(), "open loop");
        self.bound.insert(ValueKey(iv.clone()));
        self.frames.push(LoopFrame { iv: iv.clone(), lower: lower.clone(), upper: upper.clone(), step, body: Vec::new() });
        Ok(())
    }

    /// Close the innermost open loop and place it in the enclosing block.
    pub fn close_loop(&mut self) -> Result<Rc<Value>> {
        let LoopFrame { iv, lower, upper, step, body } = self.frames.pop().context(NoOpenLoopSnafu)?;
        tracing::trace!(iv = iv.id, depth = self.frames.len(), "close loop");
        Ok(self.insert(Op::For { iv, lower, upper, step, body }, DType::Void))
    }

    /// Finish the unit. Every opened loop must have been closed.
    pub fn finish(self) -> Result<Function> {
        ensure!(self.frames.is_empty(), UnclosedLoopsSnafu { count: self.frames.len() });
        Ok(self.function)
    }
}
