//! Value nodes of the representation.
//!
//! A [`Value`] is both the operation that produced it and its single result.
//! Values are immutable once created and shared through `Rc`; the graph only
//! ever grows. Equality throughout the crate is identity: two values are the
//! same only when they are the same allocation, never because they compute
//! the same number.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_dtype::DType;

use crate::op::Op;

// Monotonic ids, never reused. Relaxed is enough since only uniqueness matters.
static VALUE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_value_id() -> u64 {
    VALUE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Node in the value graph.
pub struct Value {
    /// Stable id, unique across all compilation units of the process.
    pub id: u64,
    pub(crate) op: Op,
    pub(crate) dtype: DType,
}

impl Value {
    pub(crate) fn new(op: Op, dtype: DType) -> Rc<Self> {
        Rc::new(Self { id: next_value_id(), op, dtype })
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Whether some operation produced this value.
    ///
    /// Unit arguments and loop induction variables are block arguments: they
    /// exist without a defining operation.
    pub fn has_producer(&self) -> bool {
        !matches!(self.op, Op::Argument { .. } | Op::InductionVar)
    }

    /// Literal of a `ConstantIndex` value.
    pub fn constant_index(&self) -> Option<i64> {
        match self.op {
            Op::ConstantIndex(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_induction_var(&self) -> bool {
        matches!(self.op, Op::InductionVar)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{} = {}", self.id, self.op.name())?;
        let operands = self.op.operands();
        if !operands.is_empty() {
            let ids: Vec<String> = operands.iter().map(|v| format!("%{}", v.id)).collect();
            write!(f, "({})", ids.join(", "))?;
        }
        write!(f, " : {}", self.dtype)
    }
}

/// `Rc<Value>` wrapper hashing and comparing by value id.
#[derive(Clone)]
pub struct ValueKey(pub Rc<Value>);

impl fmt::Debug for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueKey(id={})", self.0.id)
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
