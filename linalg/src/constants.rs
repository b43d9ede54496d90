//! Per-unit constant pool.
//!
//! Folding hands out constants through the pool so that every use of a given
//! literal within one unit sees the same value. Identity-based elision
//! downstream relies on that.

use std::collections::HashMap;
use std::rc::Rc;

use snafu::ensure;
use strata_ir::{FunctionBuilder, Value};

use crate::error::{ForeignConstantPoolSnafu, Result};

/// Cache of index constants for one compilation unit.
///
/// Constants are created at the unit's entry point on first request and never
/// evicted. The pool is bound to the unit it was created for and refuses to
/// serve any other.
#[derive(Debug)]
pub struct ConstantPool {
    unit_id: u64,
    constants: HashMap<i64, Rc<Value>>,
}

impl ConstantPool {
    pub fn new(b: &FunctionBuilder) -> Self {
        Self { unit_id: b.unit_id(), constants: HashMap::new() }
    }

    /// Unit this pool belongs to.
    pub fn unit_id(&self) -> u64 {
        self.unit_id
    }

    /// Canonical constant for `literal`, created at the entry point on first request.
    pub fn get_or_create_index(&mut self, b: &mut FunctionBuilder, literal: i64) -> Result<Rc<Value>> {
        ensure!(b.unit_id() == self.unit_id, ForeignConstantPoolSnafu { pool_unit: self.unit_id, unit: b.unit_id() });
        if let Some(value) = self.constants.get(&literal) {
            return Ok(value.clone());
        }
        let value = b.constant_index_at_entry(literal);
        tracing::debug!(literal, value.id = value.id, unit = self.unit_id, "pooled constant created");
        self.constants.insert(literal, value.clone());
        Ok(value)
    }

    pub fn get(&self, literal: i64) -> Option<&Rc<Value>> {
        self.constants.get(&literal)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}
