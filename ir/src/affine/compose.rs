//! Composition of an affine map with the affine computations feeding it.
//!
//! [`fully_compose`] inlines every single-result `AffineApply` producer of an
//! operand into the consumer map and replaces every `ConstantIndex` operand
//! by its literal, repeating until no operand is produced by either. The
//! result is normalised: operands are unique by identity and every remaining
//! operand is referenced by the map.

use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;
use snafu::ensure;

use crate::affine::expr::AffineExpr;
use crate::affine::map::AffineMap;
use crate::error::{AffineArityMismatchSnafu, CompositionDivergedSnafu, MultiResultAffineApplySnafu, Result};
use crate::op::Op;
use crate::value::{Value, ValueKey};

/// Fixpoint rounds allowed before composition gives up.
pub const DEFAULT_COMPOSE_LIMIT: usize = 1024;

/// Operand list deduplicated by identity.
#[derive(Default)]
struct OperandSet {
    values: Vec<Rc<Value>>,
    positions: HashMap<ValueKey, u32>,
}

impl OperandSet {
    fn position(&mut self, value: &Rc<Value>) -> u32 {
        let next = self.values.len() as u32;
        *self.positions.entry(ValueKey(value.clone())).or_insert_with(|| {
            self.values.push(value.clone());
            next
        })
    }
}

/// Compose `map` applied to `operands` with their affine producers.
///
/// Returns the normalised `(map, operands)` pair. Evaluating it gives the same
/// results as evaluating the input pair.
pub fn fully_compose(
    map: &AffineMap,
    operands: &[Rc<Value>],
    limit: usize,
) -> Result<(AffineMap, SmallVec<[Rc<Value>; 4]>)> {
    ensure!(
        map.num_inputs() == operands.len(),
        AffineArityMismatchSnafu { expected: map.num_inputs(), actual: operands.len() }
    );

    let mut map = map.clone();
    let mut operands: SmallVec<[Rc<Value>; 4]> = operands.iter().cloned().collect();
    for round in 0..limit {
        let (next_map, next_operands, changed) = compose_once(&map, &operands)?;
        tracing::trace!(round, map = %next_map, num_operands = next_operands.len(), changed, "affine composition round");
        map = next_map;
        operands = next_operands;
        if !changed {
            return drop_unused(&map, &operands);
        }
    }
    CompositionDivergedSnafu { limit }.fail()
}

/// One substitution pass. The flag reports whether any producer was inlined.
fn compose_once(map: &AffineMap, operands: &[Rc<Value>]) -> Result<(AffineMap, SmallVec<[Rc<Value>; 4]>, bool)> {
    let mut dims = OperandSet::default();
    let mut symbols = OperandSet::default();
    let mut dim_replacements = Vec::with_capacity(map.num_dims());
    let mut symbol_replacements = Vec::with_capacity(map.num_symbols());
    let mut changed = false;

    for (position, operand) in operands.iter().enumerate() {
        let is_dim = position < map.num_dims();
        let replacement = match operand.op() {
            Op::ConstantIndex(value) => {
                changed = true;
                AffineExpr::Constant(*value)
            }
            Op::AffineApply { map: producer, operands: producer_operands } => {
                changed = true;
                let [expr] = producer.results() else {
                    return MultiResultAffineApplySnafu { results: producer.num_results() }.fail();
                };
                ensure!(
                    producer_operands.len() == producer.num_inputs(),
                    AffineArityMismatchSnafu { expected: producer.num_inputs(), actual: producer_operands.len() }
                );
                let (producer_dims, producer_symbols) = producer_operands.split_at(producer.num_dims());
                let inner_dims: Vec<AffineExpr> =
                    producer_dims.iter().map(|v| AffineExpr::Dim(dims.position(v))).collect();
                let inner_symbols: Vec<AffineExpr> =
                    producer_symbols.iter().map(|v| AffineExpr::Symbol(symbols.position(v))).collect();
                expr.replace_dims_and_symbols(&inner_dims, &inner_symbols)
            }
            _ if is_dim => AffineExpr::Dim(dims.position(operand)),
            _ => AffineExpr::Symbol(symbols.position(operand)),
        };
        if is_dim {
            dim_replacements.push(replacement);
        } else {
            symbol_replacements.push(replacement);
        }
    }

    let results: Vec<AffineExpr> =
        map.results().iter().map(|expr| expr.replace_dims_and_symbols(&dim_replacements, &symbol_replacements)).collect();
    let composed = AffineMap::new(dims.values.len(), symbols.values.len(), results)?;
    let mut operands: SmallVec<[Rc<Value>; 4]> = dims.values.into_iter().collect();
    operands.extend(symbols.values);
    Ok((composed, operands, changed))
}

/// Remove inputs the map never reads, renumbering the rest in order.
fn drop_unused(map: &AffineMap, operands: &[Rc<Value>]) -> Result<(AffineMap, SmallVec<[Rc<Value>; 4]>)> {
    let mut used_dims = vec![false; map.num_dims()];
    let mut used_symbols = vec![false; map.num_symbols()];
    for expr in map.results() {
        expr.mark_used(&mut used_dims, &mut used_symbols);
    }

    let mut kept: SmallVec<[Rc<Value>; 4]> = SmallVec::new();
    let mut renumber = |used: &[bool], offset: usize, make: fn(u32) -> AffineExpr| -> Vec<AffineExpr> {
        let mut next = 0u32;
        used.iter()
            .enumerate()
            .map(|(i, used)| {
                if *used {
                    kept.push(operands[offset + i].clone());
                    next += 1;
                    make(next - 1)
                } else {
                    // Never read, any placeholder works.
                    AffineExpr::Constant(0)
                }
            })
            .collect()
    };
    let dim_replacements = renumber(&used_dims, 0, AffineExpr::Dim);
    let symbol_replacements = renumber(&used_symbols, map.num_dims(), AffineExpr::Symbol);

    let num_dims = used_dims.iter().filter(|used| **used).count();
    let num_symbols = used_symbols.iter().filter(|used| **used).count();
    let results: Vec<AffineExpr> =
        map.results().iter().map(|expr| expr.replace_dims_and_symbols(&dim_replacements, &symbol_replacements)).collect();
    Ok((AffineMap::new(num_dims, num_symbols, results)?, kept))
}
