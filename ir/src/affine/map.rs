//! Multi-result affine maps.

use std::fmt;

use smallvec::{SmallVec, smallvec};
use snafu::ensure;

use crate::affine::expr::AffineExpr;
use crate::error::{AffinePositionOutOfRangeSnafu, Result};

/// Function from `num_dims` dimension inputs followed by `num_symbols` symbol
/// inputs to a tuple of result expressions.
///
/// Maps are plain values and compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineMap {
    num_dims: usize,
    num_symbols: usize,
    results: SmallVec<[AffineExpr; 2]>,
}

impl AffineMap {
    /// Create a map, checking every referenced position against the declared counts.
    ///
    /// ```rust
    /// # use strata_ir::{AffineExpr, AffineMap};
    /// let map = AffineMap::new(2, 0, [AffineExpr::dim(0) + AffineExpr::dim(1)]).unwrap();
    /// assert_eq!(map.to_string(), "(d0, d1) -> (d0 + d1)");
    /// assert!(AffineMap::new(1, 0, [AffineExpr::dim(1)]).is_err());
    /// ```
    pub fn new(num_dims: usize, num_symbols: usize, results: impl IntoIterator<Item = AffineExpr>) -> Result<Self> {
        let results: SmallVec<[AffineExpr; 2]> = results.into_iter().collect();
        for expr in &results {
            let (max_dim, max_symbol) = expr.max_positions();
            if let Some(position) = max_dim {
                ensure!(
                    (position as usize) < num_dims,
                    AffinePositionOutOfRangeSnafu { kind: "dimension", position, count: num_dims }
                );
            }
            if let Some(position) = max_symbol {
                ensure!(
                    (position as usize) < num_symbols,
                    AffinePositionOutOfRangeSnafu { kind: "symbol", position, count: num_symbols }
                );
            }
        }
        Ok(Self { num_dims, num_symbols, results })
    }

    pub fn single_result(num_dims: usize, num_symbols: usize, expr: AffineExpr) -> Result<Self> {
        Self::new(num_dims, num_symbols, [expr])
    }

    /// `() -> (value)`.
    pub fn constant(value: i64) -> Self {
        Self { num_dims: 0, num_symbols: 0, results: smallvec![AffineExpr::Constant(value)] }
    }

    /// `(d0, ..., dn-1) -> (d0, ..., dn-1)`.
    pub fn identity(num_dims: usize) -> Self {
        Self { num_dims, num_symbols: 0, results: (0..num_dims as u32).map(AffineExpr::Dim).collect() }
    }

    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    pub fn num_inputs(&self) -> usize {
        self.num_dims + self.num_symbols
    }

    pub fn num_results(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[AffineExpr] {
        &self.results
    }

    /// Single-result map over the same inputs, keeping only result `index`.
    pub fn sub_map(&self, index: usize) -> Option<Self> {
        let expr = self.results.get(index)?.clone();
        Some(Self { num_dims: self.num_dims, num_symbols: self.num_symbols, results: smallvec![expr] })
    }

    /// Literal result of a single-result constant map.
    pub fn as_single_constant(&self) -> Option<i64> {
        match self.results.as_slice() {
            [expr] => expr.as_constant(),
            _ => None,
        }
    }

    /// Evaluate every result; `inputs` are the dimension values followed by the symbol values.
    pub fn eval(&self, inputs: &[i64]) -> Option<SmallVec<[i64; 2]>> {
        if inputs.len() != self.num_inputs() {
            return None;
        }
        let (dims, symbols) = inputs.split_at(self.num_dims);
        self.results.iter().map(|expr| expr.eval(dims, symbols)).collect()
    }
}

impl fmt::Display for AffineMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = (0..self.num_dims).map(|i| format!("d{i}")).collect();
        write!(f, "({})", dims.join(", "))?;
        if self.num_symbols > 0 {
            let symbols: Vec<String> = (0..self.num_symbols).map(|i| format!("s{i}")).collect();
            write!(f, "[{}]", symbols.join(", "))?;
        }
        let results: Vec<String> = self.results.iter().map(ToString::to_string).collect();
        write!(f, " -> ({})", results.join(", "))
    }
}
