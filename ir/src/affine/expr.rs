//! Affine expressions.
//!
//! Expressions are built from dimension references, symbol references and
//! integer literals. The constructors fold what they can as the tree is built,
//! so chains like `((d0 + 1) + 2) + 3` are kept as `d0 + 6` and a fully
//! constant tree collapses to a single literal.

use std::fmt;
use std::ops;

/// Binary combinator of an affine expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, derive_more::Display)]
pub enum AffineBinaryOp {
    #[display("+")]
    Add,
    #[display("*")]
    Mul,
    #[display("floordiv")]
    FloorDiv,
    #[display("ceildiv")]
    CeilDiv,
    #[display("mod")]
    Mod,
}

/// Affine expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AffineExpr {
    Dim(u32),
    Symbol(u32),
    Constant(i64),
    Binary(AffineBinaryOp, Box<AffineExpr>, Box<AffineExpr>),
}

// Floor/ceil semantics for negative operands. `None` on zero divisor or overflow.

fn floor_div(lhs: i64, rhs: i64) -> Option<i64> {
    let quotient = lhs.checked_div(rhs)?;
    let remainder = lhs.checked_rem(rhs)?;
    if remainder != 0 && ((remainder < 0) != (rhs < 0)) { quotient.checked_sub(1) } else { Some(quotient) }
}

fn ceil_div(lhs: i64, rhs: i64) -> Option<i64> {
    let quotient = lhs.checked_div(rhs)?;
    let remainder = lhs.checked_rem(rhs)?;
    if remainder != 0 && ((remainder < 0) == (rhs < 0)) { quotient.checked_add(1) } else { Some(quotient) }
}

fn modulo(lhs: i64, rhs: i64) -> Option<i64> {
    lhs.checked_sub(rhs.checked_mul(floor_div(lhs, rhs)?)?)
}

/// `lhs / rhs` when `rhs` divides `lhs` exactly.
fn exact_div(lhs: i64, rhs: i64) -> Option<i64> {
    if lhs.checked_rem(rhs)? == 0 { lhs.checked_div(rhs) } else { None }
}

impl AffineBinaryOp {
    /// Evaluate on literals.
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Mul => lhs.checked_mul(rhs),
            Self::FloorDiv => floor_div(lhs, rhs),
            Self::CeilDiv => ceil_div(lhs, rhs),
            Self::Mod => modulo(lhs, rhs),
        }
    }
}

impl AffineExpr {
    pub fn dim(position: u32) -> Self {
        Self::Dim(position)
    }

    pub fn symbol(position: u32) -> Self {
        Self::Symbol(position)
    }

    pub fn constant(value: i64) -> Self {
        Self::Constant(value)
    }

    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Self::Constant(value) => Some(*value),
            _ => None,
        }
    }

    fn binary(op: AffineBinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Split `x + c` into `(x, c)`.
    fn split_constant_addend(self) -> Result<(Self, i64), Self> {
        match self {
            Self::Binary(AffineBinaryOp::Add, lhs, rhs) => match *rhs {
                Self::Constant(c) => Ok((*lhs, c)),
                rhs => Err(Self::Binary(AffineBinaryOp::Add, lhs, Box::new(rhs))),
            },
            other => Err(other),
        }
    }

    /// Split `x * c` into `(x, c)`.
    fn split_constant_factor(&self) -> Option<(&Self, i64)> {
        match self {
            Self::Binary(AffineBinaryOp::Mul, lhs, rhs) => rhs.as_constant().map(|c| (lhs.as_ref(), c)),
            _ => None,
        }
    }

    /// Simplifying addition. Constants end up as the right-most addend.
    pub fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Constant(a), Self::Constant(b)) => match a.checked_add(b) {
                Some(sum) => Self::Constant(sum),
                None => Self::binary(AffineBinaryOp::Add, Self::Constant(a), Self::Constant(b)),
            },
            (Self::Constant(0), other) | (other, Self::Constant(0)) => other,
            (lhs @ Self::Constant(_), rhs) => rhs.add(lhs),
            (lhs, Self::Constant(c)) => match lhs.split_constant_addend() {
                Ok((inner, c0)) => match c0.checked_add(c) {
                    Some(sum) => inner.add(Self::Constant(sum)),
                    None => Self::binary(
                        AffineBinaryOp::Add,
                        Self::binary(AffineBinaryOp::Add, inner, Self::Constant(c0)),
                        Self::Constant(c),
                    ),
                },
                Err(lhs) => Self::binary(AffineBinaryOp::Add, lhs, Self::Constant(c)),
            },
            (lhs, rhs) => match (lhs.split_constant_addend(), rhs.split_constant_addend()) {
                // Float constants outward so they can meet and fold.
                (Ok((lhs, c)), Err(rhs)) | (Err(lhs), Ok((rhs, c))) => lhs.add(rhs).add(Self::Constant(c)),
                (Ok((lhs, c0)), Ok((rhs, c1))) => lhs.add(rhs).add(Self::Constant(c0)).add(Self::Constant(c1)),
                (Err(lhs), Err(rhs)) => Self::binary(AffineBinaryOp::Add, lhs, rhs),
            },
        }
    }

    /// Simplifying multiplication. Constants end up as the right-hand factor.
    pub fn mul(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Constant(a), Self::Constant(b)) => match a.checked_mul(b) {
                Some(product) => Self::Constant(product),
                None => Self::binary(AffineBinaryOp::Mul, Self::Constant(a), Self::Constant(b)),
            },
            (Self::Constant(0), _) | (_, Self::Constant(0)) => Self::Constant(0),
            (Self::Constant(1), other) | (other, Self::Constant(1)) => other,
            (lhs @ Self::Constant(_), rhs) => rhs.mul(lhs),
            (lhs, Self::Constant(c)) => match lhs.split_constant_factor().and_then(|(x, c0)| Some((x, c0.checked_mul(c)?))) {
                Some((inner, product)) => inner.clone().mul(Self::Constant(product)),
                None => Self::binary(AffineBinaryOp::Mul, lhs, Self::Constant(c)),
            },
            (lhs, rhs) => Self::binary(AffineBinaryOp::Mul, lhs, rhs),
        }
    }

    /// `self - rhs`, expressed as `self + rhs * -1`.
    pub fn sub(self, rhs: Self) -> Self {
        self.add(rhs.mul(Self::Constant(-1)))
    }

    pub fn floor_div(self, rhs: Self) -> Self {
        match (self, rhs) {
            (lhs, Self::Constant(0)) => Self::binary(AffineBinaryOp::FloorDiv, lhs, Self::Constant(0)),
            (Self::Constant(a), Self::Constant(b)) => match floor_div(a, b) {
                Some(quotient) => Self::Constant(quotient),
                None => Self::binary(AffineBinaryOp::FloorDiv, Self::Constant(a), Self::Constant(b)),
            },
            (lhs, Self::Constant(1)) => lhs,
            (lhs, Self::Constant(c)) => match lhs.split_constant_factor().and_then(|(x, f)| Some((x, exact_div(f, c)?))) {
                Some((inner, quotient)) => inner.clone().mul(Self::Constant(quotient)),
                None => Self::binary(AffineBinaryOp::FloorDiv, lhs, Self::Constant(c)),
            },
            (lhs, rhs) => Self::binary(AffineBinaryOp::FloorDiv, lhs, rhs),
        }
    }

    pub fn ceil_div(self, rhs: Self) -> Self {
        match (self, rhs) {
            (lhs, Self::Constant(0)) => Self::binary(AffineBinaryOp::CeilDiv, lhs, Self::Constant(0)),
            (Self::Constant(a), Self::Constant(b)) => match ceil_div(a, b) {
                Some(quotient) => Self::Constant(quotient),
                None => Self::binary(AffineBinaryOp::CeilDiv, Self::Constant(a), Self::Constant(b)),
            },
            (lhs, Self::Constant(1)) => lhs,
            (lhs, Self::Constant(c)) => match lhs.split_constant_factor().and_then(|(x, f)| Some((x, exact_div(f, c)?))) {
                Some((inner, quotient)) => inner.clone().mul(Self::Constant(quotient)),
                None => Self::binary(AffineBinaryOp::CeilDiv, lhs, Self::Constant(c)),
            },
            (lhs, rhs) => Self::binary(AffineBinaryOp::CeilDiv, lhs, rhs),
        }
    }

    pub fn modulo(self, rhs: Self) -> Self {
        match (self, rhs) {
            (lhs, Self::Constant(0)) => Self::binary(AffineBinaryOp::Mod, lhs, Self::Constant(0)),
            (Self::Constant(a), Self::Constant(b)) => match modulo(a, b) {
                Some(remainder) => Self::Constant(remainder),
                None => Self::binary(AffineBinaryOp::Mod, Self::Constant(a), Self::Constant(b)),
            },
            (_, Self::Constant(1)) => Self::Constant(0),
            (lhs, Self::Constant(c)) => match lhs.split_constant_factor() {
                Some((_, factor)) if exact_div(factor, c).is_some() => Self::Constant(0),
                _ => Self::binary(AffineBinaryOp::Mod, lhs, Self::Constant(c)),
            },
            (lhs, rhs) => Self::binary(AffineBinaryOp::Mod, lhs, rhs),
        }
    }

    /// Rebuild with the same combinator, re-running simplification.
    pub fn combine(op: AffineBinaryOp, lhs: Self, rhs: Self) -> Self {
        match op {
            AffineBinaryOp::Add => lhs.add(rhs),
            AffineBinaryOp::Mul => lhs.mul(rhs),
            AffineBinaryOp::FloorDiv => lhs.floor_div(rhs),
            AffineBinaryOp::CeilDiv => lhs.ceil_div(rhs),
            AffineBinaryOp::Mod => lhs.modulo(rhs),
        }
    }

    /// Substitute every `Dim(i)` by `dims[i]` and every `Symbol(j)` by `symbols[j]`.
    ///
    /// Positions must be in bounds; maps validate this on construction.
    pub fn replace_dims_and_symbols(&self, dims: &[AffineExpr], symbols: &[AffineExpr]) -> Self {
        match self {
            Self::Dim(position) => dims[*position as usize].clone(),
            Self::Symbol(position) => symbols[*position as usize].clone(),
            Self::Constant(value) => Self::Constant(*value),
            Self::Binary(op, lhs, rhs) => Self::combine(
                *op,
                lhs.replace_dims_and_symbols(dims, symbols),
                rhs.replace_dims_and_symbols(dims, symbols),
            ),
        }
    }

    /// Evaluate against concrete inputs. `None` on out-of-range position,
    /// division by zero or overflow.
    pub fn eval(&self, dims: &[i64], symbols: &[i64]) -> Option<i64> {
        match self {
            Self::Dim(position) => dims.get(*position as usize).copied(),
            Self::Symbol(position) => symbols.get(*position as usize).copied(),
            Self::Constant(value) => Some(*value),
            Self::Binary(op, lhs, rhs) => op.apply(lhs.eval(dims, symbols)?, rhs.eval(dims, symbols)?),
        }
    }

    /// Mark the dimension and symbol positions this expression reads.
    pub fn mark_used(&self, dims: &mut [bool], symbols: &mut [bool]) {
        match self {
            Self::Dim(position) => dims[*position as usize] = true,
            Self::Symbol(position) => symbols[*position as usize] = true,
            Self::Constant(_) => {}
            Self::Binary(_, lhs, rhs) => {
                lhs.mark_used(dims, symbols);
                rhs.mark_used(dims, symbols);
            }
        }
    }

    /// Largest `(dim, symbol)` position referenced, if any.
    pub(crate) fn max_positions(&self) -> (Option<u32>, Option<u32>) {
        match self {
            Self::Dim(position) => (Some(*position), None),
            Self::Symbol(position) => (None, Some(*position)),
            Self::Constant(_) => (None, None),
            Self::Binary(_, lhs, rhs) => {
                let (ld, ls) = lhs.max_positions();
                let (rd, rs) = rhs.max_positions();
                (ld.max(rd), ls.max(rs))
            }
        }
    }

}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dim(position) => write!(f, "d{position}"),
            Self::Symbol(position) => write!(f, "s{position}"),
            Self::Constant(value) => write!(f, "{value}"),
            Self::Binary(op, lhs, rhs) => {
                match lhs.as_ref() {
                    Self::Binary(AffineBinaryOp::Add, ..) if *op == AffineBinaryOp::Add => write!(f, "{lhs}")?,
                    Self::Binary(..) => write!(f, "({lhs})")?,
                    _ => write!(f, "{lhs}")?,
                }
                write!(f, " {op} ")?;
                match rhs.as_ref() {
                    Self::Binary(..) => write!(f, "({rhs})"),
                    _ => write!(f, "{rhs}"),
                }
            }
        }
    }
}

impl ops::Add for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::add(self, rhs)
    }
}

impl ops::Add<i64> for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: i64) -> AffineExpr {
        AffineExpr::add(self, AffineExpr::Constant(rhs))
    }
}

impl ops::Sub for AffineExpr {
    type Output = AffineExpr;

    fn sub(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::sub(self, rhs)
    }
}

impl ops::Sub<i64> for AffineExpr {
    type Output = AffineExpr;

    fn sub(self, rhs: i64) -> AffineExpr {
        AffineExpr::sub(self, AffineExpr::Constant(rhs))
    }
}

impl ops::Mul for AffineExpr {
    type Output = AffineExpr;

    fn mul(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::mul(self, rhs)
    }
}

impl ops::Mul<i64> for AffineExpr {
    type Output = AffineExpr;

    fn mul(self, rhs: i64) -> AffineExpr {
        AffineExpr::mul(self, AffineExpr::Constant(rhs))
    }
}

impl ops::Neg for AffineExpr {
    type Output = AffineExpr;

    fn neg(self) -> AffineExpr {
        AffineExpr::mul(self, AffineExpr::Constant(-1))
    }
}
