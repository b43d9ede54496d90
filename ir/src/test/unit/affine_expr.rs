//! Affine expression construction, simplification and evaluation.

use test_case::test_case;

use crate::{AffineBinaryOp, AffineExpr};

fn d(position: u32) -> AffineExpr {
    AffineExpr::dim(position)
}

fn s(position: u32) -> AffineExpr {
    AffineExpr::symbol(position)
}

fn c(value: i64) -> AffineExpr {
    AffineExpr::constant(value)
}

// =========================================================================
// Simplification on construction
// =========================================================================

#[test]
fn test_constant_folding() {
    assert_eq!(c(3) + c(4), c(7));
    assert_eq!(c(3) * c(4), c(12));
    assert_eq!(c(3) - c(4), c(-1));
    assert_eq!(c(7).floor_div(c(2)), c(3));
    assert_eq!(c(7).ceil_div(c(2)), c(4));
    assert_eq!(c(7).modulo(c(3)), c(1));
}

#[test]
fn test_identities() {
    assert_eq!(d(0) + 0, d(0));
    assert_eq!(c(0) + d(0), d(0));
    assert_eq!(d(0) * 1, d(0));
    assert_eq!(d(0) * 0, c(0));
    assert_eq!(d(0).floor_div(c(1)), d(0));
    assert_eq!(d(0).ceil_div(c(1)), d(0));
    assert_eq!(d(0).modulo(c(1)), c(0));
}

#[test]
fn test_constant_moves_right() {
    assert_eq!(c(5) + d(0), d(0) + 5);
    assert_eq!(c(5) * s(0), s(0) * 5);
}

#[test]
fn test_chained_addends_merge() {
    let chained = ((d(0) + 1) + 2) + 3;
    assert_eq!(chained, d(0) + 6);
    assert_eq!(chained.to_string(), "d0 + 6");
}

#[test]
fn test_constant_addend_floats_outward() {
    let expr = (d(0) + 1) + (d(1) + 2);
    assert_eq!(expr, (d(0) + d(1)) + 3);
}

#[test]
fn test_chained_factors_merge() {
    assert_eq!((d(0) * 2) * 3, d(0) * 6);
}

#[test]
fn test_exact_division_of_scaled_term() {
    assert_eq!((d(0) * 8).floor_div(c(4)), d(0) * 2);
    assert_eq!((d(0) * 8).ceil_div(c(4)), d(0) * 2);
    assert_eq!((d(0) * 8).modulo(c(4)), c(0));
    assert!(matches!((d(0) * 6).floor_div(c(4)), AffineExpr::Binary(AffineBinaryOp::FloorDiv, _, _)));
}

#[test]
fn test_division_by_zero_is_kept() {
    let expr = c(4).floor_div(c(0));
    assert!(matches!(expr, AffineExpr::Binary(AffineBinaryOp::FloorDiv, _, _)));
    assert_eq!(expr.eval(&[], &[]), None);
}

#[test]
fn test_overflow_is_kept() {
    let expr = c(i64::MAX) + c(1);
    assert!(matches!(expr, AffineExpr::Binary(AffineBinaryOp::Add, _, _)));
    assert_eq!(expr.eval(&[], &[]), None);
}

// =========================================================================
// Evaluation
// =========================================================================

#[test_case(7, 2, 3, 4, 1; "positive")]
#[test_case(-7, 2, -4, -3, 1; "negative dividend")]
#[test_case(7, -2, -4, -3, -1; "negative divisor")]
#[test_case(-7, -2, 3, 4, -1; "both negative")]
#[test_case(6, 3, 2, 2, 0; "exact")]
fn test_division_semantics(lhs: i64, rhs: i64, floor: i64, ceil: i64, modulo: i64) {
    assert_eq!(d(0).floor_div(s(0)).eval(&[lhs], &[rhs]), Some(floor));
    assert_eq!(d(0).ceil_div(s(0)).eval(&[lhs], &[rhs]), Some(ceil));
    assert_eq!(d(0).modulo(s(0)).eval(&[lhs], &[rhs]), Some(modulo));
}

#[test]
fn test_eval_mixed() {
    let expr = d(0) * 4 + s(0) - d(1);
    assert_eq!(expr.eval(&[3, 5], &[10]), Some(17));
    assert_eq!(expr.eval(&[3], &[10]), None);
}

// =========================================================================
// Substitution
// =========================================================================

#[test]
fn test_replace_dims_and_symbols_simplifies() {
    let expr = d(0) + s(0);
    let replaced = expr.replace_dims_and_symbols(&[c(2)], &[c(5)]);
    assert_eq!(replaced, c(7));

    let partial = (d(0) * 2).replace_dims_and_symbols(&[d(1) + 1], &[]);
    assert_eq!(partial.eval(&[0, 4], &[]), Some(10));
}

#[test]
fn test_mark_used() {
    let mut dims = [false; 3];
    let mut symbols = [false; 2];
    (d(2) + s(1) * 3).mark_used(&mut dims, &mut symbols);
    assert_eq!(dims, [false, false, true]);
    assert_eq!(symbols, [false, true]);
}

#[test_case(d(0) + s(1), "d0 + s1")]
#[test_case((d(0) + d(1)) * 4, "(d0 + d1) * 4")]
#[test_case(d(0).floor_div(c(2)) + 1, "(d0 floordiv 2) + 1")]
#[test_case(c(-3), "-3")]
fn test_display(expr: AffineExpr, expected: &str) {
    assert_eq!(expr.to_string(), expected);
}
