//! Folding and emission of affine computations.

use std::rc::Rc;

use strata_dtype::DType;
use strata_ir::{AffineExpr, AffineMap, FunctionBuilder, Op};

use crate::test::const_range;
use crate::{ConstantPool, Error, RangePart, apply_map_to_range_part, emit_or_fold, try_fold};

fn d(position: u32) -> AffineExpr {
    AffineExpr::dim(position)
}

fn s(position: u32) -> AffineExpr {
    AffineExpr::symbol(position)
}

fn add_const(offset: i64) -> AffineMap {
    AffineMap::single_result(1, 0, d(0) + offset).unwrap()
}

// =========================================================================
// try_fold
// =========================================================================

#[test]
fn test_fold_dimension() {
    let mut b = FunctionBuilder::new("fold_dim");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);
    let y = b.argument(DType::Index);
    let map = AffineMap::single_result(2, 0, d(1)).unwrap();

    let folded = try_fold(&mut b, &map, &[x, y.clone()], &mut pool).unwrap().unwrap();
    assert!(Rc::ptr_eq(&folded, &y));
    assert_eq!(b.num_ops(), 0);
}

#[test]
fn test_fold_symbol() {
    let mut b = FunctionBuilder::new("fold_symbol");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);
    let n = b.argument(DType::Index);
    let m = b.argument(DType::Index);
    let map = AffineMap::single_result(1, 2, s(1)).unwrap();

    let folded = try_fold(&mut b, &map, &[x, n, m.clone()], &mut pool).unwrap().unwrap();
    assert!(Rc::ptr_eq(&folded, &m));
    assert_eq!(b.num_ops(), 0);
}

#[test]
fn test_fold_constant_is_pooled() {
    let mut b = FunctionBuilder::new("fold_constant");
    let mut pool = ConstantPool::new(&b);
    let map = AffineMap::constant(7);

    let first = try_fold(&mut b, &map, &[], &mut pool).unwrap().unwrap();
    let second = try_fold(&mut b, &map, &[], &mut pool).unwrap().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.constant_index(), Some(7));
    assert_eq!(b.num_ops(), 1);

    let mut other = FunctionBuilder::new("fold_constant_other");
    let mut other_pool = ConstantPool::new(&other);
    let third = try_fold(&mut other, &map, &[], &mut other_pool).unwrap().unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!(third.constant_index(), Some(7));
}

#[test]
fn test_arithmetic_does_not_fold() {
    let mut b = FunctionBuilder::new("no_fold");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);

    assert!(try_fold(&mut b, &add_const(1), &[x], &mut pool).unwrap().is_none());
    assert_eq!(b.num_ops(), 0);
}

#[test]
fn test_fold_needs_single_result() {
    let mut b = FunctionBuilder::new("multi");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);
    let map = AffineMap::identity(1);
    let two = AffineMap::new(1, 0, [d(0), d(0)]).unwrap();

    assert!(try_fold(&mut b, &map, &[x.clone()], &mut pool).unwrap().is_some());
    assert_eq!(try_fold(&mut b, &two, &[x], &mut pool).unwrap_err(), Error::SingleResultExpected { results: 2 });
}

// =========================================================================
// emit_or_fold
// =========================================================================

#[test]
fn test_chain_collapses_to_constant() {
    let mut b = FunctionBuilder::new("collapse");
    let mut pool = ConstantPool::new(&b);
    let ten = b.constant_index(10);
    let a1 = b.affine_apply(add_const(1), &[ten]).unwrap();
    let a2 = b.affine_apply(add_const(2), &[a1]).unwrap();
    let a3 = b.affine_apply(add_const(3), &[a2]).unwrap();
    let before = b.num_ops();

    let result = emit_or_fold(&mut b, &AffineMap::identity(1), &[a3], &mut pool).unwrap();
    assert_eq!(result.constant_index(), Some(16));
    assert!(Rc::ptr_eq(&result, pool.get(16).unwrap()));
    // Only the pooled constant is new; no affine computation was emitted.
    assert_eq!(b.num_ops(), before + 1);
}

#[test]
fn test_chain_over_argument_emits_one_computation() {
    let mut b = FunctionBuilder::new("emit");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);
    let a1 = b.affine_apply(add_const(1), &[x.clone()]).unwrap();
    let a2 = b.affine_apply(add_const(2), &[a1]).unwrap();
    let before = b.num_ops();

    let result = emit_or_fold(&mut b, &add_const(3), &[a2], &mut pool).unwrap();
    assert_eq!(b.num_ops(), before + 1);
    let Op::AffineApply { map, operands } = result.op() else { panic!("expected affine computation") };
    assert_eq!(map.results(), &[d(0) + 6]);
    assert_eq!(operands.len(), 1);
    assert!(Rc::ptr_eq(&operands[0], &x));
    assert!(pool.is_empty());
}

#[test]
fn test_identity_over_computation_returns_it() {
    let mut b = FunctionBuilder::new("reuse");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);
    let y = b.argument(DType::Index);
    let copied = b.affine_apply(AffineMap::identity(1), &[x.clone()]).unwrap();
    let before = b.num_ops();

    let result = emit_or_fold(&mut b, &AffineMap::identity(1), &[copied], &mut pool).unwrap();
    assert!(Rc::ptr_eq(&result, &x));
    assert_eq!(b.num_ops(), before);

    let picked = emit_or_fold(&mut b, &AffineMap::single_result(2, 0, d(1)).unwrap(), &[x, y.clone()], &mut pool)
        .unwrap();
    assert!(Rc::ptr_eq(&picked, &y));
    assert_eq!(b.num_ops(), before);
}

// =========================================================================
// apply_map_to_range_part
// =========================================================================

#[test]
fn test_apply_map_to_constant_ranges() {
    let mut b = FunctionBuilder::new("ranges");
    let mut pool = ConstantPool::new(&b);
    let r0 = const_range(&mut b, 0, 16, 1);
    let r1 = const_range(&mut b, 2, 8, 2);
    let map = AffineMap::new(2, 0, [d(1), d(0) + d(1), d(0) * 4]).unwrap();

    let maxes = apply_map_to_range_part(&mut b, &map, &[r0.clone(), r1.clone()], RangePart::Max, &mut pool).unwrap();
    let literals: Vec<Option<i64>> = maxes.iter().map(|v| v.constant_index()).collect();
    assert_eq!(literals, vec![Some(8), Some(24), Some(64)]);
    // Constant operands are substituted, so even a bare dimension comes back pooled.
    assert!(Rc::ptr_eq(&maxes[0], pool.get(8).unwrap()));

    let steps = apply_map_to_range_part(&mut b, &map, &[r0, r1], RangePart::Step, &mut pool).unwrap();
    let literals: Vec<Option<i64>> = steps.iter().map(|v| v.constant_index()).collect();
    assert_eq!(literals, vec![Some(2), Some(3), Some(4)]);
}

#[test]
fn test_apply_map_to_symbolic_ranges() {
    let mut b = FunctionBuilder::new("symbolic");
    let mut pool = ConstantPool::new(&b);
    let zero = b.constant_index(0);
    let one = b.constant_index(1);
    let n = b.argument(DType::Index);
    let range = b.range(&zero, &n, &one).unwrap();
    let before = b.num_ops();

    let map = AffineMap::new(1, 0, [d(0), d(0) * 2]).unwrap();
    let results = apply_map_to_range_part(&mut b, &map, &[range], RangePart::Max, &mut pool).unwrap();
    assert_eq!(results.len(), 2);
    assert!(Rc::ptr_eq(&results[0], &n));
    assert!(matches!(results[1].op(), Op::AffineApply { .. }));
    assert_eq!(b.num_ops(), before + 1);
}

#[test]
fn test_apply_map_arity() {
    let mut b = FunctionBuilder::new("arity");
    let mut pool = ConstantPool::new(&b);
    let r0 = const_range(&mut b, 0, 4, 1);

    let err = apply_map_to_range_part(&mut b, &AffineMap::identity(2), &[r0.clone()], RangePart::Min, &mut pool)
        .unwrap_err();
    assert_eq!(err, Error::RangeArityMismatch { dims: 2, ranges: 1 });

    let with_symbol = AffineMap::single_result(1, 1, d(0) + s(0)).unwrap();
    let err = apply_map_to_range_part(&mut b, &with_symbol, &[r0], RangePart::Min, &mut pool).unwrap_err();
    assert_eq!(err, Error::UnexpectedSymbols { symbols: 1 });
}

#[test]
fn test_apply_map_rejects_non_range() {
    let mut b = FunctionBuilder::new("non_range");
    let mut pool = ConstantPool::new(&b);
    let x = b.argument(DType::Index);

    let err = apply_map_to_range_part(&mut b, &AffineMap::identity(1), &[x.clone()], RangePart::Min, &mut pool)
        .unwrap_err();
    assert_eq!(err, Error::NotARange { id: x.id, actual: DType::Index });
}
