//! Configuration builder, environment fallbacks and the limits they set.

use std::collections::HashMap;
use std::rc::Rc;

use strata_dtype::DType;
use strata_ir::{AffineExpr, AffineMap, DEFAULT_COMPOSE_LIMIT, FunctionBuilder, Value};

use crate::affine::emit_or_fold_with_config;
use crate::collect::get_ranges_with_config;
use crate::test::const_range;
use crate::{ConstantPool, Error, LinalgConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| vars.get(key).cloned()
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_builder_defaults() {
    let config = LinalgConfig::builder().build();
    assert_eq!(config, LinalgConfig::default());
    assert_eq!(config.max_view_depth, 64);
    assert_eq!(config.compose_limit, DEFAULT_COMPOSE_LIMIT);
}

#[test]
fn test_builder_overrides() {
    let config = LinalgConfig::builder().max_view_depth(8).compose_limit(3).build();
    assert_eq!(config.max_view_depth, 8);
    assert_eq!(config.compose_limit, 3);
}

#[test]
fn test_env_overrides() {
    let config = LinalgConfig::from_vars(lookup(&[("STRATA_MAX_VIEW_DEPTH", "5"), ("STRATA_COMPOSE_LIMIT", "17")]));
    assert_eq!(config, LinalgConfig::builder().max_view_depth(5).compose_limit(17).build());
}

#[test]
fn test_env_fallbacks() {
    assert_eq!(LinalgConfig::from_vars(lookup(&[])), LinalgConfig::default());

    let config = LinalgConfig::from_vars(lookup(&[("STRATA_MAX_VIEW_DEPTH", "deep"), ("STRATA_COMPOSE_LIMIT", "-3")]));
    assert_eq!(config, LinalgConfig::default());

    let config = LinalgConfig::from_vars(lookup(&[("STRATA_COMPOSE_LIMIT", "9")]));
    assert_eq!(config.max_view_depth, 64);
    assert_eq!(config.compose_limit, 9);
}

// =========================================================================
// Limits
// =========================================================================

#[test]
fn test_compose_limit_is_honoured() {
    let mut b = FunctionBuilder::new("limit");
    let mut pool = ConstantPool::new(&b);
    let mut value = b.argument(DType::Index);
    let increment = AffineMap::single_result(1, 0, AffineExpr::dim(0) + 1).unwrap();
    for _ in 0..4 {
        value = b.affine_apply(increment.clone(), &[value]).unwrap();
    }

    let tight = LinalgConfig::builder().compose_limit(2).build();
    let err = emit_or_fold_with_config(&mut b, &AffineMap::identity(1), &[value.clone()], &mut pool, &tight)
        .unwrap_err();
    assert_eq!(err, Error::Ir { source: strata_ir::Error::CompositionDiverged { limit: 2 } });

    let roomy = LinalgConfig::builder().build();
    let result = emit_or_fold_with_config(&mut b, &AffineMap::identity(1), &[value], &mut pool, &roomy).unwrap();
    let strata_ir::Op::AffineApply { map, .. } = result.op() else { panic!("expected affine computation") };
    assert_eq!(map.results(), &[AffineExpr::dim(0) + 4]);
}

fn view_consumer(b: &mut FunctionBuilder) -> (Rc<Value>, Rc<Value>) {
    let range = const_range(b, 0, 4, 1);
    let buffer = b.argument(DType::Buffer { rank: 1 });
    let view = b.view(&buffer, &[range.clone()]).unwrap();
    (range, b.generic("fill", &[view], DType::Void))
}

#[test]
fn test_view_depth_within_limit() {
    let mut b = FunctionBuilder::new("depth_ok");
    let (range, consumer) = view_consumer(&mut b);

    let config = LinalgConfig::builder().max_view_depth(1).build();
    let ranges = get_ranges_with_config(&consumer, &config).unwrap();
    assert_eq!(ranges.len(), 1);
    assert!(Rc::ptr_eq(&ranges[0], &range));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "view chain deeper than 0")]
fn test_view_depth_exceeded() {
    let mut b = FunctionBuilder::new("depth_exceeded");
    let (_, consumer) = view_consumer(&mut b);

    let config = LinalgConfig::builder().max_view_depth(0).build();
    let _ = get_ranges_with_config(&consumer, &config);
}
