//! View/slice elision.
//!
//! Re-slicing a view with the ranges it already has is a no-op and must not
//! create anything. The comparison is by identity: two range values that would
//! compute the same bounds are still different ranges here.

use std::rc::Rc;

use smallvec::SmallVec;
use snafu::ensure;
use strata_ir::{FunctionBuilder, Value};

use crate::error::*;

/// Return `base` itself if `ranges` leave it unchanged, otherwise one new slice.
///
/// For a view, `ranges` is compared against its whole indexing list. For a
/// slice, `ranges` replaces its range-typed positions in order while its
/// index-typed positions are carried over; the new slice is taken over the
/// slice's own base view.
pub fn create_or_return_view(b: &mut FunctionBuilder, base: &Rc<Value>, ranges: &[Rc<Value>]) -> Result<Rc<Value>> {
    let op = base.op();
    if let Some((_, indexings)) = op.as_view() {
        let unchanged =
            indexings.len() == ranges.len() && indexings.iter().zip(ranges).all(|(old, new)| Rc::ptr_eq(old, new));
        if unchanged {
            tracing::debug!(view.id = base.id, "view unchanged, slice elided");
            return Ok(base.clone());
        }
        let slice = b.slice(base, ranges)?;
        tracing::debug!(view.id = base.id, slice.id = slice.id, "slice created over view");
        return Ok(slice);
    }

    let Some((view, indexings)) = op.as_slice() else {
        tracing::error!(value.id = base.id, op = op.name(), "expected a view or slice");
        return NotAViewOrSliceSnafu { id: base.id, op: op.name() }.fail();
    };
    let expected = indexings.iter().filter(|indexing| indexing.dtype().is_range()).count();
    ensure!(expected == ranges.len(), SliceRangeCountMismatchSnafu { id: base.id, expected, actual: ranges.len() });

    let mut replacements = ranges.iter();
    let mut changed = false;
    let mut merged: SmallVec<[Rc<Value>; 4]> = SmallVec::with_capacity(indexings.len());
    for indexing in indexings {
        let replacement = if indexing.dtype().is_range() { replacements.next() } else { None };
        match replacement {
            Some(replacement) => {
                changed |= !Rc::ptr_eq(indexing, replacement);
                merged.push(replacement.clone());
            }
            None => merged.push(indexing.clone()),
        }
    }

    if !changed {
        tracing::debug!(slice.id = base.id, "slice unchanged, re-slice elided");
        return Ok(base.clone());
    }
    let slice = b.slice(view, &merged)?;
    tracing::debug!(slice.id = base.id, new_slice.id = slice.id, "slice re-created over base view");
    Ok(slice)
}
