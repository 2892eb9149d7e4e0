//! Geometry kernel (`spec.md` §4.1, component C1): orientation and in-circle
//! predicates on 2-D points.
//!
//! Both predicates are pure — no global state — and are backed by
//! `geometry_predicates`, a port of Shewchuk's adaptive-precision expansion
//! arithmetic. That gives the "wider than the input format" robustness the
//! spec asks for without a hand-rolled epsilon fudge.

use crate::data::Point;
use crate::error::{Error, Result};

/// The sign of `orient(a, b, c)`. `Left` means `c` is strictly left of the
/// directed line `a -> b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
  Left,
  Right,
  CoLinear,
}

/// Sign of the 2x2 determinant `(b.x-a.x)(c.y-a.y) - (b.y-a.y)(c.x-a.x)`.
pub fn orient(a: &Point, b: &Point, c: &Point) -> Orientation {
  let sign = geometry_predicates::orient2d([a.x, a.y], [b.x, b.y], [c.x, c.y]);
  if sign > 0.0 {
    Orientation::Left
  } else if sign < 0.0 {
    Orientation::Right
  } else {
    Orientation::CoLinear
  }
}

/// True iff `d` lies strictly inside the circle through `a, b, c` (`a, b, c`
/// assumed CCW by the caller, per `spec.md` §4.1).
///
/// A cocircular quadruple makes the underlying determinant exactly zero;
/// `spec.md` mandates a deterministic secondary rule in that case so that
/// downstream callers never see a result that contradicts a sibling
/// recursive call on the same four points. We break ties lexicographically
/// on point id, comparing `d` only against the triangle `a, b, c` it is being
/// tested against (never against `d` itself): `d` is classified as strictly
/// inside iff its id is greater than every one of `a, b, c`'s. That makes a
/// higher-id point always "win" a cocircular tie against a lower-id
/// triangle, so once a triangle has absorbed the highest-id point among a
/// cocircular group, every other member of that group is consistently
/// classified as outside it (an arbitrary but fixed and total rule).
pub fn in_circle(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
  let sign = geometry_predicates::incircle([a.x, a.y], [b.x, b.y], [c.x, c.y], [d.x, d.y]);
  if sign != 0.0 {
    sign > 0.0
  } else {
    cocircular_tie_break(a, b, c, d)
  }
}

fn cocircular_tie_break(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
  let max_id = a.id.max(b.id).max(c.id);
  d.id > max_id
}

/// `in_circle`, guarded by the `spec.md` §7 runtime consistency check: a
/// circle through three collinear points has no finite radius, so
/// `in_circle(a, b, c, ·)` is only a meaningful query when `orient(a, b, c)`
/// itself reports a real (non-degenerate) triangle. Every production call
/// site that queries `in_circle` on a triangle assembled during the merge
/// (`spec.md` §4.4) asserts this rather than silently tolerating it, per
/// §7's "assert, not silently correct" policy — `orient` and `in_circle`
/// disagreeing here (one reporting a real triangle, the other reporting a
/// query made against a degenerate one) is exactly the kind of predicate
/// inconsistency `ErrorKind::GeometryInconsistency` exists for.
pub fn in_circle_checked(a: &Point, b: &Point, c: &Point, d: &Point) -> Result<bool> {
  if orient(a, b, c) == Orientation::CoLinear {
    return Err(Error::geometry_inconsistency(
      format!(
        "in_circle queried against collinear triangle (ids {}, {}, {})",
        a.id, b.id, c.id
      ),
      "predicates::in_circle_checked",
    ));
  }
  Ok(in_circle(a, b, c, d))
}
