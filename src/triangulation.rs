//! Result projection (`spec.md` §4.5, component C7): walks a finished
//! quad-edge subdivision and extracts a plain vertex/edge/triangle view
//! addressed by stable `Point::id`s rather than internal edge handles.

use std::collections::HashSet;

use crate::data::Point;
use crate::error::{Error, Result};
use crate::predicates::{orient, Orientation};
use crate::quadedge::{Edge, Subdivision};

/// A finished triangulation, addressed entirely by `Point::id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
  pub points: Vec<Point>,
  /// Undirected edges, each listed once.
  pub edges: Vec<(u32, u32)>,
  /// Bounded faces, each a vertex triple `(u, v, w)` with `u < v < w`
  /// (`spec.md` §6). Every triple is geometrically CCW in *some* rotation
  /// of its three vertices (`spec.md` §8.1) — that rotation is checked
  /// during projection, then discarded in favor of the sorted egress form.
  /// Empty when the subdivision has fewer than 3 points.
  pub triangles: Vec<(u32, u32, u32)>,
}

fn req_org(subd: &Subdivision, e: Edge) -> Result<u32> {
  subd
    .org(e)
    .ok_or_else(|| Error::topology_violation("edge origin undefined", "triangulation::project"))
}

fn req_dest(subd: &Subdivision, e: Edge) -> Result<u32> {
  req_org(subd, e.sym())
}

/// Walks the subdivision reachable from `le` and builds a `Triangulation`.
/// `pts` is the sorted point order the subdivision's `org`/`dest` indices
/// address; the returned struct re-keys everything by `Point::id` so callers
/// never need to know about that internal order.
pub fn project(subd: &Subdivision, pts: &[Point], le: Edge, _re: Edge) -> Result<Triangulation> {
  let mut visited_dirs: HashSet<u32> = HashSet::new();
  let mut undirected_seen: HashSet<(u32, u32)> = HashSet::new();
  let mut edges_out = Vec::new();
  let mut stack = vec![le];

  while let Some(e) = stack.pop() {
    if visited_dirs.contains(&e.0) {
      continue;
    }
    visited_dirs.insert(e.0);

    let o = req_org(subd, e)?;
    let d = req_dest(subd, e)?;
    let key = (o.min(d), o.max(d));
    if undirected_seen.insert(key) {
      let id_o = pts[o as usize].id;
      let id_d = pts[d as usize].id;
      edges_out.push((id_o.min(id_d), id_o.max(id_d)));
    }

    let mut ring = subd.onext(e);
    while ring != e {
      if !visited_dirs.contains(&ring.0) {
        stack.push(ring);
      }
      ring = subd.onext(ring);
    }

    let s = e.sym();
    if !visited_dirs.contains(&s.0) {
      stack.push(s);
    }
  }

  // Iterate in a fixed order rather than the HashSet's hash-dependent one,
  // so which directed edge starts each face walk (and therefore which
  // vertex becomes the triple's `a`) is reproducible across runs.
  let mut edge_ids: Vec<u32> = visited_dirs.iter().copied().collect();
  edge_ids.sort_unstable();
  let mut triangles = Vec::new();
  let mut face_visited: HashSet<u32> = HashSet::new();

  for id in edge_ids {
    if face_visited.contains(&id) {
      continue;
    }
    let e = Edge(id);
    let e1 = subd.lnext(e);
    let e2 = subd.lnext(e1);
    let e3 = subd.lnext(e2);
    if e3 != e {
      continue;
    }
    let a = req_org(subd, e)?;
    let b = req_org(subd, e1)?;
    let c = req_org(subd, e2)?;
    if orient(&pts[a as usize], &pts[b as usize], &pts[c as usize]) == Orientation::Left {
      // The face walk only certifies CCW-ness (§8.1) in the order it found
      // (a, b, c); §6's egress format asks for the triple itself sorted
      // ascending by id, which is a different, unrelated canonicalization.
      let mut ids = [pts[a as usize].id, pts[b as usize].id, pts[c as usize].id];
      ids.sort_unstable();
      triangles.push((ids[0], ids[1], ids[2]));
      face_visited.insert(e.0);
      face_visited.insert(e1.0);
      face_visited.insert(e2.0);
    }
  }

  edges_out.sort_unstable();
  triangles.sort_unstable();

  Ok(Triangulation {
    points: pts.to_vec(),
    edges: edges_out,
    triangles,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::algorithms::delaunay;

  #[test]
  fn triangulation_of_unit_square_has_two_triangles_and_five_edges() {
    let pts = vec![
      Point::new(0, 0.0, 0.0),
      Point::new(1, 1.0, 0.0),
      Point::new(2, 1.0, 1.0),
      Point::new(3, 0.0, 1.0),
    ];
    let (subd, sorted, le, re) = delaunay(&pts).unwrap();
    let tri = project(&subd, &sorted, le, re).unwrap();
    assert_eq!(tri.edges.len(), 5);
    assert_eq!(tri.triangles.len(), 2);
    // Every emitted triple is non-degenerate; the ascending (u, v, w)
    // egress order is not required to be the CCW rotation itself (that is
    // checked during projection, against the face-walk order).
    for &(a, b, c) in &tri.triangles {
      assert_ne!(
        orient(&pts[a as usize], &pts[b as usize], &pts[c as usize]),
        Orientation::CoLinear
      );
    }
  }
}
