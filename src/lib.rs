//! Parallel divide-and-conquer Delaunay triangulation over a quad-edge
//! planar subdivision (Guibas & Stolfi).
//!
//! The crate is organized leaf-first, matching `spec.md`'s component table:
//! [`predicates`] (C1, the geometry kernel), [`quadedge`] (C2/C3, the
//! topological store and its derived edge algebra), [`algorithms`] (C4/C5,
//! the sequential divide-and-conquer solver and its pairwise merge),
//! [`distributed`] (C6, the tree-structured parallel coordinator and the
//! `ProcessGroup` transport it is parameterized over), and [`triangulation`]
//! (C7, projecting a finished subdivision into a plain edge/triangle view).
//!
//! Ingesting raw `(f64, f64)` coordinates and assigning the stable `id`s
//! `spec.md` §6 calls for is handled by the two top-level entry points,
//! [`triangulate`] and [`triangulate_distributed`]; everything past that
//! point is addressed by [`data::Point`].

pub mod algorithms;
pub mod data;
pub mod distributed;
pub mod error;
pub mod predicates;
pub mod quadedge;
pub mod triangulation;

pub use data::Point;
pub use distributed::ProcessGroup;
pub use error::{Error, ErrorKind, Result};
pub use triangulation::Triangulation;

/// Assigns each coordinate a stable id equal to its position in `points`
/// (`spec.md` §6 "Ingress": "the caller assigns ids `0..n-1` by position").
fn ingest(points: &[(f64, f64)]) -> Vec<Point> {
  points
    .iter()
    .enumerate()
    .map(|(i, &(x, y))| Point::new(i as u32, x, y))
    .collect()
}

/// Single-process entry point: builds the Delaunay triangulation of
/// `points` on the calling process alone (`spec.md` §4.3, component C4, run
/// with `P = 1`).
///
/// # Errors
///
/// Returns [`Error`] with kind [`ErrorKind::InputError`] if fewer than 2
/// points are given, a coordinate is non-finite, or two points coincide
/// exactly (`spec.md` §7).
pub fn triangulate(points: &[(f64, f64)]) -> Result<Triangulation> {
  let pts = ingest(points);
  let (subd, sorted, le, re) = algorithms::delaunay(&pts)?;
  triangulation::project(&subd, &sorted, le, re)
}

/// Distributed entry point: runs the tree-structured reduction of `spec.md`
/// §4.5 (component C6) across `group`. `points` is the complete input on
/// rank 0 and is ignored on every other rank, which instead receives its
/// partition from rank 0 over `group` (`spec.md` §4.5 step 1).
///
/// Returns `Some(Triangulation)` on the rank that ends up owning the final
/// subdivision (rank 0) and `None` on every other rank, whose role in the
/// reduction ends once it has sent its subdivision upward.
pub fn triangulate_distributed<G: ProcessGroup>(
  points: &[(f64, f64)],
  group: &G,
) -> Result<Option<Triangulation>> {
  let pts = ingest(points);
  distributed::triangulate_distributed(&pts, group)
}
