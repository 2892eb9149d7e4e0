//! End-to-end tests for the public triangulation surface: the fixed S1-S6
//! scenarios and the permutation/worker-count invariance properties of
//! `spec.md` §8. Unit-level edge-algebra and merge tests live inline next to
//! the code they exercise; this file only drives `pdelaunay::triangulate`
//! and `pdelaunay::triangulate_distributed` as a caller would.

use pdelaunay::distributed::LoopbackGroup;
use pdelaunay::{triangulate, triangulate_distributed, ProcessGroup, Triangulation};

use proptest::collection::btree_set;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use test_strategy::proptest;

fn run_distributed(points: &[(f64, f64)], workers: usize) -> Triangulation {
  let groups = LoopbackGroup::new_group(workers);
  let points = points.to_vec();
  let handles: Vec<_> = groups
    .into_iter()
    .map(|group| {
      let pts = if group.rank() == 0 { points.clone() } else { Vec::new() };
      std::thread::spawn(move || triangulate_distributed(&pts, &group))
    })
    .collect();

  let mut result = None;
  for h in handles {
    if let Some(t) = h.join().unwrap().unwrap() {
      result = Some(t);
    }
  }
  result.unwrap()
}

fn every_triangle_is_empty_of_other_points(tri: &Triangulation) {
  let by_id = |id: u32| tri.points.iter().find(|p| p.id == id).expect("triangle references a known point id");

  for &(a, b, c) in &tri.triangles {
    let pa = by_id(a);
    let pb = by_id(b);
    let pc = by_id(c);
    // Egress triples are sorted ascending by id (spec.md §6), not by CCW
    // winding (spec.md §8.1 only requires that *some* rotation is CCW, and
    // `in_circle` in turn requires its first three arguments in CCW order),
    // so reorder before querying the predicate rather than assuming (a, b, c)
    // itself is already CCW.
    let (pa, pb, pc) = match pdelaunay::predicates::orient(pa, pb, pc) {
      pdelaunay::predicates::Orientation::Left => (pa, pb, pc),
      pdelaunay::predicates::Orientation::Right => (pa, pc, pb),
      pdelaunay::predicates::Orientation::CoLinear => panic!("triangle ({a}, {b}, {c}) is degenerate"),
    };
    for d in &tri.points {
      if d.id == a || d.id == b || d.id == c {
        continue;
      }
      assert!(
        !pdelaunay::predicates::in_circle(pa, pb, pc, d),
        "point {} lies inside the circumcircle of ({a}, {b}, {c})",
        d.id
      );
    }
  }
}

#[test]
fn s1_two_points() {
  let tri = triangulate(&[(0.0, 0.0), (1.0, 0.0)]).unwrap();
  assert_eq!(tri.edges, vec![(0, 1)]);
  assert!(tri.triangles.is_empty());
}

#[test]
fn s2_right_triangle() {
  let tri = triangulate(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap();
  assert_eq!(tri.triangles, vec![(0, 1, 2)]);
}

#[test]
fn s3_four_points_straight_edge() {
  let tri = triangulate(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (1.0, 1.0)]).unwrap();
  assert_eq!(tri.triangles, vec![(0, 1, 3), (1, 2, 3)]);
}

#[test]
fn s4_unit_square_breaks_the_cocircular_tie_deterministically() {
  let tri = triangulate(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap();
  assert_eq!(tri.triangles, vec![(0, 1, 3), (1, 2, 3)]);
  every_triangle_is_empty_of_other_points(&tri);
}

#[test]
fn s5_regular_pentagon_fans_from_vertex_zero() {
  use std::f64::consts::PI;
  let coords: Vec<(f64, f64)> = (0..5)
    .map(|k| {
      let theta = 2.0 * PI * (k as f64) / 5.0;
      (theta.cos(), theta.sin())
    })
    .collect();
  let tri = triangulate(&coords).unwrap();
  assert_eq!(tri.triangles.len(), 3);
  assert!(tri.triangles.iter().all(|&(a, _, _)| a == 0));
}

#[test]
fn s6_thirty_two_random_points_triangle_count_matches_euler_formula() {
  let mut rng = SmallRng::seed_from_u64(42);
  let coords: Vec<(f64, f64)> = (0..32)
    .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
    .collect();
  let tri = triangulate(&coords).unwrap();

  // Euler characteristic of a triangulated disk (spec.md §8 property 4):
  // |edges| - |points| - |triangles| == -1, for connected non-collinear input.
  let e = tri.edges.len() as i64;
  let v = tri.points.len() as i64;
  let f = tri.triangles.len() as i64;
  assert_eq!(e - v - f, -1);
  every_triangle_is_empty_of_other_points(&tri);
}

#[test]
fn running_twice_on_the_same_input_is_byte_identical() {
  let coords = [(0.0, 0.0), (2.0, 1.0), (4.0, 0.0), (2.0, 3.0), (2.0, -2.0)];
  let a = triangulate(&coords).unwrap();
  let b = triangulate(&coords).unwrap();
  assert_eq!(a, b);
}

#[test]
fn worker_count_does_not_change_the_geometric_result() {
  let coords: Vec<(f64, f64)> = (0..24).map(|i| ((i % 6) as f64, (i / 6) as f64)).collect();
  let sequential = triangulate(&coords).unwrap();

  for &workers in &[1usize, 2, 3, 4] {
    let distributed = run_distributed(&coords, workers);
    assert_eq!(distributed.edges, sequential.edges, "workers = {workers}");
    assert_eq!(distributed.triangles, sequential.triangles, "workers = {workers}");
  }
}

fn distinct_grid_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
  btree_set((-30i32..30, -30i32..30), 4..16).prop_map(|set| set.into_iter().map(|(x, y)| (x as f64, y as f64)).collect())
}

// spec.md §8 property 5: invariant under permutation of the input sequence,
// after canonicalization (sorting) of triangle triples.
#[proptest]
fn triangulation_is_invariant_under_input_permutation(
  #[strategy(distinct_grid_points())] points: Vec<(f64, f64)>,
  seed: u64,
) {
  prop_assume!(points.len() >= 4);
  let canonical = triangulate(&points).unwrap();

  let mut shuffled = points.clone();
  let mut rng = SmallRng::seed_from_u64(seed);
  shuffled.shuffle(&mut rng);
  let permuted = triangulate(&shuffled).unwrap();

  let mut canonical_triangles = canonical.triangles.clone();
  let mut permuted_triangles: Vec<_> = permuted
    .triangles
    .iter()
    .map(|&(a, b, c)| {
      let pa = shuffled[a as usize];
      let pb = shuffled[b as usize];
      let pc = shuffled[c as usize];
      // Re-key each permuted triangle's vertices by the canonical run's
      // point order, so the two triangle sets are comparable by id.
      let reindex = |p: (f64, f64)| points.iter().position(|&q| q == p).unwrap() as u32;
      let mut tri = [reindex(pa), reindex(pb), reindex(pc)];
      tri.sort_unstable();
      (tri[0], tri[1], tri[2])
    })
    .collect();

  canonical_triangles.sort_unstable();
  permuted_triangles.sort_unstable();
  prop_assert_eq!(canonical_triangles, permuted_triangles);
}

// spec.md §8 property 2/3: every emitted triangle is Delaunay-empty and CCW,
// for arbitrary (non-degenerate-by-construction) point sets.
#[proptest]
fn every_triangulation_is_delaunay_valid(#[strategy(distinct_grid_points())] points: Vec<(f64, f64)>) {
  let tri = triangulate(&points).unwrap();
  every_triangle_is_empty_of_other_points(&tri);
}
