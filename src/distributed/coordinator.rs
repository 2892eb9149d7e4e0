//! Parallel coordinator (`spec.md` §4.5, component C6): tree-structured
//! reduction across a `ProcessGroup` of `P` equally-ranked workers.
//!
//! Each rank partitions (or receives its partition of) the point set, runs
//! the sequential solver (C4) locally, then takes part in
//! `⌈log2 P⌉` reduction rounds of recursive doubling: receivers fold an
//! incoming peer subdivision into their own store and apply the pairwise
//! merge (C5) once; senders serialize their current subdivision and drop out
//! of the reduction. Rank 0 is the root and owns the final subdivision.

use crate::algorithms;
use crate::data::{lexicographic_key, Point};
use crate::distributed::group::ProcessGroup;
use crate::distributed::wire::{self, Cursor};
use crate::error::{Error, Result};
use crate::quadedge::Subdivision;
use crate::triangulation::{self, Triangulation};

const LOC: &str = "distributed::coordinator::triangulate_distributed";

/// Drives the full distributed build (`spec.md` §4.5 steps 1-4) for one
/// rank of `group`. `points` is the complete input set on rank 0 and is
/// ignored on every other rank (a real worker process would not have it at
/// all; it receives its slice over the wire during ingest & partition).
///
/// Returns `Some(Triangulation)` on the rank that ends up owning the final
/// subdivision (rank 0, per `spec.md` §4.5 step 4) and `None` on every rank
/// whose role ended earlier in the reduction.
#[tracing::instrument(level = "info", skip(points, group), fields(rank = group.rank(), size = group.size()))]
pub fn triangulate_distributed<G: ProcessGroup>(points: &[Point], group: &G) -> Result<Option<Triangulation>> {
  let rank = group.rank();
  let size = group.size();
  if size == 0 {
    return Err(Error::input("a process group must have at least one rank", LOC));
  }

  let local_pts = ingest_and_partition(points, rank, size, group)?;
  let (mut subd, sorted, mut le, mut re) = algorithms::delaunay(&local_pts)?;
  let mut local_pts = sorted;

  let mut active = true;
  let mut round = 0usize;
  while (1usize << round) < size {
    let step = 1usize << round;
    let pos = rank % (2 * step);

    if active && pos == 0 {
      let peer = rank + step;
      if peer < size {
        tracing::info!(round, rank, peer, "receiving reduction round");
        let message_bytes = group.recv(peer)?;
        let manifest_bytes = group.recv(peer)?;
        let message = wire::read_message(&message_bytes)?;
        let global_ids = read_id_manifest(&manifest_bytes)?;
        if global_ids.len() != message.points.len() {
          return Err(Error::transport(
            "id manifest length does not match point count",
            LOC,
          ));
        }

        let offset = local_pts.len() as u32;
        let (mut peer_pts, peer_le, peer_re) = wire::decode_into(&mut subd, &message, offset)?;
        for (p, &id) in peer_pts.iter_mut().zip(global_ids.iter()) {
          p.id = id;
        }
        local_pts.extend(peer_pts);

        let (new_le, new_re) = algorithms::merge(&mut subd, &local_pts, le, re, peer_le, peer_re)?;
        le = new_le;
        re = new_re;
      }
    } else if active && pos == step {
      let peer = rank - step;
      tracing::info!(round, rank, peer, "sending reduction round");
      let message = wire::encode_subdivision(&subd, &local_pts, le, re)?;
      let manifest = write_id_manifest(&message.points.iter().map(|p| p.id).collect::<Vec<_>>());
      let message_bytes = wire::write_message(&message);
      group.send(peer, message_bytes)?;
      group.send(peer, manifest)?;
      active = false;
    }

    round += 1;
  }

  if active {
    let result = triangulation::project(&subd, &local_pts, le, re)?;
    Ok(Some(result))
  } else {
    Ok(None)
  }
}

/// `spec.md` §4.5 step 1: rank 0 sorts the full point set and scatters
/// contiguous ranges `[r*n/P, (r+1)*n/P)`; every other rank blocks on a
/// single `recv` from rank 0 to get its slice.
fn ingest_and_partition<G: ProcessGroup>(
  points: &[Point],
  rank: usize,
  size: usize,
  group: &G,
) -> Result<Vec<Point>> {
  if rank != 0 {
    let bytes = group.recv(0)?;
    return read_point_batch(&bytes);
  }

  algorithms::validate_input(points)?;
  let mut sorted: Vec<Point> = points.to_vec();
  sorted.sort_by_key(lexicographic_key);

  let n = sorted.len();
  if n / size < 2 {
    return Err(Error::input(
      "each rank must receive at least 2 points (spec.md §4.5 bounds P <= n/2)",
      LOC,
    ));
  }

  for r in 1..size {
    let start = r * n / size;
    let end = (r + 1) * n / size;
    let bytes = write_point_batch(&sorted[start..end]);
    group.send(r, bytes)?;
  }

  let end0 = n / size;
  Ok(sorted[0..end0].to_vec())
}

fn write_point_batch(pts: &[Point]) -> Vec<u8> {
  let mut buf = Vec::with_capacity(4 + pts.len() * 16);
  buf.extend_from_slice(&(pts.len() as u32).to_le_bytes());
  for p in pts {
    buf.extend_from_slice(&p.id.to_le_bytes());
    buf.extend_from_slice(&p.x.to_le_bytes());
    buf.extend_from_slice(&p.y.to_le_bytes());
  }
  buf
}

fn read_point_batch(bytes: &[u8]) -> Result<Vec<Point>> {
  const LOC: &str = "distributed::coordinator::read_point_batch";
  let mut cur = Cursor::new(bytes);
  let n = cur.u32()?;
  let mut pts = Vec::with_capacity(n as usize);
  for _ in 0..n {
    let id = cur.u32()?;
    let x = cur.f64()?;
    let y = cur.f64()?;
    pts.push(Point::new(id, x, y));
  }
  if !cur.at_end() {
    return Err(Error::transport("trailing bytes after point batch", LOC));
  }
  Ok(pts)
}

/// A coordinator-level companion to each reduction `Message` (`wire.rs`):
/// the global `Point::id` of every point in the message's `points`, in
/// order. The `spec.md` §6 wire format itself carries coordinates only
/// (`Point::id` is re-derived by position on decode), so this travels as a
/// second, immediately-following send rather than widening that format.
fn write_id_manifest(ids: &[u32]) -> Vec<u8> {
  let mut buf = Vec::with_capacity(4 + ids.len() * 4);
  buf.extend_from_slice(&(ids.len() as u32).to_le_bytes());
  for &id in ids {
    buf.extend_from_slice(&id.to_le_bytes());
  }
  buf
}

fn read_id_manifest(bytes: &[u8]) -> Result<Vec<u32>> {
  const LOC: &str = "distributed::coordinator::read_id_manifest";
  let mut cur = Cursor::new(bytes);
  let n = cur.u32()?;
  let mut ids = Vec::with_capacity(n as usize);
  for _ in 0..n {
    ids.push(cur.u32()?);
  }
  if !cur.at_end() {
    return Err(Error::transport("trailing bytes after id manifest", LOC));
  }
  Ok(ids)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::distributed::group::LoopbackGroup;

  fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords
      .iter()
      .enumerate()
      .map(|(i, &(x, y))| Point::new(i as u32, x, y))
      .collect()
  }

  fn run(points: &[Point], workers: usize) -> Triangulation {
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

  #[test]
  fn two_workers_agree_with_single_process_unit_square() {
    let p = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let (subd, sorted, le, re) = algorithms::delaunay(&p).unwrap();
    let sequential = triangulation::project(&subd, &sorted, le, re).unwrap();

    let distributed = run(&p, 2);
    assert_eq!(distributed.edges, sequential.edges);
    assert_eq!(distributed.triangles, sequential.triangles);
  }

  #[test]
  fn four_workers_on_eight_points_matches_single_process() {
    let coords: Vec<(f64, f64)> = (0..8).map(|i| (i as f64, (i % 3) as f64)).collect();
    let p = pts(&coords);
    let (subd, sorted, le, re) = algorithms::delaunay(&p).unwrap();
    let sequential = triangulation::project(&subd, &sorted, le, re).unwrap();

    let distributed = run(&p, 4);
    assert_eq!(distributed.edges, sequential.edges);
    assert_eq!(distributed.triangles, sequential.triangles);
  }

  #[test]
  fn single_worker_matches_single_process() {
    let p = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (1.0, 1.0)]);
    let (subd, sorted, le, re) = algorithms::delaunay(&p).unwrap();
    let sequential = triangulation::project(&subd, &sorted, le, re).unwrap();

    let distributed = run(&p, 1);
    assert_eq!(distributed.edges, sequential.edges);
    assert_eq!(distributed.triangles, sequential.triangles);
  }
}
