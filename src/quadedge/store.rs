//! Quad-edge store (`spec.md` §4.2, component C2).
//!
//! The subdivision is an arena of directed-edge records grouped in units of
//! four (the edge, its dual, its symmetric, and the reverse dual — `spec.md`
//! §9 "Navigation by algebra, not by fields"). `org` and `next` (`Onext`) are
//! the only state stored per directed edge; every other accessor (`Rot`,
//! `Sym`, `Lnext`, `Oprev`, `Dest`) is derived algebraically (`algebra.rs`).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use claim::debug_assert_ok;

use crate::error::{Error, Result};

/// A directed-edge handle into a `Subdivision`'s arena. The low two bits
/// select which of the four quad-edge members this id names; the rest
/// selects the group.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge(pub(crate) u32);

impl std::fmt::Debug for Edge {
  fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(fmt, "e{}", self.0)
  }
}

impl Edge {
  /// Rotate 90 degrees inside the quad-edge group: edge -> dual -> sym ->
  /// reverse dual -> edge.
  pub fn rot(self) -> Edge {
    Edge((self.0 & !3) | ((self.0 + 1) & 3))
  }

  /// Rotate -90 degrees; the inverse of `rot`.
  pub fn rot_inv(self) -> Edge {
    Edge((self.0 & !3) | ((self.0 + 3) & 3))
  }

  /// The oppositely directed edge. `sym(sym(e)) == e` (`spec.md` §3 invariant 2).
  pub fn sym(self) -> Edge {
    Edge(self.0 ^ 2)
  }

  fn group(self) -> u32 {
    self.0 & !3
  }
}

#[derive(Clone, Copy)]
struct EdgeRec {
  org: Option<u32>,
  next: Edge,
}

/// The owning container of edges, with the topological primitives
/// `make_edge`, `splice`, `connect`, `delete_edge` (`spec.md` §4.2).
///
/// `org`/`Dest` values are indices into a point slice supplied by the
/// caller, not `Point::id` directly: within a single build, points are
/// addressed by their position in the (sub-)slice being triangulated
/// (`spec.md` §6 wire format, "origin_local_index"). `Point::id` is only
/// consulted by the geometry kernel and by result projection.
pub struct Subdivision {
  edges: Vec<EdgeRec>,
  free: BinaryHeap<Reverse<u32>>,
}

impl Default for Subdivision {
  fn default() -> Self {
    Self::new()
  }
}

impl Subdivision {
  pub fn new() -> Subdivision {
    Subdivision {
      edges: Vec::new(),
      free: BinaryHeap::new(),
    }
  }

  /// Allocates a fresh, isolated edge: `org(e) = org(Sym(e)) = undefined`,
  /// `Onext(e) = e`, `Onext(Sym(e)) = Sym(e)`. Reuses the lowest free slot
  /// left by a prior `delete_edge`, so the store is deterministic
  /// (`spec.md` §4.2).
  pub fn make_edge(&mut self) -> Edge {
    let base = match self.free.pop() {
      Some(Reverse(base)) => base,
      None => {
        let base = self.edges.len() as u32;
        let filler = EdgeRec {
          org: None,
          next: Edge(base),
        };
        self.edges.extend_from_slice(&[filler; 4]);
        base
      }
    };
    let e = Edge(base);
    let e_rot = e.rot();
    let e_sym = e.sym();
    let e_rot_inv = e.rot_inv();
    self.edges[e.0 as usize] = EdgeRec { org: None, next: e };
    self.edges[e_sym.0 as usize] = EdgeRec {
      org: None,
      next: e_sym,
    };
    self.edges[e_rot.0 as usize] = EdgeRec {
      org: None,
      next: e_rot_inv,
    };
    self.edges[e_rot_inv.0 as usize] = EdgeRec {
      org: None,
      next: e_rot,
    };
    e
  }

  pub fn onext(&self, e: Edge) -> Edge {
    self.edges[e.0 as usize].next
  }

  fn set_onext(&mut self, e: Edge, to: Edge) {
    self.edges[e.0 as usize].next = to;
  }

  /// Identity of the origin vertex, or `None` for a dual edge whose face we
  /// do not label.
  pub fn org(&self, e: Edge) -> Option<u32> {
    self.edges[e.0 as usize].org
  }

  pub fn set_org(&mut self, e: Edge, index: u32) {
    self.edges[e.0 as usize].org = Some(index);
  }

  pub fn dest(&self, e: Edge) -> Option<u32> {
    self.org(e.sym())
  }

  /// The canonical Guibas-Stolfi primitive: exchanges the `Onext` rings at
  /// `org(a)` and `org(b)`. Separates them if they share a ring, merges them
  /// otherwise. Involutive: `splice(a, b)` applied twice is the identity.
  pub fn splice(&mut self, a: Edge, b: Edge) {
    let alpha = self.onext(a).rot();
    let beta = self.onext(b).rot();

    let na = self.onext(a);
    let nb = self.onext(b);
    self.set_onext(a, nb);
    self.set_onext(b, na);

    let n_alpha = self.onext(alpha);
    let n_beta = self.onext(beta);
    self.set_onext(alpha, n_beta);
    self.set_onext(beta, n_alpha);

    debug_assert_ok!(self.check_quad_edge_algebra(a));
    debug_assert_ok!(self.check_quad_edge_algebra(b));
  }

  /// Cheap, local sanity check for `spec.md` §3 invariant 2 (`Sym(Sym(e)) =
  /// e`, `Rot^4(e) = e`), run under `debug_assert_ok!` after every `splice`
  /// and `connect`. It does not walk the whole `Onext` ring — that would
  /// make every topology mutation O(n) — only the algebraic identities that
  /// a corrupted arena slot would violate immediately.
  fn check_quad_edge_algebra(&self, e: Edge) -> Result<()> {
    const LOC: &str = "quadedge::store::check_quad_edge_algebra";
    if e.rot().rot().rot().rot() != e {
      return Err(Error::topology_violation("Rot^4(e) != e", LOC));
    }
    if e.sym().sym() != e {
      return Err(Error::topology_violation("Sym(Sym(e)) != e", LOC));
    }
    Ok(())
  }

  /// Creates a new edge from `Dest(a)` to `Org(b)`, spliced so the new edge
  /// and `a` share `Dest(a)`, `Sym(new)` and `b` share `Org(b)`, and the new
  /// edge's left face is the face `a` and `b` bound. Precondition: `a` and
  /// `b` have a common left face.
  pub fn connect(&mut self, a: Edge, b: Edge) -> Edge {
    let e = self.make_edge();
    let a_lnext = self.lnext(a);
    self.splice(e, a_lnext);
    self.splice(e.sym(), b);
    if let Some(d) = self.dest(a) {
      self.set_org(e, d);
    }
    if let Some(o) = self.org(b) {
      self.set_org(e.sym(), o);
    }
    debug_assert_ok!(self.check_quad_edge_algebra(e));
    e
  }

  /// Detaches `e` from both its origin rings via two splices, then releases
  /// the record. After return, `e` and `Sym(e)` (and the group's two dual
  /// members) are invalid (`spec.md` §3 invariant 4).
  pub fn delete_edge(&mut self, e: Edge) {
    let e_oprev = self.oprev(e);
    self.splice(e, e_oprev);
    let sym = e.sym();
    let sym_oprev = self.oprev(sym);
    self.splice(sym, sym_oprev);

    let base = e.group();
    for slot in 0..4u32 {
      let idx = (base + slot) as usize;
      self.edges[idx] = EdgeRec {
        org: None,
        next: Edge(base + slot),
      };
    }
    self.free.push(Reverse(base));
  }
}
