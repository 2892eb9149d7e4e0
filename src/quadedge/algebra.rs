//! Derived navigation over the quad-edge store (`spec.md` §3/§4.2,
//! component C3). None of these store any state; each is a short algebraic
//! composition of `Rot`/`Sym`/`Onext`.

use super::store::{Edge, Subdivision};

impl Subdivision {
  /// Next edge around the left face: `Rot^-1(Onext(Rot(e)))`.
  pub fn lnext(&self, e: Edge) -> Edge {
    self.onext(e.rot()).rot_inv()
  }

  /// Previous edge around the origin: `Rot(Onext(Rot(e)))`.
  pub fn oprev(&self, e: Edge) -> Edge {
    self.onext(e.rot()).rot()
  }

  /// Next edge around the right face: `Sym(Lnext(Sym(e)))`.
  pub fn rnext(&self, e: Edge) -> Edge {
    self.lnext(e.sym()).sym()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn triangle_lnext_cycles_back_after_three_steps() {
    // Build a, b spliced at a shared vertex, and connect to close a triangle
    // the same way algorithms::delaunay's n=3 base case does.
    let mut s = Subdivision::new();
    let a = s.make_edge();
    s.set_org(a, 0);
    s.set_org(a.sym(), 1);
    let b = s.make_edge();
    s.set_org(b, 1);
    s.set_org(b.sym(), 2);
    s.splice(a.sym(), b);
    let c = s.connect(b, a);
    assert_eq!(s.org(c), Some(2));
    assert_eq!(s.org(c.sym()), Some(0));

    // Walking Lnext three times around the bounded face returns to a.
    let l1 = s.lnext(a);
    let l2 = s.lnext(l1);
    let l3 = s.lnext(l2);
    assert_eq!(l3, a);
  }
}
