mod delaunay;

pub use delaunay::delaunay;
pub(crate) use delaunay::{merge, validate_input};
