mod algebra;
mod store;

pub use store::{Edge, Subdivision};
