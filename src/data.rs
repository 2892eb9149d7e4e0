mod point;

pub use point::{lexicographic_key, Point};
