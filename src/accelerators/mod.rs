//! Acceleration structures cut the cost of ray queries from linear in
//! the number of elements down to roughly logarithmic, by pruning
//! whole groups of elements with a single bounding box test instead
//! of testing the ray against each element in turn. This crate ships
//! one: a bounding volume hierarchy built with the surface area
//! heuristic over equally sized spatial buckets.
//!
//! - Bvh

pub mod bvh;
