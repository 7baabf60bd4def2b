//! # rs_accel
//!
//! [Rust][rust] crate providing a bounding volume hierarchy (BVH) for
//! ray queries over arbitrary bounded elements. Construction bins
//! element centroids into sixteen equally sized spatial buckets per
//! node and splits where the [surface area heuristic][sah] says a
//! split beats a leaf; wide subtrees build in parallel via
//! [Rayon][rayon]. The finished hierarchy is a flat array of 32-byte
//! nodes in depth-first pre-order, traversed iteratively with a fixed
//! stack.
//!
//! Elements only need a world-space bounding box (the `Boundable`
//! trait in [core::element]); the ray/element test is supplied per
//! query through the `Tracer` trait, so the same hierarchy answers
//! both closest-hit and any-hit (occlusion) queries with whatever hit
//! payload the caller wants. The entry point is the `Bvh` type found
//! [here][bvh].
//!
//! [rust]: https://www.rust-lang.org
//! [sah]: https://www.pbr-book.org/3ed-2018/Primitives_and_Intersection_Acceleration/Bounding_Volume_Hierarchies
//! [rayon]: https://crates.io/crates/rayon
//! [core::element]: core/element/index.html
//! [bvh]: accelerators/bvh/struct.Bvh.html

#[macro_use] extern crate impl_ops;

pub mod accelerators;
pub mod core;
pub mod shapes;
