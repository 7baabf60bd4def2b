//! Foundation the accelerator is built on: the `Float` alias with its
//! numeric helpers, points, vectors, rays, and bounding boxes, and
//! the two small traits every indexed element type implements.

pub mod accel;
pub mod element;
pub mod geometry;
