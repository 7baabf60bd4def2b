//! The hierarchy itself never looks inside an element: anything that
//! reports a world-space bounding box can be indexed, and ray tests
//! against elements stay behind the `Tracer` seam. Concrete shapes
//! therefore live apart from the acceleration code. This module holds
//! the one shape the crate ships.
//!
//! - Triangle
//!
//! ## Triangles
//!
//! Each triangle stores its three vertex positions directly rather
//! than indexing into a shared mesh vertex array; the hierarchy moves
//! elements into leaf order during construction, and self-contained
//! vertices keep that reordering trivial. The ray test is the
//! watertight permute-and-shear formulation, so rays cannot leak
//! through edges or vertices shared by adjacent triangles.

pub mod triangle;
