//! The acceleration structure deliberately knows nothing about the
//! scene it indexes. Everything scene-specific enters through two
//! narrow interfaces: **Boundable** describes how an element is
//! bounded, and **Tracer** performs the per-element intersection
//! math. The hierarchy itself only ever reasons about boxes and ray
//! segments, which keeps it reusable for triangle meshes, coarse
//! object lists, or anything else with a finite bound.

// accel
use crate::core::accel::Float;
use crate::core::geometry::{Bounds3f, Ray};

/// Anything with a finite axis-aligned bound can be indexed.
pub trait Boundable {
    /// The world-space box enclosing this element. Queried exactly
    /// once per element when the hierarchy is built.
    fn world_bound(&self) -> Bounds3f;
}

/// A plain box is its own bound, so box sets can be indexed directly.
impl Boundable for Bounds3f {
    fn world_bound(&self) -> Bounds3f {
        *self
    }
}

/// How a ray query terminates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TraceMode {
    /// Return on the first element hit, in whatever order traversal
    /// encounters it. Suited to occlusion/shadow queries.
    AnyHit,
    /// Visit every candidate leaf, tightening the ray segment after
    /// each accepted hit, and report the nearest.
    ClosestHit,
}

/// Per-element intersection policy supplied by the caller.
///
/// `test` reports a hit as `(distance, payload)`. Implementations
/// must honor the ray's current segment: a hit counts only for
/// parametric distances in `(0, ray.t_max.get())`. They must not
/// shrink `t_max` themselves; during closest-hit traversal the
/// hierarchy tightens it after every accepted hit, so a tracer that
/// reads `ray.t_max.get()` before doing expensive math gets early
/// culling for free.
pub trait Tracer<E> {
    /// Whatever the caller wants back from a hit (an element id, a
    /// full shading record, ...).
    type Hit;
    fn test(&self, element: &E, ray: &Ray) -> Option<(Float, Self::Hit)>;
}
