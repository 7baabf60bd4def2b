// std
use std::mem;
// accel
use crate::core::accel::{gamma, Float};
use crate::core::element::{Boundable, Tracer};
use crate::core::geometry::{
    bnd3_union_pnt3f, pnt3_permutef, vec3_cross_vec3, vec3_max_componentf, vec3_max_dimensionf,
    vec3_permutef,
};
use crate::core::geometry::{Bounds3f, Point3f, Ray, Vector3f};

/// A triangle storing its three vertex positions directly. Mesh-style
/// index sharing is left to callers; the hierarchy only needs each
/// element to bound itself and an accompanying [`Tracer`].
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub p0: Point3f,
    pub p1: Point3f,
    pub p2: Point3f,
}

impl Triangle {
    pub fn new(p0: Point3f, p1: Point3f, p2: Point3f) -> Self {
        Triangle { p0, p1, p2 }
    }
    pub fn area(&self) -> Float {
        let dp01: Vector3f = self.p1 - self.p0;
        let dp02: Vector3f = self.p2 - self.p0;
        0.5 as Float * vec3_cross_vec3(&dp01, &dp02).length()
    }
}

impl Boundable for Triangle {
    fn world_bound(&self) -> Bounds3f {
        bnd3_union_pnt3f(&Bounds3f::new(self.p0, self.p1), &self.p2)
    }
}

/// Distance and barycentric coordinates of a triangle hit.
#[derive(Debug, Default, Copy, Clone)]
pub struct TriangleHit {
    pub t: Float,
    pub b0: Float,
    pub b1: Float,
    pub b2: Float,
}

/// Watertight ray/triangle intersection: rays never leak through
/// shared edges or vertices of adjacent triangles.
#[derive(Debug, Default, Copy, Clone)]
pub struct TriangleTracer;

impl Tracer<Triangle> for TriangleTracer {
    type Hit = TriangleHit;
    fn test(&self, triangle: &Triangle, ray: &Ray) -> Option<(Float, TriangleHit)> {
        // translate vertices based on ray origin
        let o: Vector3f = Vector3f::from(ray.o);
        // permute components of triangle vertices and ray direction
        let kz: usize = vec3_max_dimensionf(&ray.d.abs());
        let mut kx: usize = kz + 1;
        if kx == 3 {
            kx = 0;
        }
        let mut ky: usize = kx + 1;
        if ky == 3 {
            ky = 0;
        }
        let d: Vector3f = vec3_permutef(&ray.d, kx, ky, kz);
        if d.z == 0.0 {
            // the largest component is zero, so the whole direction is
            // zero and the ray never leaves its origin
            return None;
        }
        let mut p0t: Point3f = pnt3_permutef(&(triangle.p0 - o), kx, ky, kz);
        let mut p1t: Point3f = pnt3_permutef(&(triangle.p1 - o), kx, ky, kz);
        let mut p2t: Point3f = pnt3_permutef(&(triangle.p2 - o), kx, ky, kz);
        // apply shear transformation to translated vertex positions
        let sx: Float = -d.x / d.z;
        let sy: Float = -d.y / d.z;
        let sz: Float = 1.0 / d.z;
        p0t.x += sx * p0t.z;
        p0t.y += sy * p0t.z;
        p1t.x += sx * p1t.z;
        p1t.y += sy * p1t.z;
        p2t.x += sx * p2t.z;
        p2t.y += sy * p2t.z;
        // compute edge function coefficients _e0_, _e1_, and _e2_
        let mut e0: Float = p1t.x * p2t.y - p1t.y * p2t.x;
        let mut e1: Float = p2t.x * p0t.y - p2t.y * p0t.x;
        let mut e2: Float = p0t.x * p1t.y - p0t.y * p1t.x;
        // fall back to double precision test at triangle edges
        if mem::size_of::<Float>() == mem::size_of::<f32>() && (e0 == 0.0 || e1 == 0.0 || e2 == 0.0)
        {
            let p2txp1ty: f64 = p2t.x as f64 * p1t.y as f64;
            let p2typ1tx: f64 = p2t.y as f64 * p1t.x as f64;
            e0 = (p2typ1tx - p2txp1ty) as Float;
            let p0txp2ty: f64 = p0t.x as f64 * p2t.y as f64;
            let p0typ2tx: f64 = p0t.y as f64 * p2t.x as f64;
            e1 = (p0typ2tx - p0txp2ty) as Float;
            let p1txp0ty: f64 = p1t.x as f64 * p0t.y as f64;
            let p1typ0tx: f64 = p1t.y as f64 * p0t.x as f64;
            e2 = (p1typ0tx - p1txp0ty) as Float;
        }
        // perform triangle edge and determinant tests
        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }
        let det: Float = e0 + e1 + e2;
        if det == 0.0 {
            return None;
        }
        // compute scaled hit distance to triangle and test against ray $t$ range
        p0t.z *= sz;
        p1t.z *= sz;
        p2t.z *= sz;
        let t_scaled: Float = e0 * p0t.z + e1 * p1t.z + e2 * p2t.z;
        if det < 0.0 && (t_scaled >= 0.0 || t_scaled < ray.t_max.get() * det) {
            return None;
        } else if det > 0.0 && (t_scaled <= 0.0 || t_scaled > ray.t_max.get() * det) {
            return None;
        }
        // compute barycentric coordinates and $t$ value for triangle intersection
        let inv_det: Float = 1.0 / det;
        let b0: Float = e0 * inv_det;
        let b1: Float = e1 * inv_det;
        let b2: Float = e2 * inv_det;
        let t: Float = t_scaled * inv_det;
        // ensure that computed triangle $t$ is conservatively greater than zero

        // compute $\delta_z$ term for triangle $t$ error bounds
        let max_zt: Float = vec3_max_componentf(
            &Vector3f {
                x: p0t.z,
                y: p1t.z,
                z: p2t.z,
            }
            .abs(),
        );
        let delta_z: Float = gamma(3_i32) * max_zt;
        // compute $\delta_x$ and $\delta_y$ terms for triangle $t$ error bounds
        let max_xt: Float = vec3_max_componentf(
            &Vector3f {
                x: p0t.x,
                y: p1t.x,
                z: p2t.x,
            }
            .abs(),
        );
        let max_yt: Float = vec3_max_componentf(
            &Vector3f {
                x: p0t.y,
                y: p1t.y,
                z: p2t.y,
            }
            .abs(),
        );
        let delta_x: Float = gamma(5) * (max_xt + max_zt);
        let delta_y: Float = gamma(5) * (max_yt + max_zt);
        // compute $\delta_e$ term for triangle $t$ error bounds
        let delta_e: Float =
            2.0 * (gamma(2) * max_xt * max_yt + delta_y * max_xt + delta_x * max_yt);
        // compute $\delta_t$ term for triangle $t$ error bounds and check _t_
        let max_e: Float = vec3_max_componentf(
            &Vector3f {
                x: e0,
                y: e1,
                z: e2,
            }
            .abs(),
        );
        let delta_t: Float =
            3.0 * (gamma(3) * max_e * max_zt + delta_e * max_zt + delta_z * max_e) * inv_det.abs();
        if t <= delta_t {
            return None;
        }
        Some((t, TriangleHit { t, b0, b1, b2 }))
    }
}
