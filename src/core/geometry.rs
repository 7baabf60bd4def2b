//! Ray intersection acceleration is built on a small foundation of
//! geometric classes. These classes represent mathematical constructs
//! like points, vectors, and rays.
//!
//! # Points
//!
//! A **point** is a zero-dimensional location in 3D space. The
//! **Point3f** class represents a point using x, y, and z coordinates
//! with respect to a coordinate system. Although the same
//! representation is used for vectors, the fact that a point
//! represents a position whereas a vector represents a direction
//! leads to a number of important differences in how they are
//! treated.
//!
//! ```rust
//! use rs_accel::core::geometry::Point3f;
//!
//!     let origin = Point3f {
//!         x: 0.0,
//!         y: 0.0,
//!         z: 0.0,
//!     };
//!
//!     println!("{:?}", origin);
//! ```
//!
//! # Vectors
//!
//! A **vector** provides a direction and a magnitude, parameterized
//! here over *Float* coordinates.
//!
//! ```rust
//! use rs_accel::core::geometry::Vector3f;
//!
//!     let up = Vector3f {
//!         x: 0.0,
//!         y: 1.0,
//!         z: 0.0,
//!     };
//!
//!     println!("{:?}", up);
//! ```
//!
//! # Rays
//!
//! A **ray** is a semi-infinite line specified by its origin and
//! direction, with a **Point3f** for the origin and a **Vector3f**
//! for the direction. The *t_max* field limits the ray to a segment
//! along its infinite extent; it uses interior mutability so that
//! closest-hit queries can tighten the segment through a shared
//! reference while the rest of the ray stays immutable.
//!
//! ```rust
//! use rs_accel::core::geometry::{Point3f, Ray, Vector3f};
//!
//!     let ray = Ray::new(
//!         Point3f {
//!             x: -5.5,
//!             y: 2.75,
//!             z: 0.0,
//!         },
//!         Vector3f {
//!             x: 1.0,
//!             y: -8.75,
//!             z: 2.25,
//!         },
//!         std::f32::INFINITY,
//!     );
//!
//!     println!("{:?}", ray.position(1.0));
//! ```
//!
//! # Bounding Boxes
//!
//! The bounding volume hierarchy uses 3D axis-aligned boxes to bound
//! geometric primitives in the scene. The **Bounds3f** class
//! represents the extent of such regions with two corner points. The
//! default box is *inverted* (min above max) so that unioning it with
//! any point or box yields that point or box.
//!
//! ```rust
//! use rs_accel::core::geometry::{Bounds3f, Point3f};
//!
//!     let unit_cube = Bounds3f {
//!         p_min: Point3f {
//!             x: 0.0,
//!             y: 0.0,
//!             z: 0.0,
//!         },
//!         p_max: Point3f {
//!             x: 1.0,
//!             y: 1.0,
//!             z: 1.0,
//!         },
//!     };
//!
//!     println!("{:?}", unit_cube);
//! ```

// std
use std::cell::Cell;
use std::ops;
use std::ops::Index;
// others
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
// accel
use crate::core::accel::{gamma, lerp, Float, MACHINE_EPSILON};

#[derive(EnumIter, Debug, Copy, Clone)]
#[repr(u8)]
pub enum XYZEnum {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(EnumIter, Debug, Copy, Clone)]
#[repr(u8)]
pub enum MinMaxEnum {
    Min = 0,
    Max = 1,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vector3f {
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
    pub fn abs(&self) -> Vector3f {
        Vector3f {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }
    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }
    /// Compute a new vector pointing in the same direction but with unit
    /// length.
    pub fn normalize(&self) -> Vector3f {
        *self / self.length()
    }
    /// Componentwise reciprocal for slab tests. Components within the
    /// machine epsilon of zero map to a reciprocal of 0 instead of
    /// +/-infinity. A zero reciprocal makes that axis's slab
    /// non-discriminating while pinning the parametric interval to
    /// t = 0, so a ray with degenerate components reports exactly the
    /// boxes whose remaining slabs contain its origin (and a fully
    /// degenerate direction defers every box to the tracer). Callers
    /// which precompute reciprocals for box tests must use this same
    /// convention to get matching results.
    pub fn safe_inverse(&self) -> Vector3f {
        let inv = |d: Float| -> Float {
            if d.abs() > MACHINE_EPSILON {
                1.0 as Float / d
            } else {
                0.0 as Float
            }
        };
        Vector3f {
            x: inv(self.x),
            y: inv(self.y),
            z: inv(self.z),
        }
    }
}

impl_op!(-|a: Vector3f| -> Vector3f {
    Vector3f {
        x: -a.x,
        y: -a.y,
        z: -a.z,
    }
});

impl Index<XYZEnum> for Vector3f {
    type Output = Float;
    fn index(&self, index: XYZEnum) -> &Float {
        match index {
            XYZEnum::X => &self.x,
            XYZEnum::Y => &self.y,
            _ => &self.z,
        }
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Vector3f {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

/// Product of the Euclidean magnitudes of the two vectors and the
/// cosine of the angle between them. A return value of zero means
/// both vectors are orthogonal, a value of one means they are
/// codirectional.
pub fn vec3_dot_vec3f(v1: &Vector3f, v2: &Vector3f) -> Float {
    v1.x * v2.x + v1.y * v2.y + v1.z * v2.z
}

/// Given two vectors in 3D, the cross product is a vector that is
/// perpendicular to both of them.
pub fn vec3_cross_vec3(v1: &Vector3f, v2: &Vector3f) -> Vector3f {
    let v1x: f64 = v1.x as f64;
    let v1y: f64 = v1.y as f64;
    let v1z: f64 = v1.z as f64;
    let v2x: f64 = v2.x as f64;
    let v2y: f64 = v2.y as f64;
    let v2z: f64 = v2.z as f64;
    Vector3f {
        x: ((v1y * v2z) - (v1z * v2y)) as Float,
        y: ((v1z * v2x) - (v1x * v2z)) as Float,
        z: ((v1x * v2y) - (v1y * v2x)) as Float,
    }
}

/// Return the largest coordinate value.
pub fn vec3_max_componentf(v: &Vector3f) -> Float {
    v.x.max(v.y.max(v.z))
}

/// Return the index of the component with the largest value.
pub fn vec3_max_dimensionf(v: &Vector3f) -> usize {
    if v.x > v.y {
        if v.x > v.z {
            0_usize
        } else {
            2_usize
        }
    } else if v.y > v.z {
        1_usize
    } else {
        2_usize
    }
}

/// Permute the coordinate values according to the provided
/// permutation.
pub fn vec3_permutef(v: &Vector3f, x: usize, y: usize, z: usize) -> Vector3f {
    let v3: [Float; 3] = [v.x, v.y, v.z];
    let xp: Float = v3[x];
    let yp: Float = v3[y];
    let zp: Float = v3[z];
    Vector3f {
        x: xp,
        y: yp,
        z: zp,
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Point3f {
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl Index<XYZEnum> for Point3f {
    type Output = Float;
    fn index(&self, index: XYZEnum) -> &Float {
        match index {
            XYZEnum::X => &self.x,
            XYZEnum::Y => &self.y,
            _ => &self.z,
        }
    }
}

impl_op_ex!(+|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(-|a: &Vector3f, b: &Vector3f| -> Vector3f {
    Vector3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(*|a: &Vector3f, b: Float| -> Vector3f {
    Vector3f {
        x: a.x * b,
        y: a.y * b,
        z: a.z * b,
    }
});

impl_op_ex!(/|a: &Vector3f, b: Float| -> Vector3f {
    Vector3f {
        x: a.x / b,
        y: a.y / b,
        z: a.z / b,
    }
});

impl_op_ex!(+|a: &Point3f, b: &Point3f| -> Point3f {
    Point3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(+|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
});

impl_op_ex!(-|a: &Point3f, b: &Point3f| -> Vector3f {
    Vector3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(-|a: &Point3f, b: &Vector3f| -> Point3f {
    Point3f {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

impl_op_ex!(*|a: &Point3f, b: Float| -> Point3f {
    Point3f {
        x: a.x * b,
        y: a.y * b,
        z: a.z * b,
    }
});

impl_op_ex!(/|a: &Point3f, b: Float| -> Point3f {
    Point3f {
        x: a.x / b,
        y: a.y / b,
        z: a.z / b,
    }
});

/// The distance between two points is the length of the vector
/// between them.
pub fn pnt3_distancef(p1: &Point3f, p2: &Point3f) -> Float {
    (p1 - p2).length()
}

/// Permute the coordinate values according to the provided
/// permutation.
pub fn pnt3_permutef(p: &Point3f, x: usize, y: usize, z: usize) -> Point3f {
    let p3: [Float; 3] = [p.x, p.y, p.z];
    let xp: Float = p3[x];
    let yp: Float = p3[y];
    let zp: Float = p3[z];
    Point3f {
        x: xp,
        y: yp,
        z: zp,
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds3f {
    pub p_min: Point3f,
    pub p_max: Point3f,
}

impl Default for Bounds3f {
    fn default() -> Bounds3f {
        let min_num: Float = std::f32::MIN;
        let max_num: Float = std::f32::MAX;
        // inverted box, the union identity
        Bounds3f {
            p_min: Point3f {
                x: max_num,
                y: max_num,
                z: max_num,
            },
            p_max: Point3f {
                x: min_num,
                y: min_num,
                z: min_num,
            },
        }
    }
}

impl Bounds3f {
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        let p_min: Point3f = Point3f {
            x: p1.x.min(p2.x),
            y: p1.y.min(p2.y),
            z: p1.z.min(p2.z),
        };
        let p_max: Point3f = Point3f {
            x: p1.x.max(p2.x),
            y: p1.y.max(p2.y),
            z: p1.z.max(p2.z),
        };
        Bounds3f { p_min, p_max }
    }
    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }
    pub fn surface_area(&self) -> Float {
        let d: Vector3f = self.diagonal();
        // 2 * (d.x * d.y + d.x * d.z + d.y * d.z)
        let r: Float = d.x * d.y + d.x * d.z + d.y * d.z;
        r + r // avoid '2 *'
    }
    /// Return the axis along which the box is widest, as an index the
    /// builder can use to pick a split dimension.
    pub fn maximum_extent(&self) -> u8 {
        let d: Vector3f = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0_u8
        } else if d.y > d.z {
            1_u8
        } else {
            2_u8
        }
    }
    /// Continuous position of a point relative to the corners of the
    /// box, where a point at the minimum corner has offset (0, 0, 0)
    /// and a point at the maximum corner has offset (1, 1, 1).
    pub fn offset(&self, p: &Point3f) -> Vector3f {
        let mut o: Vector3f = p - self.p_min;
        if self.p_max.x > self.p_min.x {
            o.x /= self.p_max.x - self.p_min.x;
        }
        if self.p_max.y > self.p_min.y {
            o.y /= self.p_max.y - self.p_min.y;
        }
        if self.p_max.z > self.p_min.z {
            o.z /= self.p_max.z - self.p_min.z;
        }
        o
    }
    pub fn lerp(&self, t: &Point3f) -> Point3f {
        Point3f {
            x: lerp(t.x, self.p_min.x as Float, self.p_max.x as Float),
            y: lerp(t.y, self.p_min.y as Float, self.p_max.y as Float),
            z: lerp(t.z, self.p_min.z as Float, self.p_max.z as Float),
        }
    }
    /// Slab test against the segment [0, *t_max*] of the given ray,
    /// writing the parametric interval of overlap to *hitt0* and
    /// *hitt1* on a hit. Touching the box counts as a hit.
    pub fn intersect_b(&self, ray: &Ray, hitt0: &mut Float, hitt1: &mut Float) -> bool {
        let mut t0: Float = 0.0;
        let mut t1: Float = ray.t_max.get();
        for i in XYZEnum::iter() {
            // update interval for _i_th bounding box slab
            let inv_ray_dir: Float = 1.0 as Float / ray.d[i];
            let mut t_near: Float = (self.p_min[i] - ray.o[i]) * inv_ray_dir;
            let mut t_far: Float = (self.p_max[i] - ray.o[i]) * inv_ray_dir;
            // update parametric interval from slab intersection $t$ values
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            // update _t_far_ to ensure robust ray--bounds intersection
            t_far *= 1.0 as Float + 2.0 as Float * gamma(3_i32);
            if t_near > t0 {
                t0 = t_near;
            }
            if t_far < t1 {
                t1 = t_far;
            }
            if t0 > t1 {
                return false;
            }
        }
        *hitt0 = t0;
        *hitt1 = t1;
        true
    }
    /// Slab test with precomputed (safe) reciprocal direction and
    /// per-axis direction signs, the form the traverser calls once
    /// per visited node.
    pub fn intersect_p(&self, ray: &Ray, inv_dir: &Vector3f, dir_is_neg: &[u8; 3]) -> bool {
        let dir_is_neg_0: MinMaxEnum = match dir_is_neg[0] {
            0 => MinMaxEnum::Min,
            _ => MinMaxEnum::Max,
        };
        let dir_is_not_neg_0: MinMaxEnum = match dir_is_neg[0] {
            0 => MinMaxEnum::Max,
            _ => MinMaxEnum::Min,
        };
        let dir_is_neg_1: MinMaxEnum = match dir_is_neg[1] {
            0 => MinMaxEnum::Min,
            _ => MinMaxEnum::Max,
        };
        let dir_is_not_neg_1: MinMaxEnum = match dir_is_neg[1] {
            0 => MinMaxEnum::Max,
            _ => MinMaxEnum::Min,
        };
        let dir_is_neg_2: MinMaxEnum = match dir_is_neg[2] {
            0 => MinMaxEnum::Min,
            _ => MinMaxEnum::Max,
        };
        let dir_is_not_neg_2: MinMaxEnum = match dir_is_neg[2] {
            0 => MinMaxEnum::Max,
            _ => MinMaxEnum::Min,
        };
        // check for ray intersection against $x$ and $y$ slabs
        let mut t_min: Float = (self[dir_is_neg_0].x - ray.o.x) * inv_dir.x;
        let mut t_max: Float = (self[dir_is_not_neg_0].x - ray.o.x) * inv_dir.x;
        let ty_min: Float = (self[dir_is_neg_1].y - ray.o.y) * inv_dir.y;
        let mut ty_max: Float = (self[dir_is_not_neg_1].y - ray.o.y) * inv_dir.y;
        // update _t_max_ and _ty_max_ to ensure robust bounds intersection
        t_max *= 1.0 + 2.0 * gamma(3_i32);
        ty_max *= 1.0 + 2.0 * gamma(3_i32);
        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        if ty_min > t_min {
            t_min = ty_min;
        }
        if ty_max < t_max {
            t_max = ty_max;
        }
        // check for ray intersection against $z$ slab
        let tz_min: Float = (self[dir_is_neg_2].z - ray.o.z) * inv_dir.z;
        let mut tz_max: Float = (self[dir_is_not_neg_2].z - ray.o.z) * inv_dir.z;
        // update _tz_max_ to ensure robust bounds intersection
        tz_max *= 1.0 + 2.0 * gamma(3_i32);
        if t_min > tz_max || tz_min > t_max {
            return false;
        }
        if tz_min > t_min {
            t_min = tz_min;
        }
        if tz_max < t_max {
            t_max = tz_max;
        }
        // touching at t == 0 counts, which keeps safe-reciprocal axes
        // (interval pinned to zero) from rejecting every box
        (t_min < ray.t_max.get()) && (t_max >= 0.0)
    }
}

impl Index<MinMaxEnum> for Bounds3f {
    type Output = Point3f;
    fn index(&self, i: MinMaxEnum) -> &Point3f {
        match i {
            MinMaxEnum::Min => &self.p_min,
            _ => &self.p_max,
        }
    }
}

/// Given a bounding box and a point, the **bnd3_union_pnt3f()**
/// function returns a new bounding box that encompasses that point as
/// well as the original box.
pub fn bnd3_union_pnt3f(b: &Bounds3f, p: &Point3f) -> Bounds3f {
    let p_min: Point3f = Point3f {
        x: b.p_min.x.min(p.x),
        y: b.p_min.y.min(p.y),
        z: b.p_min.z.min(p.z),
    };
    let p_max: Point3f = Point3f {
        x: b.p_max.x.max(p.x),
        y: b.p_max.y.max(p.y),
        z: b.p_max.z.max(p.z),
    };
    Bounds3f { p_min, p_max }
}

/// Construct a new box that bounds the space encompassed by two other
/// bounding boxes.
pub fn bnd3_union_bnd3f(b1: &Bounds3f, b2: &Bounds3f) -> Bounds3f {
    let p_min: Point3f = Point3f {
        x: b1.p_min.x.min(b2.p_min.x),
        y: b1.p_min.y.min(b2.p_min.y),
        z: b1.p_min.z.min(b2.p_min.z),
    };
    let p_max: Point3f = Point3f {
        x: b1.p_max.x.max(b2.p_max.x),
        y: b1.p_max.y.max(b2.p_max.y),
        z: b1.p_max.z.max(b2.p_max.z),
    };
    Bounds3f { p_min, p_max }
}

/// Determine if a given point is inside the bounding box.
pub fn pnt3_inside_bnd3(p: &Point3f, b: &Bounds3f) -> bool {
    p.x >= b.p_min.x
        && p.x <= b.p_max.x
        && p.y >= b.p_min.y
        && p.y <= b.p_max.y
        && p.z >= b.p_min.z
        && p.z <= b.p_max.z
}

/// Determine if one bounding box is entirely contained in another.
pub fn bnd3_inside_bnd3(inner: &Bounds3f, outer: &Bounds3f) -> bool {
    pnt3_inside_bnd3(&inner.p_min, outer) && pnt3_inside_bnd3(&inner.p_max, outer)
}

#[derive(Debug, Default, Clone)]
pub struct Ray {
    /// origin
    pub o: Point3f,
    /// direction
    pub d: Vector3f,
    /// limits the ray to a segment along its infinite extent
    pub t_max: Cell<Float>,
}

impl Ray {
    pub fn new(o: Point3f, d: Vector3f, t_max: Float) -> Self {
        Ray {
            o,
            d,
            t_max: Cell::new(t_max),
        }
    }
    // Point3f operator()(Float t) const { return o + d * t; }
    pub fn position(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}
