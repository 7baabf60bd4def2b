// accel
use rs_accel::accelerators::bvh::{BuildError, Bvh, SahCost};
use rs_accel::core::accel::Float;
use rs_accel::core::geometry::{Point3f, Ray, Vector3f};
use rs_accel::shapes::triangle::{Triangle, TriangleTracer};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tessellate a gently rolling height field into 2 * n * n triangles.
fn height_field(n: usize, extent: Float) -> Vec<Triangle> {
    let h = |x: Float, z: Float| -> Float { (x * 0.35).sin() + (z * 0.27).cos() };
    let at = |i: usize, j: usize| -> Point3f {
        let x: Float = i as Float / n as Float * extent;
        let z: Float = j as Float / n as Float * extent;
        Point3f { x, y: h(x, z), z }
    };
    let mut triangles: Vec<Triangle> = Vec::with_capacity(2 * n * n);
    for i in 0..n {
        for j in 0..n {
            let p00: Point3f = at(i, j);
            let p10: Point3f = at(i + 1, j);
            let p01: Point3f = at(i, j + 1);
            let p11: Point3f = at(i + 1, j + 1);
            triangles.push(Triangle::new(p00, p10, p11));
            triangles.push(Triangle::new(p00, p11, p01));
        }
    }
    triangles
}

fn main() -> Result<(), BuildError> {
    env_logger::init();
    println!("rs_accel {} ray casting demo", VERSION);
    let triangles: Vec<Triangle> = height_field(64, 100.0);
    println!("tessellated height field: {} triangles", triangles.len());
    let bvh = Bvh::new(triangles, &SahCost::default())?;
    let stats = bvh.stats();
    println!(
        "hierarchy: {} nodes, {} leaves, max depth {}, largest leaf {}",
        stats.node_count, stats.leaf_count, stats.max_depth, stats.max_leaf_elements
    );
    let eye = Point3f {
        x: -10.0,
        y: 8.0,
        z: -10.0,
    };
    let sun = Vector3f {
        x: 0.4,
        y: 1.0,
        z: 0.2,
    };
    for k in 0..8 {
        let s: Float = k as Float / 7.0;
        let target = Point3f {
            x: 5.0 + s * 90.0,
            y: 0.0,
            z: 95.0 - s * 90.0,
        };
        let ray = Ray::new(eye, target - eye, std::f32::INFINITY);
        match bvh.intersect(&TriangleTracer, &ray) {
            Some(hit) => {
                let p: Point3f = ray.position(hit.t);
                let shadow_ray = Ray::new(p + sun * 1.0e-3, sun, std::f32::INFINITY);
                let lit: bool = !bvh.intersect_p(&TriangleTracer, &shadow_ray);
                println!(
                    "ray {}: hit t = {:7.3} at ({:6.2}, {:5.2}, {:6.2}) b = ({:.3}, {:.3}, {:.3}) {}",
                    k,
                    hit.t,
                    p.x,
                    p.y,
                    p.z,
                    hit.b0,
                    hit.b1,
                    hit.b2,
                    if lit { "lit" } else { "shadowed" }
                );
            }
            None => {
                println!("ray {}: missed", k);
            }
        }
    }
    Ok(())
}
