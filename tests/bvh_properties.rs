//! End-to-end properties of the hierarchy as a caller outside the
//! crate sees it: node bounds enclose their subtrees, every element
//! lands in exactly one leaf, queries agree with brute force, and
//! adversarial inputs degrade without violating any of that.

// others
use rand::prelude::*;
// accel
use rs_accel::accelerators::bvh::{Bvh, SahCost};
use rs_accel::core::accel::Float;
use rs_accel::core::element::{Boundable, Tracer};
use rs_accel::core::geometry::{bnd3_inside_bnd3, Bounds3f, Point3f, Ray, Vector3f};

/// A box with a stable identity, the simplest thing worth indexing.
#[derive(Debug, Copy, Clone)]
struct SceneBox {
    id: usize,
    bounds: Bounds3f,
}

impl Boundable for SceneBox {
    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }
}

/// Reports the id and slab-entry distance of a box hit.
struct SceneBoxTracer;

impl Tracer<SceneBox> for SceneBoxTracer {
    type Hit = (usize, Float);
    fn test(&self, element: &SceneBox, ray: &Ray) -> Option<(Float, (usize, Float))> {
        let mut t0: Float = 0.0;
        let mut t1: Float = 0.0;
        if element.bounds.intersect_b(ray, &mut t0, &mut t1) {
            Some((t0, (element.id, t0)))
        } else {
            None
        }
    }
}

fn unit_box_at(center: Point3f) -> Bounds3f {
    Bounds3f::new(
        Point3f {
            x: center.x - 0.5,
            y: center.y - 0.5,
            z: center.z - 0.5,
        },
        Point3f {
            x: center.x + 0.5,
            y: center.y + 0.5,
            z: center.z + 0.5,
        },
    )
}

fn random_scene(rng: &mut StdRng, n: usize, extent: Float) -> Vec<SceneBox> {
    (0..n)
        .map(|id| {
            let center = Point3f {
                x: rng.gen::<Float>() * extent,
                y: rng.gen::<Float>() * extent,
                z: rng.gen::<Float>() * extent,
            };
            SceneBox {
                id,
                bounds: unit_box_at(center),
            }
        })
        .collect()
}

/// A random direction with every component held away from zero; the
/// zero-component conventions have their own tests in the geometry
/// module.
fn random_direction(rng: &mut StdRng) -> Vector3f {
    fn component(rng: &mut StdRng) -> Float {
        let c: Float = rng.gen::<Float>() * 2.0 - 1.0;
        if c.abs() < 0.05 {
            if c < 0.0 {
                -0.05
            } else {
                0.05
            }
        } else {
            c
        }
    }
    Vector3f {
        x: component(rng),
        y: component(rng),
        z: component(rng),
    }
}

fn random_ray(rng: &mut StdRng, extent: Float) -> Ray {
    let o = Point3f {
        x: rng.gen::<Float>() * extent,
        y: rng.gen::<Float>() * extent,
        z: rng.gen::<Float>() * extent,
    };
    Ray::new(o, random_direction(rng), std::f32::INFINITY)
}

/// Recursively check that child node bounds and leaf element bounds
/// stay inside their parent's, and mark every element seen.
fn check_subtree(bvh: &Bvh<SceneBox>, index: usize, seen: &mut Vec<bool>) {
    let node = &bvh.nodes()[index];
    if node.is_leaf() {
        for i in 0..node.n_elements() {
            let element: &SceneBox = &bvh.elements()[node.element_id() + i];
            assert!(
                bnd3_inside_bnd3(&element.world_bound(), &node.bounds()),
                "leaf {} does not enclose element {}",
                index,
                element.id
            );
            assert!(
                !seen[element.id],
                "element {} appears in more than one leaf",
                element.id
            );
            seen[element.id] = true;
        }
    } else {
        let first: usize = index + 1;
        let second: usize = index + node.child_offset();
        assert!(bnd3_inside_bnd3(&bvh.nodes()[first].bounds(), &node.bounds()));
        assert!(bnd3_inside_bnd3(&bvh.nodes()[second].bounds(), &node.bounds()));
        check_subtree(bvh, first, seen);
        check_subtree(bvh, second, seen);
    }
}

fn assert_well_formed(bvh: &Bvh<SceneBox>, n: usize) {
    assert_eq!(bvh.element_count(), n);
    let mut seen: Vec<bool> = vec![false; n];
    check_subtree(bvh, 0, &mut seen);
    assert!(
        seen.iter().all(|s| *s),
        "some elements never made it into a leaf"
    );
}

#[test]
fn test_structure_over_varied_sizes() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    for n in [1_usize, 2, 3, 7, 33, 256, 1000].iter().copied() {
        let scene = random_scene(&mut rng, n, 100.0);
        let bvh = Bvh::new(scene, &SahCost::default()).unwrap();
        assert_well_formed(&bvh, n);
        let stats = bvh.stats();
        assert_eq!(stats.node_count, bvh.node_count());
        assert_eq!(stats.leaf_count, stats.interior_count + 1);
    }
}

#[test]
fn test_identical_builds_answer_identically() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    let scene = random_scene(&mut rng, 500, 100.0);
    let bvh_a = Bvh::new(scene.clone(), &SahCost::default()).unwrap();
    let bvh_b = Bvh::new(scene, &SahCost::default()).unwrap();
    assert_eq!(bvh_a.node_count(), bvh_b.node_count());
    for (na, nb) in bvh_a.nodes().iter().zip(bvh_b.nodes().iter()) {
        assert_eq!(na.bounds(), nb.bounds());
        assert_eq!(na.is_leaf(), nb.is_leaf());
        assert_eq!(na.n_elements(), nb.n_elements());
    }
    for _ in 0..200 {
        let ray_a = random_ray(&mut rng, 100.0);
        let ray_b = Ray::new(ray_a.o, ray_a.d, ray_a.t_max.get());
        let hit_a = bvh_a.intersect(&SceneBoxTracer, &ray_a);
        let hit_b = bvh_b.intersect(&SceneBoxTracer, &ray_b);
        assert_eq!(hit_a, hit_b);
    }
}

#[test]
fn test_any_hit_agrees_with_closest_hit() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0003);
    let scene = random_scene(&mut rng, 300, 60.0);
    let bvh = Bvh::new(scene, &SahCost::default()).unwrap();
    for _ in 0..300 {
        let ray_closest = random_ray(&mut rng, 60.0);
        let ray_any = Ray::new(ray_closest.o, ray_closest.d, ray_closest.t_max.get());
        let closest = bvh.intersect(&SceneBoxTracer, &ray_closest);
        let any = bvh.intersect_p(&SceneBoxTracer, &ray_any);
        assert_eq!(closest.is_some(), any);
    }
}

#[test]
fn test_closest_hit_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0004);
    let scene = random_scene(&mut rng, 400, 50.0);
    let bvh = Bvh::new(scene.clone(), &SahCost::default()).unwrap();
    for _ in 0..200 {
        let ray = random_ray(&mut rng, 50.0);
        let reference = Ray::new(ray.o, ray.d, ray.t_max.get());
        let mut brute: Option<(usize, Float)> = None;
        for element in scene.iter() {
            if let Some((t, _)) = SceneBoxTracer.test(element, &reference) {
                let closer: bool = match brute {
                    Some((_, best_t)) => t < best_t,
                    None => true,
                };
                if closer {
                    brute = Some((element.id, t));
                }
            }
        }
        let hit = bvh.intersect(&SceneBoxTracer, &ray);
        match (hit, brute) {
            (Some((_, t)), Some((_, brute_t))) => assert_eq!(t, brute_t),
            (None, None) => {}
            (got, want) => panic!("hierarchy found {:?}, brute force found {:?}", got, want),
        }
    }
}

#[test]
fn test_ray_pointing_away_misses() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0005);
    let scene = random_scene(&mut rng, 100, 50.0);
    let bvh = Bvh::new(scene, &SahCost::default()).unwrap();
    // everything lives in [−0.5, 50.5]³; aim the other way
    let ray = Ray::new(
        Point3f {
            x: -10.0,
            y: -10.0,
            z: -10.0,
        },
        Vector3f {
            x: -1.0,
            y: -2.0,
            z: -0.5,
        },
        std::f32::INFINITY,
    );
    assert!(bvh.intersect(&SceneBoxTracer, &ray).is_none());
    let shadow = Ray::new(ray.o, ray.d, std::f32::INFINITY);
    assert!(!bvh.intersect_p(&SceneBoxTracer, &shadow));
}

/// Distance from point *p* to the segment running *a* to *b*.
fn point_segment_distance(p: &Point3f, a: &Point3f, b: &Point3f) -> Float {
    let ab: Vector3f = b - a;
    let ap: Vector3f = p - a;
    let denom: Float = ab.length_squared();
    let t: Float = if denom > 0.0 {
        (ap.x * ab.x + ap.y * ab.y + ap.z * ab.z) / denom
    } else {
        0.0
    };
    let t_clamped: Float = t.max(0.0).min(1.0);
    let closest: Point3f = *a + ab * t_clamped;
    (p - closest).length()
}

#[test]
fn test_large_scene_hits_known_target() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0006);
    let n: usize = 100_000;
    let extent: Float = 1000.0;
    let target_center = Point3f {
        x: 500.5,
        y: 500.5,
        z: 500.5,
    };
    let origin = Point3f {
        x: 498.0,
        y: 498.5,
        z: 498.7,
    };
    // scatter boxes but keep a clear corridor around the probe
    // segment, so the target is provably the first thing on the ray
    let mut scene: Vec<SceneBox> = Vec::with_capacity(n);
    scene.push(SceneBox {
        id: 0,
        bounds: unit_box_at(target_center),
    });
    while scene.len() < n {
        let center = Point3f {
            x: rng.gen::<Float>() * extent,
            y: rng.gen::<Float>() * extent,
            z: rng.gen::<Float>() * extent,
        };
        if point_segment_distance(&center, &origin, &target_center) < 2.0 {
            continue;
        }
        scene.push(SceneBox {
            id: scene.len(),
            bounds: unit_box_at(center),
        });
    }
    let bvh = Bvh::new(scene, &SahCost::default()).unwrap();
    assert_well_formed(&bvh, n);
    let stats = bvh.stats();
    assert!(stats.max_depth <= 62, "tree depth {} past the cap", stats.max_depth);
    let ray = Ray::new(origin, target_center - origin, std::f32::INFINITY);
    let (id, _t) = bvh
        .intersect(&SceneBoxTracer, &ray)
        .expect("probe ray lost its target");
    assert_eq!(id, 0);
    let shadow = Ray::new(origin, target_center - origin, std::f32::INFINITY);
    assert!(bvh.intersect_p(&SceneBoxTracer, &shadow));
}

#[test]
fn test_coincident_centroids_degrade_to_one_leaf() {
    // concentric boxes: identical centroids leave nothing to split on,
    // so everything collapses to one oversized leaf that still answers
    let n: usize = 1000;
    let scene: Vec<SceneBox> = (0..n)
        .map(|id| {
            let r: Float = 0.5 + id as Float * 0.01;
            SceneBox {
                id,
                bounds: Bounds3f::new(
                    Point3f {
                        x: -r,
                        y: -r,
                        z: -r,
                    },
                    Point3f { x: r, y: r, z: r },
                ),
            }
        })
        .collect();
    let bvh = Bvh::new(scene.clone(), &SahCost::default()).unwrap();
    assert_eq!(bvh.node_count(), 1);
    assert_eq!(bvh.stats().max_leaf_elements, n);
    assert_well_formed(&bvh, n);
    let ray = Ray::new(
        Point3f {
            x: -50.0,
            y: 0.1,
            z: 0.2,
        },
        Vector3f {
            x: 1.0,
            y: 0.01,
            z: 0.01,
        },
        std::f32::INFINITY,
    );
    let reference = Ray::new(ray.o, ray.d, ray.t_max.get());
    let mut brute: Option<(usize, Float)> = None;
    for element in scene.iter() {
        if let Some((t, _)) = SceneBoxTracer.test(element, &reference) {
            let closer: bool = match brute {
                Some((_, best_t)) => t < best_t,
                None => true,
            };
            if closer {
                brute = Some((element.id, t));
            }
        }
    }
    let hit = bvh.intersect(&SceneBoxTracer, &ray);
    assert_eq!(hit.map(|(_, t)| t), brute.map(|(_, t)| t));
}

#[test]
fn test_exponential_spread_respects_depth_cap() {
    // element spacing that doubles every step pushes splits toward
    // one-off-the-end partitions; depth must stay capped regardless
    let n: usize = 120;
    let scene: Vec<SceneBox> = (0..n)
        .map(|id| {
            let x: Float = (2.0 as Float).powi(id as i32 - 60);
            SceneBox {
                id,
                bounds: unit_box_at(Point3f { x, y: 0.0, z: 0.0 }),
            }
        })
        .collect();
    let bvh = Bvh::new(scene, &SahCost::default()).unwrap();
    assert_well_formed(&bvh, n);
    assert!(bvh.stats().max_depth <= 62);
}
