// std
use std::time::Instant;
// others
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;
// accel
use crate::core::accel::{clamp_t, Float};
use crate::core::element::{Boundable, TraceMode, Tracer};
use crate::core::geometry::{bnd3_union_bnd3f, bnd3_union_pnt3f};
use crate::core::geometry::{Bounds3f, Point3f, Ray, Vector3f, XYZEnum};

/// Spatial bins evaluated along the split axis; one candidate split
/// per interior bin boundary.
const N_BUCKETS: usize = 16;
/// Hard tree depth cap; subranges still unsplit here become leaves.
const MAX_TREE_DEPTH: usize = 61;
/// Subtree construction may fork only at this depth or above it in
/// the tree; deeper halves run the iterative builder on the current
/// thread, bounding fan-out to about 2^8 concurrent tasks.
const MAX_FORK_DEPTH: usize = 8;
/// Element count past which one binning pass fans out over blocks.
const PARALLEL_BIN_THRESHOLD: usize = 1 << 13;
const BIN_BLOCK_SIZE: usize = 4096;
/// Fixed capacity of the iterative builder's job stack.
const JOB_STACK_SIZE: usize = 256;
/// Fixed capacity of the traversal stack.
const TRAVERSAL_STACK_SIZE: usize = 256;
/// Most elements one flat leaf can record.
const MAX_LEAF_ELEMENTS: usize = std::u16::MAX as usize;

/// Construction failures. A failed build never yields a partial
/// hierarchy; callers get either a complete tree or one of these.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("BVH build requires at least one element")]
    NoElements,
    #[error("iterative build job stack overflow (capacity {capacity})")]
    JobStackOverflow { capacity: usize },
    #[error("BVH leaf with {count} elements exceeds the flat node limit of {limit}")]
    LeafOverflow { count: usize, limit: usize },
}

/// Split policy consumed by the builder. The stock implementation is
/// [`SahCost`]; callers with unusual element mixes can supply their
/// own to tune split aggressiveness.
pub trait CostEvaluator {
    /// Estimated cost of splitting a node into child sets of
    /// *count0*/*count1* elements with surface areas *area0*/*area1*,
    /// in units where a leaf over *n* elements costs *n*.
    fn eval_cost(
        &self,
        count0: usize,
        area0: Float,
        count1: usize,
        area1: Float,
        total_area: Float,
    ) -> Float;
    /// Leaf size above which a node is always split, even when the
    /// estimated split cost says otherwise.
    fn elements_per_node(&self) -> usize;
}

/// Surface-area-heuristic split costs.
#[derive(Debug, Copy, Clone)]
pub struct SahCost {
    /// Cost of one traversal step relative to one element test.
    pub traversal_cost: Float,
    /// Leaf size the builder tries not to exceed.
    pub elements_per_node: usize,
}

impl SahCost {
    pub fn new(traversal_cost: Float, elements_per_node: usize) -> Self {
        SahCost {
            traversal_cost,
            elements_per_node: clamp_t(elements_per_node, 1, 255),
        }
    }
}

impl Default for SahCost {
    fn default() -> Self {
        SahCost {
            traversal_cost: 0.125,
            elements_per_node: 4,
        }
    }
}

impl CostEvaluator for SahCost {
    fn eval_cost(
        &self,
        count0: usize,
        area0: Float,
        count1: usize,
        area1: Float,
        total_area: Float,
    ) -> Float {
        self.traversal_cost
            + (count0 as Float * area0 + count1 as Float * area1) / total_area
    }
    fn elements_per_node(&self) -> usize {
        self.elements_per_node
    }
}

/// Per-element record the builder partitions in place: the caller's
/// element index, its bound, and the bound's midpoint.
#[derive(Debug, Default, Copy, Clone)]
pub struct BvhElementInfo {
    element_number: usize,
    bounds: Bounds3f,
    centroid: Point3f,
}

impl BvhElementInfo {
    pub fn new(element_number: usize, bounds: Bounds3f) -> Self {
        BvhElementInfo {
            element_number,
            bounds,
            centroid: bounds.p_min * 0.5 + bounds.p_max * 0.5,
        }
    }
}

/// Intermediate node in the construction arena. Interior nodes link
/// to children by arena index; leaves record a run of the partitioned
/// element-info array. `n_elements == 0` discriminates interior from
/// leaf, mirroring the flat layout.
#[derive(Debug, Default, Copy, Clone)]
struct BvhBuildNode {
    bounds: Bounds3f,
    children: [u32; 2],
    split_axis: u8,
    first_element_offset: u32,
    n_elements: u32,
}

impl BvhBuildNode {
    fn init_leaf(&mut self, first: u32, n: u32, b: &Bounds3f) {
        self.first_element_offset = first;
        self.n_elements = n;
        self.bounds = *b;
        self.children = [0_u32; 2];
    }
    fn init_interior(&mut self, axis: u8, c0: u32, c1: u32, b: &Bounds3f) {
        self.n_elements = 0;
        self.bounds = *b;
        self.children = [c0, c1];
        self.split_axis = axis;
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct BucketInfo {
    count: usize,
    bounds: Bounds3f,
}

/// One pending subrange in the iterative builder: the arena slot its
/// node will fill, the slab-local element range, and the tree depth.
#[derive(Debug, Default, Copy, Clone)]
struct BuildJob {
    slot: u32,
    start: u32,
    end: u32,
    depth: u8,
}

/// Compact runtime node, 32 bytes. Nodes are stored in depth-first
/// pre-order: an interior node's first child is the next array slot
/// and `offset` is the delta to its second child, while a leaf's
/// `offset` is the start of its run in the flat element array.
/// `n_elements == 0` is the sole interior/leaf discriminator.
#[derive(Debug, Default, Copy, Clone)]
pub struct FlatBvhNode {
    bounds: Bounds3f,
    offset: u32,
    n_elements: u16,
    axis: u8,
    flags: u8,
}

impl FlatBvhNode {
    /// Reserved optimization bit: traversal descends a flagged node
    /// without testing its box. The builder leaves it unset.
    pub const SKIP_BOUNDS_TEST: u8 = 1 << 0;

    pub fn bounds(&self) -> Bounds3f {
        self.bounds
    }
    pub fn is_leaf(&self) -> bool {
        self.n_elements > 0
    }
    /// Leaf: number of elements in this leaf's run.
    pub fn n_elements(&self) -> usize {
        self.n_elements as usize
    }
    /// Leaf: start of this leaf's run in the flat element array.
    pub fn element_id(&self) -> usize {
        self.offset as usize
    }
    /// Interior: index delta from this node to its second child.
    pub fn child_offset(&self) -> usize {
        self.offset as usize
    }
    /// Interior: the split axis (0, 1, or 2).
    pub fn axis(&self) -> u8 {
        self.axis
    }
    pub fn skips_bounds_test(&self) -> bool {
        self.flags & FlatBvhNode::SKIP_BOUNDS_TEST != 0_u8
    }
}

/// Build statistics derived from the flat node array.
#[derive(Debug, Default, Copy, Clone)]
pub struct BvhStats {
    pub node_count: usize,
    pub interior_count: usize,
    pub leaf_count: usize,
    pub max_leaf_elements: usize,
    pub max_depth: usize,
}

/// A bounding volume hierarchy over the caller's elements.
///
/// Construction partitions the elements by the surface-area heuristic
/// and flattens the result into one contiguous node array plus the
/// elements regrouped into leaf order. Afterwards the structure is
/// immutable; any number of threads may trace rays against it
/// concurrently.
pub struct Bvh<E> {
    elements: Vec<E>,
    nodes: Vec<FlatBvhNode>,
}

impl<E: Boundable> Bvh<E> {
    /// Build a hierarchy over *elements*, which must be non-empty.
    /// The elements are consumed and handed back in leaf-grouped
    /// order via [`Bvh::elements`]; queries report hits in terms of
    /// whatever payload the caller's [`Tracer`] returns.
    pub fn new<C>(elements: Vec<E>, cost: &C) -> Result<Bvh<E>, BuildError>
    where
        C: CostEvaluator + Sync,
    {
        let num_elements: usize = elements.len();
        if num_elements == 0_usize {
            return Err(BuildError::NoElements);
        }
        let build_start: Instant = Instant::now();
        let mut element_info: Vec<BvhElementInfo> = Vec::with_capacity(num_elements);
        for i in 0..num_elements {
            let world_bound: Bounds3f = elements[i].world_bound();
            element_info.push(BvhElementInfo::new(i, world_bound));
        }
        // node arena, dealt out in slabs: a subtree over k elements
        // owns exactly 2 * k - 1 slots, so concurrently built subtrees
        // never share slots and indices are deterministic
        let mut arena: Vec<BvhBuildNode> =
            vec![BvhBuildNode::default(); 2 * num_elements - 1];
        let total_nodes: usize =
            Bvh::<E>::recursive_build(cost, &mut arena[..], 0, &mut element_info[..], 0, 0)?;
        // flatten next
        let mut nodes: Vec<FlatBvhNode> = vec![FlatBvhNode::default(); total_nodes];
        let mut slots: Vec<Option<E>> = elements.into_iter().map(Some).collect();
        let mut ordered: Vec<E> = Vec::with_capacity(num_elements);
        let mut offset: usize = 0;
        Bvh::<E>::flatten_tree(
            &arena,
            0,
            &element_info,
            &mut slots,
            &mut nodes,
            &mut ordered,
            &mut offset,
        );
        assert!(offset == total_nodes);
        assert!(ordered.len() == num_elements);
        info!(
            "BVH over {} elements: {} nodes, built in {:.3} s",
            num_elements,
            total_nodes,
            build_start.elapsed().as_secs_f32()
        );
        Ok(Bvh {
            elements: ordered,
            nodes,
        })
    }

    /// Recursive builder over one slab of the arena. The node for
    /// this subrange lands in `slab[0]` (arena index *base*); child
    /// slabs are dealt by element count. Returns the number of arena
    /// slots initialized.
    fn recursive_build<C>(
        cost: &C,
        slab: &mut [BvhBuildNode],
        base: u32,
        info: &mut [BvhElementInfo],
        first_offset: u32,
        depth: usize,
    ) -> Result<usize, BuildError>
    where
        C: CostEvaluator + Sync,
    {
        let n_elements: usize = info.len();
        debug_assert!(n_elements > 0_usize);
        debug_assert!(slab.len() >= 2 * n_elements - 1);
        // compute bounds of all elements in this subrange
        let mut bounds: Bounds3f = Bounds3f::default();
        for ei in info.iter() {
            bounds = bnd3_union_bnd3f(&bounds, &ei.bounds);
        }
        if n_elements == 1 || depth >= MAX_TREE_DEPTH {
            return make_leaf(&mut slab[0], first_offset, n_elements, &bounds);
        }
        // compute bound of element centroids, choose split dimension _dim_
        let mut centroid_bounds: Bounds3f = Bounds3f::default();
        for ei in info.iter() {
            centroid_bounds = bnd3_union_pnt3f(&centroid_bounds, &ei.centroid);
        }
        let dim: u8 = centroid_bounds.maximum_extent();
        if centroid_bounds.p_max[axis_enum(dim)] == centroid_bounds.p_min[axis_enum(dim)] {
            // all centroids coincide, nothing discriminates a split
            return make_leaf(&mut slab[0], first_offset, n_elements, &bounds);
        }
        let split_bucket: usize = match choose_split(cost, info, &bounds, &centroid_bounds, dim) {
            Some(split_bucket) => split_bucket,
            None => {
                return make_leaf(&mut slab[0], first_offset, n_elements, &bounds);
            }
        };
        let mid: usize = partition_by_bucket(info, &centroid_bounds, dim, split_bucket);
        debug_assert!(mid > 0_usize && mid < n_elements);
        let (left_info, right_info) = info.split_at_mut(mid);
        let (head, rest) = slab.split_at_mut(1);
        let (left_slab, right_slab) = rest.split_at_mut(2 * mid - 1);
        let c0: u32 = base + 1_u32;
        let c1: u32 = base + 2 * mid as u32;
        let child_depth: usize = depth + 1;
        let (used0, used1) = if child_depth <= MAX_FORK_DEPTH {
            // the two halves own disjoint info ranges and arena slabs,
            // so they may build concurrently with only the join below
            rayon::join(
                || Bvh::<E>::recursive_build(cost, left_slab, c0, left_info, first_offset, child_depth),
                || {
                    Bvh::<E>::recursive_build(
                        cost,
                        right_slab,
                        c1,
                        right_info,
                        first_offset + mid as u32,
                        child_depth,
                    )
                },
            )
        } else {
            // past the fork bound: bounded-stack, single-threaded
            (
                Bvh::<E>::iterative_build(cost, left_slab, c0, left_info, first_offset, child_depth),
                Bvh::<E>::iterative_build(
                    cost,
                    right_slab,
                    c1,
                    right_info,
                    first_offset + mid as u32,
                    child_depth,
                ),
            )
        };
        let total: usize = 1 + used0? + used1?;
        head[0].init_interior(dim, c0, c1, &bounds);
        Ok(total)
    }

    /// Iterative builder: an explicit LIFO work list with a fixed job
    /// capacity instead of call-stack recursion. On a split one half
    /// is pushed and the other continued directly. Overflowing the
    /// job stack aborts the build.
    fn iterative_build<C>(
        cost: &C,
        slab: &mut [BvhBuildNode],
        base: u32,
        info: &mut [BvhElementInfo],
        first_offset: u32,
        depth: usize,
    ) -> Result<usize, BuildError>
    where
        C: CostEvaluator + Sync,
    {
        // bump allocation within this slab; slot 0 is the subtree root
        let mut next_node: usize = 1;
        let mut jobs: [BuildJob; JOB_STACK_SIZE] = [BuildJob::default(); JOB_STACK_SIZE];
        let mut n_jobs: usize = 1;
        jobs[0] = BuildJob {
            slot: 0_u32,
            start: 0_u32,
            end: info.len() as u32,
            depth: depth as u8,
        };
        while n_jobs > 0_usize {
            n_jobs -= 1_usize;
            let mut job: BuildJob = jobs[n_jobs];
            loop {
                let start: usize = job.start as usize;
                let end: usize = job.end as usize;
                let n_elements: usize = end - start;
                let mut bounds: Bounds3f = Bounds3f::default();
                for ei in info[start..end].iter() {
                    bounds = bnd3_union_bnd3f(&bounds, &ei.bounds);
                }
                if n_elements == 1 || job.depth as usize >= MAX_TREE_DEPTH {
                    make_leaf(
                        &mut slab[job.slot as usize],
                        first_offset + job.start,
                        n_elements,
                        &bounds,
                    )?;
                    break;
                }
                let mut centroid_bounds: Bounds3f = Bounds3f::default();
                for ei in info[start..end].iter() {
                    centroid_bounds = bnd3_union_pnt3f(&centroid_bounds, &ei.centroid);
                }
                let dim: u8 = centroid_bounds.maximum_extent();
                if centroid_bounds.p_max[axis_enum(dim)] == centroid_bounds.p_min[axis_enum(dim)] {
                    make_leaf(
                        &mut slab[job.slot as usize],
                        first_offset + job.start,
                        n_elements,
                        &bounds,
                    )?;
                    break;
                }
                let split_bucket: usize = match choose_split(
                    cost,
                    &info[start..end],
                    &bounds,
                    &centroid_bounds,
                    dim,
                ) {
                    Some(split_bucket) => split_bucket,
                    None => {
                        make_leaf(
                            &mut slab[job.slot as usize],
                            first_offset + job.start,
                            n_elements,
                            &bounds,
                        )?;
                        break;
                    }
                };
                let mid: usize = start
                    + partition_by_bucket(&mut info[start..end], &centroid_bounds, dim, split_bucket);
                debug_assert!(mid > start && mid < end);
                // allocate both children, push the right half, continue
                // directly with the left
                debug_assert!(next_node + 2 <= slab.len());
                let c0: usize = next_node;
                let c1: usize = next_node + 1;
                next_node += 2;
                slab[job.slot as usize].init_interior(
                    dim,
                    base + c0 as u32,
                    base + c1 as u32,
                    &bounds,
                );
                if n_jobs == JOB_STACK_SIZE {
                    return Err(BuildError::JobStackOverflow {
                        capacity: JOB_STACK_SIZE,
                    });
                }
                jobs[n_jobs] = BuildJob {
                    slot: c1 as u32,
                    start: mid as u32,
                    end: job.end,
                    depth: job.depth + 1_u8,
                };
                n_jobs += 1_usize;
                job = BuildJob {
                    slot: c0 as u32,
                    start: job.start,
                    end: mid as u32,
                    depth: job.depth + 1_u8,
                };
            }
        }
        Ok(next_node)
    }

    /// Emit the flat node array in depth-first pre-order and move the
    /// elements into leaf-grouped runs. An interior node's delta to
    /// its second child is only known after its whole first subtree
    /// has been emitted. Returns this node's position.
    fn flatten_tree(
        arena: &[BvhBuildNode],
        node_index: u32,
        element_info: &[BvhElementInfo],
        slots: &mut Vec<Option<E>>,
        nodes: &mut Vec<FlatBvhNode>,
        ordered: &mut Vec<E>,
        offset: &mut usize,
    ) -> usize {
        let node: BvhBuildNode = arena[node_index as usize];
        let my_offset: usize = *offset;
        *offset += 1_usize;
        if node.n_elements > 0_u32 {
            // leaf
            let first: usize = ordered.len();
            for i in node.first_element_offset..(node.first_element_offset + node.n_elements) {
                let element_number: usize = element_info[i as usize].element_number;
                let element: E = slots[element_number]
                    .take()
                    .expect("element referenced by more than one leaf");
                ordered.push(element);
            }
            nodes[my_offset] = FlatBvhNode {
                bounds: node.bounds,
                offset: first as u32,
                n_elements: node.n_elements as u16,
                axis: 0_u8,
                flags: 0_u8,
            };
        } else {
            // interior
            Bvh::<E>::flatten_tree(
                arena,
                node.children[0],
                element_info,
                slots,
                nodes,
                ordered,
                offset,
            );
            let second: usize = Bvh::<E>::flatten_tree(
                arena,
                node.children[1],
                element_info,
                slots,
                nodes,
                ordered,
                offset,
            );
            nodes[my_offset] = FlatBvhNode {
                bounds: node.bounds,
                offset: (second - my_offset) as u32,
                n_elements: 0_u16,
                axis: node.split_axis,
                flags: 0_u8,
            };
        }
        my_offset
    }
}

impl<E> Bvh<E> {
    /// Walk the hierarchy for one ray. In `AnyHit` mode the first
    /// element hit ends the query; in `ClosestHit` mode the ray's
    /// `t_max` shrinks with every accepted hit and the nearest
    /// payload is returned. On a closest hit the ray's `t_max` holds
    /// the hit distance afterwards.
    pub fn trace_ray<T>(&self, tracer: &T, ray: &Ray, mode: TraceMode) -> Option<T::Hit>
    where
        T: Tracer<E>,
    {
        // precompute the (safe) reciprocal direction and signs once
        let inv_dir: Vector3f = ray.d.safe_inverse();
        let dir_is_neg: [u8; 3] = [
            (inv_dir.x < 0.0) as u8,
            (inv_dir.y < 0.0) as u8,
            (inv_dir.z < 0.0) as u8,
        ];
        let mut best: Option<T::Hit> = None;
        // follow the ray through the nodes to find element intersections
        let mut to_visit_offset: u32 = 0;
        let mut current_node_index: u32 = 0;
        let mut nodes_to_visit: [u32; TRAVERSAL_STACK_SIZE] = [0_u32; TRAVERSAL_STACK_SIZE];
        loop {
            let node: FlatBvhNode = self.nodes[current_node_index as usize];
            let intersects: bool =
                node.skips_bounds_test() || node.bounds.intersect_p(ray, &inv_dir, &dir_is_neg);
            if intersects {
                if node.n_elements > 0_u16 {
                    // test the ray against every element in the leaf
                    for i in 0..node.n_elements as usize {
                        let element: &E = &self.elements[node.offset as usize + i];
                        if let Some((t, hit)) = tracer.test(element, ray) {
                            match mode {
                                TraceMode::AnyHit => {
                                    return Some(hit);
                                }
                                TraceMode::ClosestHit => {
                                    if t < ray.t_max.get() {
                                        ray.t_max.set(t);
                                        best = Some(hit);
                                    }
                                }
                            }
                        }
                    }
                    if to_visit_offset == 0_u32 {
                        break;
                    }
                    to_visit_offset -= 1_u32;
                    current_node_index = nodes_to_visit[to_visit_offset as usize];
                } else {
                    // put the far node on _nodes_to_visit_, advance to
                    // the near one
                    assert!(
                        (to_visit_offset as usize) < TRAVERSAL_STACK_SIZE,
                        "traversal stack exhausted: node array deeper than the depth cap"
                    );
                    if dir_is_neg[node.axis as usize] == 1_u8 {
                        nodes_to_visit[to_visit_offset as usize] = current_node_index + 1_u32;
                        to_visit_offset += 1_u32;
                        current_node_index += node.offset;
                    } else {
                        nodes_to_visit[to_visit_offset as usize] =
                            current_node_index + node.offset;
                        to_visit_offset += 1_u32;
                        current_node_index += 1_u32;
                    }
                }
            } else {
                if to_visit_offset == 0_u32 {
                    break;
                }
                to_visit_offset -= 1_u32;
                current_node_index = nodes_to_visit[to_visit_offset as usize];
            }
        }
        best
    }

    /// Closest-hit query.
    pub fn intersect<T>(&self, tracer: &T, ray: &Ray) -> Option<T::Hit>
    where
        T: Tracer<E>,
    {
        self.trace_ray(tracer, ray, TraceMode::ClosestHit)
    }

    /// Any-hit (occlusion) query.
    pub fn intersect_p<T>(&self, tracer: &T, ray: &Ray) -> bool
    where
        T: Tracer<E>,
    {
        self.trace_ray(tracer, ray, TraceMode::AnyHit).is_some()
    }

    /// Box enclosing the whole hierarchy.
    pub fn world_bound(&self) -> Bounds3f {
        self.nodes[0].bounds
    }
    /// The indexed elements, regrouped into leaf order.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
    /// The flattened node array, depth-first pre-order.
    pub fn nodes(&self) -> &[FlatBvhNode] {
        &self.nodes
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    /// Derive tree statistics from the flat array.
    pub fn stats(&self) -> BvhStats {
        let mut stats: BvhStats = BvhStats {
            node_count: self.nodes.len(),
            ..BvhStats::default()
        };
        let mut stack: Vec<(usize, usize)> = vec![(0_usize, 1_usize)];
        while let Some((index, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            let node: &FlatBvhNode = &self.nodes[index];
            if node.is_leaf() {
                stats.leaf_count += 1;
                stats.max_leaf_elements = stats.max_leaf_elements.max(node.n_elements());
            } else {
                stats.interior_count += 1;
                stack.push((index + 1, depth + 1));
                stack.push((index + node.child_offset(), depth + 1));
            }
        }
        stats
    }
}

fn axis_enum(dim: u8) -> XYZEnum {
    match dim {
        0 => XYZEnum::X,
        1 => XYZEnum::Y,
        _ => XYZEnum::Z,
    }
}

fn make_leaf(
    node: &mut BvhBuildNode,
    first_offset: u32,
    n_elements: usize,
    bounds: &Bounds3f,
) -> Result<usize, BuildError> {
    if n_elements > MAX_LEAF_ELEMENTS {
        return Err(BuildError::LeafOverflow {
            count: n_elements,
            limit: MAX_LEAF_ELEMENTS,
        });
    }
    if n_elements > 255_usize {
        warn!("forced BVH leaf holds {} elements", n_elements);
    }
    node.init_leaf(first_offset, n_elements as u32, bounds);
    Ok(1_usize)
}

/// Bucket an element's centroid along *dim*, identically in the
/// binning and partitioning passes.
fn bucket_index(centroid_bounds: &Bounds3f, centroid: &Point3f, dim: u8) -> usize {
    let mut b: usize =
        (N_BUCKETS as Float * centroid_bounds.offset(centroid)[axis_enum(dim)]) as usize;
    if b == N_BUCKETS {
        b = N_BUCKETS - 1;
    }
    assert!(b < N_BUCKETS, "b < {}", N_BUCKETS);
    b
}

fn bin_block(
    info: &[BvhElementInfo],
    centroid_bounds: &Bounds3f,
    dim: u8,
) -> [BucketInfo; N_BUCKETS] {
    let mut buckets: [BucketInfo; N_BUCKETS] = [BucketInfo::default(); N_BUCKETS];
    for ei in info.iter() {
        let b: usize = bucket_index(centroid_bounds, &ei.centroid, dim);
        buckets[b].count += 1;
        buckets[b].bounds = bnd3_union_bnd3f(&buckets[b].bounds, &ei.bounds);
    }
    buckets
}

fn merge_buckets(
    mut a: [BucketInfo; N_BUCKETS],
    b: [BucketInfo; N_BUCKETS],
) -> [BucketInfo; N_BUCKETS] {
    for i in 0..N_BUCKETS {
        a[i].count += b[i].count;
        a[i].bounds = bnd3_union_bnd3f(&a[i].bounds, &b[i].bounds);
    }
    a
}

/// Initialize the bucket table for one split evaluation. Counts and
/// box unions merge exactly in any order, so large inputs fan out
/// over fixed blocks and reduce.
fn bin_elements(
    info: &[BvhElementInfo],
    centroid_bounds: &Bounds3f,
    dim: u8,
) -> [BucketInfo; N_BUCKETS] {
    if info.len() > PARALLEL_BIN_THRESHOLD {
        info.par_chunks(BIN_BLOCK_SIZE)
            .map(|block| bin_block(block, centroid_bounds, dim))
            .reduce(|| [BucketInfo::default(); N_BUCKETS], merge_buckets)
    } else {
        bin_block(info, centroid_bounds, dim)
    }
}

/// Evaluate the split cost at every interior bucket boundary and pick
/// the cheapest; `None` means a leaf is cheaper. Boundary ties keep
/// the first minimum found scanning left to right, which keeps builds
/// deterministic.
fn choose_split<C>(
    cost: &C,
    info: &[BvhElementInfo],
    bounds: &Bounds3f,
    centroid_bounds: &Bounds3f,
    dim: u8,
) -> Option<usize>
where
    C: CostEvaluator,
{
    let buckets: [BucketInfo; N_BUCKETS] = bin_elements(info, centroid_bounds, dim);
    // prefix pass accumulates everything left of each boundary
    let mut left_counts: [usize; N_BUCKETS - 1] = [0_usize; N_BUCKETS - 1];
    let mut left_areas: [Float; N_BUCKETS - 1] = [0.0 as Float; N_BUCKETS - 1];
    let mut left_bounds: Bounds3f = Bounds3f::default();
    let mut left_count: usize = 0;
    for i in 0..(N_BUCKETS - 1) {
        left_bounds = bnd3_union_bnd3f(&left_bounds, &buckets[i].bounds);
        left_count += buckets[i].count;
        left_counts[i] = left_count;
        left_areas[i] = left_bounds.surface_area();
    }
    // suffix pass mirrors it from the right
    let mut right_counts: [usize; N_BUCKETS - 1] = [0_usize; N_BUCKETS - 1];
    let mut right_areas: [Float; N_BUCKETS - 1] = [0.0 as Float; N_BUCKETS - 1];
    let mut right_bounds: Bounds3f = Bounds3f::default();
    let mut right_count: usize = 0;
    for i in (1..N_BUCKETS).rev() {
        right_bounds = bnd3_union_bnd3f(&right_bounds, &buckets[i].bounds);
        right_count += buckets[i].count;
        right_counts[i - 1] = right_count;
        right_areas[i - 1] = right_bounds.surface_area();
    }
    // find the bucket boundary that minimizes the split cost
    let total_area: Float = bounds.surface_area();
    let mut min_cost: Float = cost.eval_cost(
        left_counts[0],
        left_areas[0],
        right_counts[0],
        right_areas[0],
        total_area,
    );
    let mut min_cost_split_bucket: usize = 0;
    for i in 1..(N_BUCKETS - 1) {
        let c: Float = cost.eval_cost(
            left_counts[i],
            left_areas[i],
            right_counts[i],
            right_areas[i],
            total_area,
        );
        if c < min_cost {
            min_cost = c;
            min_cost_split_bucket = i;
        }
    }
    // split when the node is too big for a leaf either way, or when
    // splitting beats the leaf cost of one unit per element
    let leaf_cost: Float = info.len() as Float;
    if info.len() > cost.elements_per_node() || min_cost < leaf_cost {
        Some(min_cost_split_bucket)
    } else {
        None
    }
}

/// Partition *info* in place so that elements bucketed at or below
/// *split_bucket* come first; returns the start of the upper half.
/// Only reorders the slice, never reallocates.
fn partition_by_bucket(
    info: &mut [BvhElementInfo],
    centroid_bounds: &Bounds3f,
    dim: u8,
    split_bucket: usize,
) -> usize {
    let mut first: usize = 0;
    for i in 0..info.len() {
        if bucket_index(centroid_bounds, &info[i].centroid, dim) <= split_bucket {
            info.swap(first, i);
            first += 1;
        }
    }
    first
}
