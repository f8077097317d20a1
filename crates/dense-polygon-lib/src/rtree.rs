//! Bounding-box R-tree with packed bulk loading
//!
//! The tree keeps every item in a leaf at height 1 and every internal node's
//! bounding box equal to the union of its children's. Batches are packed
//! bottom-up (sort-tile-recursive on min-x, then min-y) and the packed subtree
//! is grafted into the existing tree, so repeated bulk loads stay balanced
//! without re-inserting items one by one.

use crate::utils::{
    enlarged_area, intersection_area, rect_contains, rect_margin, rect_union, rects_intersect,
};
use geo::Rect;
use std::cmp::Ordering;

/// Default maximum number of children per node
pub const DEFAULT_MAX_ENTRIES: usize = 9;

/// Anything that can be stored in the index
pub trait Bounded {
    /// Axis-aligned bounding box of the item
    fn bounding_box(&self) -> Rect<f64>;
}

impl Bounded for Rect<f64> {
    #[inline]
    fn bounding_box(&self) -> Rect<f64> {
        *self
    }
}

/// Balanced bounding-box tree over items of type `T`
#[derive(Debug, Clone)]
pub struct RTree<T> {
    /// Root node, `None` while the tree is empty
    root: Option<Node<T>>,
    /// Maximum number of children per node
    max_entries: usize,
    /// Minimum number of children per node after a split
    min_entries: usize,
    /// Number of stored items
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<T> {
    /// Union of the children's bounding boxes
    bounding_box: Rect<f64>,
    /// Leaves have height 1, their parents 2, and so on
    height: usize,
    children: Children<T>,
}

#[derive(Debug, Clone)]
enum Children<T> {
    Leaf(Vec<T>),
    Internal(Vec<Node<T>>),
}

/// What is being pushed down the tree: a single item or a packed subtree
enum Insertion<T> {
    Item(T),
    Subtree(Node<T>),
}

impl<T: Bounded + PartialEq> Default for RTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: Bounded + PartialEq> RTree<T> {
    /// Create an empty tree with the default node capacity
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create an empty tree with a custom node capacity (at least 4)
    pub fn with_max_entries(max_entries: usize) -> Self {
        let max_entries = max_entries.max(4);
        let min_entries = ((max_entries as f64 * 0.4).ceil() as usize).max(2);
        Self {
            root: None,
            max_entries,
            min_entries,
            len: 0,
        }
    }

    /// Number of stored items
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree (0 when empty, 1 when the root is a leaf)
    #[inline]
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.height)
    }

    /// Bounding box of everything in the tree
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.root.as_ref().map(|root| root.bounding_box)
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert a single item
    pub fn insert(&mut self, item: T) {
        let bbox = item.bounding_box();
        self.len += 1;
        let root = match self.root.take() {
            None => Node::leaf(vec![item], bbox),
            Some(root) => self.graft(root, Insertion::Item(item), bbox, 0),
        };
        self.root = Some(root);
    }

    /// Insert a batch of items at once
    ///
    /// The batch is packed into its own balanced subtree which is then merged
    /// into the existing tree. Batches smaller than the minimum node fill are
    /// inserted one by one since packing would create underfull nodes.
    pub fn bulk_load(&mut self, items: Vec<T>) {
        #[cfg(feature = "profiling")]
        profiling::scope!("rtree::bulk_load");

        if items.is_empty() {
            return;
        }
        if items.len() < self.min_entries {
            for item in items {
                self.insert(item);
            }
            return;
        }

        self.len += items.len();
        let Some(packed) = build_packed(items, 0, self.max_entries) else {
            return;
        };

        let root = match self.root.take() {
            None => packed,
            Some(root) if root.height == packed.height => Node::internal(vec![root, packed]),
            Some(root) => {
                // Hang the shorter tree at the matching level of the taller one
                let (taller, shorter) = if root.height < packed.height {
                    (packed, root)
                } else {
                    (root, packed)
                };
                let bbox = shorter.bounding_box;
                let height = shorter.height;
                self.graft(taller, Insertion::Subtree(shorter), bbox, height)
            }
        };
        self.root = Some(root);
    }

    fn graft(
        &self,
        mut root: Node<T>,
        insertion: Insertion<T>,
        bbox: Rect<f64>,
        insertion_height: usize,
    ) -> Node<T> {
        match root.insert(
            insertion,
            bbox,
            insertion_height,
            self.max_entries,
            self.min_entries,
        ) {
            Some(sibling) => Node::internal(vec![root, sibling]),
            None => root,
        }
    }

    /// Remove one item equal to `item`
    ///
    /// Returns whether something was removed. Removing an absent item is a no-op.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let bbox = item.bounding_box();
        if !root.remove(item, &bbox) {
            return false;
        }
        self.len -= 1;

        // Prune the root: drop it when empty, collapse single-child chains
        let mut root = self.root.take();
        loop {
            match root {
                Some(node) if node.is_empty() => root = None,
                Some(Node {
                    children: Children::Internal(mut nodes),
                    ..
                }) if nodes.len() == 1 => root = nodes.pop(),
                other => {
                    self.root = other;
                    break;
                }
            }
        }
        true
    }

    /// All items whose bounding box intersects `area` (touching counts)
    pub fn query(&self, area: &Rect<f64>) -> Vec<&T> {
        #[cfg(feature = "profiling")]
        profiling::scope!("rtree::query");

        let mut results = Vec::new();
        let Some(root) = &self.root else {
            return results;
        };
        if !rects_intersect(area, &root.bounding_box) {
            return results;
        }

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match &node.children {
                Children::Leaf(items) => results.extend(
                    items
                        .iter()
                        .filter(|item| rects_intersect(area, &item.bounding_box())),
                ),
                Children::Internal(nodes) => {
                    for child in nodes {
                        if !rects_intersect(area, &child.bounding_box) {
                            continue;
                        }
                        if rect_contains(area, &child.bounding_box) {
                            child.collect_all(&mut results);
                        } else {
                            stack.push(child);
                        }
                    }
                }
            }
        }
        results
    }

    /// Whether any item's bounding box intersects `area`
    pub fn collides(&self, area: &Rect<f64>) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        if !rects_intersect(area, &root.bounding_box) {
            return false;
        }

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match &node.children {
                Children::Leaf(items) => {
                    if items
                        .iter()
                        .any(|item| rects_intersect(area, &item.bounding_box()))
                    {
                        return true;
                    }
                }
                Children::Internal(nodes) => {
                    for child in nodes {
                        if !rects_intersect(area, &child.bounding_box) {
                            continue;
                        }
                        // Nodes are never empty, so a contained node always holds a hit
                        if rect_contains(area, &child.bounding_box) {
                            return true;
                        }
                        stack.push(child);
                    }
                }
            }
        }
        false
    }

    /// Every stored item, in tree order
    pub fn all(&self) -> Vec<&T> {
        let mut results = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.collect_all(&mut results);
        }
        results
    }
}

impl<T: Bounded> Node<T> {
    fn leaf(items: Vec<T>, bounding_box: Rect<f64>) -> Self {
        Self {
            bounding_box,
            height: 1,
            children: Children::Leaf(items),
        }
    }

    /// Build a node from a non-empty item list
    fn leaf_from(items: Vec<T>) -> Option<Self> {
        let bbox = union_all(&items, T::bounding_box)?;
        Some(Self::leaf(items, bbox))
    }

    /// Parent node one level above the given (same height, non-empty) nodes
    fn internal(nodes: Vec<Node<T>>) -> Self {
        let height = nodes.first().map_or(1, |n| n.height) + 1;
        let mut node = Self {
            bounding_box: nodes[0].bounding_box,
            height,
            children: Children::Internal(nodes),
        };
        node.recompute_bbox();
        node
    }

    fn len(&self) -> usize {
        match &self.children {
            Children::Leaf(items) => items.len(),
            Children::Internal(nodes) => nodes.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn recompute_bbox(&mut self) {
        let bbox = match &self.children {
            Children::Leaf(items) => union_all(items, T::bounding_box),
            Children::Internal(nodes) => union_all(nodes, |n: &Node<T>| n.bounding_box),
        };
        if let Some(bbox) = bbox {
            self.bounding_box = bbox;
        }
    }

    fn collect_all<'a>(&'a self, results: &mut Vec<&'a T>) {
        match &self.children {
            Children::Leaf(items) => results.extend(items.iter()),
            Children::Internal(nodes) => {
                for node in nodes {
                    node.collect_all(results);
                }
            }
        }
    }

    /// Push an insertion down to the node one level above its height
    ///
    /// Returns the new sibling when this node overflowed and had to split.
    fn insert(
        &mut self,
        insertion: Insertion<T>,
        bbox: Rect<f64>,
        insertion_height: usize,
        max_entries: usize,
        min_entries: usize,
    ) -> Option<Node<T>> {
        self.bounding_box = rect_union(&self.bounding_box, &bbox);

        if self.height == insertion_height + 1 {
            match (&mut self.children, insertion) {
                (Children::Leaf(items), Insertion::Item(item)) => items.push(item),
                (Children::Internal(nodes), Insertion::Subtree(node)) => nodes.push(node),
                _ => unreachable!("insertion height does not match node kind"),
            }
        } else {
            let Children::Internal(nodes) = &mut self.children else {
                unreachable!("leaf found above the insertion level");
            };
            let index = choose_subtree(nodes, &bbox);
            if let Some(sibling) =
                nodes[index].insert(insertion, bbox, insertion_height, max_entries, min_entries)
            {
                nodes.push(sibling);
            }
        }

        if self.len() > max_entries {
            Some(self.split(min_entries))
        } else {
            None
        }
    }

    /// Split an overflowing node in two, returning the new right half
    fn split(&mut self, min_entries: usize) -> Node<T> {
        let children = match &mut self.children {
            Children::Leaf(items) => {
                Children::Leaf(split_children(items, min_entries, T::bounding_box))
            }
            Children::Internal(nodes) => Children::Internal(split_children(
                nodes,
                min_entries,
                |n: &Node<T>| n.bounding_box,
            )),
        };
        self.recompute_bbox();

        let mut sibling = Node {
            bounding_box: self.bounding_box,
            height: self.height,
            children,
        };
        sibling.recompute_bbox();
        sibling
    }

    fn remove(&mut self, item: &T, bbox: &Rect<f64>) -> bool
    where
        T: PartialEq,
    {
        if !rect_contains(&self.bounding_box, bbox) {
            return false;
        }

        let removed = match &mut self.children {
            Children::Leaf(items) => match items.iter().position(|candidate| candidate == item) {
                Some(index) => {
                    items.remove(index);
                    true
                }
                None => false,
            },
            Children::Internal(nodes) => {
                let hit = nodes.iter_mut().position(|child| child.remove(item, bbox));
                if let Some(index) = hit
                    && nodes[index].is_empty()
                {
                    nodes.remove(index);
                }
                hit.is_some()
            }
        };

        if removed {
            self.recompute_bbox();
        }
        removed
    }
}

/// Pack `items` into a balanced subtree (overlap-minimizing top-down packing)
///
/// `height` is 0 on the outermost call; the target height and the root fan-out
/// are then derived from the item count so every leaf lands at height 1.
fn build_packed<T: Bounded>(mut items: Vec<T>, height: usize, max_entries: usize) -> Option<Node<T>> {
    let count = items.len();
    if count <= max_entries {
        // Remainder groups can be small at any level; lift them so all leaves stay at height 1
        let mut node = Node::leaf_from(items)?;
        while node.height < height {
            node = Node::internal(vec![node]);
        }
        return Some(node);
    }

    let (height, fan_out) = if height == 0 {
        let height = ((count as f64).ln() / (max_entries as f64).ln()).ceil() as usize;
        let capacity_below = max_entries.pow((height - 1) as u32);
        (height, count.div_ceil(capacity_below))
    } else {
        (height, max_entries)
    };

    let per_child = count.div_ceil(fan_out);
    let per_slice = per_child * (fan_out as f64).sqrt().ceil() as usize;

    items.sort_by(|a, b| compare_min_x(&a.bounding_box(), &b.bounding_box()));

    let mut nodes = Vec::with_capacity(fan_out);
    for mut slice in split_into_chunks(items, per_slice) {
        slice.sort_by(|a, b| compare_min_y(&a.bounding_box(), &b.bounding_box()));
        for group in split_into_chunks(slice, per_child) {
            nodes.extend(build_packed(group, height - 1, max_entries));
        }
    }

    let bbox = union_all(&nodes, |n: &Node<T>| n.bounding_box)?;
    Some(Node {
        bounding_box: bbox,
        height,
        children: Children::Internal(nodes),
    })
}

/// Break an owned vector into consecutive chunks of at most `size` elements
fn split_into_chunks<T>(mut items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    while items.len() > size {
        let tail = items.split_off(size);
        chunks.push(items);
        items = tail;
    }
    if !items.is_empty() {
        chunks.push(items);
    }
    chunks
}

fn union_all<C>(children: &[C], bbox_of: impl Fn(&C) -> Rect<f64>) -> Option<Rect<f64>> {
    children
        .iter()
        .map(bbox_of)
        .reduce(|acc, bbox| rect_union(&acc, &bbox))
}

fn compare_min_x(a: &Rect<f64>, b: &Rect<f64>) -> Ordering {
    a.min().x.total_cmp(&b.min().x)
}

fn compare_min_y(a: &Rect<f64>, b: &Rect<f64>) -> Ordering {
    a.min().y.total_cmp(&b.min().y)
}

/// Child needing the least area enlargement, ties broken by smallest area
fn choose_subtree<T>(nodes: &[Node<T>], bbox: &Rect<f64>) -> usize {
    let mut best_index = 0;
    let mut min_enlargement = f64::INFINITY;
    let mut min_area = f64::INFINITY;

    for (index, node) in nodes.iter().enumerate() {
        let area = node.bounding_box.width() * node.bounding_box.height();
        let enlargement = enlarged_area(bbox, &node.bounding_box) - area;

        if enlargement < min_enlargement {
            min_enlargement = enlargement;
            min_area = area.min(min_area);
            best_index = index;
        } else if enlargement == min_enlargement && area < min_area {
            min_area = area;
            best_index = index;
        }
    }
    best_index
}

/// Sort along the better axis, then cut at the least-overlap index
fn split_children<C>(
    children: &mut Vec<C>,
    min_entries: usize,
    bbox_of: impl Fn(&C) -> Rect<f64> + Copy,
) -> Vec<C> {
    let x_margin = distribution_margin(children, min_entries, bbox_of, compare_min_x);
    let y_margin = distribution_margin(children, min_entries, bbox_of, compare_min_y);
    // The y pass left the children sorted by y
    if x_margin < y_margin {
        children.sort_by(|a, b| compare_min_x(&bbox_of(a), &bbox_of(b)));
    }

    let index = choose_split_index(children, min_entries, bbox_of);
    children.split_off(index)
}

/// Sum of the margins of every allowed split along one axis
fn distribution_margin<C>(
    children: &mut [C],
    min_entries: usize,
    bbox_of: impl Fn(&C) -> Rect<f64> + Copy,
    compare: fn(&Rect<f64>, &Rect<f64>) -> Ordering,
) -> f64 {
    children.sort_by(|a, b| compare(&bbox_of(a), &bbox_of(b)));

    let total = children.len();
    let (Some(mut left), Some(mut right)) = (
        union_all(&children[..min_entries], bbox_of),
        union_all(&children[total - min_entries..], bbox_of),
    ) else {
        return f64::INFINITY;
    };

    let mut margin = rect_margin(&left) + rect_margin(&right);
    for child in &children[min_entries..total - min_entries] {
        left = rect_union(&left, &bbox_of(child));
        margin += rect_margin(&left);
    }
    for child in children[min_entries..total - min_entries].iter().rev() {
        right = rect_union(&right, &bbox_of(child));
        margin += rect_margin(&right);
    }
    margin
}

fn choose_split_index<C>(
    children: &[C],
    min_entries: usize,
    bbox_of: impl Fn(&C) -> Rect<f64> + Copy,
) -> usize {
    let total = children.len();
    let mut best_index = total - min_entries;
    let mut min_overlap = f64::INFINITY;
    let mut min_area = f64::INFINITY;

    for index in min_entries..=total - min_entries {
        let (Some(left), Some(right)) = (
            union_all(&children[..index], bbox_of),
            union_all(&children[index..], bbox_of),
        ) else {
            continue;
        };

        let overlap = intersection_area(&left, &right);
        let area = left.width() * left.height() + right.width() * right.height();

        if overlap < min_overlap {
            min_overlap = overlap;
            best_index = index;
            min_area = area.min(min_area);
        } else if overlap == min_overlap && area < min_area {
            min_area = area;
            best_index = index;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
        Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
    }

    /// Deterministic pseudo-random boxes (64-bit LCG)
    fn random_rects(count: usize, seed: u64) -> Vec<Rect<f64>> {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..count)
            .map(|_| {
                let x = next() * 1000.0;
                let y = next() * 1000.0;
                let w = next() * 20.0;
                let h = next() * 20.0;
                rect(x, y, x + w, y + h)
            })
            .collect()
    }

    fn brute_force(items: &[Rect<f64>], area: &Rect<f64>) -> Vec<Rect<f64>> {
        let mut hits: Vec<Rect<f64>> = items
            .iter()
            .filter(|r| rects_intersect(area, r))
            .copied()
            .collect();
        sort_rects(&mut hits);
        hits
    }

    fn sort_rects(rects: &mut [Rect<f64>]) {
        rects.sort_by(|a, b| {
            compare_min_x(a, b)
                .then(compare_min_y(a, b))
                .then(a.max().x.total_cmp(&b.max().x))
                .then(a.max().y.total_cmp(&b.max().y))
        });
    }

    fn query_sorted(tree: &RTree<Rect<f64>>, area: &Rect<f64>) -> Vec<Rect<f64>> {
        let mut hits: Vec<Rect<f64>> = tree.query(area).into_iter().copied().collect();
        sort_rects(&mut hits);
        hits
    }

    /// Walk the tree checking the structural invariants; returns the item count
    fn check_node(node: &Node<Rect<f64>>, max_entries: usize) -> usize {
        assert!(node.len() <= max_entries, "node overflow: {}", node.len());
        assert!(!node.is_empty(), "empty node left in tree");
        match &node.children {
            Children::Leaf(items) => {
                assert_eq!(node.height, 1);
                assert_eq!(union_all(items, |r: &Rect<f64>| *r), Some(node.bounding_box));
                items.len()
            }
            Children::Internal(nodes) => {
                assert_eq!(
                    union_all(nodes, |n: &Node<Rect<f64>>| n.bounding_box),
                    Some(node.bounding_box)
                );
                nodes
                    .iter()
                    .map(|child| {
                        assert_eq!(child.height + 1, node.height);
                        check_node(child, max_entries)
                    })
                    .sum()
            }
        }
    }

    fn check_tree(tree: &RTree<Rect<f64>>) {
        let counted = tree
            .root
            .as_ref()
            .map_or(0, |root| check_node(root, tree.max_entries));
        assert_eq!(counted, tree.len());
    }

    #[test]
    fn test_empty_tree() {
        let mut tree: RTree<Rect<f64>> = RTree::new();
        let everything = rect(-1e9, -1e9, 1e9, 1e9);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.query(&everything).is_empty());
        assert!(!tree.collides(&everything));
        assert!(!tree.remove(&rect(0.0, 0.0, 1.0, 1.0)));
        assert!(tree.all().is_empty());
    }

    #[test]
    fn test_bulk_load_query_matches_brute_force() {
        let items = random_rects(2000, 7);
        let mut tree = RTree::new();
        tree.bulk_load(items.clone());
        check_tree(&tree);
        assert_eq!(tree.len(), 2000);

        for area in [
            rect(0.0, 0.0, 100.0, 100.0),
            rect(450.0, 450.0, 550.0, 900.0),
            rect(999.0, 0.0, 1100.0, 1100.0),
            rect(500.0, 500.0, 500.0, 500.0),
        ] {
            assert_eq!(query_sorted(&tree, &area), brute_force(&items, &area));
        }
    }

    #[test]
    fn test_universal_and_disjoint_boxes() {
        let items = random_rects(700, 11);
        let mut tree = RTree::new();
        tree.bulk_load(items.clone());

        let everything = rect(-1e9, -1e9, 1e9, 1e9);
        assert_eq!(tree.query(&everything).len(), 700);
        assert!(tree.collides(&everything));

        let nowhere = rect(5000.0, 5000.0, 6000.0, 6000.0);
        assert!(tree.query(&nowhere).is_empty());
        assert!(!tree.collides(&nowhere));
    }

    #[test]
    fn test_incremental_bulk_loads() {
        let items = random_rects(1253, 3);
        let mut tree = RTree::new();
        // Batches of varying sizes, including one below the minimum node fill
        let mut rest = items.clone();
        for size in [500, 500, 3, 250] {
            let tail = rest.split_off(size.min(rest.len()));
            tree.bulk_load(rest);
            rest = tail;
            check_tree(&tree);
        }
        assert!(rest.is_empty());
        assert_eq!(tree.len(), 1253);

        let area = rect(200.0, 300.0, 400.0, 700.0);
        assert_eq!(query_sorted(&tree, &area), brute_force(&items, &area));
    }

    #[test]
    fn test_small_batch_into_tall_tree() {
        let mut tree = RTree::new();
        tree.bulk_load(random_rects(5000, 1));
        let small = random_rects(12, 2);
        tree.bulk_load(small.clone());
        check_tree(&tree);
        assert_eq!(tree.len(), 5012);
        for r in &small {
            assert!(tree.query(r).contains(&r));
        }
    }

    #[test]
    fn test_single_inserts() {
        let items = random_rects(300, 5);
        let mut tree = RTree::new();
        for item in &items {
            tree.insert(*item);
        }
        check_tree(&tree);
        assert!(tree.height() > 1);

        let area = rect(100.0, 100.0, 600.0, 400.0);
        assert_eq!(query_sorted(&tree, &area), brute_force(&items, &area));
    }

    #[test]
    fn test_remove_then_query() {
        let items = random_rects(400, 9);
        let mut tree = RTree::new();
        tree.bulk_load(items.clone());

        let target = items[123];
        assert!(tree.query(&target).contains(&&target));
        assert!(tree.remove(&target));
        assert!(!tree.query(&target).contains(&&target));
        assert_eq!(tree.len(), 399);
        check_tree(&tree);

        // Second removal is a no-op
        assert!(!tree.remove(&target));
        assert_eq!(tree.len(), 399);
    }

    #[test]
    fn test_remove_everything() {
        let items = random_rects(150, 13);
        let mut tree = RTree::new();
        tree.bulk_load(items.clone());
        for item in &items {
            assert!(tree.remove(item));
            check_tree(&tree);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);

        // The tree is reusable afterwards
        tree.bulk_load(items[..20].to_vec());
        assert_eq!(tree.len(), 20);
    }

    #[test]
    fn test_collides_with_points() {
        let mut tree = RTree::new();
        tree.bulk_load(vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 20.0, 30.0, 30.0)]);
        assert!(tree.collides(&rect(10.0, 10.0, 10.0, 10.0)));
        assert!(!tree.collides(&rect(15.0, 15.0, 15.0, 15.0)));
    }

    #[test]
    fn test_clear() {
        let mut tree = RTree::new();
        tree.bulk_load(random_rects(100, 17));
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.query(&rect(0.0, 0.0, 1000.0, 1000.0)).is_empty());
    }

    #[test]
    fn test_split_into_chunks() {
        let chunks = split_into_chunks((0..10).collect::<Vec<_>>(), 4);
        assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }
}
