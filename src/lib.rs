//! # rbtree-rs
//!
//! A red-black tree over caller-ordered items, stored in an index arena.
//!
//! Nodes are addressed through copyable [`NodeId`] handles, and traversal
//! goes through a [`Cursor`] that can sit on a node or on one of two
//! sentinels just outside the populated range. Cursors never borrow the
//! tree, so the node a cursor observes may be deleted as long as the cursor
//! is [`reset`](Cursor::reset) before its next move.
//!
//! ## Example
//!
//! ```rust
//! use rbtree_rs::{Cursor, Position, Tree};
//!
//! let mut tree: Tree<u32> = (0..10).collect();
//! assert_eq!(tree.len(), 10);
//!
//! let mut cursor = Cursor::new(Position::BeforeMin);
//! let mut seen = Vec::new();
//! while let Some(id) = cursor.right(&tree) {
//!     seen.push(tree[id]);
//! }
//! assert_eq!(seen, (0..10).collect::<Vec<_>>());
//!
//! let three = tree.find(&3).unwrap();
//! assert_eq!(tree.delete(three), 3);
//! assert!(tree.find(&3).is_none());
//! ```

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;

// =============================================================================
// Configuration
// =============================================================================

/// Slot index reserved as the nil link.
const NIL_INDEX: u32 = u32::MAX;
/// Most slots a single arena hands out (every index below `NIL_INDEX`).
const MAX_SLOTS: usize = NIL_INDEX as usize;

// =============================================================================
// Item capability
// =============================================================================

/// Ordering capability of stored items.
///
/// `precedes` must be a strict weak order: irreflexive and transitive, with
/// "neither precedes the other" meaning equal rank. Every `T: Ord` is an
/// `Item` through `<`.
pub trait Item {
    /// Returns `true` if `self` strictly precedes `other`.
    fn precedes(&self, other: &Self) -> bool;
}

impl<T: Ord> Item for T {
    #[inline]
    fn precedes(&self, other: &Self) -> bool {
        self < other
    }
}

/// Where `target` lies relative to `node`.
#[inline]
fn direction<T: Item>(target: &T, node: &T) -> Ordering {
    if target.precedes(node) {
        Ordering::Less
    } else if node.precedes(target) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

// =============================================================================
// Links and handles
// =============================================================================

/// Arena slot index; `NIL` marks an absent child or parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Link(u32);

impl Link {
    const NIL: Link = Link(NIL_INDEX);

    #[inline]
    fn is_nil(self) -> bool {
        self.0 == NIL_INDEX
    }

    #[inline]
    fn idx(self) -> usize {
        debug_assert!(!self.is_nil());
        self.0 as usize
    }
}

/// Handle to a node of one [`Tree`].
///
/// A handle stays valid until its node is removed. After that it is stale:
/// the slot's generation moves on, so a stale handle never resolves to a
/// node inserted later into the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone)]
struct Node<T> {
    item: T,
    color: Color,
    parent: Link,
    left: Link,
    right: Link,
}

impl<T> Node<T> {
    #[inline]
    fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

// =============================================================================
// Node arena
// =============================================================================

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Backing store for the nodes of one tree, with a free list of vacant slots.
#[derive(Clone)]
struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    /// Vacant slot indices, most recently freed last.
    free: Vec<u32>,
}

impl<T> NodeArena<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self, node: Node<T>) -> Link {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.node.is_none(), "free list holds a live slot");
            slot.node = Some(node);
            return Link(index);
        }
        assert!(self.slots.len() < MAX_SLOTS, "node arena exhausted");
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        Link(index)
    }

    /// Vacates a slot and returns the item it held.
    fn free(&mut self, link: Link) -> T {
        let slot = &mut self.slots[link.idx()];
        let node = slot.node.take().expect("freeing a vacant slot");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(link.0);
        node.item
    }

    #[inline]
    fn get(&self, link: Link) -> &Node<T> {
        self.slots[link.idx()]
            .node
            .as_ref()
            .expect("link to a vacant slot")
    }

    #[inline]
    fn get_mut(&mut self, link: Link) -> &mut Node<T> {
        self.slots[link.idx()]
            .node
            .as_mut()
            .expect("link to a vacant slot")
    }

    #[inline]
    fn id(&self, link: Link) -> NodeId {
        NodeId {
            index: link.0,
            generation: self.slots[link.idx()].generation,
        }
    }

    fn resolve(&self, id: NodeId) -> Option<Link> {
        let slot = self.slots.get(id.index as usize)?;
        (slot.generation == id.generation && slot.node.is_some()).then_some(Link(id.index))
    }

    fn swap_items(&mut self, a: Link, b: Link) {
        if a == b {
            return;
        }
        let (lo, hi) = if a.idx() < b.idx() {
            (a.idx(), b.idx())
        } else {
            (b.idx(), a.idx())
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let low = head[lo].node.as_mut().expect("link to a vacant slot");
        let high = tail[0].node.as_mut().expect("link to a vacant slot");
        std::mem::swap(&mut low.item, &mut high.item);
    }

    fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Vacates every slot, keeping generations so old handles stay stale.
    fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
    }

    fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Slot<T>>()
            + self.free.capacity() * std::mem::size_of::<u32>()
    }

    fn shrink_to_fit(&mut self) {
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }
}

// =============================================================================
// Tree
// =============================================================================

/// A red-black tree of items ordered by [`Item::precedes`].
///
/// Equal-ranked items may coexist; a newly inserted item lands to the right
/// of the equal-ranked items already present.
#[derive(Clone)]
pub struct Tree<T> {
    nodes: NodeArena<T>,
    root: Link,
    count: usize,
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a tree whose arena can hold `capacity` nodes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            root: Link::NIL,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Heap bytes held by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Removes every item. All outstanding handles become stale.
    pub fn clear(&mut self) {
        log::trace!("clear: dropping {} nodes", self.count);
        self.nodes.clear();
        self.root = Link::NIL;
        self.count = 0;
    }

    pub fn min(&self) -> Option<NodeId> {
        (!self.root.is_nil()).then(|| self.nodes.id(self.extreme(self.root, Side::Left)))
    }

    pub fn max(&self) -> Option<NodeId> {
        (!self.root.is_nil()).then(|| self.nodes.id(self.extreme(self.root, Side::Right)))
    }

    /// Smallest item, or the leftmost of several equal-ranked smallest items.
    pub fn first(&self) -> Option<&T> {
        self.min().map(|id| &self[id])
    }

    pub fn last(&self) -> Option<&T> {
        self.max().map(|id| &self[id])
    }

    /// Returns `true` if `id` names a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.resolve(id).is_some()
    }

    /// Item of a live node, or `None` for a stale handle.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let link = self.nodes.resolve(id)?;
        Some(&self.nodes.get(link).item)
    }

    /// Mutable access to a node's item.
    ///
    /// Changing the item's rank breaks the tree's ordering around the node;
    /// call [`Tree::fix`] on the same handle before any other operation.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let link = self.nodes.resolve(id)?;
        Some(&mut self.nodes.get_mut(link).item)
    }

    /// In-order successor of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.neighbour(id, Side::Right)
    }

    /// In-order predecessor of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.neighbour(id, Side::Left)
    }

    /// Cursor position whose next right step lands on `id`.
    ///
    /// For the minimum this is [`Position::BeforeMin`].
    pub fn before(&self, id: NodeId) -> Position {
        self.prev(id).map_or(Position::BeforeMin, Position::At)
    }

    /// Cursor position whose next left step lands on `id`.
    ///
    /// For the maximum this is [`Position::AfterMax`].
    pub fn after(&self, id: NodeId) -> Position {
        self.next(id).map_or(Position::AfterMax, Position::At)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let (front, back) = if self.root.is_nil() {
            (Link::NIL, Link::NIL)
        } else {
            (
                self.extreme(self.root, Side::Left),
                self.extreme(self.root, Side::Right),
            )
        };
        Iter {
            tree: self,
            front,
            back,
            remaining: self.count,
        }
    }

    /// Finds a node using a caller-supplied direction.
    ///
    /// `direction` receives the item of each visited node and says where the
    /// target lies relative to it: `Less` to the left, `Greater` to the
    /// right, `Equal` for a match. This allows lookups by a projected key
    /// without building a full item.
    pub fn find_with(&self, direction: impl FnMut(&T) -> Ordering) -> Option<NodeId> {
        self.locate(direction).ok().map(|link| self.nodes.id(link))
    }

    /// Finds a node using `direction` as in [`Tree::find_with`], inserting
    /// `make()` at the search position if nothing matches.
    ///
    /// `make` runs only on a miss.
    pub fn find_with_or_insert_with(
        &mut self,
        direction: impl FnMut(&T) -> Ordering,
        make: impl FnOnce() -> T,
    ) -> NodeId {
        let link = match self.locate(direction) {
            Ok(link) => link,
            Err((parent, side)) => self.attach(parent, side, make()),
        };
        self.nodes.id(link)
    }

    /// Removes a node and returns its item.
    ///
    /// When the node has two children its item trades places with the
    /// in-order successor's item and the successor's slot is removed
    /// instead. `id` then stays live but names the successor's item, while
    /// the successor's handle becomes stale.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn delete(&mut self, id: NodeId) -> T {
        let mut target = self.expect_live(id);
        let (left, right) = {
            let node = self.nodes.get(target);
            (node.left, node.right)
        };
        if !left.is_nil() && !right.is_nil() {
            let successor = self.extreme(right, Side::Left);
            log::trace!(
                "delete {id:?}: moving successor {:?} into its place",
                self.nodes.id(successor)
            );
            self.nodes.swap_items(target, successor);
            target = successor;
        }

        let node = self.nodes.get(target);
        let child = if node.left.is_nil() {
            node.right
        } else {
            node.left
        };
        let parent = node.parent;
        let color = node.color;

        if !child.is_nil() {
            self.nodes.get_mut(child).parent = parent;
        }
        self.replace_child(parent, target, child);
        let item = self.nodes.free(target);
        self.count -= 1;

        if color == Color::Black {
            self.delete_fixup(child, parent);
        }
        item
    }

    // === Search and linking ===

    /// Descends from the root. `Ok` holds the matching node; `Err` holds the
    /// parent and side where a new leaf belongs.
    fn locate(
        &self,
        mut direction: impl FnMut(&T) -> Ordering,
    ) -> Result<Link, (Link, Side)> {
        let mut parent = Link::NIL;
        let mut side = Side::Left;
        let mut current = self.root;
        while !current.is_nil() {
            let node = self.nodes.get(current);
            side = match direction(&node.item) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Ok(current),
            };
            parent = current;
            current = node.child(side);
        }
        Err((parent, side))
    }

    fn attach(&mut self, parent: Link, side: Side, item: T) -> Link {
        let link = self.nodes.alloc(Node {
            item,
            color: Color::Red,
            parent,
            left: Link::NIL,
            right: Link::NIL,
        });
        if parent.is_nil() {
            self.root = link;
        } else {
            *self.nodes.get_mut(parent).child_mut(side) = link;
        }
        self.count += 1;
        self.insert_fixup(link);
        link
    }

    fn expect_live(&self, id: NodeId) -> Link {
        match self.nodes.resolve(id) {
            Some(link) => link,
            None => panic!("stale node handle {id:?}"),
        }
    }

    fn neighbour(&self, id: NodeId, side: Side) -> Option<NodeId> {
        let next = self.step(self.expect_live(id), side);
        (!next.is_nil()).then(|| self.nodes.id(next))
    }

    // === Link helpers ===

    #[inline]
    fn parent(&self, link: Link) -> Link {
        self.nodes.get(link).parent
    }

    #[inline]
    fn child(&self, link: Link, side: Side) -> Link {
        self.nodes.get(link).child(side)
    }

    /// Absent children count as black.
    #[inline]
    fn is_red(&self, link: Link) -> bool {
        !link.is_nil() && self.nodes.get(link).color == Color::Red
    }

    #[inline]
    fn set_color(&mut self, link: Link, color: Color) {
        if !link.is_nil() {
            self.nodes.get_mut(link).color = color;
        }
    }

    #[inline]
    fn side_of(&self, child: Link, parent: Link) -> Side {
        if self.child(parent, Side::Left) == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn extreme(&self, mut link: Link, side: Side) -> Link {
        loop {
            let next = self.child(link, side);
            if next.is_nil() {
                return link;
            }
            link = next;
        }
    }

    /// In-order neighbour on `side` (`Right` is the successor).
    fn step(&self, link: Link, side: Side) -> Link {
        let child = self.child(link, side);
        if !child.is_nil() {
            return self.extreme(child, side.opposite());
        }
        let mut current = link;
        let mut parent = self.parent(link);
        while !parent.is_nil() && self.child(parent, side) == current {
            current = parent;
            parent = self.parent(parent);
        }
        parent
    }

    fn replace_child(&mut self, parent: Link, old: Link, new: Link) {
        if parent.is_nil() {
            self.root = new;
            return;
        }
        let node = self.nodes.get_mut(parent);
        if node.left == old {
            node.left = new;
        } else {
            debug_assert_eq!(node.right, old);
            node.right = new;
        }
    }

    /// Rotates `x` down toward `side`; its child on the other side takes its
    /// place.
    fn rotate(&mut self, x: Link, side: Side) {
        let y = self.child(x, side.opposite());
        debug_assert!(!y.is_nil(), "rotation needs a child to lift");
        let inner = self.child(y, side);

        *self.nodes.get_mut(x).child_mut(side.opposite()) = inner;
        if !inner.is_nil() {
            self.nodes.get_mut(inner).parent = x;
        }

        let parent = self.parent(x);
        self.nodes.get_mut(y).parent = parent;
        self.replace_child(parent, x, y);

        *self.nodes.get_mut(y).child_mut(side) = x;
        self.nodes.get_mut(x).parent = y;
    }

    // === Rebalancing ===

    fn insert_fixup(&mut self, mut node: Link) {
        loop {
            let mut parent = self.parent(node);
            if !self.is_red(parent) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let grand = self.parent(parent);
            let side = self.side_of(parent, grand);
            let uncle = self.child(grand, side.opposite());

            if self.is_red(uncle) {
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grand, Color::Red);
                node = grand;
                continue;
            }

            if node == self.child(parent, side.opposite()) {
                // Inner child: straighten the zig-zag first.
                self.rotate(parent, side);
                node = parent;
                parent = self.parent(node);
            }
            self.set_color(parent, Color::Black);
            self.set_color(grand, Color::Red);
            self.rotate(grand, side.opposite());
            break;
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Repairs the black-height deficit left at `node`, a child of `parent`
    /// that may be absent.
    fn delete_fixup(&mut self, mut node: Link, mut parent: Link) {
        while node != self.root && !self.is_red(node) {
            let side = self.side_of(node, parent);
            let far = side.opposite();
            // The deficit guarantees a sibling.
            let mut sibling = self.child(parent, far);

            if self.is_red(sibling) {
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.child(parent, far);
            }

            let near_nephew = self.child(sibling, side);
            let far_nephew = self.child(sibling, far);
            if !self.is_red(near_nephew) && !self.is_red(far_nephew) {
                self.set_color(sibling, Color::Red);
                node = parent;
                parent = self.parent(node);
                continue;
            }

            if !self.is_red(far_nephew) {
                self.set_color(near_nephew, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, far);
                sibling = self.child(parent, far);
            }

            let parent_color = self.nodes.get(parent).color;
            self.set_color(sibling, parent_color);
            self.set_color(parent, Color::Black);
            let far_nephew = self.child(sibling, far);
            self.set_color(far_nephew, Color::Black);
            self.rotate(parent, side);
            node = self.root;
        }
        self.set_color(node, Color::Black);
    }
}

impl<T: Item> Tree<T> {
    /// Finds a node whose item has the same rank as `item`.
    pub fn find(&self, item: &T) -> Option<NodeId> {
        self.find_with(|node| direction(item, node))
    }

    /// Inserts `item`, keeping any equal-ranked items already present.
    pub fn insert(&mut self, item: T) -> NodeId {
        let found = self.locate(|node| {
            if item.precedes(node) {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });
        let (parent, side) = match found {
            Ok(_) => unreachable!("insertion search never reports a match"),
            Err(slot) => slot,
        };
        let link = self.attach(parent, side, item);
        self.nodes.id(link)
    }

    /// Returns the node holding an item of the same rank as `item`, or
    /// inserts `item` if there is none. On a hit `item` is dropped.
    pub fn find_or_insert(&mut self, item: T) -> NodeId {
        let found = self.locate(|node| direction(&item, node));
        let link = match found {
            Ok(link) => link,
            Err((parent, side)) => self.attach(parent, side, item),
        };
        self.nodes.id(link)
    }

    /// Restores the tree's order after the item behind `id` was changed
    /// through [`Tree::get_mut`].
    ///
    /// The item is removed and inserted again. The returned handle names the
    /// node now holding it; `id` must not be used afterwards, since it may be
    /// stale or name another item.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn fix(&mut self, id: NodeId) -> NodeId {
        log::trace!("fix {id:?}: reinserting item");
        let item = self.delete(id);
        self.insert(item)
    }

    /// Checks every structural invariant and reports the first one broken.
    pub fn verify(&self) -> Result<(), Violation> {
        if self.is_red(self.root) {
            return Err(Violation::RedRoot);
        }
        if !self.root.is_nil() && !self.parent(self.root).is_nil() {
            return Err(Violation::BrokenParent {
                node: self.nodes.id(self.root),
            });
        }

        let mut reachable = 0;
        self.verify_subtree(self.root, &mut reachable)?;
        if reachable != self.count {
            return Err(Violation::CountMismatch {
                reported: self.count,
                reachable,
            });
        }
        let live = self.nodes.live();
        if live != reachable {
            return Err(Violation::UnreachableNodes { live, reachable });
        }

        if self.root.is_nil() {
            return Ok(());
        }
        let mut prev = self.extreme(self.root, Side::Left);
        let mut current = self.step(prev, Side::Right);
        while !current.is_nil() {
            if self.nodes.get(current).item.precedes(&self.nodes.get(prev).item) {
                return Err(Violation::OutOfOrder {
                    node: self.nodes.id(current),
                });
            }
            prev = current;
            current = self.step(current, Side::Right);
        }
        Ok(())
    }

    /// Returns the black height of the subtree at `link`.
    fn verify_subtree(&self, link: Link, reachable: &mut usize) -> Result<usize, Violation> {
        if link.is_nil() {
            return Ok(1);
        }
        *reachable += 1;
        let node = self.nodes.get(link);
        for child in [node.left, node.right] {
            if child.is_nil() {
                continue;
            }
            if self.parent(child) != link {
                return Err(Violation::BrokenParent {
                    node: self.nodes.id(child),
                });
            }
            if node.color == Color::Red && self.is_red(child) {
                return Err(Violation::RedChild {
                    node: self.nodes.id(link),
                });
            }
        }

        let left = self.verify_subtree(node.left, reachable)?;
        let right = self.verify_subtree(node.right, reachable)?;
        if left != right {
            return Err(Violation::BlackHeight {
                node: self.nodes.id(link),
                left,
                right,
            });
        }
        Ok(left + usize::from(node.color == Color::Black))
    }
}

/// A broken structural invariant found by [`Tree::verify`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("root node is red")]
    RedRoot,
    #[error("red node {node:?} has a red child")]
    RedChild { node: NodeId },
    #[error("black height differs under {node:?}: {left} on the left, {right} on the right")]
    BlackHeight {
        node: NodeId,
        left: usize,
        right: usize,
    },
    #[error("{node:?} precedes its in-order predecessor")]
    OutOfOrder { node: NodeId },
    #[error("parent link of {node:?} does not point back at its parent")]
    BrokenParent { node: NodeId },
    #[error("tree reports {reported} nodes but {reachable} are reachable from the root")]
    CountMismatch { reported: usize, reachable: usize },
    #[error("{live} arena slots are live but {reachable} nodes are reachable from the root")]
    UnreachableNodes { live: usize, reachable: usize },
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<NodeId> for Tree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.nodes.get(self.expect_live(id)).item
    }
}

impl<T: Item> Extend<T> for Tree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Item> FromIterator<T> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// In-order iterator over the items of a [`Tree`].
pub struct Iter<'a, T> {
    tree: &'a Tree<T>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let link = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.tree.step(link, Side::Right);
        }
        Some(&self.tree.nodes.get(link).item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let link = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.tree.step(link, Side::Left);
        }
        Some(&self.tree.nodes.get(link).item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// =============================================================================
// Cursor
// =============================================================================

/// Where a [`Cursor`] sits relative to its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// Just left of the minimum.
    BeforeMin,
    At(NodeId),
    /// Just right of the maximum.
    AfterMax,
}

impl From<NodeId> for Position {
    fn from(id: NodeId) -> Self {
        Position::At(id)
    }
}

/// A movable position over one tree's nodes.
///
/// The cursor holds no borrow of the tree: every move takes the tree as an
/// argument. Moving right from the maximum lands on [`Position::AfterMax`],
/// which absorbs further right moves; the left side mirrors this with
/// [`Position::BeforeMin`].
///
/// After a structural change to the tree, reset any cursor that observed the
/// changed region. In particular a cursor whose node was deleted must be
/// reset before it moves again; moving it panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    position: Position,
}

impl Cursor {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    pub fn at(id: NodeId) -> Self {
        Self::new(Position::At(id))
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` while the cursor sits on a node rather than a sentinel.
    pub fn is_ok(&self) -> bool {
        matches!(self.position, Position::At(_))
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.position {
            Position::At(id) => Some(id),
            Position::BeforeMin | Position::AfterMax => None,
        }
    }

    pub fn item<'t, T>(&self, tree: &'t Tree<T>) -> Option<&'t T> {
        self.node().and_then(|id| tree.get(id))
    }

    pub fn reset(&mut self, position: Position) {
        self.position = position;
    }

    /// Moves to the in-order successor and returns it, or `None` once the
    /// cursor has run off the right end.
    pub fn right<T>(&mut self, tree: &Tree<T>) -> Option<NodeId> {
        self.position = self.neighbour(tree, Side::Right);
        self.node()
    }

    /// Moves to the in-order predecessor and returns it, or `None` once the
    /// cursor has run off the left end.
    pub fn left<T>(&mut self, tree: &Tree<T>) -> Option<NodeId> {
        self.position = self.neighbour(tree, Side::Left);
        self.node()
    }

    /// What [`Cursor::right`] would return, without moving.
    pub fn peek_right<T>(&self, tree: &Tree<T>) -> Option<NodeId> {
        Cursor::new(self.neighbour(tree, Side::Right)).node()
    }

    /// What [`Cursor::left`] would return, without moving.
    pub fn peek_left<T>(&self, tree: &Tree<T>) -> Option<NodeId> {
        Cursor::new(self.neighbour(tree, Side::Left)).node()
    }

    fn neighbour<T>(&self, tree: &Tree<T>, side: Side) -> Position {
        match (self.position, side) {
            (Position::BeforeMin, Side::Left) => Position::BeforeMin,
            (Position::AfterMax, Side::Right) => Position::AfterMax,
            (Position::BeforeMin, Side::Right) => {
                tree.min().map_or(Position::AfterMax, Position::At)
            }
            (Position::AfterMax, Side::Left) => {
                tree.max().map_or(Position::BeforeMin, Position::At)
            }
            (Position::At(id), Side::Right) => tree.next(id).map_or(Position::AfterMax, Position::At),
            (Position::At(id), Side::Left) => tree.prev(id).map_or(Position::BeforeMin, Position::At),
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new(Position::BeforeMin)
    }
}


#[cfg(test)]
mod proptests;
