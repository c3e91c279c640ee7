//! Arena-backed forest of tenant groups with nested-set bookkeeping.
//!
//! Parent/child links are arena indices, never pointers. Every node carries a
//! [`TreePosition`]: `left_bound`/`right_bound` number the tree in pre-order,
//! siblings ordered by name, so subtree and ancestor questions become interval
//! comparisons. Mutations keep the numbering dense (`1..=2n` per tree) by
//! opening and closing gaps, which rewrites bounds of every later node in the
//! affected tree.

use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::entities::{GroupChanges, GroupId, NewTenantGroup, TenantGroup, TreePosition};
use crate::domain::error::{DomainError, DomainResult, ValidationErrors};

const KIND: &str = "tenant group";

/// Tree node in the arena-based forest.
#[derive(Debug, Clone)]
struct GroupNode {
    group: TenantGroup,
    parent: Option<Index>,
    /// Sorted by group name.
    children: Vec<Index>,
}

/// Where a node (or subtree root) lands when it is inserted.
#[derive(Debug, Clone, Copy)]
struct Slot {
    tree_id: u32,
    left: u32,
    depth: u32,
}

/// Forest of tenant groups.
///
/// Serialises as the flat list of records (bookkeeping included) in tree
/// order; deserialisation checks parent links but trusts the stored
/// bookkeeping. Run
/// [`GroupTree::rebuild`] after loading records from an untrusted source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TenantGroup>", into = "Vec<TenantGroup>")]
pub struct GroupTree {
    arena: Arena<GroupNode>,
    by_id: HashMap<GroupId, Index>,
}

impl GroupTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct the forest from persisted records.
    ///
    /// Parent links must resolve and must not form a cycle; sibling lists are
    /// ordered by name. Stored bookkeeping is kept as-is.
    pub fn from_records(records: Vec<TenantGroup>) -> DomainResult<Self> {
        let mut tree = Self::new();
        for group in records {
            let id = group.id;
            let idx = tree.arena.insert(GroupNode {
                group,
                parent: None,
                children: Vec::new(),
            });
            if tree.by_id.insert(id, idx).is_some() {
                return Err(DomainError::validation(
                    "id",
                    format!("duplicate tenant group id {id}"),
                ));
            }
        }
        tree.link_from_parent_ids()?;
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn get(&self, id: GroupId) -> Option<&TenantGroup> {
        self.by_id.get(&id).map(|&idx| &self.arena[idx].group)
    }

    /// Like [`get`](Self::get) but reports a missing group as `NotFound`.
    pub fn require(&self, id: GroupId) -> DomainResult<&TenantGroup> {
        self.get(id).ok_or_else(|| DomainError::not_found(KIND, id))
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&TenantGroup> {
        self.arena
            .iter()
            .map(|(_, node)| &node.group)
            .find(|g| g.slug == slug)
    }

    // ============================================================
    // MUTATIONS
    // ============================================================

    /// Insert a new group as a root or under an existing parent.
    #[instrument(level = "debug", skip(self, new), fields(name = %new.name))]
    pub fn insert(&mut self, new: NewTenantGroup) -> DomainResult<GroupId> {
        let mut errors = new.validate();
        errors.extend(self.uniqueness_errors(&new.name, &new.slug, None));
        let parent_idx = match new.parent {
            Some(pid) => match self.by_id.get(&pid) {
                Some(&idx) => Some(idx),
                None => {
                    errors.push("parent", format!("unknown tenant group {pid}"));
                    None
                }
            },
            None => None,
        };
        errors.into_result()?;
        if let Some(p) = parent_idx {
            self.span(p)?;
        }

        let slot = self.slot_for(parent_idx, &new.name);
        if parent_idx.is_some() {
            self.open_gap(slot.tree_id, slot.left, 2, &HashSet::new());
        }

        let id = GroupId::new();
        let group = TenantGroup {
            id,
            name: new.name,
            slug: new.slug,
            parent: new.parent,
            description: new.description,
            position: TreePosition {
                depth: slot.depth,
                left_bound: slot.left,
                right_bound: slot.left + 1,
                tree_id: slot.tree_id,
            },
        };
        let idx = self.arena.insert(GroupNode {
            group,
            parent: parent_idx,
            children: Vec::new(),
        });
        self.by_id.insert(id, idx);
        if let Some(p) = parent_idx {
            self.attach_child(p, idx);
        }
        debug!(
            "inserted group {} into tree {} at ({}, {})",
            id,
            slot.tree_id,
            slot.left,
            slot.left + 1
        );
        Ok(id)
    }

    /// Apply caller-editable field changes. A rename re-sorts the node among
    /// its siblings.
    #[instrument(level = "debug", skip(self, changes))]
    pub fn update(&mut self, id: GroupId, changes: GroupChanges) -> DomainResult<()> {
        let idx = self.index_of(id)?;
        let mut errors = changes.validate();
        {
            let current = &self.arena[idx].group;
            let name = changes.name.as_deref().unwrap_or(&current.name);
            let slug = changes.slug.as_deref().unwrap_or(&current.slug);
            errors.extend(self.uniqueness_errors(name, slug, Some(id)));
        }
        errors.into_result()?;
        if changes.name.is_some() && self.arena[idx].parent.is_some() {
            self.span(idx)?;
        }

        let renamed = {
            let group = &mut self.arena[idx].group;
            let renamed = changes.name.as_ref().is_some_and(|n| *n != group.name);
            if let Some(name) = changes.name {
                group.name = name;
            }
            if let Some(slug) = changes.slug {
                group.slug = slug;
            }
            if let Some(description) = changes.description {
                group.description = description;
            }
            renamed
        };

        if renamed {
            if let Some(parent) = self.arena[idx].parent {
                self.relocate(idx, Some(parent));
            }
        }
        Ok(())
    }

    /// Re-parent a group together with its whole subtree.
    ///
    /// `None` turns the group into the root of a new tree. Moving a group
    /// under itself or one of its descendants is rejected and leaves the
    /// forest untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn move_to(&mut self, id: GroupId, new_parent: Option<GroupId>) -> DomainResult<()> {
        let idx = self.index_of(id)?;
        let target = match new_parent {
            Some(pid) => {
                let pidx = self.by_id.get(&pid).copied().ok_or_else(|| {
                    DomainError::validation("parent", format!("unknown tenant group {pid}"))
                })?;
                if pidx == idx || self.has_ancestor(pidx, idx) {
                    return Err(DomainError::validation(
                        "parent",
                        "cannot assign self or child tenant group as parent",
                    ));
                }
                Some(pidx)
            }
            None => None,
        };

        if self.arena[idx].parent == target {
            trace!("group {} already under requested parent", id);
            return Ok(());
        }
        self.span(idx)?;
        if let Some(t) = target {
            self.span(t)?;
        }
        self.relocate(idx, target);
        Ok(())
    }

    /// Delete a group.
    ///
    /// Without `cascade`, a group that still has children is protected. With
    /// `cascade`, the whole subtree goes. Returns the removed records in
    /// pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: GroupId, cascade: bool) -> DomainResult<Vec<TenantGroup>> {
        let idx = self.index_of(id)?;
        let node = &self.arena[idx];
        if !cascade && !node.children.is_empty() {
            return Err(DomainError::Protected {
                kind: KIND,
                repr: node.group.name.clone(),
                dependents: node.children.len(),
            });
        }

        let width = self.span(idx)?;
        let subtree = self.subtree_indices(idx);
        let skip: HashSet<Index> = subtree.iter().copied().collect();
        let position = self.arena[idx].group.position;

        if let Some(parent) = self.arena[idx].parent {
            self.arena[parent].children.retain(|&c| c != idx);
            self.close_gap(position.tree_id, position.right_bound, width, &skip);
        }

        let mut removed = Vec::with_capacity(subtree.len());
        for i in subtree {
            if let Some(node) = self.arena.remove(i) {
                self.by_id.remove(&node.group.id);
                removed.push(node.group);
            }
        }
        debug!("deleted {} group(s) from tree {}", removed.len(), position.tree_id);
        Ok(removed)
    }

    /// Recompute every node's bookkeeping from parent links alone.
    ///
    /// Roots are ordered by name and numbered `1..=n`; each tree is numbered
    /// depth-first. Running it twice yields identical bookkeeping. Unknown
    /// parents or parent cycles are rejected without touching the forest.
    #[instrument(level = "debug", skip(self))]
    pub fn rebuild(&mut self) -> DomainResult<()> {
        let mut staged = self.clone();
        staged.link_from_parent_ids()?;

        let mut roots: Vec<Index> = staged
            .arena
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| i)
            .collect();
        staged.sort_by_name(&mut roots);

        let mut positions: HashMap<Index, TreePosition> = HashMap::with_capacity(staged.len());
        for (n, &root) in roots.iter().enumerate() {
            let tree_id = n as u32 + 1;
            let mut counter = 1;
            // (node, depth, children already numbered)
            let mut stack = vec![(root, 0u32, false)];
            while let Some((current, depth, visited)) = stack.pop() {
                if visited {
                    if let Some(pos) = positions.get_mut(&current) {
                        pos.right_bound = counter;
                    }
                    counter += 1;
                    continue;
                }
                positions.insert(
                    current,
                    TreePosition {
                        depth,
                        left_bound: counter,
                        right_bound: 0,
                        tree_id,
                    },
                );
                counter += 1;
                stack.push((current, depth, true));
                for &child in staged.arena[current].children.iter().rev() {
                    stack.push((child, depth + 1, false));
                }
            }
        }

        for (idx, position) in positions {
            staged.arena[idx].group.position = position;
        }
        *self = staged;
        debug!("rebuilt {} tree(s) with {} group(s)", roots.len(), self.len());
        Ok(())
    }

    // ============================================================
    // TRAVERSAL
    // ============================================================

    /// Direct children, ordered by name.
    pub fn children_of(&self, id: GroupId) -> DomainResult<Children<'_>> {
        let idx = self.index_of(id)?;
        Ok(Children {
            tree: self,
            inner: self.arena[idx].children.iter(),
        })
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors_of(&self, id: GroupId) -> DomainResult<Ancestors<'_>> {
        let idx = self.index_of(id)?;
        let mut chain = Vec::new();
        let mut current = self.arena[idx].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.arena[p].parent;
        }
        Ok(Ancestors { tree: self, chain })
    }

    /// All descendants in pre-order (ascending `left_bound`).
    pub fn descendants_of(&self, id: GroupId) -> DomainResult<Descendants<'_>> {
        let idx = self.index_of(id)?;
        Ok(Descendants::new(self, self.arena[idx].children.clone()))
    }

    /// Every group of every tree, roots ordered by name, each tree in
    /// pre-order.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants::new(self, self.root_indices())
    }

    /// Root groups ordered by name.
    pub fn roots(&self) -> impl Iterator<Item = &TenantGroup> + '_ {
        self.root_indices()
            .into_iter()
            .map(move |idx| &self.arena[idx].group)
    }

    /// Size of the subtree below `id`, read from its bounds.
    pub fn descendant_count(&self, id: GroupId) -> DomainResult<usize> {
        let idx = self.index_of(id)?;
        Ok(((self.span(idx)? - 2) / 2) as usize)
    }

    /// True if `candidate` lies strictly inside `ancestor`'s subtree.
    pub fn is_descendant_of(&self, candidate: GroupId, ancestor: GroupId) -> DomainResult<bool> {
        let c = self.index_of(candidate)?;
        let a = self.index_of(ancestor)?;
        Ok(self.is_descendant(c, a))
    }

    /// Verify the nested-set invariants against the parent/child links.
    pub fn check_integrity(&self) -> DomainResult<()> {
        let mut tree_ids = HashSet::new();
        for root in self.root_indices() {
            let g = &self.arena[root].group;
            if !tree_ids.insert(g.position.tree_id) {
                return Err(DomainError::InconsistentTree(format!(
                    "tree id {} shared by more than one root",
                    g.position.tree_id
                )));
            }
            if g.position.left_bound != 1 || g.position.depth != 0 {
                return Err(DomainError::InconsistentTree(format!(
                    "root '{}' does not start at bound 1, depth 0",
                    g.name
                )));
            }
        }

        for (_, node) in self.arena.iter() {
            let g = &node.group;
            let pos = g.position;
            if pos.left_bound >= pos.right_bound {
                return Err(DomainError::InconsistentTree(format!(
                    "'{}' has left bound {} not below right bound {}",
                    g.name, pos.left_bound, pos.right_bound
                )));
            }
            if let Some(p) = node.parent {
                let parent = &self.arena[p].group;
                if parent.position.tree_id != pos.tree_id || parent.position.depth + 1 != pos.depth
                {
                    return Err(DomainError::InconsistentTree(format!(
                        "'{}' disagrees with parent '{}' on tree or depth",
                        g.name, parent.name
                    )));
                }
            }
            // children tile the interior of the parent interval, in name order
            let mut expected = pos.left_bound + 1;
            let mut previous: Option<&str> = None;
            for &c in &node.children {
                let child = &self.arena[c].group;
                if child.position.left_bound != expected {
                    return Err(DomainError::InconsistentTree(format!(
                        "'{}' expected left bound {} but has {}",
                        child.name, expected, child.position.left_bound
                    )));
                }
                if previous.is_some_and(|prev| prev > child.name.as_str()) {
                    return Err(DomainError::InconsistentTree(format!(
                        "children of '{}' are not ordered by name",
                        g.name
                    )));
                }
                previous = Some(&child.name);
                expected = child.position.right_bound + 1;
            }
            if expected != pos.right_bound {
                return Err(DomainError::InconsistentTree(format!(
                    "'{}' right bound {} does not close its children (expected {})",
                    g.name, pos.right_bound, expected
                )));
            }
        }
        Ok(())
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    fn index_of(&self, id: GroupId) -> DomainResult<Index> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or_else(|| DomainError::not_found(KIND, id))
    }

    /// Number of bounds the node's subtree occupies, itself included.
    /// Bookkeeping that cannot describe a subtree (missing, or loaded without
    /// a `rebuild`) is reported instead of being computed with.
    fn span(&self, idx: Index) -> DomainResult<u32> {
        let group = &self.arena[idx].group;
        let pos = group.position;
        let well_formed = pos.left_bound > 0
            && pos.right_bound > pos.left_bound
            && (pos.right_bound - pos.left_bound) % 2 == 1;
        if !well_formed {
            return Err(DomainError::InconsistentTree(format!(
                "'{}' has bounds [{}, {}]; run rebuild",
                group.name, pos.left_bound, pos.right_bound
            )));
        }
        Ok(pos.right_bound - pos.left_bound + 1)
    }

    /// Walks parent links, so it holds even while bounds are stale.
    fn has_ancestor(&self, idx: Index, ancestor: Index) -> bool {
        let mut current = self.arena[idx].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.arena[p].parent;
        }
        false
    }

    fn uniqueness_errors(&self, name: &str, slug: &str, exclude: Option<GroupId>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (_, node) in self.arena.iter() {
            let g = &node.group;
            if Some(g.id) == exclude {
                continue;
            }
            if g.name == name {
                errors.push("name", "tenant group with this name already exists");
            }
            if g.slug == slug {
                errors.push("slug", "tenant group with this slug already exists");
            }
        }
        errors
    }

    fn root_indices(&self) -> Vec<Index> {
        let mut roots: Vec<Index> = self
            .arena
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| i)
            .collect();
        self.sort_by_name(&mut roots);
        roots
    }

    fn sort_by_name(&self, indices: &mut [Index]) {
        indices.sort_by(|a, b| self.arena[*a].group.name.cmp(&self.arena[*b].group.name));
    }

    fn next_tree_id(&self) -> u32 {
        self.arena
            .iter()
            .map(|(_, n)| n.group.position.tree_id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn is_descendant(&self, candidate: Index, ancestor: Index) -> bool {
        let c = self.arena[candidate].group.position;
        let a = self.arena[ancestor].group.position;
        c.tree_id == a.tree_id && c.left_bound > a.left_bound && c.right_bound < a.right_bound
    }

    /// Smallest position under `parent` consistent with name order among
    /// the parent's current children.
    fn slot_for(&self, parent: Option<Index>, name: &str) -> Slot {
        match parent {
            None => Slot {
                tree_id: self.next_tree_id(),
                left: 1,
                depth: 0,
            },
            Some(p) => {
                let parent = &self.arena[p];
                let left = parent
                    .children
                    .iter()
                    .map(|&c| &self.arena[c].group)
                    .take_while(|sibling| sibling.name.as_str() < name)
                    .last()
                    .map(|sibling| sibling.position.right_bound + 1)
                    .unwrap_or(parent.group.position.left_bound + 1);
                Slot {
                    tree_id: parent.group.position.tree_id,
                    left,
                    depth: parent.group.position.depth + 1,
                }
            }
        }
    }

    fn attach_child(&mut self, parent: Index, child: Index) {
        let at = {
            let name = &self.arena[child].group.name;
            self.arena[parent]
                .children
                .partition_point(|&c| self.arena[c].group.name < *name)
        };
        self.arena[parent].children.insert(at, child);
    }

    /// Shift bounds at or after `at` in `tree_id` up by `width`.
    fn open_gap(&mut self, tree_id: u32, at: u32, width: u32, skip: &HashSet<Index>) {
        let mut touched = 0usize;
        for (idx, node) in self.arena.iter_mut() {
            let pos = &mut node.group.position;
            if pos.tree_id != tree_id || skip.contains(&idx) {
                continue;
            }
            if pos.left_bound >= at {
                pos.left_bound += width;
            }
            if pos.right_bound >= at {
                pos.right_bound += width;
                touched += 1;
            }
        }
        trace!("opened gap of {} at {} in tree {} ({} nodes)", width, at, tree_id, touched);
    }

    /// Shift bounds after `after` in `tree_id` down by `width`.
    fn close_gap(&mut self, tree_id: u32, after: u32, width: u32, skip: &HashSet<Index>) {
        let mut touched = 0usize;
        for (idx, node) in self.arena.iter_mut() {
            let pos = &mut node.group.position;
            if pos.tree_id != tree_id || skip.contains(&idx) {
                continue;
            }
            if pos.left_bound > after {
                pos.left_bound = pos.left_bound.saturating_sub(width);
            }
            if pos.right_bound > after {
                pos.right_bound = pos.right_bound.saturating_sub(width);
                touched += 1;
            }
        }
        trace!("closed gap of {} after {} in tree {} ({} nodes)", width, after, tree_id, touched);
    }

    /// `idx` followed by its descendants in pre-order.
    fn subtree_indices(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.arena[current].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Detach the subtree rooted at `idx` and re-insert it under `target`.
    /// Callers have ruled out cycles and checked the node's bounds.
    fn relocate(&mut self, idx: Index, target: Option<Index>) {
        let old_parent = self.arena[idx].parent;
        if old_parent.is_none() && target.is_none() {
            return;
        }

        let subtree = self.subtree_indices(idx);
        let skip: HashSet<Index> = subtree.iter().copied().collect();
        let old = self.arena[idx].group.position;
        let width = old.right_bound - old.left_bound + 1;

        if let Some(p) = old_parent {
            self.arena[p].children.retain(|&c| c != idx);
            self.close_gap(old.tree_id, old.right_bound, width, &skip);
        }

        let slot = {
            let name = self.arena[idx].group.name.clone();
            self.slot_for(target, &name)
        };
        if target.is_some() {
            self.open_gap(slot.tree_id, slot.left, width, &skip);
        }

        let offset = i64::from(slot.left) - i64::from(old.left_bound);
        let depth_delta = i64::from(slot.depth) - i64::from(old.depth);
        for &i in &subtree {
            let pos = &mut self.arena[i].group.position;
            pos.left_bound = shifted(pos.left_bound, offset);
            pos.right_bound = shifted(pos.right_bound, offset);
            pos.depth = shifted(pos.depth, depth_delta);
            pos.tree_id = slot.tree_id;
        }

        let target_id = target.map(|t| self.arena[t].group.id);
        let node = &mut self.arena[idx];
        node.parent = target;
        node.group.parent = target_id;
        if let Some(t) = target {
            self.attach_child(t, idx);
        }
        debug!(
            "relocated {} node(s) to tree {} at {}",
            subtree.len(),
            slot.tree_id,
            slot.left
        );
    }

    /// Resolve `group.parent` ids into arena links and sorted child lists.
    fn link_from_parent_ids(&mut self) -> DomainResult<()> {
        let mut links = Vec::with_capacity(self.arena.len());
        let mut errors = ValidationErrors::new();
        for (idx, node) in self.arena.iter() {
            let parent = match node.group.parent {
                Some(pid) => match self.by_id.get(&pid) {
                    Some(&p) => Some(p),
                    None => {
                        errors.push(
                            "parent",
                            format!("'{}' references unknown tenant group {pid}", node.group.name),
                        );
                        None
                    }
                },
                None => None,
            };
            links.push((idx, parent));
        }
        errors.into_result()?;

        for (_, node) in self.arena.iter_mut() {
            node.children.clear();
        }
        for &(idx, parent) in &links {
            self.arena[idx].parent = parent;
            if let Some(p) = parent {
                self.arena[p].children.push(idx);
            }
        }
        let parents: Vec<Index> = self.arena.iter().map(|(i, _)| i).collect();
        for p in parents {
            let mut children = std::mem::take(&mut self.arena[p].children);
            self.sort_by_name(&mut children);
            self.arena[p].children = children;
        }
        self.reject_cycles()
    }

    /// Every node must hang below a root; the rest sit on a parent cycle.
    fn reject_cycles(&self) -> DomainResult<()> {
        let reached: HashSet<Index> = self
            .root_indices()
            .into_iter()
            .flat_map(|root| self.subtree_indices(root))
            .collect();
        match self.arena.iter().find(|(i, _)| !reached.contains(i)) {
            Some((_, node)) => Err(DomainError::validation(
                "parent",
                format!("parent links of '{}' form a cycle", node.group.name),
            )),
            None => Ok(()),
        }
    }
}

fn shifted(value: u32, delta: i64) -> u32 {
    u32::try_from(i64::from(value) + delta).unwrap_or(0)
}

impl TryFrom<Vec<TenantGroup>> for GroupTree {
    type Error = DomainError;

    fn try_from(records: Vec<TenantGroup>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

impl From<GroupTree> for Vec<TenantGroup> {
    fn from(tree: GroupTree) -> Self {
        tree.iter().cloned().collect()
    }
}

// ============================================================
// ITERATORS
// ============================================================

/// Direct children of a group.
pub struct Children<'a> {
    tree: &'a GroupTree,
    inner: std::slice::Iter<'a, Index>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a TenantGroup;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|&idx| &self.tree.arena[idx].group)
    }
}

/// Ancestors of a group, root first.
pub struct Ancestors<'a> {
    tree: &'a GroupTree,
    /// Nearest ancestor first; consumed from the back.
    chain: Vec<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TenantGroup;

    fn next(&mut self) -> Option<Self::Item> {
        self.chain.pop().map(|idx| &self.tree.arena[idx].group)
    }
}

/// Pre-order walk over one or more subtrees.
pub struct Descendants<'a> {
    tree: &'a GroupTree,
    stack: Vec<Index>,
}

impl<'a> Descendants<'a> {
    fn new(tree: &'a GroupTree, mut starts: Vec<Index>) -> Self {
        // Push in reverse order for left-to-right traversal
        starts.reverse();
        Self {
            tree,
            stack: starts,
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a TenantGroup;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = &self.tree.arena[current];
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(&node.group)
    }
}
