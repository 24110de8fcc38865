use crate::Vec2;
use familytree_core::{CollapsePolicy, NodeId, RecordId, Spouse};
use std::collections::HashMap;

/// Visibility state of a node's children.
///
/// A node either shows its children, hides them, or has none. The "both
/// lists populated" state cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    Leaf,
    Expanded(Vec<NodeId>),
    Collapsed(Vec<NodeId>),
}

impl Children {
    /// Children start out visible; an empty list is a leaf.
    pub fn from_ids(ids: Vec<NodeId>) -> Self {
        if ids.is_empty() {
            Children::Leaf
        } else {
            Children::Expanded(ids)
        }
    }

    /// Every child regardless of visibility.
    pub fn all(&self) -> &[NodeId] {
        match self {
            Children::Leaf => &[],
            Children::Expanded(ids) | Children::Collapsed(ids) => ids,
        }
    }

    pub fn visible(&self) -> &[NodeId] {
        match self {
            Children::Expanded(ids) => ids,
            _ => &[],
        }
    }

    pub fn hidden(&self) -> &[NodeId] {
        match self {
            Children::Collapsed(ids) => ids,
            _ => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Children::Leaf)
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Children::Expanded(_))
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Children::Collapsed(_))
    }

    fn collapse(&mut self) -> bool {
        if let Children::Expanded(ids) = self {
            let ids = std::mem::take(ids);
            *self = Children::Collapsed(ids);
            true
        } else {
            false
        }
    }

    fn expand(&mut self) -> bool {
        if let Children::Collapsed(ids) = self {
            let ids = std::mem::take(ids);
            *self = Children::Expanded(ids);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    /// Id from the source document; nested documents may omit it.
    pub record_id: Option<RecordId>,
    pub name: String,
    pub spouse: Option<Spouse>,
    /// Lookup only. Never walked during forward iteration.
    pub parent: Option<NodeId>,
    pub depth: usize,
    /// Position from the previous layout pass, the origin of transitions.
    pub last_position: Option<Vec2>,
    children: Children,
}

impl TreeNode {
    pub(crate) fn new(
        id: NodeId,
        record_id: Option<RecordId>,
        name: String,
        spouse: Option<Spouse>,
    ) -> Self {
        Self {
            id,
            record_id,
            name,
            spouse,
            parent: None,
            depth: 0,
            last_position: None,
            children: Children::Leaf,
        }
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn is_married(&self) -> bool {
        self.spouse.as_ref().is_some_and(Spouse::is_married)
    }

    pub(crate) fn set_children(&mut self, children: Children) {
        self.children = children;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    /// The node is a leaf.
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeBehavior {
    /// Expanding a node re-collapses each newly shown child, so a click
    /// reveals exactly one more level.
    pub collapse_children_on_expand: bool,
}

/// A rooted family tree stored as a flat node table.
///
/// Nodes are addressed by [`NodeId`], which is the index into the table.
/// Only the expanded/collapsed partition of each node's children changes
/// after construction.
#[derive(Debug, Clone)]
pub struct FamilyTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
    by_record: HashMap<RecordId, NodeId>,
}

impl FamilyTree {
    /// Assemble a tree from nodes whose `parent`, `depth` and children are
    /// already wired. Callers guarantee a single root at `root`.
    pub(crate) fn from_parts(nodes: Vec<TreeNode>, root: NodeId) -> Self {
        let mut by_record = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            if let Some(record_id) = &node.record_id {
                by_record.entry(record_id.clone()).or_insert(node.id);
            }
        }
        Self {
            nodes,
            root,
            by_record,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    pub fn find_by_record(&self, record_id: &RecordId) -> Option<NodeId> {
        self.by_record.get(record_id).copied()
    }

    /// Apply the startup collapse policy to the whole tree.
    pub fn initialize(&mut self, policy: CollapsePolicy) {
        let root = self.root;
        for node in &mut self.nodes {
            if node.id == root && policy == CollapsePolicy::RootExpanded {
                node.children.expand();
            } else {
                node.children.collapse();
            }
        }
        tracing::debug!("Initialized tree of {} nodes with {:?}", self.len(), policy);
    }

    /// Flip a node between expanded and collapsed. Returns `None` for an
    /// unknown id.
    pub fn toggle(&mut self, id: NodeId, behavior: TreeBehavior) -> Option<ToggleOutcome> {
        let node = self.nodes.get_mut(id.0)?;
        let outcome = if node.children.collapse() {
            ToggleOutcome::Collapsed
        } else if node.children.expand() {
            ToggleOutcome::Expanded
        } else {
            ToggleOutcome::Unchanged
        };

        if outcome == ToggleOutcome::Expanded && behavior.collapse_children_on_expand {
            let shown = node.children.visible().to_vec();
            for child in shown {
                self.nodes[child.0].children.collapse();
            }
        }
        Some(outcome)
    }

    /// Collapse every expanded node. Returns how many nodes changed.
    pub fn collapse_all(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| node.children.collapse())
            .filter(|changed| *changed)
            .count()
    }

    /// Expand every collapsed node. Returns how many nodes changed.
    pub fn expand_all(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| node.children.expand())
            .filter(|changed| *changed)
            .count()
    }

    /// Reveal `target` and nothing else.
    ///
    /// The whole tree is collapsed, each ancestor from the root down is
    /// expanded, and the target shows its own children one level deep.
    /// Returns the target, or `None` when there is nothing to reveal.
    pub fn expand_path_to(&mut self, target: Option<NodeId>) -> Option<NodeId> {
        let target = target.filter(|id| self.contains(*id))?;
        self.collapse_all();

        for ancestor in self.ancestors(target).into_iter().rev() {
            self.nodes[ancestor.0].children.expand();
        }

        if self.nodes[target.0].children.expand() {
            let shown = self.nodes[target.0].children.visible().to_vec();
            for child in shown {
                self.nodes[child.0].children.collapse();
            }
        }
        Some(target)
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.nodes[parent.0].parent;
        }
        chain
    }

    /// Every node in pre-order, following hidden and visible children alike.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.walk(|children| children.all())
    }

    /// Nodes currently rendered, in pre-order.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        self.walk(|children| children.visible())
    }

    /// `(parent, child)` pairs for every rendered edge, in pre-order of the
    /// child.
    pub fn visible_links(&self) -> Vec<(NodeId, NodeId)> {
        self.visible_nodes()
            .into_iter()
            .filter_map(|id| self.nodes[id.0].parent.map(|parent| (parent, id)))
            .collect()
    }

    /// True when every ancestor of `id` shows its children.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.contains(id)
            && self
                .ancestors(id)
                .iter()
                .all(|a| self.nodes[a.0].children.is_expanded())
    }

    /// Store the positions of the pass that was just laid out.
    pub fn record_positions(&mut self, positions: impl IntoIterator<Item = (NodeId, Vec2)>) {
        for (id, pos) in positions {
            if let Some(node) = self.nodes.get_mut(id.0) {
                node.last_position = Some(pos);
            }
        }
    }

    fn walk<'a>(&'a self, next: impl Fn(&'a Children) -> &'a [NodeId]) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(next(&self.nodes[id.0].children).iter().rev());
        }
        order
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::HierarchyBuilder;
    use familytree_core::PersonRecord;
    use proptest::prelude::*;

    /// Root(1) -> Alice(2), Bob(3); Bob -> Carol(4)
    pub(crate) fn sample_tree() -> FamilyTree {
        let records = vec![
            PersonRecord::new(1, "Root").with_children([2, 3]),
            PersonRecord::new(2, "Alice"),
            PersonRecord::new(3, "Bob").with_children([4]),
            PersonRecord::new(4, "Carol"),
        ];
        HierarchyBuilder::new().build_flat(&records).unwrap().0
    }

    /// Build a tree from a parent table: `parents[i]` is the parent of node
    /// `i + 1`, always an earlier node.
    pub(crate) fn tree_from_parents(parents: &[usize]) -> FamilyTree {
        let mut records: Vec<PersonRecord> = (0..=parents.len())
            .map(|i| PersonRecord::new(i as i64, format!("Person {i}")))
            .collect();
        for (i, &parent) in parents.iter().enumerate() {
            records[parent].children.push(RecordId::from((i + 1) as i64));
        }
        HierarchyBuilder::new().build_flat(&records).unwrap().0
    }

    pub(crate) fn parents_strategy() -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::vec(any::<prop::sample::Index>(), 0..40).prop_map(|picks| {
            picks
                .iter()
                .enumerate()
                .map(|(i, pick)| pick.index(i + 1))
                .collect()
        })
    }

    fn id_of(tree: &FamilyTree, record: i64) -> NodeId {
        tree.find_by_record(&RecordId::from(record)).unwrap()
    }

    #[test]
    fn test_initialize_root_expanded() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::RootExpanded);

        let root = tree.node(tree.root()).unwrap();
        assert!(root.children().is_expanded());
        assert!(tree.node(id_of(&tree, 3)).unwrap().children().is_collapsed());
        assert!(tree.node(id_of(&tree, 2)).unwrap().children().is_leaf());

        let names: Vec<_> = tree
            .visible_nodes()
            .iter()
            .map(|id| tree.node(*id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Root", "Alice", "Bob"]);
    }

    #[test]
    fn test_initialize_all_collapsed() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::AllCollapsed);
        assert_eq!(tree.visible_nodes(), vec![tree.root()]);
        assert!(tree.visible_links().is_empty());
    }

    #[test]
    fn test_toggle_flips_and_leaf_is_unchanged() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::RootExpanded);
        let bob = id_of(&tree, 3);
        let alice = id_of(&tree, 2);

        assert_eq!(
            tree.toggle(bob, TreeBehavior::default()),
            Some(ToggleOutcome::Expanded)
        );
        assert!(tree.is_visible(id_of(&tree, 4)));
        assert_eq!(
            tree.toggle(bob, TreeBehavior::default()),
            Some(ToggleOutcome::Collapsed)
        );
        assert!(!tree.is_visible(id_of(&tree, 4)));
        assert_eq!(
            tree.toggle(alice, TreeBehavior::default()),
            Some(ToggleOutcome::Unchanged)
        );
        assert_eq!(tree.toggle(NodeId(99), TreeBehavior::default()), None);
    }

    #[test]
    fn test_expand_collapses_children_when_configured() {
        // 0 -> 1 -> 2 -> 3
        let mut tree = tree_from_parents(&[0, 1, 2]);
        tree.expand_all();
        let behavior = TreeBehavior {
            collapse_children_on_expand: true,
        };

        tree.toggle(NodeId(0), behavior);
        assert!(tree.node(NodeId(0)).unwrap().children().is_collapsed());
        tree.toggle(NodeId(0), behavior);

        assert!(tree.node(NodeId(0)).unwrap().children().is_expanded());
        assert!(tree.node(NodeId(1)).unwrap().children().is_collapsed());
        // Deeper levels keep whatever state they had.
        assert!(tree.node(NodeId(2)).unwrap().children().is_expanded());
        assert_eq!(tree.visible_nodes(), vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn test_expand_path_to_reveals_only_the_path() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::AllCollapsed);
        let carol = id_of(&tree, 4);

        assert_eq!(tree.expand_path_to(Some(carol)), Some(carol));
        let names: Vec<_> = tree
            .visible_nodes()
            .iter()
            .map(|id| tree.node(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Alice", "Bob", "Carol"]);
        assert!(tree.node(id_of(&tree, 3)).unwrap().children().is_expanded());
    }

    #[test]
    fn test_expand_path_to_none_is_noop() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::RootExpanded);
        let before = tree.visible_nodes();
        assert_eq!(tree.expand_path_to(None), None);
        assert_eq!(tree.expand_path_to(Some(NodeId(42))), None);
        assert_eq!(tree.visible_nodes(), before);
    }

    #[test]
    fn test_expand_path_to_target_children_one_level() {
        // 0 -> 1 -> 2 -> 3, 0 -> 4
        let mut tree = tree_from_parents(&[0, 1, 2, 0]);
        tree.expand_all();

        tree.expand_path_to(Some(NodeId(1)));
        assert!(tree.node(NodeId(1)).unwrap().children().is_expanded());
        assert!(tree.node(NodeId(2)).unwrap().children().is_collapsed());
        assert_eq!(
            tree.visible_nodes(),
            vec![NodeId(0), NodeId(1), NodeId(2), NodeId(4)]
        );
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let tree = sample_tree();
        let carol = id_of(&tree, 4);
        assert_eq!(tree.ancestors(carol), vec![id_of(&tree, 3), id_of(&tree, 1)]);
        assert!(tree.ancestors(tree.root()).is_empty());
    }

    #[test]
    fn test_pre_order_ignores_visibility() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::AllCollapsed);
        let names: Vec<_> = tree
            .pre_order()
            .iter()
            .map(|id| tree.node(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_record_positions_overwrites_previous() {
        let mut tree = sample_tree();
        let root = tree.root();
        tree.record_positions([(root, Vec2::new(1.0, 2.0))]);
        tree.record_positions([(root, Vec2::new(3.0, 4.0))]);
        assert_eq!(
            tree.node(root).unwrap().last_position,
            Some(Vec2::new(3.0, 4.0))
        );
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_partition(
            parents in parents_strategy(),
            pick in any::<prop::sample::Index>(),
            collapse_children in any::<bool>(),
        ) {
            let mut tree = tree_from_parents(&parents);
            tree.initialize(CollapsePolicy::RootExpanded);
            let id = NodeId(pick.index(tree.len()));
            let behavior = TreeBehavior { collapse_children_on_expand: collapse_children };

            let before = tree.node(id).unwrap().children().clone();
            tree.toggle(id, behavior);
            tree.toggle(id, behavior);
            prop_assert_eq!(tree.node(id).unwrap().children(), &before);
        }

        #[test]
        fn prop_collapse_all_hides_everything(parents in parents_strategy()) {
            let mut tree = tree_from_parents(&parents);
            tree.expand_all();
            tree.collapse_all();
            for node in tree.nodes() {
                prop_assert!(node.children().visible().is_empty());
                let has_children = !node.children().all().is_empty();
                prop_assert_eq!(has_children, !node.children().hidden().is_empty());
            }
            prop_assert_eq!(tree.visible_nodes(), vec![tree.root()]);
        }

        #[test]
        fn prop_expand_path_to_keeps_off_path_collapsed(
            parents in parents_strategy(),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut tree = tree_from_parents(&parents);
            tree.expand_all();
            let target = NodeId(pick.index(tree.len()));
            tree.expand_path_to(Some(target));

            let mut path = tree.ancestors(target);
            path.push(target);
            for node in tree.nodes() {
                if path.contains(&node.id) {
                    prop_assert!(!node.children().is_collapsed());
                } else {
                    prop_assert!(!node.children().is_expanded());
                }
            }
            for ancestor in tree.ancestors(target) {
                let visible = tree.node(ancestor).unwrap().children().visible();
                prop_assert!(
                    visible
                        .iter()
                        .any(|c| *c == target || tree.ancestors(target).contains(c))
                );
            }
            prop_assert!(tree.is_visible(target));
        }

        #[test]
        fn prop_children_never_duplicated(parents in parents_strategy()) {
            let tree = tree_from_parents(&parents);
            let mut seen = std::collections::HashSet::new();
            for node in tree.nodes() {
                for child in node.children().all() {
                    prop_assert!(seen.insert(*child));
                }
            }
            prop_assert_eq!(seen.len(), tree.len() - 1);
            prop_assert!(!seen.contains(&tree.root()));
        }
    }
}
