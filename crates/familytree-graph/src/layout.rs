use crate::tree::FamilyTree;
use crate::{Rect, Vec2};
use familytree_core::{LayoutDirection, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub trait Layouter {
    /// Assign a position to every currently visible node.
    fn layout(&self, tree: &FamilyTree) -> TreeLayout;
}

/// Positions of the visible nodes, in the pre-order they were laid out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    order: Vec<NodeId>,
    positions: HashMap<NodeId, Vec2>,
}

impl TreeLayout {
    pub fn get(&self, id: NodeId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Vec2)> + '_ {
        self.order.iter().map(|id| (*id, self.positions[id]))
    }

    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.positions.values().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Extent along the sibling axis.
    pub breadth: f32,
    /// Extent along the depth axis, root to deepest visible level.
    pub depth: f32,
    /// Shift applied to every node along the depth axis.
    pub depth_offset: f32,
    pub direction: LayoutDirection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::for_viewport(1200.0, 800.0, LayoutDirection::Vertical)
    }
}

impl LayoutConfig {
    pub const HORIZONTAL_INSET: f32 = 200.0;
    pub const VERTICAL_INSET: f32 = 300.0;
    pub const DEPTH_OFFSET: f32 = 50.0;

    /// Fit the tree inside a `width` x `height` viewport, leaving the
    /// standard insets free for labels.
    pub fn for_viewport(width: f32, height: f32, direction: LayoutDirection) -> Self {
        Self::with_insets(
            width,
            height,
            (Self::HORIZONTAL_INSET, Self::VERTICAL_INSET),
            Self::DEPTH_OFFSET,
            direction,
        )
    }

    /// Like [`LayoutConfig::for_viewport`] with explicit
    /// `(horizontal, vertical)` insets and depth offset.
    pub fn with_insets(
        width: f32,
        height: f32,
        insets: (f32, f32),
        depth_offset: f32,
        direction: LayoutDirection,
    ) -> Self {
        let usable_w = (width - insets.0).max(1.0);
        let usable_h = (height - insets.1).max(1.0);
        let (breadth, depth) = match direction {
            LayoutDirection::Vertical => (usable_w, usable_h),
            LayoutDirection::Horizontal => (usable_h, usable_w),
        };
        Self {
            breadth,
            depth,
            depth_offset,
            direction,
        }
    }
}

/// Tidy tree layout.
///
/// Layout leaves (nodes showing no children) take successive slots along the
/// breadth axis, one slot apart between siblings and two apart between
/// cousins. A parent sits midway between its first and last visible child,
/// which keeps siblings apart and parents inside their subtree's span.
/// Depth maps linearly onto the depth axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyTreeLayouter {
    pub config: LayoutConfig,
}

impl TidyTreeLayouter {
    const SIBLING_SEPARATION: f32 = 1.0;
    const COUSIN_SEPARATION: f32 = 2.0;

    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Breadth slot per visible node before scaling.
    fn slots(tree: &FamilyTree, order: &[NodeId]) -> HashMap<NodeId, f32> {
        let mut slots = HashMap::with_capacity(order.len());
        let mut cursor = 0.0;
        let mut previous_leaf: Option<NodeId> = None;

        for &id in order {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if !node.children().visible().is_empty() {
                continue;
            }
            if let Some(prev) = previous_leaf {
                let prev_parent = tree.node(prev).and_then(|n| n.parent);
                cursor += if prev_parent == node.parent {
                    Self::SIBLING_SEPARATION
                } else {
                    Self::COUSIN_SEPARATION
                };
            }
            slots.insert(id, cursor);
            previous_leaf = Some(id);
        }

        // Children precede parents in reverse pre-order.
        for &id in order.iter().rev() {
            let visible = tree
                .node(id)
                .map(|n| n.children().visible())
                .unwrap_or_default();
            if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
                let mid = (slots[first] + slots[last]) * 0.5;
                slots.insert(id, mid);
            }
        }
        slots
    }
}

impl Layouter for TidyTreeLayouter {
    fn layout(&self, tree: &FamilyTree) -> TreeLayout {
        let order = tree.visible_nodes();
        let slots = Self::slots(tree, &order);

        let (min_slot, max_slot) = slots
            .values()
            .fold((f32::MAX, f32::MIN), |(lo, hi), s| (lo.min(*s), hi.max(*s)));
        // Half a slot of padding on each side, so a lone node sits centred.
        let span = max_slot - min_slot + 1.0;
        let root_depth = tree.node(tree.root()).map(|n| n.depth).unwrap_or_default();
        let max_depth = order
            .iter()
            .filter_map(|id| tree.node(*id))
            .map(|n| n.depth - root_depth)
            .max()
            .unwrap_or_default()
            .max(1);

        let cfg = &self.config;
        let positions: HashMap<NodeId, Vec2> = order
            .iter()
            .map(|&id| {
                let depth = tree.node(id).map(|n| n.depth - root_depth).unwrap_or_default();
                let breadth = (slots[&id] - min_slot + 0.5) / span * cfg.breadth;
                let along = depth as f32 / max_depth as f32 * cfg.depth + cfg.depth_offset;
                let pos = match cfg.direction {
                    LayoutDirection::Vertical => Vec2::new(breadth, along),
                    LayoutDirection::Horizontal => Vec2::new(along, breadth),
                };
                (id, pos)
            })
            .collect();

        tracing::debug!("Laid out {} visible nodes", order.len());
        TreeLayout { order, positions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{parents_strategy, sample_tree, tree_from_parents};
    use familytree_core::CollapsePolicy;
    use proptest::prelude::*;

    fn layouter() -> TidyTreeLayouter {
        TidyTreeLayouter::new(LayoutConfig {
            breadth: 100.0,
            depth: 100.0,
            depth_offset: 0.0,
            direction: LayoutDirection::Vertical,
        })
    }

    #[test]
    fn test_single_node_is_centred() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::AllCollapsed);
        let layout = layouter().layout(&tree);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.get(tree.root()), Some(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_parent_centred_over_children() {
        let mut tree = sample_tree();
        tree.expand_all();
        let layout = layouter().layout(&tree);
        assert_eq!(layout.len(), 4);

        // Leaves: Alice at slot 0, Carol at slot 2 (cousin gap). Bob sits over
        // Carol, Root between Alice and Bob.
        let ids: Vec<NodeId> = tree.visible_nodes();
        let (root, alice, bob, carol) = (ids[0], ids[1], ids[2], ids[3]);
        let x = |id| layout.get(id).unwrap().x;
        assert_eq!(x(bob), x(carol));
        assert!((x(root) - (x(alice) + x(bob)) * 0.5).abs() < 1e-4);
        assert!(x(alice) < x(bob));

        let y = |id| layout.get(id).unwrap().y;
        assert_eq!(y(root), 0.0);
        assert_eq!(y(alice), 50.0);
        assert_eq!(y(carol), 100.0);
    }

    #[test]
    fn test_horizontal_swaps_axes() {
        let mut tree = sample_tree();
        tree.initialize(CollapsePolicy::RootExpanded);
        let mut config = layouter().config;
        config.direction = LayoutDirection::Horizontal;
        config.depth_offset = 50.0;
        let layout = TidyTreeLayouter::new(config).layout(&tree);

        let root = layout.get(tree.root()).unwrap();
        assert_eq!(root.x, 50.0);
        for (id, pos) in layout.iter() {
            if id != tree.root() {
                assert_eq!(pos.x, 150.0);
            }
        }
    }

    #[test]
    fn test_for_viewport_applies_insets() {
        let config = LayoutConfig::for_viewport(1200.0, 800.0, LayoutDirection::Vertical);
        assert_eq!(config.breadth, 1000.0);
        assert_eq!(config.depth, 500.0);
        assert_eq!(config.depth_offset, 50.0);

        let tiny = LayoutConfig::for_viewport(10.0, 10.0, LayoutDirection::Horizontal);
        assert_eq!(tiny.breadth, 1.0);
        assert_eq!(tiny.depth, 1.0);
    }

    proptest! {
        #[test]
        fn prop_siblings_never_overlap(parents in parents_strategy()) {
            let mut tree = tree_from_parents(&parents);
            tree.expand_all();
            let layout = layouter().layout(&tree);
            prop_assert_eq!(layout.len(), tree.len());

            for node in tree.nodes() {
                let xs: Vec<f32> = node
                    .children()
                    .visible()
                    .iter()
                    .map(|c| layout.get(*c).unwrap().x)
                    .collect();
                for pair in xs.windows(2) {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }

        #[test]
        fn prop_depth_is_monotonic(parents in parents_strategy()) {
            let mut tree = tree_from_parents(&parents);
            tree.expand_all();
            let layout = layouter().layout(&tree);
            for (parent, child) in tree.visible_links() {
                prop_assert!(layout.get(parent).unwrap().y < layout.get(child).unwrap().y);
            }
            let bounds = layout.bounds().unwrap();
            prop_assert!(bounds.min.x >= 0.0 && bounds.max.x <= 100.0);
        }
    }
}
