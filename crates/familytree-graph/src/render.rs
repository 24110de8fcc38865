use crate::Vec2;
use crate::layout::TreeLayout;
use crate::tree::{Children, FamilyTree, TreeNode};
use familytree_core::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Where a visual element is in its enter/update/exit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Newly visible: create, then animate in.
    Enter,
    /// Visible before and after: animate to the new position.
    Update,
    /// No longer visible: animate out, then remove.
    Exit,
}

/// Marker drawn inside a node's circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpandGlyph {
    Collapse,
    Expand,
    None,
}

impl ExpandGlyph {
    pub fn for_children(children: &Children) -> Self {
        match children {
            Children::Expanded(_) => ExpandGlyph::Collapse,
            Children::Collapsed(_) => ExpandGlyph::Expand,
            Children::Leaf => ExpandGlyph::None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ExpandGlyph::Collapse => "-",
            ExpandGlyph::Expand => "+",
            ExpandGlyph::None => "",
        }
    }
}

/// Which side of the circle the name label sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelSide {
    /// Right-aligned before the circle; used by nodes with children.
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVisual {
    pub id: NodeId,
    pub name: String,
    pub depth: usize,
    pub phase: Phase,
    pub from: Vec2,
    pub to: Vec2,
    pub glyph: ExpandGlyph,
    pub label_side: LabelSide,
    pub married: bool,
    pub highlighted: bool,
}

impl NodeVisual {
    fn new(node: &TreeNode, phase: Phase, from: Vec2, to: Vec2, highlighted: bool) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            depth: node.depth,
            phase,
            from,
            to,
            glyph: ExpandGlyph::for_children(node.children()),
            label_side: if node.children().is_leaf() {
                LabelSide::After
            } else {
                LabelSide::Before
            },
            married: node.is_married(),
            highlighted,
        }
    }
}

/// An edge from `source` to `target`. Edges are keyed by their target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkVisual {
    pub source: NodeId,
    pub target: NodeId,
    pub phase: Phase,
    pub from: (Vec2, Vec2),
    pub to: (Vec2, Vec2),
}

/// Everything a sink needs to draw one re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Node whose action triggered this render.
    pub anchor: NodeId,
    pub nodes: Vec<NodeVisual>,
    pub links: Vec<LinkVisual>,
    pub transition_ms: u64,
}

impl RenderFrame {
    pub fn nodes_in(&self, phase: Phase) -> impl Iterator<Item = &NodeVisual> {
        self.nodes.iter().filter(move |n| n.phase == phase)
    }

    pub fn links_in(&self, phase: Phase) -> impl Iterator<Item = &LinkVisual> {
        self.links.iter().filter(move |l| l.phase == phase)
    }

    /// Nodes still on screen once the transition ends.
    pub fn visible_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.phase != Phase::Exit).count()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeVisual> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Draws frames. Clicks are reported back as node ids; the sink never
/// decides expand/collapse itself.
pub trait RenderSink {
    fn render(&mut self, frame: &RenderFrame);
}

impl<T: RenderSink + ?Sized> RenderSink for &mut T {
    fn render(&mut self, frame: &RenderFrame) {
        (**self).render(frame);
    }
}

/// Diffs consecutive layouts by node id into enter/update/exit visuals.
#[derive(Debug, Clone, Default)]
pub struct RenderPlanner {
    pub transition_ms: u64,
    rendered: Vec<NodeId>,
}

impl RenderPlanner {
    pub const DEFAULT_TRANSITION_MS: u64 = 200;

    pub fn new(transition_ms: u64) -> Self {
        Self {
            transition_ms,
            rendered: Vec::new(),
        }
    }

    /// Nodes on screen after the last planned frame.
    pub fn rendered(&self) -> &[NodeId] {
        &self.rendered
    }

    /// Forget the previous frame so the next one enters everything.
    pub fn reset(&mut self) {
        self.rendered.clear();
    }

    /// Plan the transition from the previous frame to `layout`.
    ///
    /// Previous positions are read from the tree before being overwritten
    /// with the new layout, so the next frame animates from here.
    pub fn plan(
        &mut self,
        tree: &mut FamilyTree,
        layout: &TreeLayout,
        anchor: NodeId,
        highlight: Option<NodeId>,
    ) -> RenderFrame {
        let previous: HashSet<NodeId> = self.rendered.iter().copied().collect();
        let mut nodes = Vec::with_capacity(layout.len() + previous.len());

        for (id, to) in layout.iter() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let (phase, from) = match node.last_position {
                Some(last) if previous.contains(&id) => (Phase::Update, last),
                _ => {
                    let origin = Self::enter_origin(tree, id, &previous).unwrap_or(to);
                    (Phase::Enter, origin)
                }
            };
            nodes.push(NodeVisual::new(node, phase, from, to, highlight == Some(id)));
        }

        for &id in &self.rendered {
            if layout.contains(id) {
                continue;
            }
            let Some(node) = tree.node(id) else {
                continue;
            };
            let from = node.last_position.unwrap_or_default();
            let to = Self::exit_target(tree, id, layout).unwrap_or(from);
            nodes.push(NodeVisual::new(node, Phase::Exit, from, to, false));
        }

        let links = Self::plan_links(tree, &nodes);

        tracing::debug!(
            "Planned frame at {}: {} nodes, {} links",
            anchor,
            nodes.len(),
            links.len()
        );
        self.rendered = layout.iter().map(|(id, _)| id).collect();
        tree.record_positions(layout.iter());

        RenderFrame {
            anchor,
            nodes,
            links,
            transition_ms: self.transition_ms,
        }
    }

    /// Previous position of the nearest ancestor that was on screen.
    fn enter_origin(
        tree: &FamilyTree,
        id: NodeId,
        previous: &HashSet<NodeId>,
    ) -> Option<Vec2> {
        tree.ancestors(id)
            .into_iter()
            .find(|a| previous.contains(a))
            .and_then(|a| tree.node(a).and_then(|n| n.last_position))
    }

    /// New position of the nearest ancestor that stays on screen.
    fn exit_target(tree: &FamilyTree, id: NodeId, layout: &TreeLayout) -> Option<Vec2> {
        tree.ancestors(id).into_iter().find_map(|a| layout.get(a))
    }

    fn plan_links(tree: &FamilyTree, nodes: &[NodeVisual]) -> Vec<LinkVisual> {
        let by_id: HashMap<NodeId, &NodeVisual> = nodes.iter().map(|n| (n.id, n)).collect();
        nodes
            .iter()
            .filter_map(|child| {
                let source = tree.node(child.id)?.parent?;
                let parent = by_id.get(&source).copied();
                let parent_from = parent.map_or(child.from, |p| p.from);
                let parent_to = parent.map_or(child.to, |p| p.to);
                let (from, to) = match child.phase {
                    // Grows out of the point the child enters from.
                    Phase::Enter => ((child.from, child.from), (parent_to, child.to)),
                    Phase::Update => ((parent_from, child.from), (parent_to, child.to)),
                    // Shrinks into the point the child exits to.
                    Phase::Exit => ((parent_from, child.from), (child.to, child.to)),
                };
                Some(LinkVisual {
                    source,
                    target: child.id,
                    phase: child.phase,
                    from,
                    to,
                })
            })
            .collect()
    }
}
