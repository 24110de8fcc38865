use crate::Vec2;
use crate::layout::TreeLayout;
use crate::viewport::Viewport;
use familytree_core::NodeId;

/// Maps pointer positions to the node circle under them.
#[derive(Debug, Clone)]
pub struct HitTester {
    targets: Vec<(NodeId, Vec2)>,
    radius: f32,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RADIUS)
    }
}

impl HitTester {
    pub const DEFAULT_RADIUS: f32 = 15.0;

    pub fn new(radius: f32) -> Self {
        Self {
            targets: Vec::new(),
            radius,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Refresh hit regions after a layout pass.
    pub fn update(&mut self, layout: &TreeLayout) {
        self.targets.clear();
        self.targets.extend(layout.iter());
    }

    /// Node whose circle contains `point` (tree coordinates). When circles
    /// overlap the nearest centre wins.
    pub fn hit_test(&self, point: Vec2) -> Option<NodeId> {
        self.targets
            .iter()
            .map(|(id, center)| (*id, center.distance(point)))
            .filter(|(_, dist)| *dist <= self.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn hit_test_screen(&self, point: Vec2, viewport: &Viewport) -> Option<NodeId> {
        self.hit_test(viewport.screen_to_tree(point))
    }
}
