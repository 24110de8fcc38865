pub mod geometry;
pub mod hierarchy;
pub mod hit_tester;
pub mod layout;
pub mod render;
pub mod tree;
pub mod viewport;

pub use geometry::{Rect, Vec2};
pub use hierarchy::{BuildReport, HierarchyBuilder};
pub use hit_tester::HitTester;
pub use layout::{LayoutConfig, Layouter, TidyTreeLayouter, TreeLayout};
pub use render::{
    ExpandGlyph, LabelSide, LinkVisual, NodeVisual, Phase, RenderFrame, RenderPlanner, RenderSink,
};
pub use tree::{Children, FamilyTree, ToggleOutcome, TreeBehavior, TreeNode};
pub use viewport::Viewport;
