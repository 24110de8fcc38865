use familytree_graph::{ExpandGlyph, NodeVisual, Phase, RenderFrame, RenderSink};
use std::fmt::Write;

/// Renders frames as an indented outline on stdout.
#[derive(Debug, Default)]
pub struct TextRenderer {
    pub echo: bool,
    last: String,
}

impl TextRenderer {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            last: String::new(),
        }
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    fn line(out: &mut String, node: &NodeVisual) {
        let indent = "  ".repeat(node.depth);
        let glyph = match node.glyph {
            ExpandGlyph::None => " ",
            glyph => glyph.symbol(),
        };
        let _ = write!(out, "{indent}{glyph} {}", node.name);
        if node.married {
            out.push_str(" (m)");
        }
        if node.highlighted {
            out.push_str("  <==");
        }
        out.push('\n');
    }

    pub fn format(frame: &RenderFrame) -> String {
        let mut out = String::new();
        let entered = frame.nodes_in(Phase::Enter).count();
        let exited = frame.nodes_in(Phase::Exit).count();
        let _ = writeln!(
            out,
            "-- {} visible (+{entered} -{exited}) at node {}",
            frame.visible_count(),
            frame.anchor
        );
        for node in frame.nodes.iter().filter(|n| n.phase != Phase::Exit) {
            Self::line(&mut out, node);
        }
        out
    }
}

impl RenderSink for TextRenderer {
    fn render(&mut self, frame: &RenderFrame) {
        self.last = Self::format(frame);
        if self.echo {
            print!("{}", self.last);
        }
    }
}
