//! Indented textual rendering of schedule trees.

use crate::schedule::tree::{NodeId, ScheduleTree};
use crate::utils::CodeFormatter;
use std::fmt;

impl ScheduleTree {
    /// Render the subtree at `node`, one node per line, children indented
    /// below their parent.
    pub fn render(&self, node: NodeId) -> String {
        let mut out = CodeFormatter::default_indent();
        self.render_into(node, &mut out);
        out.finish()
    }

    fn render_into(&self, node: NodeId, out: &mut CodeFormatter) {
        out.writeln(&self.elem(node).to_string());
        out.nested(|out| {
            for &child in self.children(node) {
                self.render_into(child, out);
            }
        });
    }
}

impl fmt::Display for ScheduleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.root()))
    }
}
