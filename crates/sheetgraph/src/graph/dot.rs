//! Graphviz DOT export.

use super::CellGraph;
use petgraph::visit::EdgeRef;
use std::fmt;

/// Display adapter that writes a [`CellGraph`] as a DOT digraph.
pub(super) struct DotGraph<'a> {
    graph: &'a CellGraph,
}

impl<'a> DotGraph<'a> {
    pub(super) fn new(graph: &'a CellGraph) -> Self {
        Self { graph }
    }
}

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph Dependencies {{")?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=box];")?;

        for node in self.graph.node_indices() {
            let entry = &self.graph[node];
            let id = quote(entry.cell.as_str());
            match &entry.formula {
                Some(formula) => writeln!(
                    f,
                    "  {id} [style=filled, fillcolor=lightblue, tooltip={}];",
                    quote(formula)
                )?,
                None => writeln!(f, "  {id};")?,
            }
        }

        // Edges grouped by source in arena order, then insertion order.
        for node in self.graph.node_indices() {
            let mut targets: Vec<_> = self.graph.edges(node).map(|e| e.target()).collect();
            targets.reverse();
            for target in targets {
                writeln!(
                    f,
                    "  {} -> {};",
                    quote(self.graph[node].cell.as_str()),
                    quote(self.graph[target].cell.as_str())
                )?;
            }
        }

        writeln!(f, "}}")
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use crate::domain::CellAddress;
    use crate::graph::DependencyGraph;

    #[test]
    fn test_dot_output() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(
            &CellAddress::from("Sheet1!A1"),
            &CellAddress::from("Sheet1!B1"),
            Some("=Sheet1!B1+1"),
        );

        let expected = "\
digraph Dependencies {
  rankdir=LR;
  node [shape=box];
  \"Sheet1!A1\" [style=filled, fillcolor=lightblue, tooltip=\"=Sheet1!B1+1\"];
  \"Sheet1!B1\";
  \"Sheet1!A1\" -> \"Sheet1!B1\";
}
";
        assert_eq!(graph.to_dot(), expected);
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(
            &CellAddress::from("Sheet1!A1"),
            &CellAddress::from("Sheet1!B1"),
            Some("=IF(B1=\"x\",1,0)"),
        );

        assert!(graph.to_dot().contains("tooltip=\"=IF(B1=\\\"x\\\",1,0)\""));
    }

    #[test]
    fn test_dot_empty_graph() {
        let graph = DependencyGraph::new();
        assert_eq!(
            graph.to_dot(),
            "digraph Dependencies {\n  rankdir=LR;\n  node [shape=box];\n}\n"
        );
    }

    #[test]
    fn test_dot_is_deterministic() {
        let mut graph = DependencyGraph::new();
        for (from, to) in [("A1", "B1"), ("A1", "C1"), ("C1", "D1")] {
            graph.add_dependency(&from.into(), &to.into(), None);
        }
        assert_eq!(graph.to_dot(), graph.to_dot());
        let dot = graph.to_dot();
        let ab = dot.find("\"A1\" -> \"B1\"").unwrap();
        let ac = dot.find("\"A1\" -> \"C1\"").unwrap();
        assert!(ab < ac);
    }
}
