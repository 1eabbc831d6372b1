//! C3 — Visibility dependency cycles.
//!
//! Depth-first search over the controller -> dependent edges from C1. A
//! back edge to a node still on the stack closes a cycle, reported as the
//! key path from that node around to itself.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregated C3 result.
#[derive(Debug, Clone, Serialize)]
pub struct C3Result {
    /// Each cycle starts and ends with the same key.
    pub cycles: Vec<Vec<String>>,
}

struct Search<'a> {
    graph: BTreeMap<&'a str, Vec<&'a str>>,
    on_stack: BTreeSet<&'a str>,
    done: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
    cycles: Vec<Vec<String>>,
}

impl<'a> Search<'a> {
    fn visit(&mut self, node: &'a str) {
        if self.done.contains(node) {
            return;
        }
        if self.on_stack.contains(node) {
            if let Some(start) = self.stack.iter().position(|n| *n == node) {
                let mut cycle: Vec<String> =
                    self.stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                self.cycles.push(cycle);
            }
            return;
        }

        self.on_stack.insert(node);
        self.stack.push(node);
        let next = self.graph.get(node).cloned().unwrap_or_default();
        for n in next {
            self.visit(n);
        }
        self.stack.pop();
        self.on_stack.remove(node);
        self.done.insert(node);
    }
}

pub fn analyze_cycles(edges: &BTreeSet<(String, String)>) -> C3Result {
    let mut graph: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, to) in edges {
        graph.entry(from.as_str()).or_default().push(to.as_str());
    }
    let roots: Vec<&str> = graph.keys().copied().collect();

    let mut search = Search {
        graph,
        on_stack: BTreeSet::new(),
        done: BTreeSet::new(),
        stack: Vec::new(),
        cycles: Vec::new(),
    };
    for root in roots {
        search.visit(root);
    }

    C3Result {
        cycles: search.cycles,
    }
}
