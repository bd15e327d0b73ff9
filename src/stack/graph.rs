//! Dependency graph utilities over a stack's nodes.
//!
//! Nodes are addressed by their insertion index. Dependencies naming ids that
//! are not part of the stack are ignored here; [`Stack::validate`] reports them
//! separately.
//!
//! [`Stack::validate`]: super::Stack::validate

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::resources::ResourceNode;

/// Resolved dependency indices for every node, in dependency order.
fn resolved_dependencies(nodes: &IndexMap<String, ResourceNode>) -> Vec<Vec<usize>> {
    nodes
        .values()
        .map(|node| {
            node.dependencies()
                .iter()
                .filter_map(|d| nodes.get_index_of(d.as_str()))
                .collect()
        })
        .collect()
}

/// Lazy dependency-respecting order of node ids (Kahn's algorithm).
///
/// Among nodes whose dependencies are all yielded, the one inserted first is
/// yielded next, so the order is deterministic. On a cyclic graph the
/// iterator ends once no node is ready; the nodes on or behind a cycle are
/// never yielded.
#[derive(Debug)]
pub struct TopologicalOrder<'a> {
    nodes: &'a IndexMap<String, ResourceNode>,
    in_degree: Vec<usize>,
    dependents: Vec<Vec<usize>>,
    ready: BTreeSet<usize>,
}

impl<'a> TopologicalOrder<'a> {
    pub(super) fn new(nodes: &'a IndexMap<String, ResourceNode>) -> Self {
        let deps = resolved_dependencies(nodes);
        let in_degree: Vec<usize> = deps.iter().map(Vec::len).collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, ds) in deps.iter().enumerate() {
            for &d in ds {
                if let Some(rd) = dependents.get_mut(d) {
                    rd.push(i);
                }
            }
        }

        let ready = in_degree
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| (d == 0).then_some(i))
            .collect();

        Self {
            nodes,
            in_degree,
            dependents,
            ready,
        }
    }
}

impl<'a> Iterator for TopologicalOrder<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.ready.pop_first()?;
        if let Some(dependents) = self.dependents.get(idx) {
            for &dep in dependents {
                if let Some(count) = self.in_degree.get_mut(dep) {
                    *count -= 1;
                    if *count == 0 {
                        self.ready.insert(dep);
                    }
                }
            }
        }
        self.nodes.get_index(idx).map(|(id, _)| id.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ready.len(), Some(self.nodes.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Find a dependency cycle, if any.
///
/// Walks depth-first from each node in insertion order, following
/// dependencies in their declared order. The returned ids start at the first
/// node of the cycle the walk re-enters and follow the walk from there.
pub fn find_cycle(nodes: &IndexMap<String, ResourceNode>) -> Option<Vec<String>> {
    let deps = resolved_dependencies(nodes);
    let mut marks = vec![Mark::White; nodes.len()];

    for root in 0..nodes.len() {
        if marks.get(root) != Some(&Mark::White) {
            continue;
        }
        // (node, position of the next dependency to visit)
        let mut path: Vec<(usize, usize)> = vec![(root, 0)];
        if let Some(m) = marks.get_mut(root) {
            *m = Mark::Gray;
        }

        while let Some(top) = path.last_mut() {
            let node = top.0;
            let next = deps.get(node).and_then(|ds| ds.get(top.1)).copied();
            top.1 += 1;
            match next {
                Some(dep) => match marks.get(dep) {
                    Some(Mark::White) => {
                        if let Some(m) = marks.get_mut(dep) {
                            *m = Mark::Gray;
                        }
                        path.push((dep, 0));
                    }
                    Some(Mark::Gray) => {
                        let start = path.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        return Some(
                            path.get(start..)
                                .unwrap_or_default()
                                .iter()
                                .filter_map(|&(n, _)| nodes.get_index(n).map(|(id, _)| id.clone()))
                                .collect(),
                        );
                    }
                    _ => {}
                },
                None => {
                    if let Some(m) = marks.get_mut(node) {
                        *m = Mark::Black;
                    }
                    path.pop();
                }
            }
        }
    }
    None
}
