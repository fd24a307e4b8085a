//! Parent/child topology over hosts.
//!
//! The parent relation is stored on each host; children are a derived index
//! rebuilt from it on demand. Loop detection runs strongly connected
//! components over the whole host set in one traversal, so disconnected loops
//! are all found in the same pass.

use crate::diagnostics::Diagnostics;
use crate::entity::{Host, HostId};
use crate::error::ConfigError;

/// Children per host, derived from every host's resolved parents.
#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    children: Vec<Vec<HostId>>,
}

impl ChildIndex {
    pub fn build(hosts: &[Host]) -> Self {
        let mut children = vec![Vec::new(); hosts.len()];
        for (idx, host) in hosts.iter().enumerate() {
            for parent in host.parents() {
                if let Some(kids) = children.get_mut(parent.index()) {
                    if !kids.contains(&HostId(idx)) {
                        kids.push(HostId(idx));
                    }
                }
            }
        }
        Self { children }
    }

    pub fn children_of(&self, id: HostId) -> &[HostId] {
        self.children.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Find every host on a parent loop, report each once (in input order), and
/// cut all edges touching them. Returns the implicated host names.
pub fn find_and_break_cycles(hosts: &mut [Host], diags: &mut Diagnostics) -> Vec<String> {
    let implicated = loop_members(hosts);
    if !implicated.iter().any(|&x| x) {
        return Vec::new();
    }

    let mut names = Vec::new();
    for (idx, host) in hosts.iter().enumerate() {
        if implicated[idx] {
            diags.report(ConfigError::CircularChain {
                host: host.name().to_string(),
            });
            names.push(host.name().to_string());
        }
    }

    for (idx, host) in hosts.iter_mut().enumerate() {
        if implicated[idx] {
            host.parents.clear();
        } else {
            host.parents.retain(|p| !implicated[p.index()]);
        }
    }

    tracing::debug!(count = names.len(), "parent loops broken");
    names
}

/// Tarjan's strongly connected components over the parent edges. A host is
/// on a loop when its component has more than one member or it is its own
/// parent.
///
/// The traversal keeps its own frame stack of `(host, next parent)` so that
/// arbitrarily long parent chains cannot exhaust the thread stack.
fn loop_members(hosts: &[Host]) -> Vec<bool> {
    let n = hosts.len();
    let mut next = 0usize;
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut members = vec![false; n];
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if index[v].is_none() {
                index[v] = Some(next);
                low[v] = next;
                next += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            if let Some(parent) = hosts[v].parents().get(frame.1) {
                frame.1 += 1;
                let w = parent.index();
                match index[w] {
                    None => frames.push((w, 0)),
                    Some(w_index) if on_stack[w] => low[v] = low[v].min(w_index),
                    Some(_) => {}
                }
                continue;
            }

            // All parents visited: close the frame.
            frames.pop();
            if let Some(&(caller, _)) = frames.last() {
                low[caller] = low[caller].min(low[v]);
            }
            if Some(low[v]) != index[v] {
                continue;
            }

            let mut component = Vec::new();
            while let Some(w) = stack.pop() {
                on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            let self_loop = hosts[v].parents().iter().any(|p| p.index() == v);
            if component.len() > 1 || self_loop {
                for w in component {
                    members[w] = true;
                }
            }
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ConfigItem, EntityKind, Item};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn hosts(edges: &[&[usize]]) -> Vec<Host> {
        edges
            .iter()
            .enumerate()
            .map(|(idx, parents)| {
                let mut raw = BTreeMap::new();
                raw.insert("host_name".to_string(), format!("test_host_{idx}"));
                let mut host = Host::from_item(Item::new(EntityKind::Host, "hosts.cfg", raw));
                host.parents = parents.iter().map(|&p| HostId(p)).collect();
                host
            })
            .collect()
    }

    #[test]
    fn self_parent_is_a_loop() {
        let mut hs = hosts(&[&[0]]);
        let mut diags = Diagnostics::new();
        let found = find_and_break_cycles(&mut hs, &mut diags);
        assert_eq!(found, vec!["test_host_0"]);
        assert!(hs[0].parents().is_empty());
    }

    #[test]
    fn edges_touching_a_loop_are_all_cut() {
        // 0 <- 1 <-> 2, and 3 hangs off 2.
        let mut hs = hosts(&[&[], &[0, 2], &[1], &[2]]);
        let mut diags = Diagnostics::new();
        let found = find_and_break_cycles(&mut hs, &mut diags);

        assert_eq!(found, vec!["test_host_1", "test_host_2"]);
        assert!(hs[1].parents().is_empty());
        assert!(hs[2].parents().is_empty());
        assert!(hs[3].parents().is_empty());
        assert_eq!(diags.len(), 2);

        let index = ChildIndex::build(&hs);
        assert!(index.children_of(HostId(0)).is_empty());
        assert!(index.children_of(HostId(1)).is_empty());
    }

    #[test]
    fn disconnected_loops_are_found_in_one_pass() {
        let mut hs = hosts(&[&[1], &[0], &[3], &[2], &[]]);
        let mut diags = Diagnostics::new();
        let found = find_and_break_cycles(&mut hs, &mut diags);
        assert_eq!(found.len(), 4);
        assert!(!found.contains(&"test_host_4".to_string()));
    }

    #[test]
    fn acyclic_graph_is_untouched() {
        let mut hs = hosts(&[&[], &[0], &[0, 1]]);
        let mut diags = Diagnostics::new();
        assert!(find_and_break_cycles(&mut hs, &mut diags).is_empty());
        assert!(diags.is_empty());
        let index = ChildIndex::build(&hs);
        assert_eq!(index.children_of(HostId(0)), &[HostId(1), HostId(2)]);
    }

    #[test]
    fn long_chain_is_walked_without_recursion() {
        let n = 200_000;
        let chain: Vec<Vec<usize>> = (0..n)
            .map(|i| if i + 1 < n { vec![i + 1] } else { vec![0] })
            .collect();
        let edges: Vec<&[usize]> = chain.iter().map(Vec::as_slice).collect();
        let mut hs = hosts(&edges);
        let mut diags = Diagnostics::new();
        let found = find_and_break_cycles(&mut hs, &mut diags);

        // The last host closes the chain into one big loop.
        assert_eq!(found.len(), n);
        assert!(hs.iter().all(|h| h.parents().is_empty()));
    }
}
