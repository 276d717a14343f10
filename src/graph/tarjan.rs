//! Tarjan strongly-connected-components and cycle engine.
//!
//! Traversal order is canonicalized so the engine's output is
//! deterministic and testable: source nodes and each node's outgoing
//! arcs are visited in ascending handle order, and the emitted
//! components/cycles are sorted by their lowest-handle member.

use std::collections::{HashMap, HashSet};

use super::core::Graph;

/// Every strongly connected component, as a list of node handles,
/// ordered by each component's minimum member handle.
pub fn scc_node_lists<N, A>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
) -> Vec<Vec<usize>> {
    g.reset_scratch();
    let mut counter: i64 = 0;
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for v in g.node_handles() {
        if !g.node_scratch(v).depth_first {
            dfs(g, filter, v, &mut counter, &mut stack, &mut components);
        }
    }
    components.sort_by_key(|c| *c.iter().min().expect("a component has at least one member"));
    components
}

fn dfs<N, A>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
    v: usize,
    counter: &mut i64,
    stack: &mut Vec<usize>,
    components: &mut Vec<Vec<usize>>,
) {
    let df_v = *counter;
    {
        let s = g.node_scratch_mut(v);
        s.depth_first = true;
        s.min = true;
        s.counter = df_v;
        s.low = df_v;
    }
    *counter += 1;
    stack.push(v);

    let mut arcs: Vec<usize> = g.out_arcs(v);
    arcs.sort_unstable();
    for a in arcs {
        if !filter(g, a) {
            continue;
        }
        let w = g.other_endpoint(a, v);
        if !g.node_scratch(w).depth_first {
            dfs(g, filter, w, counter, stack, components);
            let low_w = g.node_scratch(w).low;
            let s = g.node_scratch_mut(v);
            s.low = s.low.min(low_w);
        } else if g.node_scratch(w).min {
            let df_w = g.node_scratch(w).counter;
            let s = g.node_scratch_mut(v);
            s.low = s.low.min(df_w);
        }
    }

    if g.node_scratch(v).low == df_v {
        let mut component = Vec::new();
        loop {
            let w = stack.pop().expect("v's own frame is still on the stack");
            g.node_scratch_mut(w).min = false;
            component.push(w);
            if w == v {
                break;
            }
        }
        components.push(component);
    }
}

/// The size of each strongly connected component, in the same order as
/// [`scc_node_lists`].
pub fn scc_sizes<N, A>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
) -> Vec<usize> {
    scc_node_lists(g, filter).iter().map(|c| c.len()).collect()
}

/// One isolated, mapped-copy subgraph per component (containing only
/// that component's intra-component arcs), plus the list of arcs that
/// cross between components.
pub fn scc_subgraphs<N: Clone, A: Clone>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
) -> (Vec<Graph<N, A>>, Vec<usize>) {
    let components = scc_node_lists(g, filter);
    let mut comp_of: HashMap<usize, usize> = HashMap::new();
    for (ci, comp) in components.iter().enumerate() {
        for &n in comp {
            comp_of.insert(n, ci);
        }
    }
    let mut subgraphs: Vec<Graph<N, A>> =
        components.iter().map(|_| Graph::new(g.directed())).collect();
    let mut node_maps: Vec<HashMap<usize, usize>> =
        components.iter().map(|_| HashMap::new()).collect();
    for (ci, comp) in components.iter().enumerate() {
        for &n in comp {
            let new_idx = subgraphs[ci].insert_node(g.node(n).clone());
            node_maps[ci].insert(n, new_idx);
        }
    }
    let mut inter_component_arcs = Vec::new();
    for a in g.arc_handles() {
        let (u, v) = g.arc_endpoints(a);
        let cu = comp_of[&u];
        let cv = comp_of[&v];
        if cu == cv {
            let info = g.arc(a).clone();
            subgraphs[cu].insert_arc(node_maps[cu][&u], node_maps[cu][&v], info);
        } else {
            inter_component_arcs.push(a);
        }
    }
    (subgraphs, inter_component_arcs)
}

/// A directed path's arcs from `from` to `to`, confined to `allowed`
/// arcs and visited in ascending handle order; `None` if no such path
/// exists.
fn dfs_path<N, A>(
    g: &Graph<N, A>,
    from: usize,
    to: usize,
    allowed: &HashSet<usize>,
) -> Option<Vec<usize>> {
    fn go<N, A>(
        g: &Graph<N, A>,
        cur: usize,
        to: usize,
        allowed: &HashSet<usize>,
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> bool {
        if cur == to {
            return true;
        }
        visited.insert(cur);
        let mut arcs: Vec<usize> =
            g.out_arcs(cur).into_iter().filter(|a| allowed.contains(a)).collect();
        arcs.sort_unstable();
        for a in arcs {
            let w = g.other_endpoint(a, cur);
            if visited.contains(&w) {
                continue;
            }
            path.push(a);
            if go(g, w, to, allowed, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    if go(g, from, to, allowed, &mut visited, &mut path) {
        Some(path)
    } else {
        None
    }
}

/// One cycle witness (a sequence of arc handles) per qualifying
/// component: for a self-loop (component of size 1 with a self-arc),
/// that single arc; for a component of size ≥ 2, an arbitrary
/// intra-component arc `(s, t)` closed by the shortest canonical path
/// found back from `t` to `s`.
pub fn cycles<N: Clone, A: Clone>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
) -> Vec<Vec<usize>> {
    let components = scc_node_lists(g, filter);
    let mut out = Vec::new();
    for comp in &components {
        if comp.len() == 1 {
            let n = comp[0];
            if let Some(&a) = g.incident_arcs(n).iter().find(|&&a| {
                let (s, t) = g.arc_endpoints(a);
                s == n && t == n
            }) {
                out.push(vec![a]);
            }
            continue;
        }
        let comp_set: HashSet<usize> = comp.iter().copied().collect();
        let intra_arcs: HashSet<usize> = g
            .arc_handles()
            .into_iter()
            .filter(|&a| {
                let (s, t) = g.arc_endpoints(a);
                comp_set.contains(&s) && comp_set.contains(&t)
            })
            .collect();
        let mut sorted_intra: Vec<usize> = intra_arcs.iter().copied().collect();
        sorted_intra.sort_unstable();
        let Some(&first_arc) = sorted_intra.first() else { continue };
        let (s, t) = g.arc_endpoints(first_arc);
        if let Some(mut path) = dfs_path(g, t, s, &intra_arcs) {
            let mut cycle = vec![first_arc];
            cycle.append(&mut path);
            out.push(cycle);
        }
    }
    out
}

/// Whether the graph is strongly connected: a single DFS root visits
/// every node and the component it roots equals the whole graph.
pub fn is_strongly_connected<N, A>(
    g: &mut Graph<N, A>,
    filter: &impl Fn(&Graph<N, A>, usize) -> bool,
) -> bool {
    let n = g.node_count();
    if n == 0 {
        return true;
    }
    let components = scc_node_lists(g, filter);
    components.len() == 1 && components[0].len() == n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_filter<N, A>() -> impl Fn(&Graph<N, A>, usize) -> bool {
        |_, _| true
    }

    #[test]
    fn single_cycle_is_one_component() {
        let mut g: Graph<i32, ()> = Graph::new(true);
        let nodes: Vec<usize> = (0..4).map(|i| g.insert_node(i)).collect();
        for i in 0..4 {
            g.insert_arc(nodes[i], nodes[(i + 1) % 4], ());
        }
        let comps = scc_node_lists(&mut g, &no_filter());
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 4);
    }

    #[test]
    fn dag_has_singleton_components_in_topo_order() {
        let mut g: Graph<i32, ()> = Graph::new(true);
        let a = g.insert_node(0);
        let b = g.insert_node(1);
        let c = g.insert_node(2);
        g.insert_arc(a, b, ());
        g.insert_arc(b, c, ());
        let comps = scc_node_lists(&mut g, &no_filter());
        assert_eq!(comps, vec![vec![a], vec![b], vec![c]]);
    }

    #[test]
    fn two_disjoint_triangles() {
        let mut g: Graph<i32, ()> = Graph::new(true);
        let first: Vec<usize> = (0..3).map(|i| g.insert_node(i)).collect();
        let second: Vec<usize> = (0..3).map(|i| g.insert_node(i + 10)).collect();
        for i in 0..3 {
            g.insert_arc(first[i], first[(i + 1) % 3], ());
            g.insert_arc(second[i], second[(i + 1) % 3], ());
        }
        let sizes = scc_sizes(&mut g, &no_filter());
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn self_loop_cycle_is_the_single_arc() {
        let mut g: Graph<i32, &str> = Graph::new(true);
        let a = g.insert_node(1);
        let loop_arc = g.insert_arc(a, a, "self");
        let found = cycles(&mut g, &no_filter());
        assert_eq!(found, vec![vec![loop_arc]]);
    }

    #[test]
    fn cycle_in_larger_component_round_trips_to_same_start() {
        let mut g: Graph<i32, ()> = Graph::new(true);
        let nodes: Vec<usize> = (0..5).map(|i| g.insert_node(i)).collect();
        for i in 0..5 {
            g.insert_arc(nodes[i], nodes[(i + 1) % 5], ());
        }
        let found = cycles(&mut g, &no_filter());
        assert_eq!(found.len(), 1);
        let cycle = &found[0];
        assert_eq!(cycle.len(), 5);
        let (first_src, _) = g.arc_endpoints(cycle[0]);
        let mut cur = first_src;
        for &a in cycle {
            let (s, t) = g.arc_endpoints(a);
            assert_eq!(s, cur);
            cur = t;
        }
        assert_eq!(cur, first_src);
    }

    #[test]
    fn strong_connectivity_check() {
        let mut ring: Graph<i32, ()> = Graph::new(true);
        let nodes: Vec<usize> = (0..4).map(|i| ring.insert_node(i)).collect();
        for i in 0..4 {
            ring.insert_arc(nodes[i], nodes[(i + 1) % 4], ());
        }
        assert!(is_strongly_connected(&mut ring, &no_filter()));

        let mut chain: Graph<i32, ()> = Graph::new(true);
        let a = chain.insert_node(0);
        let b = chain.insert_node(1);
        chain.insert_arc(a, b, ());
        assert!(!is_strongly_connected(&mut chain, &no_filter()));
    }

    #[test]
    fn subgraphs_separate_intra_from_inter_component_arcs() {
        let mut g: Graph<i32, &str> = Graph::new(true);
        let a = g.insert_node(0);
        let b = g.insert_node(1);
        let c = g.insert_node(2);
        g.insert_arc(a, b, "ab");
        g.insert_arc(b, a, "ba");
        let bridge = g.insert_arc(b, c, "bridge");
        let (subgraphs, inter) = scc_subgraphs(&mut g, &no_filter());
        assert_eq!(subgraphs.len(), 2);
        assert_eq!(inter, vec![bridge]);
        assert_eq!(subgraphs[0].node_count(), 2);
        assert_eq!(subgraphs[0].arc_count(), 2);
        assert_eq!(subgraphs[1].node_count(), 1);
    }
}
