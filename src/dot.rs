//! Graphviz DOT exporter: per-node color from the term class, per-node
//! shape from the term type, and topological rank groups when the graph
//! is acyclic (a warning comment naming one detected cycle's nodes
//! otherwise).

use std::collections::{HashMap, HashSet};

use crate::csv_graph::NodeRecord;
use crate::graph::core::Graph;
use crate::graph::tarjan;

fn color_for(class: &str) -> &'static str {
    match class {
        "cp" => "green",
        "mp" => "yellow",
        "lp" => "red",
        _ => "black",
    }
}

fn shape_for(term: &str) -> &'static str {
    match term {
        "it" => "box",
        "ef" => "ellipse",
        "pp" => "hexagon",
        _ => "plaintext",
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `g` as Graphviz DOT source.
pub fn to_dot(g: &mut Graph<NodeRecord, ()>) -> String {
    let mut out = String::new();
    let kind = if g.directed() { "digraph" } else { "graph" };
    let edge_op = if g.directed() { "->" } else { "--" };
    out.push_str(&format!("{kind} G {{\n"));

    for n in g.node_handles() {
        let rec = g.node(n);
        out.push_str(&format!(
            "  n{n} [label=\"{}\", color={}, shape={}];\n",
            escape(&rec.label),
            color_for(&rec.class),
            shape_for(&rec.term),
        ));
    }
    for a in g.arc_handles() {
        let (s, t) = g.arc_endpoints(a);
        out.push_str(&format!("  n{s} {edge_op} n{t};\n"));
    }

    let cycles = tarjan::cycles(g, &|_, _| true);
    if cycles.is_empty() {
        for layer in topo_layers(g) {
            let names: Vec<String> = layer.iter().map(|n| format!("n{n}")).collect();
            out.push_str(&format!("  {{ rank = same; {}; }}\n", names.join("; ")));
        }
    } else {
        let witness = &cycles[0];
        let nodes = cycle_nodes(g, witness);
        out.push_str(&format!("  // warning: cycle detected among nodes {nodes:?}\n"));
    }

    out.push_str("}\n");
    out
}

/// The distinct node handles visited by a cycle's arc sequence.
fn cycle_nodes(g: &Graph<NodeRecord, ()>, arcs: &[usize]) -> Vec<usize> {
    let mut seen = Vec::new();
    for &a in arcs {
        let (s, _) = g.arc_endpoints(a);
        if !seen.contains(&s) {
            seen.push(s);
        }
    }
    seen
}

/// Kahn layering: each layer is every currently-source node (all of its
/// predecessors already placed), so nodes sharing a layer can be given
/// the same DOT rank. Assumes `g` is acyclic; returns whatever layers it
/// manages to peel off otherwise.
fn topo_layers(g: &Graph<NodeRecord, ()>) -> Vec<Vec<usize>> {
    let nodes = g.node_handles();
    let mut indeg: HashMap<usize, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    for a in g.arc_handles() {
        let (_, t) = g.arc_endpoints(a);
        *indeg.get_mut(&t).expect("t is a node handle") += 1;
    }
    let mut placed: HashSet<usize> = HashSet::new();
    let mut layers = Vec::new();
    while placed.len() < nodes.len() {
        let mut layer: Vec<usize> =
            nodes.iter().copied().filter(|n| !placed.contains(n) && indeg[n] == 0).collect();
        if layer.is_empty() {
            break;
        }
        layer.sort_unstable();
        for &n in &layer {
            placed.insert(n);
            for a in g.out_arcs(n) {
                let (_, t) = g.arc_endpoints(a);
                if !placed.contains(&t) {
                    *indeg.get_mut(&t).expect("t is a node handle") -= 1;
                }
            }
        }
        layers.push(layer);
    }
    layers
}
