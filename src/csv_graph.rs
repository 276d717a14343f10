//! CSV node/arc file loader, building a [`crate::graph::core::Graph`]
//! keyed by the textual node id.
//!
//! Node file: a header line, then `id|term|class|f3|nes|power|label`
//! records. Arc file: one `src tgt` record per line, fields separated by
//! whitespace or a comma. Short records are skipped rather than treated
//! as an error; an arc naming an id that hasn't appeared in the node
//! file yet gets an empty node created for it on the spot.

use std::collections::HashMap;

use crate::graph::core::Graph;

/// One node's attributes, as read from a node CSV record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: String,
    pub term: String,
    pub class: String,
    pub f3: String,
    pub nes: String,
    pub power: String,
    pub label: String,
}

impl NodeRecord {
    fn empty(id: &str) -> Self {
        Self { id: id.to_string(), ..Default::default() }
    }
}

const NODE_FIELD_COUNT: usize = 7;

/// Load a graph from CSV text, returning it alongside the id→handle
/// index (so a caller can also resolve ids the arc file introduced).
pub fn load_graph(node_csv: &str, arc_csv: &str, directed: bool) -> (Graph<NodeRecord, ()>, HashMap<String, usize>) {
    let mut g = Graph::new(directed);
    let mut by_id = HashMap::new();
    load_nodes(node_csv, &mut g, &mut by_id);
    load_arcs(arc_csv, &mut g, &mut by_id);
    (g, by_id)
}

fn load_nodes(csv: &str, g: &mut Graph<NodeRecord, ()>, by_id: &mut HashMap<String, usize>) {
    for line in csv.lines().skip(1) {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < NODE_FIELD_COUNT {
            continue;
        }
        let record = NodeRecord {
            id: fields[0].to_string(),
            term: fields[1].to_string(),
            class: fields[2].to_string(),
            f3: fields[3].to_string(),
            nes: fields[4].to_string(),
            power: fields[5].to_string(),
            label: fields[6].to_string(),
        };
        let id = record.id.clone();
        let handle = g.insert_node(record);
        by_id.insert(id, handle);
    }
}

fn load_arcs(csv: &str, g: &mut Graph<NodeRecord, ()>, by_id: &mut HashMap<String, usize>) {
    for line in csv.lines() {
        let fields: Vec<&str> =
            line.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).collect();
        if fields.len() < 2 {
            continue;
        }
        let src = resolve_or_create(fields[0], g, by_id);
        let tgt = resolve_or_create(fields[1], g, by_id);
        g.insert_arc(src, tgt, ());
    }
}

fn resolve_or_create(id: &str, g: &mut Graph<NodeRecord, ()>, by_id: &mut HashMap<String, usize>) -> usize {
    if let Some(&h) = by_id.get(id) {
        return h;
    }
    let h = g.insert_node(NodeRecord::empty(id));
    by_id.insert(id.to_string(), h);
    h
}
