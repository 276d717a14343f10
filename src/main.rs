use bit_vec::BitVec;
use clap::{arg, crate_version, Command};

use alephw_ds::bitarray::BitArray;
use alephw_ds::csv_graph;
use alephw_ds::dot;
use alephw_ds::graph::tarjan;
use alephw_ds::huffman::{self, HuffmanCodec};

const RCH: &str = "unreachable was reached";

/// Bridges [`huffman`]'s `bit_vec::BitVec` bit streams to [`BitArray`]'s
/// text serialization, used only by this CLI's on-disk envelope.
fn bitvec_to_bitarray(bits: &BitVec) -> BitArray {
    bits.iter().collect()
}

fn bitarray_to_bitvec(bits: &BitArray) -> BitVec {
    bits.iter().collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help =
"Examples:
---------
Huffman compress: `alephw-ds huffman compress -i my_file -o my_file.ahuff`
Huffman expand:   `alephw-ds huffman expand -i my_file.ahuff -o my_file`
Graph SCC report: `alephw-ds graph scc -n nodes.csv -a arcs.csv`
Graph DOT export: `alephw-ds graph dot -n nodes.csv -a arcs.csv -o graph.dot`
Bit array echo:   `alephw-ds bitarray show -i some_file`";

    let mut main_cmd = Command::new("alephw-ds")
        .about("Generic in-memory data structures: trees, hash tables, a heap, a bit array, graphs, and a Huffman codec")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("huffman")
            .about("Huffman-compress or expand a file")
            .subcommand(
                Command::new("compress")
                    .arg(arg!(-i --input <PATH> "input path").required(true))
                    .arg(arg!(-o --output <PATH> "output path").required(true))
                    .about("compress a file"),
            )
            .subcommand(
                Command::new("expand")
                    .arg(arg!(-i --input <PATH> "input path").required(true))
                    .arg(arg!(-o --output <PATH> "output path").required(true))
                    .about("expand a file"),
            ),
    );

    main_cmd = main_cmd.subcommand(
        Command::new("graph")
            .about("Load a CSV-described graph and run a graph algorithm")
            .subcommand(
                Command::new("scc")
                    .arg(arg!(-n --nodes <PATH> "node CSV path").required(true))
                    .arg(arg!(-a --arcs <PATH> "arc CSV path").required(true))
                    .about("print a textual strongly-connected-components report"),
            )
            .subcommand(
                Command::new("cycles")
                    .arg(arg!(-n --nodes <PATH> "node CSV path").required(true))
                    .arg(arg!(-a --arcs <PATH> "arc CSV path").required(true))
                    .about("print one cycle witness per qualifying component"),
            )
            .subcommand(
                Command::new("dot")
                    .arg(arg!(-n --nodes <PATH> "node CSV path").required(true))
                    .arg(arg!(-a --arcs <PATH> "arc CSV path").required(true))
                    .arg(arg!(-o --output <PATH> "DOT output path").required(true))
                    .about("render the graph as Graphviz DOT"),
            ),
    );

    main_cmd = main_cmd.subcommand(
        Command::new("bitarray").about("Round-trip a file's bytes through the bit array text format").subcommand(
            Command::new("show").arg(arg!(-i --input <PATH> "input path").required(true)).about("print the text serialization of a file's bytes"),
        ),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("huffman") {
        if let Some(cmd) = cmd.subcommand_matches("compress") {
            let path_in = cmd.get_one::<String>("input").expect(RCH);
            let path_out = cmd.get_one::<String>("output").expect(RCH);
            huffman_compress(path_in, path_out)?;
        }
        if let Some(cmd) = cmd.subcommand_matches("expand") {
            let path_in = cmd.get_one::<String>("input").expect(RCH);
            let path_out = cmd.get_one::<String>("output").expect(RCH);
            huffman_expand(path_in, path_out)?;
        }
    }

    if let Some(cmd) = matches.subcommand_matches("graph") {
        if let Some(cmd) = cmd.subcommand_matches("scc") {
            let nodes = cmd.get_one::<String>("nodes").expect(RCH);
            let arcs = cmd.get_one::<String>("arcs").expect(RCH);
            graph_scc_report(nodes, arcs)?;
        }
        if let Some(cmd) = cmd.subcommand_matches("cycles") {
            let nodes = cmd.get_one::<String>("nodes").expect(RCH);
            let arcs = cmd.get_one::<String>("arcs").expect(RCH);
            graph_cycles_report(nodes, arcs)?;
        }
        if let Some(cmd) = cmd.subcommand_matches("dot") {
            let nodes = cmd.get_one::<String>("nodes").expect(RCH);
            let arcs = cmd.get_one::<String>("arcs").expect(RCH);
            let path_out = cmd.get_one::<String>("output").expect(RCH);
            graph_dot_export(nodes, arcs, path_out)?;
        }
    }

    if let Some(cmd) = matches.subcommand_matches("bitarray") {
        if let Some(cmd) = cmd.subcommand_matches("show") {
            let path_in = cmd.get_one::<String>("input").expect(RCH);
            bitarray_show(path_in)?;
        }
    }

    Ok(())
}

/// `alephw-ds huffman compress`'s on-disk envelope: the serialized tree
/// (bit-array text form, then one hex-encoded leaf key per line), then
/// a blank line, then the encoded payload (bit-array text form).
fn huffman_compress(path_in: &str, path_out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path_in)?;
    log::debug!("read {} bytes from {}", data.len(), path_in);

    let mut codec: HuffmanCodec<Vec<u8>> = HuffmanCodec::new();
    for &b in &data {
        codec.observe(vec![b])?;
    }
    codec.set_end_of_stream(Vec::new())?;
    codec.build_tree()?;

    let symbols: Vec<Vec<u8>> = data.iter().map(|&b| vec![b]).collect();
    let encoded = codec.encode(symbols)?;
    let (tree_bits, keys) = codec.serialize_tree()?;
    log::debug!("tree has {} leaves, payload is {} bits", keys.len(), encoded.len());

    let mut out = String::new();
    out.push_str(&bitvec_to_bitarray(&tree_bits).to_text());
    out.push_str(&format!("{}\n", keys.len()));
    for key in &keys {
        out.push_str(&hex::encode(key));
        out.push('\n');
    }
    out.push_str(&bitvec_to_bitarray(&encoded).to_text());
    std::fs::write(path_out, out)?;
    Ok(())
}

/// Parses the envelope written by [`huffman_compress`]: the tree's
/// bit-array text form (two lines), a key count, that many hex-encoded
/// leaf keys (one per line), then the payload's bit-array text form.
fn huffman_expand(path_in: &str, path_out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path_in)?;
    let mut lines = content.lines();

    let tree_header = lines.next().ok_or("truncated huffman file: missing tree header")?;
    let tree_body = lines.next().ok_or("truncated huffman file: missing tree body")?;
    let tree_bits = BitArray::from_text(&format!("{tree_header}\n{tree_body}\n"))?;

    let key_count: usize =
        lines.next().ok_or("truncated huffman file: missing key count")?.trim().parse()?;
    let mut keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let line = lines.next().ok_or("truncated huffman file: missing key")?;
        keys.push(hex::decode(line)?);
    }

    let payload_header = lines.next().ok_or("truncated huffman file: missing payload header")?;
    let payload_body = lines.next().unwrap_or("");
    let encoded = BitArray::from_text(&format!("{payload_header}\n{payload_body}\n"))?;

    let tree = huffman::deserialize_tree(&bitarray_to_bitvec(&tree_bits), &keys)?;
    let codec = HuffmanCodec::from_tree(tree, Vec::new());
    let symbols = codec.decode(&bitarray_to_bitvec(&encoded))?;
    log::debug!("decoded {} symbols", symbols.len());

    let data: Vec<u8> = symbols.into_iter().flatten().collect();
    std::fs::write(path_out, data)?;
    Ok(())
}

fn load_csv_graph(nodes_path: &str, arcs_path: &str) -> Result<alephw_ds::graph::Graph<csv_graph::NodeRecord, ()>, Box<dyn std::error::Error>> {
    let node_csv = std::fs::read_to_string(nodes_path)?;
    let arc_csv = std::fs::read_to_string(arcs_path)?;
    let (g, _by_id) = csv_graph::load_graph(&node_csv, &arc_csv, true);
    Ok(g)
}

fn graph_scc_report(nodes_path: &str, arcs_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut g = load_csv_graph(nodes_path, arcs_path)?;
    let components = tarjan::scc_node_lists(&mut g, &|_, _| true);
    println!("{} strongly connected component(s):", components.len());
    for (i, comp) in components.iter().enumerate() {
        let labels: Vec<&str> = comp.iter().map(|&n| g.node(n).label.as_str()).collect();
        println!("  [{i}] {}", labels.join(", "));
    }
    Ok(())
}

fn graph_cycles_report(nodes_path: &str, arcs_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut g = load_csv_graph(nodes_path, arcs_path)?;
    let cycles = tarjan::cycles(&mut g, &|_, _| true);
    println!("{} cycle(s) found:", cycles.len());
    for (i, arcs) in cycles.iter().enumerate() {
        let hops: Vec<String> = arcs
            .iter()
            .map(|&a| {
                let (s, t) = g.arc_endpoints(a);
                format!("{}->{}", g.node(s).label, g.node(t).label)
            })
            .collect();
        println!("  [{i}] {}", hops.join(", "));
    }
    Ok(())
}

fn graph_dot_export(nodes_path: &str, arcs_path: &str, path_out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut g = load_csv_graph(nodes_path, arcs_path)?;
    let rendered = dot::to_dot(&mut g);
    std::fs::write(path_out, rendered)?;
    Ok(())
}

fn bitarray_show(path_in: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path_in)?;
    let bits = BitArray::from_bytes(data);
    println!("{}", bits.to_text());
    Ok(())
}
