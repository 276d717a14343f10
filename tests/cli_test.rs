use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

#[test]
fn huffman_compress_then_expand_round_trips() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("message.txt");
    let compressed_path = temp_dir.path().join("message.ahuff");
    let out_path = temp_dir.path().join("message.out");
    std::fs::write(&in_path, b"the quick brown fox jumps over the lazy dog")?;

    Command::cargo_bin("alephw-ds")?
        .arg("huffman")
        .arg("compress")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("alephw-ds")?
        .arg("huffman")
        .arg("expand")
        .arg("-i")
        .arg(&compressed_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    let original = std::fs::read(&in_path)?;
    let round_tripped = std::fs::read(&out_path)?;
    assert_eq!(original, round_tripped);
    Ok(())
}

#[test]
fn huffman_compress_on_empty_file_round_trips() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("empty.txt");
    let compressed_path = temp_dir.path().join("empty.ahuff");
    let out_path = temp_dir.path().join("empty.out");
    std::fs::write(&in_path, b"")?;

    Command::cargo_bin("alephw-ds")?
        .arg("huffman")
        .arg("compress")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("alephw-ds")?
        .arg("huffman")
        .arg("expand")
        .arg("-i")
        .arg(&compressed_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_path)?, Vec::<u8>::new());
    Ok(())
}

fn write_sample_graph(
    dir: &std::path::Path,
) -> std::io::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let nodes_path = dir.join("nodes.csv");
    let arcs_path = dir.join("arcs.csv");
    let mut nodes = std::fs::File::create(&nodes_path)?;
    writeln!(nodes, "id|term|class|f3|nes|power|label")?;
    writeln!(nodes, "a|it|cp|0|0|0|Alpha")?;
    writeln!(nodes, "b|ef|mp|0|0|0|Beta")?;
    writeln!(nodes, "c|pp|lp|0|0|0|Gamma")?;
    let mut arcs = std::fs::File::create(&arcs_path)?;
    writeln!(arcs, "a b")?;
    writeln!(arcs, "b c")?;
    writeln!(arcs, "c a")?;
    Ok((nodes_path, arcs_path))
}

#[test]
fn graph_scc_reports_one_component_for_a_ring() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (nodes_path, arcs_path) = write_sample_graph(temp_dir.path())?;

    Command::cargo_bin("alephw-ds")?
        .arg("graph")
        .arg("scc")
        .arg("-n")
        .arg(&nodes_path)
        .arg("-a")
        .arg(&arcs_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 strongly connected component"));
    Ok(())
}

#[test]
fn graph_dot_export_colors_and_shapes_nodes() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (nodes_path, arcs_path) = write_sample_graph(temp_dir.path())?;
    let dot_path = temp_dir.path().join("graph.dot");

    Command::cargo_bin("alephw-ds")?
        .arg("graph")
        .arg("dot")
        .arg("-n")
        .arg(&nodes_path)
        .arg("-a")
        .arg(&arcs_path)
        .arg("-o")
        .arg(&dot_path)
        .assert()
        .success();

    let rendered = std::fs::read_to_string(&dot_path)?;
    assert!(rendered.contains("color=green"));
    assert!(rendered.contains("shape=ellipse"));
    assert!(rendered.contains("warning: cycle detected"));
    Ok(())
}

#[test]
fn bitarray_show_prints_text_serialization() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("bytes.bin");
    std::fs::write(&in_path, [0u8, 255u8])?;

    Command::cargo_bin("alephw-ds")?
        .arg("bitarray")
        .arg("show")
        .arg("-i")
        .arg(&in_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 16"));
    Ok(())
}
