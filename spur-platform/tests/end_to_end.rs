// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fs;
use std::path::Path;

use spur_engine::builder::TopologyKind;
use spur_engine::types::SpurError;
use spur_platform::config::EvalConfig;
use spur_platform::export::load_tree;
use spur_platform::run::Runner;
use spur_track::entity::toplevel;
use spur_track::test_helpers::create_tracker;

/// Eight neurons where only neuron 0 connects, to neuron 7.
fn write_matrix(path: &Path) {
    let mut rows = vec![vec![0.0_f32; 8]; 8];
    rows[0][7] = 0.5;
    fs::write(path, serde_json::to_string(&rows).unwrap()).unwrap();
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let matrix = dir.join("net.json");
    write_matrix(&matrix);
    let conf = dir.join("spur.toml");
    fs::write(
        &conf,
        format!(
            "matrix = [\"{}\"]\n\
             neurons_per_core = 1\n\
             assignment = \"sequential\"\n\
             output_dir = \"{}\"\n\
             {extra}",
            matrix.display(),
            dir.join("out").display()
        ),
    )
    .unwrap();
    conf
}

#[test]
fn both_topologies_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_config(
        dir.path(),
        "report_format = \"both\"\nexport_trees = true\nexport_mapping = true\n",
    );

    let settings = EvalConfig::from_sources(Some(&conf))
        .unwrap()
        .settings()
        .unwrap();
    let top = toplevel(&create_tracker(file!()), "top");
    let runner = Runner::new(&top, settings);
    let summaries = runner.run_all().unwrap();
    assert_eq!(summaries.len(), 2);

    let binary = &summaries[0];
    assert_eq!(binary.report.topology, TopologyKind::Binary);
    assert_eq!(binary.report.waste.total_waste, 7);
    assert_eq!(binary.report.waste.valid_messages, 1);
    assert_eq!(binary.report.waste.routed_neurons, 1);
    assert_eq!(binary.report.waste.silent_neurons, 7);
    assert_eq!(
        binary.to_string(),
        "net binary/lca: waste 7 over 1 valid messages (700.00%)"
    );

    let grouped = &summaries[1];
    assert_eq!(grouped.report.topology, TopologyKind::Grouped);
    assert_eq!(grouped.report.waste.total_waste, 0);

    let out = dir.path().join("out");
    let names: Vec<_> = binary
        .written
        .iter()
        .map(|path| path.strip_prefix(&out).unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "net_mapping.json",
            "net_binary_tree.json",
            "net_binary_tree.txt",
            "net_binary.txt",
            "net_binary.json"
        ]
    );

    let text = fs::read_to_string(out.join("net_binary.txt")).unwrap();
    assert!(text.contains("Total illegal deliveries (waste): 7\n"));
    assert!(text.contains("Waste percentage: 700.00%\n"));
    assert!(text.contains("  Neuron 0: 7\n"));

    let tree = load_tree(&out.join("net_grouped_tree.json")).unwrap();
    assert_eq!(tree.core_count(), 8);
    assert_eq!(tree.to_string(), grouped.report.tree);
}

#[test]
fn silent_spikes_have_no_percentage() {
    let dir = tempfile::tempdir().unwrap();
    let spikes = dir.path().join("spikes.json");
    fs::write(&spikes, "[3, 5]").unwrap();
    let conf = write_config(
        dir.path(),
        &format!(
            "evaluation = \"grouped\"\nspikes_file = \"{}\"\n",
            spikes.display()
        ),
    );

    let settings = EvalConfig::from_sources(Some(&conf))
        .unwrap()
        .settings()
        .unwrap();
    let top = toplevel(&create_tracker(file!()), "top");
    let summaries = Runner::new(&top, settings).run_all().unwrap();
    assert_eq!(summaries.len(), 1);

    let waste = &summaries[0].report.waste;
    assert_eq!(waste.silent_neurons, 2);
    assert_eq!(waste.valid_messages, 0);
    assert_eq!(waste.waste_percentage, None);

    let text = fs::read_to_string(dir.path().join("out").join("net_grouped.txt")).unwrap();
    assert!(text.contains("Waste percentage: n/a\n"));
}

#[test]
fn missing_matrix_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_config(dir.path(), "");
    let mut settings = EvalConfig::from_sources(Some(&conf))
        .unwrap()
        .settings()
        .unwrap();
    settings.matrices = vec![dir.path().join("absent.json")];

    let top = toplevel(&create_tracker(file!()), "top");
    assert!(matches!(
        Runner::new(&top, settings).run_all(),
        Err(SpurError::Input(_))
    ));
}
