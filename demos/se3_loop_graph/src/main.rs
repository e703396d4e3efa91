use anyhow::{Context, Result};
use slamlab_graph::{GraphConfig, GraphConstructor, PoseGraph, Se3LoopCfg};

fn run() -> Result<()> {
    let config = GraphConfig {
        init_vtx: false,
        edge_noise: true,
        ..Default::default()
    };
    log::debug!("graph config: {config:?}");

    let mut graph = PoseGraph::new();
    let gt_poses = Se3LoopCfg::default()
        .finalize()?
        .construct(&mut graph, &config)
        .context("constructing SE3 loop graph")?;

    log::info!(
        "graph with {} vertices and {} edges, chi2 {:.6}",
        graph.len(),
        graph.edge_count(),
        graph.chi2()
    );
    for vertex in graph.vertices() {
        log::debug!(
            "vertex {} fixed={} estimate {:?} truth {:?}",
            vertex.id,
            vertex.fixed,
            vertex.estimate,
            gt_poses[vertex.id]
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("se3_loop_graph: {e:#}");
        std::process::exit(1);
    }
}
