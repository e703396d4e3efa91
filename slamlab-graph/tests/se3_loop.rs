use approx::assert_abs_diff_eq;
use slamlab_core::SE3Quat;
use slamlab_graph::{GraphConfig, GraphConstructor, PoseGraph, Se3LoopConstructor, SparseOptimizer};

fn build(config: &GraphConfig) -> (PoseGraph, Vec<SE3Quat>) {
    let mut graph = PoseGraph::new();
    let gt = Se3LoopConstructor::default()
        .construct(&mut graph, config)
        .unwrap();
    (graph, gt)
}

fn assert_same_transform(a: &SE3Quat, b: &SE3Quat, epsilon: f64) {
    let ma = a.to_homogeneous_matrix();
    let mb = b.to_homogeneous_matrix();
    for r in 0..4 {
        for c in 0..4 {
            assert_abs_diff_eq!(ma[(r, c)], mb[(r, c)], epsilon = epsilon);
        }
    }
}

fn noisy_config() -> GraphConfig {
    GraphConfig {
        edge_noise: true,
        tran_noise: [0.1, 0.1, 0.1],
        quat_noise: [0.02, 0.02, 0.02, 0.02],
        seed: 42,
        ..Default::default()
    }
}

#[test]
fn default_loop_has_dense_ids() {
    let (graph, gt) = build(&GraphConfig::default());

    let ids: Vec<usize> = graph.vertices().map(|v| v.id).collect();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());
    assert_eq!(gt.len(), 12);
}

#[test]
fn only_anchors_are_fixed() {
    let (graph, gt) = build(&GraphConfig::default());

    for vertex in graph.vertices() {
        assert_eq!(vertex.fixed, vertex.id < 2);
        if vertex.fixed {
            assert_eq!(vertex.estimate, gt[vertex.id]);
        } else {
            assert_eq!(vertex.estimate, SE3Quat::identity());
        }
    }
}

#[test]
fn edges_reference_existing_vertices() {
    let (graph, _) = build(&noisy_config());

    for edge in graph.edges() {
        assert!(graph.vertex(edge.vertices.0).is_some());
        assert!(graph.vertex(edge.vertices.1).is_some());
    }
}

#[test]
fn chain_and_loop_edges() {
    let (graph, gt) = build(&GraphConfig::default());
    let edges = graph.edges();

    // one edge per consecutive ground-truth pair, then the loop closure
    assert_eq!(edges.len(), 12);
    for (i, edge) in edges[..11].iter().enumerate() {
        assert_eq!(edge.vertices, (i, i + 1));
        assert_same_transform(&edge.measurement, &(gt[i].inverse() * gt[i + 1]), 1e-9);
    }
    assert_eq!(edges[11].vertices, (1, 11));
}

#[test]
fn anchor_and_first_step_measurements() {
    let (graph, _) = build(&GraphConfig::default());
    let edges = graph.edges();

    let anchor = &edges[0].measurement;
    assert_abs_diff_eq!(anchor.translation().x, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(anchor.translation().y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(anchor.translation().z, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(anchor.rotation().angle(), 0.0, epsilon = 1e-12);

    let step = edges[1].measurement.translation();
    let angle = 2.0 * std::f64::consts::PI / 10.0;
    assert_abs_diff_eq!(step.x, 2.0 * angle.sin(), epsilon = 1e-9);
    assert_abs_diff_eq!(step.y, 2.0 * (1.0 - angle.cos()), epsilon = 1e-9);
    assert_abs_diff_eq!(step.x, 1.1756, epsilon = 1e-4);
    assert_abs_diff_eq!(step.y, 0.3820, epsilon = 1e-4);
    assert_abs_diff_eq!(step.z, 0.0, epsilon = 1e-12);
}

#[test]
fn chain_composes_to_loop_closure() {
    let (graph, _) = build(&GraphConfig::default());
    let edges = graph.edges();

    let chained = edges[1..11]
        .iter()
        .fold(SE3Quat::identity(), |acc, edge| acc * edge.measurement);
    assert_same_transform(&chained, &edges[11].measurement, 1e-9);
}

#[test]
fn noisy_edges_stay_within_bounds() {
    let (graph, gt) = build(&noisy_config());
    let edges = graph.edges();

    let mut perturbed = 0;
    for edge in edges {
        let (id0, id1) = edge.vertices;
        let truth = gt[id0].inverse() * gt[id1];

        let dt = edge.measurement.translation() - truth.translation();
        for axis in 0..3 {
            assert!(dt[axis].abs() <= 0.05 + 1e-12);
        }
        let dq = edge.measurement.coeffs() - truth.coeffs();
        for k in 0..4 {
            // 0.01 offset plus the effect of renormalizing
            assert!(dq[k].abs() <= 0.03);
        }
        assert_abs_diff_eq!(edge.measurement.coeffs().norm(), 1.0, epsilon = 1e-12);
        if dt.norm() > 0.0 {
            perturbed += 1;
        }
    }
    assert!(perturbed > 0);
}

#[test]
fn noise_is_reproducible_from_seed() {
    let (a, _) = build(&noisy_config());
    let (b, _) = build(&noisy_config());

    for (ea, eb) in a.edges().iter().zip(b.edges()) {
        assert_eq!(ea.measurement, eb.measurement);
    }
}

#[test]
fn ground_truth_initialization_has_zero_error() {
    let config = GraphConfig {
        init_vtx: true,
        ..Default::default()
    };
    let (graph, gt) = build(&config);

    for vertex in graph.vertices() {
        assert_eq!(vertex.estimate, gt[vertex.id]);
    }
    assert!(graph.chi2() < 1e-12);
}

#[test]
fn identity_initialization_has_positive_error() {
    let (graph, _) = build(&GraphConfig::default());
    assert!(graph.chi2() > 1.0);
}

#[test]
fn constructing_into_used_graph_fails() {
    let mut graph = PoseGraph::new();
    let constructor = Se3LoopConstructor::default();
    constructor
        .construct(&mut graph, &GraphConfig::default())
        .unwrap();

    assert!(constructor
        .construct(&mut graph, &GraphConfig::default())
        .is_err());
}
