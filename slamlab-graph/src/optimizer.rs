use std::collections::BTreeMap;

use slamlab_core::{Real, SE3Quat};
use sophus::nalgebra::Matrix6;

use crate::GraphError;

pub type InformationMatrix = Matrix6<Real>;

#[derive(Debug, Clone)]
pub struct VertexSE3 {
    pub id: usize,
    // identity unless the constructor sets it
    pub estimate: SE3Quat,
    pub fixed: bool,
}

impl VertexSE3 {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            estimate: SE3Quat::identity(),
            fixed: false,
        }
    }
}

/// Relative pose constraint. `measurement` is expressed as `pose[id0]⁻¹ ∘ pose[id1]`.
#[derive(Debug, Clone)]
pub struct EdgeSE3 {
    pub vertices: (usize, usize),
    pub measurement: SE3Quat,
    pub information: InformationMatrix,
}

impl EdgeSE3 {
    pub fn new(id0: usize, id1: usize, measurement: SE3Quat, information: InformationMatrix) -> Self {
        Self {
            vertices: (id0, id1),
            measurement,
            information,
        }
    }

    /// Residual of the measurement against the given vertex estimates.
    pub fn error(&self, v0: &SE3Quat, v1: &SE3Quat) -> Real {
        let delta = self.measurement.inverse() * (v0.inverse() * *v1);
        let e = delta.to_minimal_vector();
        e.dot(&(self.information * e))
    }
}

/// The part of a sparse graph optimizer a constructor talks to.
pub trait SparseOptimizer {
    fn add_vertex(&mut self, vertex: VertexSE3) -> Result<(), GraphError>;
    fn add_edge(&mut self, edge: EdgeSE3) -> Result<(), GraphError>;
    fn vertex(&self, id: usize) -> Option<&VertexSE3>;
}

#[derive(Debug, Default)]
pub struct PoseGraph {
    vertices: BTreeMap<usize, VertexSE3>,
    edges: Vec<EdgeSE3>,
}

impl PoseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &VertexSE3> {
        self.vertices.values()
    }

    pub fn edges(&self) -> &[EdgeSE3] {
        &self.edges
    }

    /// Total weighted squared error over all edges at the current estimates.
    pub fn chi2(&self) -> Real {
        self.edges
            .iter()
            .filter_map(|edge| {
                let v0 = self.vertices.get(&edge.vertices.0)?;
                let v1 = self.vertices.get(&edge.vertices.1)?;
                Some(edge.error(&v0.estimate, &v1.estimate))
            })
            .sum()
    }
}

impl SparseOptimizer for PoseGraph {
    fn add_vertex(&mut self, vertex: VertexSE3) -> Result<(), GraphError> {
        if self.vertices.contains_key(&vertex.id) {
            return Err(GraphError::DuplicateVertex(vertex.id));
        }
        self.vertices.insert(vertex.id, vertex);
        Ok(())
    }

    fn add_edge(&mut self, edge: EdgeSE3) -> Result<(), GraphError> {
        let (id0, id1) = edge.vertices;
        for id in [id0, id1] {
            if !self.vertices.contains_key(&id) {
                return Err(GraphError::VertexNotFound(id));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    fn vertex(&self, id: usize) -> Option<&VertexSE3> {
        self.vertices.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slamlab_core::Translation;

    #[test]
    fn edge_to_unknown_vertex_is_rejected() {
        let mut graph = PoseGraph::new();
        graph.add_vertex(VertexSE3::new(0)).unwrap();

        let edge = EdgeSE3::new(0, 3, SE3Quat::identity(), InformationMatrix::identity());
        assert_eq!(graph.add_edge(edge), Err(GraphError::VertexNotFound(3)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_vertex_is_rejected() {
        let mut graph = PoseGraph::new();
        graph.add_vertex(VertexSE3::new(0)).unwrap();
        assert_eq!(
            graph.add_vertex(VertexSE3::new(0)),
            Err(GraphError::DuplicateVertex(0))
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn chi2_is_zero_for_consistent_estimates() {
        let mut graph = PoseGraph::new();
        let a = SE3Quat::from_yaw(0.4, Translation::new(1.0, 2.0, 0.0));
        let b = SE3Quat::from_yaw(-0.2, Translation::new(0.0, 1.0, 3.0));
        for (id, pose) in [(0, a), (1, b)] {
            let mut v = VertexSE3::new(id);
            v.estimate = pose;
            graph.add_vertex(v).unwrap();
        }
        graph
            .add_edge(EdgeSE3::new(0, 1, a.inverse() * b, InformationMatrix::identity() * 10.0))
            .unwrap();

        assert!(graph.chi2() < 1e-20);
    }

    #[test]
    fn chi2_weights_by_information() {
        let mut graph = PoseGraph::new();
        graph.add_vertex(VertexSE3::new(0)).unwrap();
        graph.add_vertex(VertexSE3::new(1)).unwrap();
        let measurement = SE3Quat::from_translation(Translation::new(1.0, 0.0, 0.0));
        graph
            .add_edge(EdgeSE3::new(0, 1, measurement, InformationMatrix::identity() * 10.0))
            .unwrap();

        assert!((graph.chi2() - 10.0).abs() < 1e-12);
    }
}
