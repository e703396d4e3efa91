use slamlab_core::SE3Quat;

use crate::noise::NoiseModel;
use crate::optimizer::{EdgeSE3, InformationMatrix, SparseOptimizer, VertexSE3};
use crate::{GraphConfig, GraphError};

const EDGE_INFORMATION_WEIGHT: f64 = 10.0;

/// A synthetic graph generator. Returns the ground-truth pose of every vertex, indexed by id.
pub trait GraphConstructor {
    fn construct<O: SparseOptimizer>(
        &self,
        optimizer: &mut O,
        config: &GraphConfig,
    ) -> Result<Vec<SE3Quat>, GraphError>;
}

/// Bookkeeping shared by graph constructors: id allocation, ground truth,
/// noise injection and edge creation.
pub struct GraphBuilder<'a, O: SparseOptimizer> {
    optimizer: &'a mut O,
    config: GraphConfig,
    gt_poses: Vec<SE3Quat>,
    next_id: usize,
    noise: NoiseModel,
}

impl<'a, O: SparseOptimizer> GraphBuilder<'a, O> {
    pub fn new(optimizer: &'a mut O, config: &GraphConfig) -> Self {
        Self {
            optimizer,
            config: config.clone(),
            gt_poses: Vec::new(),
            next_id: 0,
            noise: NoiseModel::from_config(config),
        }
    }

    pub fn gt_poses(&self) -> &[SE3Quat] {
        &self.gt_poses
    }

    pub fn into_ground_truth(self) -> Vec<SE3Quat> {
        self.gt_poses
    }

    pub fn get_new_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Adds a vertex for `pose` and records it as ground truth.
    ///
    /// The estimate is only set for fixed vertices or when `init_vtx` is on;
    /// otherwise the vertex keeps the identity estimate.
    pub fn add_pose_vertex(&mut self, pose: SE3Quat, fixed: bool) -> Result<usize, GraphError> {
        log::debug!("add pose: {:?}", pose);
        let mut vertex = VertexSE3::new(self.get_new_id());
        if fixed || self.config.init_vtx {
            vertex.estimate = pose;
        }
        vertex.fixed = fixed;

        let id = vertex.id;
        self.optimizer.add_vertex(vertex)?;
        self.gt_poses.push(pose);
        Ok(id)
    }

    pub fn add_edge_pose_pose(
        &mut self,
        id0: usize,
        id1: usize,
        relpose: SE3Quat,
    ) -> Result<(), GraphError> {
        log::debug!("add edge: id0={id0}, id1={id1}, {:?}", relpose);
        for id in [id0, id1] {
            if self.optimizer.vertex(id).is_none() {
                return Err(GraphError::VertexNotFound(id));
            }
        }

        let information = InformationMatrix::identity() * EDGE_INFORMATION_WEIGHT;
        self.optimizer
            .add_edge(EdgeSE3::new(id0, id1, relpose, information))
    }

    /// Perturbs `pose` regardless of `edge_noise`; callers decide whether to use it.
    pub fn add_noise_pose_measurement(&mut self, pose: &SE3Quat) -> SE3Quat {
        let noisy = self.noise.perturb(pose);
        log::debug!("[add noise] before: {:?}", pose);
        log::debug!("[add noise] after: {:?}", noisy);
        noisy
    }

    /// `relpose`, perturbed when edge noise is enabled.
    pub fn measurement(&mut self, relpose: SE3Quat) -> SE3Quat {
        if self.config.edge_noise {
            self.add_noise_pose_measurement(&relpose)
        } else {
            relpose
        }
    }
}
