use std::f64::consts::PI;

use serde::Deserialize;
use slamlab_core::{SE3Quat, Translation};

use crate::constructor::{GraphBuilder, GraphConstructor};
use crate::optimizer::SparseOptimizer;
use crate::{GraphConfig, GraphError};

#[derive(Debug, Clone, Deserialize)]
pub struct Se3LoopCfg {
    pub traj_radius: f64,
    pub circle_nodes: usize,
}

impl Default for Se3LoopCfg {
    fn default() -> Self {
        Self {
            traj_radius: 2.0,
            circle_nodes: 10,
        }
    }
}

impl Se3LoopCfg {
    /// Fails on an empty circle or a radius that is not a positive finite number.
    pub fn finalize(self) -> Result<Se3LoopConstructor, GraphError> {
        if self.circle_nodes == 0 {
            return Err(GraphError::InvalidConfig(
                "circle_nodes must be at least 1".to_string(),
            ));
        }
        if !(self.traj_radius.is_finite() && self.traj_radius > 0.0) {
            return Err(GraphError::InvalidConfig(format!(
                "traj_radius must be positive, got {}",
                self.traj_radius
            )));
        }
        Ok(Se3LoopConstructor::from_cfg(&self))
    }
}

/// Closed loop of poses on a planar circle.
///
/// Vertex 0 is a fixed anchor at the origin and vertex 1 a fixed anchor at
/// `(center.x, 0, 0)`. The circle starts at vertex 1 and after
/// `circle_nodes` steps comes back onto it, which the loop-closure edge
/// between vertex 1 and the last vertex expresses.
#[derive(Debug, Clone)]
pub struct Se3LoopConstructor {
    traj_radius: f64,
    circle_nodes: usize,
    center: Translation,
}

impl Default for Se3LoopConstructor {
    fn default() -> Self {
        Self::from_cfg(&Se3LoopCfg::default())
    }
}

impl Se3LoopConstructor {
    fn from_cfg(cfg: &Se3LoopCfg) -> Self {
        Self {
            traj_radius: cfg.traj_radius,
            circle_nodes: cfg.circle_nodes,
            center: Translation::new(1.0, cfg.traj_radius, 0.0),
        }
    }

    pub fn center(&self) -> Translation {
        self.center
    }

    /// Relative pose between two consecutive circle vertices.
    pub fn step_pose(&self) -> SE3Quat {
        let angle = 2.0 * PI / self.circle_nodes as f64;
        let r = self.traj_radius;
        SE3Quat::from_yaw(
            angle,
            Translation::new(r * angle.sin(), r - r * angle.cos(), 0.0),
        )
    }

    fn set_init_pose_vertices<O: SparseOptimizer>(
        &self,
        builder: &mut GraphBuilder<'_, O>,
    ) -> Result<(), GraphError> {
        builder.add_pose_vertex(SE3Quat::identity(), true)?;
        builder.add_pose_vertex(
            SE3Quat::from_translation(Translation::new(self.center.x, 0.0, 0.0)),
            true,
        )?;
        Ok(())
    }

    fn set_circle_pose_vertices<O: SparseOptimizer>(
        &self,
        builder: &mut GraphBuilder<'_, O>,
    ) -> Result<(), GraphError> {
        let relpose = self.step_pose();
        for _ in 0..self.circle_nodes {
            let last = builder
                .gt_poses()
                .last()
                .copied()
                .unwrap_or_else(SE3Quat::identity);
            builder.add_pose_vertex(last * relpose, false)?;
        }
        Ok(())
    }

    fn set_edges_btw_poses<O: SparseOptimizer>(
        &self,
        builder: &mut GraphBuilder<'_, O>,
    ) -> Result<(), GraphError> {
        let count = builder.gt_poses().len();
        for i in 1..count {
            let gt = builder.gt_poses();
            let relpose = gt[i - 1].inverse() * gt[i];
            let measurement = builder.measurement(relpose);
            builder.add_edge_pose_pose(i - 1, i, measurement)?;
        }

        // the last pose lands back on vertex 1, not on the origin anchor
        let last = count - 1;
        let gt = builder.gt_poses();
        let relpose = gt[1].inverse() * gt[last];
        log::info!(
            "relpose between 1 and {last}:\n{}",
            relpose.to_homogeneous_matrix()
        );
        let measurement = builder.measurement(relpose);
        builder.add_edge_pose_pose(1, last, measurement)
    }
}

impl GraphConstructor for Se3LoopConstructor {
    fn construct<O: SparseOptimizer>(
        &self,
        optimizer: &mut O,
        config: &GraphConfig,
    ) -> Result<Vec<SE3Quat>, GraphError> {
        let mut builder = GraphBuilder::new(optimizer, config);

        self.set_init_pose_vertices(&mut builder)?;
        self.set_circle_pose_vertices(&mut builder)?;
        self.set_edges_btw_poses(&mut builder)?;

        Ok(builder.into_ground_truth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_circle_of_steps_returns_to_start() {
        let constructor = Se3LoopConstructor::default();
        let step = constructor.step_pose();
        let mut pose = SE3Quat::identity();
        for _ in 0..10 {
            pose = pose * step;
        }
        let m = pose.to_homogeneous_matrix();
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(m[(r, c)], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn circle_points_stay_on_radius() {
        let constructor = Se3LoopConstructor::default();
        let mut graph = crate::PoseGraph::new();
        let gt = constructor
            .construct(&mut graph, &GraphConfig::default())
            .unwrap();

        let center = constructor.center();
        for pose in &gt[1..] {
            let d = (pose.translation() - center).norm();
            assert_abs_diff_eq!(d, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn custom_node_count() {
        let constructor = Se3LoopCfg {
            traj_radius: 1.0,
            circle_nodes: 4,
        }
        .finalize()
        .unwrap();
        let mut graph = crate::PoseGraph::new();
        constructor
            .construct(&mut graph, &GraphConfig::default())
            .unwrap();

        assert_eq!(graph.len(), 6);
        assert_eq!(graph.edge_count(), 6);
    }

    #[test]
    fn empty_circle_is_rejected() {
        let result = Se3LoopCfg {
            traj_radius: 2.0,
            circle_nodes: 0,
        }
        .finalize();
        assert!(matches!(result, Err(GraphError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        for traj_radius in [0.0, -1.0, f64::NAN] {
            let result = Se3LoopCfg {
                traj_radius,
                circle_nodes: 10,
            }
            .finalize();
            assert!(matches!(result, Err(GraphError::InvalidConfig(_))));
        }
    }

    #[test]
    fn single_node_circle_closes_on_itself() {
        let constructor = Se3LoopCfg {
            traj_radius: 2.0,
            circle_nodes: 1,
        }
        .finalize()
        .unwrap();
        let mut graph = crate::PoseGraph::new();
        constructor
            .construct(&mut graph, &GraphConfig::default())
            .unwrap();

        assert_eq!(graph.len(), 3);
        assert!(graph.edges().iter().all(|e| e.vertices.0 != e.vertices.1));
        assert!(graph.chi2().is_finite());
    }
}
