//! Synthetic pose-graph generation for SE(3) graph optimization experiments.
//!
//! A [`GraphConstructor`] emits vertices and relative-pose edges into any
//! [`SparseOptimizer`]; [`PoseGraph`] is the in-memory optimizer shipped here.

mod config;
pub use config::*;
mod error;
pub use error::*;
pub mod optimizer;
pub use optimizer::{EdgeSE3, PoseGraph, SparseOptimizer, VertexSE3};
pub mod noise;
pub mod constructor;
pub use constructor::{GraphBuilder, GraphConstructor};
pub mod se3_loop;
pub use se3_loop::{Se3LoopCfg, Se3LoopConstructor};
