//! Side-by-side comparison of keypoint detector / descriptor matcher pairings.
//!
//! Each [`DescHandler`] owns one detector and one matcher. A
//! [`MatchVisualizer`] keeps two aligned sets of handlers, one bound to a
//! reference frame and one to the live frame, and renders the ratio-tested
//! matches of every pairing into its own stripe of a [`CompositeCanvas`].

mod error;
pub use error::*;
mod kind;
pub use kind::*;
pub mod canvas;
pub use canvas::CompositeCanvas;
pub mod control;
pub use control::{AcceptRatio, KeyCommand};
pub mod handler;
pub use handler::{ratio_test, DescHandler};
pub mod source;
pub use source::{CameraSource, FrameSource, HighGui, Ui};
pub mod visualizer;
pub use visualizer::{Control, MatchVisualizer, MatchVisualizerCfg, RunSummary};
