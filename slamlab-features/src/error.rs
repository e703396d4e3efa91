use thiserror::Error;

use crate::{DetectorKind, MatcherKind};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("unsupported detector or matcher kind: {0}")]
    UnsupportedKind(String),
    #[error("{matcher:?} matcher cannot compare {detector:?} descriptors")]
    IncompatiblePairing {
        detector: DetectorKind,
        matcher: MatcherKind,
    },
    #[error("cannot open camera device {0}")]
    CaptureUnavailable(i32),
    #[error("detection failed: {0}")]
    DetectorError(#[source] opencv::Error),
    #[error("matching failed: {0}")]
    MatcherError(#[source] opencv::Error),
    #[error("rendering failed: {0}")]
    RenderError(#[source] opencv::Error),
}
