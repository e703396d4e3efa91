use std::fmt;
use std::str::FromStr;

use crate::MatchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorKind {
    Sift,
    Surf,
    Orb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorClass {
    Float,
    Binary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceNorm {
    L2,
    Hamming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatcherKind {
    /// Exhaustive search. Without an explicit norm the norm follows the descriptor class.
    BruteForce(Option<DistanceNorm>),
    /// Approximate nearest neighbours (FLANN): kd-trees for float descriptors, LSH for binary.
    Flann,
}

impl DetectorKind {
    pub fn descriptor_class(self) -> DescriptorClass {
        match self {
            DetectorKind::Sift | DetectorKind::Surf => DescriptorClass::Float,
            DetectorKind::Orb => DescriptorClass::Binary,
        }
    }
}

impl DescriptorClass {
    pub fn norm(self) -> DistanceNorm {
        match self {
            DescriptorClass::Float => DistanceNorm::L2,
            DescriptorClass::Binary => DistanceNorm::Hamming,
        }
    }
}

impl MatcherKind {
    pub fn supports(self, class: DescriptorClass) -> bool {
        match self {
            MatcherKind::BruteForce(None) | MatcherKind::Flann => true,
            MatcherKind::BruteForce(Some(norm)) => norm == class.norm(),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sift" => Ok(DetectorKind::Sift),
            "surf" => Ok(DetectorKind::Surf),
            "orb" => Ok(DetectorKind::Orb),
            _ => Err(MatchError::UnsupportedKind(s.to_string())),
        }
    }
}

impl FromStr for MatcherKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bf" => Ok(MatcherKind::BruteForce(None)),
            "bf-l2" => Ok(MatcherKind::BruteForce(Some(DistanceNorm::L2))),
            "bf-hamming" => Ok(MatcherKind::BruteForce(Some(DistanceNorm::Hamming))),
            "flann" => Ok(MatcherKind::Flann),
            _ => Err(MatchError::UnsupportedKind(s.to_string())),
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectorKind::Sift => "SIFT",
            DetectorKind::Surf => "SURF",
            DetectorKind::Orb => "ORB",
        };
        f.write_str(name)
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::BruteForce(_) => f.write_str("BF"),
            MatcherKind::Flann => f.write_str("FLANN"),
        }
    }
}

/// A validated (detector, matcher) pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerKind {
    pub detector: DetectorKind,
    pub matcher: MatcherKind,
}

impl HandlerKind {
    pub fn new(detector: DetectorKind, matcher: MatcherKind) -> Result<Self, MatchError> {
        if !matcher.supports(detector.descriptor_class()) {
            return Err(MatchError::IncompatiblePairing { detector, matcher });
        }
        Ok(Self { detector, matcher })
    }

    pub fn parse(detector: &str, matcher: &str) -> Result<Self, MatchError> {
        Self::new(detector.parse()?, matcher.parse()?)
    }

    pub fn norm(&self) -> DistanceNorm {
        match self.matcher {
            MatcherKind::BruteForce(Some(norm)) => norm,
            _ => self.detector.descriptor_class().norm(),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.detector, self.matcher)
    }
}
