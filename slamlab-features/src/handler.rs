use opencv::{
    core::{self, DMatch, KeyPoint, Mat, Point, Ptr, Scalar, Vector},
    features2d::{self, BFMatcher, DrawMatchesFlags, FlannBasedMatcher, ORB, SIFT},
    flann, imgproc,
    prelude::*,
    xfeatures2d::SURF,
};

use crate::{
    AcceptRatio, CompositeCanvas, DescriptorClass, DetectorKind, DistanceNorm, HandlerKind,
    MatchError, MatcherKind,
};

enum Detector {
    Sift(Ptr<SIFT>),
    Surf(Ptr<SURF>),
    Orb(Ptr<ORB>),
}

impl Detector {
    fn create(kind: DetectorKind) -> opencv::Result<Self> {
        Ok(match kind {
            DetectorKind::Sift => Detector::Sift(SIFT::create_def()?),
            DetectorKind::Surf => Detector::Surf(SURF::create_def()?),
            DetectorKind::Orb => Detector::Orb(ORB::create_def()?),
        })
    }

    fn detect_and_compute(
        &mut self,
        image: &Mat,
        keypoints: &mut Vector<KeyPoint>,
        descriptors: &mut Mat,
    ) -> opencv::Result<()> {
        let mask = Mat::default();
        match self {
            Detector::Sift(d) => d.detect_and_compute(image, &mask, keypoints, descriptors, false),
            Detector::Surf(d) => d.detect_and_compute(image, &mask, keypoints, descriptors, false),
            Detector::Orb(d) => d.detect_and_compute(image, &mask, keypoints, descriptors, false),
        }
    }
}

enum Matcher {
    BruteForce(Ptr<BFMatcher>),
    Flann(FlannBasedMatcher),
}

impl Matcher {
    fn create(kind: &HandlerKind) -> opencv::Result<Self> {
        let class = kind.detector.descriptor_class();
        Ok(match kind.matcher {
            MatcherKind::BruteForce(_) => {
                let norm = match kind.norm() {
                    DistanceNorm::L2 => core::NORM_L2,
                    DistanceNorm::Hamming => core::NORM_HAMMING,
                };
                Matcher::BruteForce(BFMatcher::create(norm, false)?)
            }
            MatcherKind::Flann if class == DescriptorClass::Binary => {
                // table_number, key_size, multi_probe_level
                let index = flann::IndexParams::from(flann::LshIndexParams::new(6, 12, 1)?);
                let search = flann::SearchParams::new_1(50, 0., true)?;
                Matcher::Flann(FlannBasedMatcher::new(&Ptr::new(index), &Ptr::new(search))?)
            }
            MatcherKind::Flann => Matcher::Flann(FlannBasedMatcher::new_def()?),
        })
    }

    fn knn_match(&self, query: &Mat, train: &Mat, k: i32) -> opencv::Result<Vector<Vector<DMatch>>> {
        let mut knn = Vector::<Vector<DMatch>>::new();
        let mask = Mat::default();
        match self {
            Matcher::BruteForce(m) => m.knn_train_match(query, train, &mut knn, k, &mask, false)?,
            Matcher::Flann(m) => m.knn_train_match(query, train, &mut knn, k, &mask, false)?,
        }
        Ok(knn)
    }
}

/// Lowe's ratio test over 2-nearest-neighbour candidates: keeps the best
/// match only when a second neighbour exists and
/// `best.distance < accept_ratio * second.distance`.
pub fn ratio_test(knn: &Vector<Vector<DMatch>>, accept_ratio: f32) -> Vector<DMatch> {
    knn.iter()
        .filter_map(|candidates| {
            if candidates.len() < 2 {
                return None;
            }
            let best = candidates.get(0).ok()?;
            let second = candidates.get(1).ok()?;
            (best.distance < accept_ratio * second.distance).then_some(best)
        })
        .collect()
}

/// One detector + matcher pairing together with its latest observation.
pub struct DescHandler {
    kind: HandlerKind,
    stripe: usize,
    detector: Detector,
    matcher: Matcher,

    // keypoints[i] is described by descriptors.row(i)
    keypoints: Vector<KeyPoint>,
    descriptors: Mat,
    image: Mat,

    matches: Vector<DMatch>,
}

impl DescHandler {
    pub fn factory(detector: &str, matcher: &str) -> Result<Self, MatchError> {
        Self::new(HandlerKind::parse(detector, matcher)?)
    }

    pub fn new(kind: HandlerKind) -> Result<Self, MatchError> {
        let detector = Detector::create(kind.detector).map_err(MatchError::DetectorError)?;
        let matcher = Matcher::create(&kind).map_err(MatchError::MatcherError)?;
        log::debug!("created handler {kind}");

        Ok(Self {
            kind,
            stripe: 0,
            detector,
            matcher,
            keypoints: Vector::new(),
            descriptors: Mat::default(),
            image: Mat::default(),
            matches: Vector::new(),
        })
    }

    /// Places this handler's output in stripe `stripe` of the composite.
    pub fn with_stripe(mut self, stripe: usize) -> Self {
        self.stripe = stripe;
        self
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn stripe(&self) -> usize {
        self.stripe
    }

    pub fn keypoints(&self) -> &Vector<KeyPoint> {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Mat {
        &self.descriptors
    }

    pub fn image(&self) -> &Mat {
        &self.image
    }

    /// Matches accepted by the last successful `match_and_draw`.
    pub fn matches(&self) -> &Vector<DMatch> {
        &self.matches
    }

    /// Detects keypoints on `frame` and describes them. On failure the previous
    /// observation is kept.
    pub fn detect_and_compute(&mut self, frame: &Mat) -> Result<(), MatchError> {
        if frame.empty() {
            return Err(MatchError::DetectorError(opencv::Error::new(
                core::StsBadArg,
                "empty frame".to_string(),
            )));
        }
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.detector
            .detect_and_compute(frame, &mut keypoints, &mut descriptors)
            .map_err(MatchError::DetectorError)?;

        if keypoints.len() != descriptors.rows() as usize {
            return Err(MatchError::DetectorError(opencv::Error::new(
                core::StsUnmatchedSizes,
                format!(
                    "{} keypoints but {} descriptor rows",
                    keypoints.len(),
                    descriptors.rows()
                ),
            )));
        }

        self.image = frame.try_clone().map_err(MatchError::DetectorError)?;
        self.keypoints = keypoints;
        self.descriptors = descriptors;
        log::trace!("{}: {} keypoints", self.kind, self.keypoints.len());
        Ok(())
    }

    /// Ratio-tested matches from this handler's descriptors to `reference`'s.
    pub fn match_with(
        &self,
        reference: &DescHandler,
        accept_ratio: f32,
    ) -> Result<Vector<DMatch>, MatchError> {
        // with fewer than two reference descriptors no candidate has a second neighbour
        if self.descriptors.rows() == 0 || reference.descriptors.rows() < 2 {
            return Ok(Vector::new());
        }
        let knn = self
            .matcher
            .knn_match(&self.descriptors, &reference.descriptors, 2)
            .map_err(MatchError::MatcherError)?;
        Ok(ratio_test(&knn, accept_ratio))
    }

    /// Matches against `reference`, draws both frames with the accepted
    /// matches and copies the panel into this handler's stripe of `canvas`.
    /// Returns the number of accepted matches.
    pub fn match_and_draw(
        &mut self,
        reference: &DescHandler,
        accept_ratio: AcceptRatio,
        canvas: &mut CompositeCanvas,
    ) -> Result<usize, MatchError> {
        let matches = self.match_with(reference, accept_ratio.value())?;
        let panel = self
            .draw(reference, &matches, accept_ratio)
            .map_err(MatchError::RenderError)?;
        canvas
            .write_stripe(self.stripe, &panel)
            .map_err(MatchError::RenderError)?;

        let count = matches.len();
        self.matches = matches;
        Ok(count)
    }

    fn draw(
        &self,
        reference: &DescHandler,
        matches: &Vector<DMatch>,
        accept_ratio: AcceptRatio,
    ) -> opencv::Result<Mat> {
        let mut panel = Mat::default();
        features2d::draw_matches(
            &self.image,
            &self.keypoints,
            &reference.image,
            &reference.keypoints,
            matches,
            &mut panel,
            Scalar::all(-1.),
            Scalar::all(-1.),
            &Vector::<i8>::new(),
            DrawMatchesFlags::DEFAULT,
        )?;

        let label = format!(
            "{} ratio {:.1} matches {}",
            self.kind,
            accept_ratio.value(),
            matches.len()
        );
        imgproc::put_text(
            &mut panel,
            &label,
            Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            Scalar::new(0., 255., 0., 0.),
            2,
            imgproc::LINE_8,
            false,
        )?;
        Ok(panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(query: i32, train: i32, distance: f32) -> DMatch {
        DMatch {
            query_idx: query,
            train_idx: train,
            img_idx: 0,
            distance,
        }
    }

    fn knn(pairs: &[(f32, Option<f32>)]) -> Vector<Vector<DMatch>> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (best, second))| {
                let mut row = Vector::<DMatch>::new();
                row.push(candidate(i as i32, i as i32, *best));
                if let Some(second) = second {
                    row.push(candidate(i as i32, i as i32 + 1, *second));
                }
                row
            })
            .collect()
    }

    #[test]
    fn ratio_test_needs_a_second_neighbour() {
        let accepted = ratio_test(&knn(&[(0.0, None), (1.0, Some(10.0))]), 1.0);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted.get(0).unwrap().query_idx, 1);
    }

    #[test]
    fn ratio_test_is_strict() {
        // 2 < 0.5 * 4 does not hold
        assert!(ratio_test(&knn(&[(2.0, Some(4.0))]), 0.5).is_empty());
        assert_eq!(ratio_test(&knn(&[(1.9, Some(4.0))]), 0.5).len(), 1);
    }

    #[test]
    fn ratio_zero_rejects_everything() {
        let candidates = knn(&[(0.0, Some(1.0)), (0.0, Some(0.0)), (3.0, Some(9.0))]);
        assert!(ratio_test(&candidates, 0.0).is_empty());
    }

    #[test]
    fn accepted_sets_grow_with_ratio() {
        let candidates = knn(&[
            (0.0, Some(5.0)),
            (1.0, Some(5.0)),
            (2.0, Some(5.0)),
            (3.0, Some(5.0)),
            (4.0, Some(5.0)),
            (4.9, Some(5.0)),
            (1.0, None),
        ]);
        let mut previous: Vec<i32> = Vec::new();
        for tenths in 0..=10 {
            let ratio = AcceptRatio::from_tenths(tenths).value();
            let accepted: Vec<i32> = ratio_test(&candidates, ratio)
                .iter()
                .map(|m| m.query_idx)
                .collect();
            assert!(previous.iter().all(|q| accepted.contains(q)));
            previous = accepted;
        }
        assert_eq!(previous.len(), 6);
    }
}
