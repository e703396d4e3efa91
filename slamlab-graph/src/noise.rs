use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use slamlab_core::{QuatCoeffs, SE3Quat, Translation};

use crate::GraphConfig;

/// Uniform measurement noise: each translation axis and each quaternion
/// coefficient is offset independently by a value in `[-0.5 * bound, 0.5 * bound]`.
pub struct NoiseModel {
    tran_bound: Translation,
    quat_bound: QuatCoeffs,
    rng: ChaCha8Rng,
}

impl NoiseModel {
    pub fn new(tran_bound: Translation, quat_bound: QuatCoeffs, seed: u64) -> Self {
        Self {
            tran_bound,
            quat_bound,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(
            Translation::from(config.tran_noise),
            QuatCoeffs::from(config.quat_noise),
            config.seed,
        )
    }

    fn centered(&mut self) -> f64 {
        self.rng.gen_range(-0.5..=0.5)
    }

    /// Perturbed translation and quaternion coefficients, before the rotation is renormalized.
    pub fn perturb_raw(&mut self, pose: &SE3Quat) -> (Translation, QuatCoeffs) {
        let mut tran = pose.translation();
        for axis in 0..3 {
            let offset = self.centered();
            tran[axis] += self.tran_bound[axis] * offset;
        }
        let mut coeffs = pose.coeffs();
        for k in 0..4 {
            let offset = self.centered();
            coeffs[k] += self.quat_bound[k] * offset;
        }
        (tran, coeffs)
    }

    pub fn perturb(&mut self, pose: &SE3Quat) -> SE3Quat {
        let (tran, coeffs) = self.perturb_raw(pose);
        let mut noisy = SE3Quat::from_raw_coeffs(&coeffs, tran);
        noisy.normalize_rotation();
        noisy
    }
}
