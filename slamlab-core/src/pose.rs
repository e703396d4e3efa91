use std::fmt;
use std::ops::Mul;

use sophus::nalgebra::{
    Isometry3, Matrix4, Quaternion, Translation3, UnitQuaternion, Vector3, Vector6,
};

use crate::{QuatCoeffs, Real, Translation};

/// Rigid body transform stored as a unit quaternion plus a translation.
///
/// Composition follows the usual convention: `(a * b).transform(p) == a.transform(b.transform(p))`.
#[derive(Clone, Copy, PartialEq)]
pub struct SE3Quat {
    iso: Isometry3<Real>,
}

impl Default for SE3Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl SE3Quat {
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    pub fn new(rotation: UnitQuaternion<Real>, translation: Translation) -> Self {
        Self {
            iso: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    pub fn from_translation(translation: Translation) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// Rotation of `angle` radians around the z axis followed by `translation`.
    pub fn from_yaw(angle: Real, translation: Translation) -> Self {
        Self::new(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
            translation,
        )
    }

    /// Builds a pose from raw (x, y, z, w) coefficients that need not have unit norm.
    pub fn from_raw_coeffs(coeffs: &QuatCoeffs, translation: Translation) -> Self {
        let quat = Quaternion::new(coeffs[3], coeffs[0], coeffs[1], coeffs[2]);
        Self::new(UnitQuaternion::new_normalize(quat), translation)
    }

    pub fn translation(&self) -> Translation {
        self.iso.translation.vector
    }

    pub fn rotation(&self) -> UnitQuaternion<Real> {
        self.iso.rotation
    }

    /// Quaternion coefficients in (x, y, z, w) order.
    pub fn coeffs(&self) -> QuatCoeffs {
        self.iso.rotation.quaternion().coords
    }

    pub fn inverse(&self) -> Self {
        Self {
            iso: self.iso.inverse(),
        }
    }

    pub fn normalize_rotation(&mut self) {
        self.iso.rotation = UnitQuaternion::new_normalize(self.iso.rotation.into_inner());
    }

    pub fn transform(&self, point: &Vector3<Real>) -> Vector3<Real> {
        self.iso.transform_vector(point) + self.iso.translation.vector
    }

    pub fn to_homogeneous_matrix(&self) -> Matrix4<Real> {
        self.iso.to_homogeneous()
    }

    /// Minimal 6-vector: translation followed by the quaternion vector part,
    /// with the sign chosen so that w is non-negative.
    pub fn to_minimal_vector(&self) -> Vector6<Real> {
        let coeffs = self.coeffs();
        let sign = if coeffs[3] < 0.0 { -1.0 } else { 1.0 };
        let t = self.translation();
        Vector6::new(
            t.x,
            t.y,
            t.z,
            sign * coeffs[0],
            sign * coeffs[1],
            sign * coeffs[2],
        )
    }
}

impl Mul for SE3Quat {
    type Output = SE3Quat;

    fn mul(self, rhs: SE3Quat) -> SE3Quat {
        SE3Quat {
            iso: self.iso * rhs.iso,
        }
    }
}

impl<'a> Mul<&'a SE3Quat> for &'a SE3Quat {
    type Output = SE3Quat;

    fn mul(self, rhs: &'a SE3Quat) -> SE3Quat {
        SE3Quat {
            iso: self.iso * rhs.iso,
        }
    }
}

impl fmt::Debug for SE3Quat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.translation();
        let q = self.coeffs();
        write!(
            f,
            "t=[{:.6} {:.6} {:.6}] r=[{:.6} {:.6} {:.6} {:.6}]",
            t.x, t.y, t.z, q[0], q[1], q[2], q[3]
        )
    }
}
