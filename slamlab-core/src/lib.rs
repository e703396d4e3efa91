mod pose;
pub use pose::*;

use sophus::nalgebra::{Vector3, Vector4};

pub type Real = f64;
pub type Translation = Vector3<Real>;
// quaternion coefficients in (x, y, z, w) order
pub type QuatCoeffs = Vector4<Real>;
