use crate::quat::Quat;
use log::warn;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Tolerance when checking a matrix for uniform scale
const SCALE_EPSILON: f32 = 0.001_f32;

/// Translation, rotation and uniform scale
///
/// Used in place of a 4x4 matrix for bone transforms. Non-uniform scale can
/// not be represented.
///
/// Composition follows the matrix convention: `a * b` applies `b` first and
/// then `a`, so `(a * b) * p == a * (b * p)`.
///
/// The translation term of a composition, and the point transform, do not
/// multiply by the scale. Scale is carried through `s` and is only applied
/// when converting to a matrix. With unit scale, which is the normal case for
/// skeletal rigs, this is the same as the matrix product.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vqs {
    pub v: glm::Vec3,
    pub q: Quat,
    pub s: f32,
}

impl Default for Vqs {
    fn default() -> Self {
        Self {
            v: glm::Vec3::zeros(),
            q: Quat::identity(),
            s: 1.0_f32,
        }
    }
}

impl Vqs {
    #[must_use]
    pub const fn new(v: glm::Vec3, q: Quat, s: f32) -> Self {
        Self { v, q, s }
    }

    #[must_use]
    pub fn from_translation(v: glm::Vec3) -> Self {
        Self {
            v,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_rotation(q: Quat) -> Self {
        Self {
            q,
            ..Self::default()
        }
    }

    /// Inverse under the composition rule of this type, so that
    /// `a * a.inverse()` and `a.inverse() * a` are both the identity.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let q = self.q.inverse();
        Self {
            v: -(q * self.v),
            q,
            s: 1.0_f32 / self.s,
        }
    }

    /// Transforms a point. Same as `*` with a `glm::Vec3`.
    #[must_use]
    pub fn transform_point(&self, p: &glm::Vec3) -> glm::Vec3 {
        self.q.rotate(p) + self.v
    }

    /// Converts to a translation * rotation * scale matrix
    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        let m = glm::translation(&self.v) * self.q.to_mat4();
        glm::scale(&m, &glm::vec3(self.s, self.s, self.s))
    }

    /// Decomposes an affine matrix. The scale is taken from the length of the
    /// first column. A warning is logged if the scale is not uniform since
    /// only the first column's scale will be kept.
    #[must_use]
    pub fn from_mat4(m: &glm::Mat4) -> Self {
        let v = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        let m3 = glm::mat4_to_mat3(m);
        let sx = glm::length(&m3.column(0).into_owned());
        let sy = glm::length(&m3.column(1).into_owned());
        let sz = glm::length(&m3.column(2).into_owned());
        if (sx - sy).abs() > SCALE_EPSILON || (sx - sz).abs() > SCALE_EPSILON {
            warn!("non-uniform scale {sx} {sy} {sz} reduced to {sx}");
        }
        if sx <= f32::EPSILON {
            warn!("degenerate matrix has zero scale");
            return Self::from_translation(v);
        }
        let rot = glm::Mat3::from_columns(&[
            m3.column(0) / sx,
            m3.column(1) / sy.max(f32::EPSILON),
            m3.column(2) / sz.max(f32::EPSILON),
        ]);
        Self {
            v,
            q: Quat::from_mat3(&rot),
            s: sx,
        }
    }
}

impl Mul for Vqs {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            v: self.q.rotate(&rhs.v) + self.v,
            q: self.q * rhs.q,
            s: self.s * rhs.s,
        }
    }
}

impl Mul<glm::Vec3> for Vqs {
    type Output = glm::Vec3;
    fn mul(self, rhs: glm::Vec3) -> glm::Vec3 {
        self.transform_point(&rhs)
    }
}

/// Conversion to a column major array ready to upload as a shader mat4
impl From<Vqs> for [[f32; 4]; 4] {
    fn from(t: Vqs) -> [[f32; 4]; 4] {
        t.to_mat4().into()
    }
}
