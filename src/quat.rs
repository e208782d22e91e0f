use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Quaternion stored as a scalar part `s` and a vector part `v`
///
/// Rotations need a unit quaternion but this is not enforced. Arithmetic is
/// allowed to produce non-unit intermediate values and callers normalize
/// when they need a rotation. The layout is independent of `glm::Quat`,
/// which stores xyzw, and `From` conversions are provided both ways.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub s: f32,
    pub v: glm::Vec3,
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    #[must_use]
    pub const fn new(s: f32, v: glm::Vec3) -> Self {
        Self { s, v }
    }

    /// Creates from individual components in wxyz order
    #[must_use]
    pub fn from_wxyz(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self {
            s: w,
            v: glm::vec3(x, y, z),
        }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self {
            s: 1.0_f32,
            v: glm::Vec3::zeros(),
        }
    }

    /// Rotation of `angle` radians about `axis`. The axis does not need to be
    /// unit length. A zero length axis gives the identity.
    #[must_use]
    pub fn from_axis_angle(axis: &glm::Vec3, angle: f32) -> Self {
        let len = glm::length(axis);
        if len <= f32::EPSILON {
            return Self::identity();
        }
        let half = 0.5_f32 * angle;
        Self {
            s: half.cos(),
            v: axis * (half.sin() / len),
        }
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.s.mul_add(other.s, glm::dot(&self.v, &other.v))
    }

    #[must_use]
    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Divides by the magnitude. The result is undefined for a zero
    /// quaternion so callers must not pass one.
    #[must_use]
    pub fn normalize(&self) -> Self {
        *self * (1.0_f32 / self.length())
    }

    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self {
            s: self.s,
            v: -self.v,
        }
    }

    /// Multiplicative inverse, which is the conjugate for a unit quaternion
    #[must_use]
    pub fn inverse(&self) -> Self {
        self.conjugate() * (1.0_f32 / self.length_squared())
    }

    /// Rotates a vector. Assumes a unit quaternion.
    ///
    /// Uses `(2s² - 1)v + 2(u·v)u + 2s(u×v)` where `u` is the vector part,
    /// which avoids building a matrix or doing two quaternion products.
    #[must_use]
    pub fn rotate(&self, p: &glm::Vec3) -> glm::Vec3 {
        let u = &self.v;
        p * (2.0_f32 * self.s).mul_add(self.s, -1.0_f32)
            + u * (2.0_f32 * glm::dot(u, p))
            + glm::cross(u, p) * (2.0_f32 * self.s)
    }

    /// Rotation matrix for a unit quaternion
    #[must_use]
    pub fn to_mat3(&self) -> glm::Mat3 {
        let (w, x, y, z) = (self.s, self.v.x, self.v.y, self.v.z);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        // `Mat3::new` takes arguments in row major order
        glm::Mat3::new(
            1.0 - 2.0 * (yy + zz),
            2.0 * (xy - wz),
            2.0 * (xz + wy),
            2.0 * (xy + wz),
            1.0 - 2.0 * (xx + zz),
            2.0 * (yz - wx),
            2.0 * (xz - wy),
            2.0 * (yz + wx),
            1.0 - 2.0 * (xx + yy),
        )
    }

    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        glm::mat3_to_mat4(&self.to_mat3())
    }

    /// Extracts the rotation from the upper 3x3 of a matrix, which should be
    /// orthonormal.
    ///
    /// Branches on the largest of the trace and the diagonal terms so the
    /// square root is always taken of a value of at least 1. Rotations near
    /// 180 degrees have a trace near -1 and would otherwise divide by a value
    /// near zero.
    #[must_use]
    pub fn from_mat3(m: &glm::Mat3) -> Self {
        let (m00, m11, m22) = (m[(0, 0)], m[(1, 1)], m[(2, 2)]);
        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let r = (1.0 + trace).sqrt();
            let f = 0.5 / r;
            Self::from_wxyz(
                0.5 * r,
                (m[(2, 1)] - m[(1, 2)]) * f,
                (m[(0, 2)] - m[(2, 0)]) * f,
                (m[(1, 0)] - m[(0, 1)]) * f,
            )
        } else if m00 >= m11 && m00 >= m22 {
            let r = (1.0 + m00 - m11 - m22).sqrt();
            let f = 0.5 / r;
            Self::from_wxyz(
                (m[(2, 1)] - m[(1, 2)]) * f,
                0.5 * r,
                (m[(0, 1)] + m[(1, 0)]) * f,
                (m[(0, 2)] + m[(2, 0)]) * f,
            )
        } else if m11 >= m22 {
            let r = (1.0 + m11 - m00 - m22).sqrt();
            let f = 0.5 / r;
            Self::from_wxyz(
                (m[(0, 2)] - m[(2, 0)]) * f,
                (m[(0, 1)] + m[(1, 0)]) * f,
                0.5 * r,
                (m[(1, 2)] + m[(2, 1)]) * f,
            )
        } else {
            let r = (1.0 + m22 - m00 - m11).sqrt();
            let f = 0.5 / r;
            Self::from_wxyz(
                (m[(1, 0)] - m[(0, 1)]) * f,
                (m[(0, 2)] + m[(2, 0)]) * f,
                (m[(1, 2)] + m[(2, 1)]) * f,
                0.5 * r,
            )
        };
        q.normalize()
    }

    #[must_use]
    pub fn from_mat4(m: &glm::Mat4) -> Self {
        Self::from_mat3(&glm::mat4_to_mat3(m))
    }
}

impl Add for Quat {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            s: self.s + rhs.s,
            v: self.v + rhs.v,
        }
    }
}

impl Sub for Quat {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            s: self.s - rhs.s,
            v: self.v - rhs.v,
        }
    }
}

impl Neg for Quat {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            s: -self.s,
            v: -self.v,
        }
    }
}

impl Mul<f32> for Quat {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self {
            s: self.s * rhs,
            v: self.v * rhs,
        }
    }
}

impl Mul<Quat> for f32 {
    type Output = Quat;
    fn mul(self, rhs: Quat) -> Quat {
        rhs * self
    }
}

/// Hamilton product
impl Mul for Quat {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            s: self.s.mul_add(rhs.s, -glm::dot(&self.v, &rhs.v)),
            v: rhs.v * self.s + self.v * rhs.s + glm::cross(&self.v, &rhs.v),
        }
    }
}

/// Rotation of a vector, same as `rotate`
impl Mul<glm::Vec3> for Quat {
    type Output = glm::Vec3;
    fn mul(self, rhs: glm::Vec3) -> glm::Vec3 {
        self.rotate(&rhs)
    }
}

impl From<glm::Quat> for Quat {
    fn from(q: glm::Quat) -> Self {
        Self::from_wxyz(q.w, q.i, q.j, q.k)
    }
}

impl From<Quat> for glm::Quat {
    fn from(q: Quat) -> Self {
        glm::quat(q.v.x, q.v.y, q.v.z, q.s)
    }
}
