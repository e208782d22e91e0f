//! Tests for the quat module
//!
//! Results are compared against `nalgebra_glm`, which stores quaternions in
//! xyzw order. `Quat` keeps the scalar separately so conversions are used to
//! line things up.

use kinema::quat::Quat;
use log::info;
use nalgebra_glm as glm;
use std::sync::Once;

const EPSILON: f32 = 0.0001f32; // Small value for float comparisons
static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// Assorted axes and angles, including awkward ones
fn axis_angles() -> Vec<(glm::Vec3, f32)> {
    let axes = [
        glm::vec3(1.0f32, 0.0f32, 0.0f32),
        glm::vec3(0.0f32, 1.0f32, 0.0f32),
        glm::vec3(0.0f32, 0.0f32, 1.0f32),
        glm::vec3(0.620174f32, -0.248069f32, 0.744208f32),
        glm::vec3(-3.0f32, 14.0f32, 0.5f32),
        glm::vec3(0.001f32, -0.002f32, 0.0005f32),
    ];
    let angles = [
        0.0f32,
        0.0808f32,
        -1.491f32,
        std::f32::consts::FRAC_PI_2,
        3.0f32,
        std::f32::consts::PI,
        -std::f32::consts::PI,
        5.9f32,
    ];
    let mut ret = Vec::new();
    for axis in axes {
        for angle in angles {
            ret.push((axis, angle));
        }
    }
    ret
}

fn compare(q1: &Quat, q2: &Quat) {
    assert!((q1.s - q2.s).abs() < EPSILON, "{q1:?} != {q2:?}");
    let c = glm::equal_eps(&q1.v, &q2.v, EPSILON);
    assert!(c.x && c.y && c.z, "{q1:?} != {q2:?}");
}

/// Same rotation, allowing for q and -q
fn compare_rotation(q1: &Quat, q2: &Quat) {
    assert!(
        (q1.dot(q2).abs() - 1.0f32).abs() < EPSILON,
        "{q1:?} is not the same rotation as {q2:?}"
    );
}

/// Tests `Quat::default`
#[test]
fn default() {
    let q = Quat::default();
    assert_eq!(q.s, 1.0f32);
    assert_eq!(q.v, glm::Vec3::zeros());
}

/// Tests `Quat::normalize` gives unit length for axis-angle inputs
#[test]
fn unit_norm() {
    for (axis, angle) in axis_angles() {
        let q = Quat::from_axis_angle(&axis, angle);
        assert!((q.length() - 1.0f32).abs() < EPSILON);
        // Scaled versions normalize back
        let scaled = q * 7.5f32;
        assert!((scaled.normalize().length() - 1.0f32).abs() < EPSILON);
        compare(&scaled.normalize(), &q);
    }
}

/// Tests `Quat::from_axis_angle` against glm
#[test]
fn axis_angle() {
    for (axis, angle) in axis_angles() {
        let q1 = Quat::from_axis_angle(&axis, angle);
        let q2: Quat = glm::quat_angle_axis(angle, &glm::normalize(&axis)).into();
        compare(&q1, &q2);
    }
}

/// Tests the Hamilton product and conjugate
#[test]
fn product() {
    let q1 = Quat::from_wxyz(4.0, 1.0, 2.0, 3.0);
    let q2 = Quat::from_wxyz(1.0, 4.0, 3.0, 2.0);
    // Same values as the product in the glm tests, written out
    let res = q1 * q2;
    assert!(
        res.s == -12.0f32
            && res.v.x == 12.0f32
            && res.v.y == 24.0f32
            && res.v.z == 6.0f32
    );

    // A quaternion times its conjugate is a scalar
    let res = q1 * q1.conjugate();
    assert_eq!(res.s, 30.0f32);
    assert_eq!(res.v, glm::Vec3::zeros());

    // Not commutative
    let a = Quat::from_axis_angle(&glm::vec3(1.0, 0.0, 0.0), 0.7);
    let b = Quat::from_axis_angle(&glm::vec3(0.0, 1.0, 0.0), 0.4);
    assert!(((a * b).dot(&(b * a)) - 1.0f32).abs() > EPSILON * 0.1);
}

/// Tests `Quat::inverse`
#[test]
fn inverse() {
    let q = Quat::from_wxyz(0.5, -1.0, 2.0, 0.25);
    let res = q * q.inverse();
    compare(&res, &Quat::identity());
}

/// Tests `Quat::rotate` against glm and against the `q v q*` product
#[test]
fn rotate() {
    init_tests();
    let p = glm::vec3(-12.6f32, 1204.0f32, 0.004f32);
    for (axis, angle) in axis_angles() {
        let q = Quat::from_axis_angle(&axis, angle);
        let r1 = q.rotate(&p);
        let gq: glm::Quat = q.into();
        let r2 = glm::quat_rotate_vec3(&gq, &p);
        let pure = Quat::new(0.0f32, p);
        let r3 = (q * pure * q.conjugate()).v;
        // Large input so compare relative to its size
        let c = glm::equal_eps(&r1, &r2, 0.001f32 * glm::length(&p));
        assert!(c.x && c.y && c.z, "{r1:?} != {r2:?}");
        let c = glm::equal_eps(&r1, &r3, 0.001f32 * glm::length(&p));
        assert!(c.x && c.y && c.z, "{r1:?} != {r3:?}");
    }
    let q = Quat::from_axis_angle(
        &glm::vec3(0.0f32, 1.0f32, 0.0f32),
        std::f32::consts::FRAC_PI_2,
    );
    let r = q * glm::vec3(1.0f32, 0.0f32, 0.0f32);
    info!("rotate r={:?}", r);
    let c = glm::equal_eps(&r, &glm::vec3(0.0f32, 0.0f32, -1.0f32), EPSILON);
    assert!(c.x && c.y && c.z);
}

/// Tests `Quat::to_mat4` against glm
#[test]
fn to_mat4() {
    for (axis, angle) in axis_angles() {
        let q = Quat::from_axis_angle(&axis, angle);
        let m1 = q.to_mat4();
        let gq: glm::Quat = q.into();
        let m2 = glm::quat_to_mat4(&gq);
        let c = glm::equal_columns_eps(&m1, &m2, EPSILON);
        assert!(c.x && c.y && c.z && c.w);
    }
}

/// Tests `Quat::from_mat4`, including rotations near 180 degrees where the
/// trace is close to -1
#[test]
fn from_mat4() {
    init_tests();
    for (axis, angle) in axis_angles() {
        let q = Quat::from_axis_angle(&axis, angle);
        let m = q.to_mat4();
        let res = Quat::from_mat4(&m);
        compare_rotation(&res, &q);
        assert!((res.length() - 1.0f32).abs() < EPSILON);
    }

    // Arbitrary glm built matrix with translation, which is ignored
    let m = glm::Mat4::identity();
    let m = glm::translate(&m, &glm::vec3(31.0f32, -192.52f32, -0.34f32));
    let m = glm::rotate_z(&m, -0.261f32);
    let res = Quat::from_mat4(&m);
    info!("from_mat4 res={:?}", res);
    let expect = Quat::from_axis_angle(&glm::vec3(0.0, 0.0, 1.0), -0.261f32);
    compare_rotation(&res, &expect);
}
