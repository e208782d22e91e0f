//! Tests for the vqs module
//!
//! `Vqs` composition does not scale the translation term. Several tests here
//! pin that formula exactly so a change to it is noticed. With unit scale the
//! result must match the equivalent 4x4 matrices.

use kinema::{quat::Quat, vqs::Vqs};
use log::info;
use nalgebra_glm as glm;
use std::sync::Once;

const EPSILON: f32 = 0.0001f32; // Small value for float comparisons
static INIT: Once = Once::new();

fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

fn compare_vec(a: &glm::Vec3, b: &glm::Vec3) {
    let c = glm::equal_eps(a, b, EPSILON);
    assert!(c.x && c.y && c.z, "{a:?} != {b:?}");
}

fn compare(a: &Vqs, b: &Vqs) {
    compare_vec(&a.v, &b.v);
    assert!((a.q.dot(&b.q).abs() - 1.0f32).abs() < EPSILON);
    assert!((a.s - b.s).abs() < EPSILON);
}

fn use_these_vqs() -> (Vqs, Vqs, Vqs) {
    let a = Vqs::new(
        glm::vec3(3.0f32, 1.4f32, 0.0f32),
        Quat::from_axis_angle(&glm::vec3(0.0, 0.0, 1.0), 0.376f32),
        1.5f32,
    );
    let b = Vqs::new(
        glm::vec3(1.2f32, 0.0f32, -4.0f32),
        Quat::from_axis_angle(&glm::vec3(0.0, 1.0, 0.0), 0.512f32),
        0.5f32,
    );
    let c = Vqs::new(
        glm::vec3(-0.7f32, 5.1f32, -21.0f32),
        Quat::from_axis_angle(&glm::vec3(0.811107, 0.486664, 0.324443), 2.1f32),
        2.0f32,
    );
    (a, b, c)
}

/// Points for checking transforms
fn points() -> [glm::Vec3; 4] {
    [
        glm::vec3(0.0f32, 0.0f32, 0.0f32),
        glm::vec3(1.0f32, 0.0f32, 0.0f32),
        glm::vec3(-5.33f32, 0.00326f32, 9.31f32),
        glm::vec3(42.2f32, -3.0f32, 0.5f32),
    ]
}

/// The default is the identity for points and for composition
#[test]
fn identity() {
    let id = Vqs::default();
    for p in points() {
        compare_vec(&(id * p), &p);
    }
    let (a, _, _) = use_these_vqs();
    compare(&(id * a), &a);
    compare(&(a * id), &a);
}

#[test]
fn associative() {
    let (a, b, c) = use_these_vqs();
    let left = (a * b) * c;
    let right = a * (b * c);
    info!("associative left={:?} right={:?}", left, right);
    compare(&left, &right);
}

/// `a * b` applies `b` first
#[test]
fn order() {
    let (a, b, _) = use_these_vqs();
    for p in points() {
        compare_vec(&((a * b) * p), &(a * (b * p)));
    }
}

/// Pins the composition formula `{q1 v2 + v1, q1 q2, s1 s2}`
#[test]
fn composition_formula() {
    let (a, b, _) = use_these_vqs();
    let res = a * b;
    compare_vec(&res.v, &(a.q.rotate(&b.v) + a.v));
    let q = a.q * b.q;
    assert!((res.q.s - q.s).abs() < EPSILON);
    compare_vec(&res.q.v, &q.v);
    assert!((res.s - 0.75f32).abs() < EPSILON);

    // Scale is not applied to points either
    let p = glm::vec3(1.0f32, 2.0f32, 3.0f32);
    compare_vec(&(a * p), &(a.q.rotate(&p) + a.v));
}

/// With unit scale composition matches matrix multiplication
#[test]
fn matches_matrices() {
    init_tests();
    let (a, b, c) = use_these_vqs();
    let a = Vqs { s: 1.0, ..a };
    let b = Vqs { s: 1.0, ..b };
    let c = Vqs { s: 1.0, ..c };
    let m = a.to_mat4() * b.to_mat4() * c.to_mat4();
    let t = a * b * c;
    info!("matches_matrices m={:?}", m);
    let c = glm::equal_columns_eps(&m, &t.to_mat4(), EPSILON * 10.0);
    assert!(c.x && c.y && c.z && c.w);
    for p in points() {
        let mp = m * glm::vec4(p.x, p.y, p.z, 1.0f32);
        compare_vec(&glm::vec3(mp.x, mp.y, mp.z), &(t * p));
    }
}

#[test]
fn to_from_mat4() {
    let (a, _, c) = use_these_vqs();
    for t in [a, c, Vqs::default()] {
        let res = Vqs::from_mat4(&t.to_mat4());
        compare(&res, &t);
    }

    // Conversion to a shader array is column major
    let arr: [[f32; 4]; 4] = a.into();
    assert!((arr[3][0] - a.v.x).abs() < EPSILON);
    assert!((arr[3][1] - a.v.y).abs() < EPSILON);
    assert!((arr[3][2] - a.v.z).abs() < EPSILON);
    assert!((arr[3][3] - 1.0f32).abs() < EPSILON);
}

/// Non-uniform scale keeps the first column's scale and still gets the
/// rotation right
#[test]
fn non_uniform_scale() {
    init_tests();
    let rot = Quat::from_axis_angle(&glm::vec3(1.0, 0.0, 0.0), 1.42f32);
    let m = glm::translation(&glm::vec3(1.0f32, 2.0f32, 3.0f32))
        * rot.to_mat4()
        * glm::scaling(&glm::vec3(2.0f32, 3.0f32, 4.0f32));
    let res = Vqs::from_mat4(&m);
    assert!((res.s - 2.0f32).abs() < EPSILON);
    assert!((res.q.dot(&rot).abs() - 1.0f32).abs() < EPSILON);
    compare_vec(&res.v, &glm::vec3(1.0f32, 2.0f32, 3.0f32));
}

#[test]
fn inverse() {
    let (a, b, c) = use_these_vqs();
    for t in [a, b, c] {
        compare(&(t * t.inverse()), &Vqs::default());
        compare(&(t.inverse() * t), &Vqs::default());
        for p in points() {
            compare_vec(&(t.inverse() * (t * p)), &p);
        }
    }
}
