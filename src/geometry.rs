//! 点・ベクトル演算（状態なし）

use nalgebra::{UnitQuaternion, Vector3};

/// 3成分の座標 `[x, y, z]`
///
/// 空間上の位置としても、検出器の生キーポイントとしても使う。
pub type Point = [f32; 3];

pub const ORIGIN: Point = [0.0, 0.0, 0.0];

/// 2点の中点
pub fn middle(a: &Point, b: &Point) -> Point {
    weighted_middle(a, b, 1.0, 1.0)
}

/// 重み付き中点: `(aw * a + bw * b) / (aw + bw)`
///
/// `aw > bw` なら `a` 寄りになる。
pub fn weighted_middle(a: &Point, b: &Point, aw: f32, bw: f32) -> Point {
    let w = aw + bw;
    [
        (aw * a[0] + bw * b[0]) / w,
        (aw * a[1] + bw * b[1]) / w,
        (aw * a[2] + bw * b[2]) / w,
    ]
}

pub fn diff(a: &Point, b: &Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn sum(a: &Point, b: &Point) -> Point {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// 成分ごとの積
pub fn scale_by(a: &Point, s: &Point) -> Point {
    [a[0] * s[0], a[1] * s[1], a[2] * s[2]]
}

/// ユークリッド距離
pub fn distance(a: &Point, b: &Point) -> f32 {
    let d = diff(a, b);
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// (sx, sy) → (dx, dy) 方向の角度
pub fn angle(sx: f32, sy: f32, dx: f32, dy: f32) -> f32 {
    f32::atan2(dy - sy, dx - sx)
}

/// a → b 方向の yaw / pitch / roll
///
/// yaw: XZ平面, pitch: ZY平面, roll: XY平面
pub fn yaw_pitch_roll(a: &Point, b: &Point) -> Point {
    let tau = 2.0 * std::f32::consts::PI;
    [
        angle(a[2], a[0], b[2], b[0]) % tau,
        angle(a[2], a[1], b[2], b[1]) % tau,
        angle(a[0], a[1], b[0], b[1]) % tau,
    ]
}

/// `angle2 - angle1` を `[-π, π)` に折り返した符号付き差分
pub fn relative_angle(angle1: f32, angle2: f32) -> f32 {
    use std::f32::consts::PI;
    (angle2 - angle1 + PI).rem_euclid(2.0 * PI) - PI
}

pub fn radians_to_degrees(rad: f32) -> i32 {
    (180.0 * rad / std::f32::consts::PI).round() as i32
}

/// 3点を通る平面の単位法線 `(p2 - p1) × (p3 - p1)`
///
/// 3点が同一直線上にある場合は None。
pub fn plane_normal(p1: &Point, p2: &Point, p3: &Point) -> Option<Point> {
    let a = Vector3::from(*p1);
    let u = Vector3::from(*p2) - a;
    let v = Vector3::from(*p3) - a;
    let n = u.cross(&v);
    let len = n.norm();
    if len < f32::EPSILON {
        return None;
    }
    let n = n / len;
    Some([n.x, n.y, n.z])
}

/// オイラー角 (x, y, z) → クォータニオン (x, y, z, w)
pub fn euler_to_quaternion(rotation: &Point) -> [f32; 4] {
    let q = UnitQuaternion::from_euler_angles(rotation[0], rotation[1], rotation[2]);
    [q.i, q.j, q.k, q.w]
}
