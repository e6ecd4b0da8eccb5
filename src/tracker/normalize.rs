use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// 正規化オプション
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// 追加する min/max を、x は正規化後の値から、y/z は生の値から求める旧挙動。
    /// バウンディングボックス側がこの値に依存しているため既定で有効
    #[serde(default = "default_legacy_extents")]
    pub legacy_extents: bool,
}

fn default_legacy_extents() -> bool { true }

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            legacy_extents: default_legacy_extents(),
        }
    }
}

fn extents<'a>(points: impl Iterator<Item = &'a Point>) -> (Point, Point) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in points {
        for a in 0..3 {
            min[a] = min[a].min(p[a]);
            max[a] = max[a].max(p[a]);
        }
    }
    (min, max)
}

/// キーポイントを中心合わせ・スケーリングし、末尾に min, max, position を追加する
///
/// `scale = hypot(幅x, 幅y)`（奥行きは含めない）。出力長は `keypoints.len() + 3`。
/// `offsets` が足りないキーポイントには補正を掛けない。
pub fn normalize(
    keypoints: &[Point],
    target_scale: &Point,
    manual_offset: &Point,
    offsets: &[Point],
    options: NormalizeOptions,
) -> Vec<Point> {
    if keypoints.is_empty() {
        return Vec::new();
    }
    let (min, max) = extents(keypoints.iter());
    let mut scale = (max[0] - min[0]).hypot(max[1] - min[1]);
    if scale == 0.0 || !scale.is_finite() {
        // 全点が同じ xy に潰れている
        scale = 1.0;
    }
    let center = [
        (max[0] + min[0]) / 2.0,
        (max[1] + min[1]) / 2.0,
        (max[2] + min[2]) / 2.0,
    ];

    let mut out: Vec<Point> = Vec::with_capacity(keypoints.len() + 3);
    for (i, kpt) in keypoints.iter().enumerate() {
        let o = offsets.get(i).copied().unwrap_or([0.0; 3]);
        out.push([
            target_scale[0] * (kpt[0] - center[0]) / scale + o[0],
            target_scale[1] * (kpt[1] - center[1]) / scale + o[1],
            target_scale[2] * (kpt[2] - center[2]) / scale + o[2],
        ]);
    }

    let (out_min, out_max) = extents(out.iter());
    let (min, max) = if options.legacy_extents {
        ([out_min[0], min[1], min[2]], [out_max[0], max[1], max[2]])
    } else {
        (out_min, out_max)
    };
    out.push(min);
    out.push(max);
    out.push([
        target_scale[0] * center[0] / scale + manual_offset[0],
        target_scale[1] * center[1] / scale + manual_offset[1],
        target_scale[2] * center[2] / scale + manual_offset[2],
    ]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Point = [1.0, 1.0, 1.0];
    const ZERO: Point = [0.0, 0.0, 0.0];

    fn approx_eq_3(a: &Point, b: &Point) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5 && (a[2] - b[2]).abs() < 1e-5
    }

    fn body() -> Vec<Point> {
        vec![
            [0.2, 1.5, 0.3],
            [-0.4, 0.9, 0.1],
            [0.5, 0.8, -0.2],
            [0.1, -0.3, 0.0],
            [-0.2, -0.4, 0.4],
        ]
    }

    #[test]
    fn test_symmetric_pair() {
        let out = normalize(&[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &ONE, &ZERO, &[ZERO; 2], NormalizeOptions::default());
        assert_eq!(out.len(), 5);
        assert!(approx_eq_3(&out[0], &[-0.5, 0.0, 0.0]));
        assert!(approx_eq_3(&out[1], &[0.5, 0.0, 0.0]));
        assert!(approx_eq_3(&out[2], &[-0.5, 0.0, 0.0]));
        assert!(approx_eq_3(&out[3], &[0.5, 0.0, 0.0]));
        assert!(approx_eq_3(&out[4], &ZERO));
    }

    #[test]
    fn test_x_extents_match_output() {
        let kpts = body();
        let scale = [2.7, 1.6, 2.1];
        let out = normalize(&kpts, &scale, &ZERO, &[ZERO; 5], NormalizeOptions::default());
        let n = out.len();
        let xs: Vec<f32> = out[..n - 3].iter().map(|p| p[0]).collect();
        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((out[n - 3][0] - min_x).abs() < 1e-6);
        assert!((out[n - 2][0] - max_x).abs() < 1e-6);
    }

    #[test]
    fn test_legacy_extents_keep_raw_yz() {
        let kpts = body();
        let out = normalize(&kpts, &[2.7, 1.6, 2.1], &ZERO, &[], NormalizeOptions::default());
        let n = out.len();
        assert_eq!(out[n - 3][1], -0.4);
        assert_eq!(out[n - 2][1], 1.5);
        assert_eq!(out[n - 3][2], -0.2);
        assert_eq!(out[n - 2][2], 0.4);
    }

    #[test]
    fn test_consistent_extents() {
        let kpts = body();
        let opts = NormalizeOptions { legacy_extents: false };
        let out = normalize(&kpts, &[2.7, 1.6, 2.1], &ZERO, &[], opts);
        let n = out.len();
        for a in 0..3 {
            let min = out[..n - 3].iter().map(|p| p[a]).fold(f32::INFINITY, f32::min);
            assert!((out[n - 3][a] - min).abs() < 1e-6);
        }
    }

    #[test]
    fn test_manual_offset_only_moves_position() {
        let kpts = body();
        let a = normalize(&kpts, &ONE, &ZERO, &[], NormalizeOptions::default());
        let b = normalize(&kpts, &ONE, &[1.0, -2.0, 0.5], &[], NormalizeOptions::default());
        let n = a.len();
        assert_eq!(a[..n - 1], b[..n - 1]);
        assert!(approx_eq_3(&b[n - 1], &[a[n - 1][0] + 1.0, a[n - 1][1] - 2.0, a[n - 1][2] + 0.5]));
    }

    #[test]
    fn test_per_keypoint_offset_is_additive() {
        let kpts = body();
        let mut offsets = [ZERO; 5];
        let base = normalize(&kpts, &ONE, &ZERO, &offsets, NormalizeOptions::default());
        offsets[2] = [0.1, 0.2, 0.3];
        let moved = normalize(&kpts, &ONE, &ZERO, &offsets, NormalizeOptions::default());
        assert!(approx_eq_3(&moved[2], &[base[2][0] + 0.1, base[2][1] + 0.2, base[2][2] + 0.3]));
        assert_eq!(moved[1], base[1]);
    }

    #[test]
    fn test_degenerate_input() {
        assert!(normalize(&[], &ONE, &ZERO, &[], NormalizeOptions::default()).is_empty());
        let out = normalize(&[[1.0, 1.0, 0.0]; 3], &ONE, &ZERO, &[], NormalizeOptions::default());
        assert!(out.iter().all(|p| p.iter().all(|v| v.is_finite())));
    }
}
