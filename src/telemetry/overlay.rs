//! テレメトリのオーバーレイ出力。どれも同じ偏差値を独立に消費する

use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::geometry::{radians_to_degrees, Point};
use crate::rig::{Bone, BoneMap};

/// チャートへの追加間隔 (ms)
const CHART_INTERVAL_MS: f64 = 500.0;

/// 色付けの感度
pub const DEFAULT_SENSITIVITY: f32 = 2.0;

/// ボーン上に出す回転ラベル
pub fn rotation_label(label: &str, base: Option<&str>, angles: &Point, percent: u32) -> String {
    let mut text = format!("{}\n", label);
    if let Some(base) = base {
        text.push_str(&format!("BASE: {}\n", base));
    }
    if percent > 0 {
        text.push_str(&format!("POSE CHANGE: {}%\n", percent));
    }
    let deg = angles.map(radians_to_degrees);
    if deg.iter().any(|d| *d != 0) {
        text.push_str(&format!("ROTATION: {}° | {}° | {}°", deg[0], deg[1], deg[2]));
    }
    text
}

/// 偏差に応じた発光色 (r, g, b)。0% なら発光しない
pub fn highlight_color(percent: u32, sensitivity: f32) -> Option<[f32; 3]> {
    if percent == 0 {
        return None;
    }
    let v = sensitivity * percent as f32 / 100.0;
    Some([v, 1.0 - v, 0.0])
}

/// 軸ごとの最大・最小と全体偏差の最大
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maximums {
    pub max: Point,
    pub overall: u32,
    pub min: Point,
}

impl Default for Maximums {
    fn default() -> Self {
        Self {
            max: [-PI; 3],
            overall: 0,
            min: [PI; 3],
        }
    }
}

impl Maximums {
    pub fn update(&mut self, angles: &Point, overall: u32) {
        for a in 0..3 {
            self.max[a] = self.max[a].max(angles[a]);
            self.min[a] = self.min[a].min(angles[a]);
        }
        self.overall = self.overall.max(overall);
    }

    /// `[maxX, maxY, maxZ, overall, minX, minY, minZ]`
    pub fn to_array(&self) -> [f32; 7] {
        [
            self.max[0],
            self.max[1],
            self.max[2],
            self.overall as f32,
            self.min[0],
            self.min[1],
            self.min[2],
        ]
    }
}

/// ボーン毎の偏差の時系列
pub struct Chart {
    length: usize,
    series: BoneMap<VecDeque<u32>>,
    last_update: BoneMap<Option<f64>>,
}

impl Chart {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
            series: BoneMap::default(),
            last_update: BoneMap::default(),
        }
    }

    /// 前回から間隔が空いていれば追加する
    pub fn push(&mut self, bone: Bone, value: u32, now: f64) -> bool {
        if let Some(last) = self.last_update[bone] {
            if now - last < CHART_INTERVAL_MS {
                return false;
            }
        }
        self.last_update[bone] = Some(now);
        let series = &mut self.series[bone];
        if series.len() == self.length {
            series.pop_front();
        }
        series.push_back(value);
        true
    }

    pub fn series(&self, bone: Bone) -> &VecDeque<u32> {
        &self.series[bone]
    }

    pub fn clear(&mut self) {
        self.series = BoneMap::default();
        self.last_update = BoneMap::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_label() {
        let text = rotation_label("left forearm", None, &[FRAC_PI_2, 0.0, -PI / 4.0], 37);
        assert_eq!(text, "left forearm\nPOSE CHANGE: 37%\nROTATION: 90° | 0° | -45°");
    }

    #[test]
    fn test_rotation_label_clone_at_rest() {
        let text = rotation_label("hips", Some("person 1"), &[0.0; 3], 0);
        assert_eq!(text, "hips\nBASE: person 1\n");
    }

    #[test]
    fn test_highlight_color() {
        assert_eq!(highlight_color(0, DEFAULT_SENSITIVITY), None);
        let c = highlight_color(25, DEFAULT_SENSITIVITY).unwrap();
        assert!((c[0] - 0.5).abs() < 1e-6);
        assert!((c[1] - 0.5).abs() < 1e-6);
        assert_eq!(c[2], 0.0);
    }

    #[test]
    fn test_maximums() {
        let mut m = Maximums::default();
        m.update(&[0.5, -0.2, 0.0], 10);
        m.update(&[-0.3, 0.1, 0.0], 5);
        let a = m.to_array();
        assert_eq!(a[0], 0.5);
        assert_eq!(a[1], 0.1);
        assert_eq!(a[3], 10.0);
        assert_eq!(a[4], -0.3);
        assert_eq!(a[5], -0.2);
    }

    #[test]
    fn test_chart_throttles_and_rolls() {
        let mut chart = Chart::new(3);
        assert!(chart.push(Bone::Head, 1, 0.0));
        assert!(!chart.push(Bone::Head, 2, 100.0));
        for (i, t) in [500.0, 1000.0, 1500.0].iter().enumerate() {
            assert!(chart.push(Bone::Head, 10 + i as u32, *t));
        }
        assert_eq!(chart.series(Bone::Head).iter().copied().collect::<Vec<_>>(), vec![10, 11, 12]);
        // 別ボーンは独立
        assert!(chart.push(Bone::Hips, 7, 1500.0));
    }
}
