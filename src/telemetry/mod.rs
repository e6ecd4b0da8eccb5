//! ボーン毎の姿勢変化量
//!
//! 各ボーンの回転を基準姿勢（レスト、またはクローン元の同じボーン）と比べ、
//! 軸毎の差と全体の偏差 (0-100%) を出す。オーバーレイはこの値を個別に使う。

pub mod gesture;
pub mod overlay;

use std::f32::consts::PI;

use crate::config::TelemetryConfig;
use crate::geometry::{relative_angle, Point, ORIGIN};
use crate::rig::{Bone, BoneMap, Skeleton};

pub use gesture::{Gesture, GestureCounter, Gestures};
pub use overlay::{highlight_color, rotation_label, Chart, Maximums, DEFAULT_SENSITIVITY};

/// 基準姿勢の軸毎の差
pub fn relative_rotation(rotation: &Point, reference: &Point) -> Point {
    [
        relative_angle(rotation[0], reference[0]),
        relative_angle(rotation[1], reference[1]),
        relative_angle(rotation[2], reference[2]),
    ]
}

/// 3軸の差の二乗平均を π で割った百分率
pub fn deviation_percent(angles: &Point) -> u32 {
    let sq = angles[0] * angles[0] + angles[1] * angles[1] + angles[2] * angles[2];
    (100.0 * (sq / (PI * PI) / 3.0).sqrt()).round() as u32
}

/// クローン元の人物
pub struct Reference<'a> {
    pub name: &'a str,
    pub skeleton: &'a dyn Skeleton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneTelemetry {
    pub bone: Bone,
    pub label: &'static str,
    pub angles: Point,
    pub percent: u32,
    /// 回転ラベル（無効なら None）
    pub text: Option<String>,
    /// 発光色（無効または 0% なら None）
    pub color: Option<[f32; 3]>,
}

pub struct Telemetry {
    config: TelemetryConfig,
    visible: BoneMap<bool>,
    bones: Vec<BoneTelemetry>,
    maximums: BoneMap<Maximums>,
    chart: Chart,
    gestures: Gestures,
}

impl Telemetry {
    pub fn new(config: TelemetryConfig) -> Self {
        let chart = Chart::new(config.chart_length);
        Self {
            config,
            visible: BoneMap::from_fn(|_| true),
            bones: Vec::new(),
            maximums: BoneMap::default(),
            chart,
            gestures: Gestures::default(),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TelemetryConfig) {
        if config.chart_length != self.config.chart_length {
            self.chart = Chart::new(config.chart_length);
        }
        self.config = config;
    }

    /// ボーン毎の表示スイッチ（ラベル・チャート）
    pub fn set_visible(&mut self, bone: Bone, visible: bool) {
        self.visible[bone] = visible;
    }

    /// 1ティック分を計算する。`now` はミリ秒
    pub fn update(&mut self, skeleton: &dyn Skeleton, reference: Option<&Reference>, now: f64) -> &[BoneTelemetry] {
        if !self.config.maximums {
            self.maximums = BoneMap::default();
        }
        if !self.config.chart {
            self.chart.clear();
        }
        self.bones.clear();
        for bone in Bone::ALL {
            let (Some(label), Some(rotation)) = (bone.telemetry_label(), skeleton.bone_rotation(bone)) else {
                continue;
            };
            let mut base = reference
                .and_then(|r| r.skeleton.bone_rotation(bone))
                .unwrap_or(ORIGIN);
            if bone == Bone::Hips {
                // 腰は反転したレストポーズが基準
                base[1] = PI;
            }
            let angles = relative_rotation(&rotation, &base);
            let percent = deviation_percent(&angles);

            if self.config.maximums {
                self.maximums[bone].update(&angles, percent);
            }
            if self.config.chart && self.visible[bone] {
                self.chart.push(bone, percent, now);
            }
            let text = (self.config.rotation && self.visible[bone])
                .then(|| rotation_label(label, reference.map(|r| r.name), &angles, percent));
            let color = if self.config.highlight && self.visible[bone] {
                highlight_color(percent, DEFAULT_SENSITIVITY)
            } else {
                None
            };
            self.bones.push(BoneTelemetry {
                bone,
                label,
                angles,
                percent,
                text,
                color,
            });
        }
        if self.config.track {
            self.gestures.update(skeleton, now);
        } else {
            self.gestures.reset();
        }
        &self.bones
    }

    pub fn bones(&self) -> &[BoneTelemetry] {
        &self.bones
    }

    pub fn bone(&self, bone: Bone) -> Option<&BoneTelemetry> {
        self.bones.iter().find(|b| b.bone == bone)
    }

    /// 記録していなければ None
    pub fn maximums(&self, bone: Bone) -> Option<&Maximums> {
        self.config.maximums.then(|| &self.maximums[bone])
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn gestures(&self) -> &Gestures {
        &self.gestures
    }

    /// 全ボーンの平均偏差
    pub fn overall_percent(&self) -> u32 {
        if self.bones.is_empty() {
            return 0;
        }
        let total: u32 = self.bones.iter().map(|b| b.percent).sum();
        (total as f32 / self.bones.len() as f32).round() as u32
    }
}
