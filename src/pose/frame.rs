//! 検出器出力の入力境界

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::geometry::Point;

/// 1人分の検出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// キーポイント列（意味はアクティブなキーポイントモデルで決まる）
    pub keypoints: Vec<Point>,
    /// ボックス信頼度 (0.0〜1.0)
    pub score: f32,
}

impl Detection {
    pub fn new(keypoints: Vec<Point>, score: f32) -> Self {
        Self { keypoints, score }
    }

    /// マッチングに使う基準キーポイント（先頭点）
    pub fn reference(&self) -> Option<&Point> {
        self.keypoints.first()
    }
}

/// 1ティック分の検出器出力。人物の並び順はフレーム間で保証されない
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub bodies: Vec<Detection>,
    /// キャプチャ時刻 (ms)
    pub timestamp: f64,
}

impl RawFrame {
    pub fn new(bodies: Vec<Detection>, timestamp: f64) -> Self {
        Self { bodies, timestamp }
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// 録画済み検出データ
///
/// `[frame][body]` で添字付けされる。`boxes` の5番目の要素が信頼度。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionBatch {
    #[serde(default)]
    pub frames: usize,
    #[serde(default)]
    pub resolution: [u32; 2],
    pub poses: Vec<Vec<Vec<Point>>>,
    pub boxes: Vec<Vec<[f32; 5]>>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub joints: Vec<String>,
    #[serde(default)]
    pub timestamps: Vec<f64>,
    /// 録画ごとの上書き設定
    #[serde(default, rename = "scalePerson")]
    pub scale_person: Option<Point>,
    #[serde(default, rename = "scaleScene")]
    pub scale_scene: Option<Point>,
}

impl DetectionBatch {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 録画ファイルを読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// フレーム `index` を RawFrame に変換。範囲外は None（このティックはデータなし）
    ///
    /// ボックスが欠けている人物は信頼度 0 とする。
    pub fn frame(&self, index: usize) -> Option<RawFrame> {
        let poses = self.poses.get(index)?;
        let boxes = self.boxes.get(index);
        let bodies = poses
            .iter()
            .enumerate()
            .map(|(i, kpts)| {
                let score = boxes.and_then(|b| b.get(i)).map_or(0.0, |b| b[4]);
                Detection::new(kpts.clone(), score)
            })
            .collect();
        let timestamp = self.timestamps.get(index).copied().unwrap_or(0.0);
        Some(RawFrame::new(bodies, timestamp))
    }
}
