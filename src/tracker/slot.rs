use serde::{Deserialize, Serialize};

use crate::geometry::{sum, Point, ORIGIN};

/// 1人分のポーズデータ（生 or 補間済み）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionData {
    /// ms
    pub timestamp: f64,
    pub keypoints: Vec<Point>,
    pub scores: Vec<f32>,
    pub score: f32,
}

/// 正規化キーポイントの外接箱と配置アンカー
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub avg: Point,
}

impl BoundingBox {
    /// 正規化結果の末尾3点（min, max, position）から作る
    pub fn from_normalized(normalized: &[Point]) -> Option<Self> {
        let n = normalized.len();
        if n < 3 {
            return None;
        }
        Some(Self {
            min: normalized[n - 3],
            max: normalized[n - 2],
            avg: normalized[n - 1],
        })
    }
}

/// フレームをまたいで同一人物を表すスロット
///
/// マッチャーが生成し、人数が減っても削除せず無効化するだけ（再利用される）。
#[derive(Debug, Clone, Default)]
pub struct PersonSlot {
    pub index: usize,
    pub active: bool,
    /// 最新の生割り当て
    pub current: MotionData,
    /// 時間方向に平滑化したポーズ
    pub interpolated: MotionData,
    /// 正規化結果（末尾に min / max / position の3点が付く）
    pub normalized: Vec<Point>,
    /// ユーザーがドラッグしたキーポイント毎の補正。長さは常にキーポイント数と一致
    pub normalized_offsets: Vec<Point>,
    /// 人物全体の手動オフセット
    pub offsets: Point,
    pub bbox: BoundingBox,
    /// 中心アンカーをドラッグ中
    pub detached: bool,
    pub should_update: bool,
    /// 最後の新規データからのティック数
    pub interpolation_step: u32,
}

impl PersonSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            active: true,
            should_update: true,
            // 初回補間が「新しい」と判定されるよう current より大きくしておく
            interpolated: MotionData {
                timestamp: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// "person N" 表記用の1始まり番号
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// 新しい検出を割り当てる
    pub fn update_data(&mut self, keypoints: Vec<Point>, score: f32, now: f64) {
        if self.normalized_offsets.len() != keypoints.len() {
            self.reset_offsets(keypoints.len());
        }
        self.current.timestamp = self.current.timestamp.max(now);
        self.current.keypoints = keypoints;
        self.current.score = score;
        self.interpolation_step = 0;
        self.should_update = true;
    }

    /// 手動補正をゼロベクトル `count` 個で作り直す（モデル切替時など）
    pub fn reset_offsets(&mut self, count: usize) {
        self.normalized_offsets = vec![ORIGIN; count];
    }

    /// キーポイント `index` の手動補正に `delta` を加える
    pub fn nudge_keypoint(&mut self, index: usize, delta: &Point) -> bool {
        match self.normalized_offsets.get_mut(index) {
            Some(offset) => {
                *offset = sum(offset, delta);
                self.should_update = true;
                true
            }
            None => false,
        }
    }

    /// 人物全体を `delta` だけ動かす
    pub fn move_by(&mut self, delta: &Point) {
        self.offsets = sum(&self.offsets, delta);
        self.should_update = true;
    }

    pub fn has_data(&self) -> bool {
        !self.current.keypoints.is_empty()
    }
}
