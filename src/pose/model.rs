//! キーポイントモデル定義
//!
//! 関節名 → 生フレームのキーポイント配列インデックス。
//! 起動時に固定長テーブルへ解決しておき、フレーム毎の文字列検索はしない。

use serde::{Deserialize, Serialize};

use super::keypoint::Joint;
use crate::geometry::Point;

type IndexTable = [Option<usize>; Joint::COUNT];

const fn table(entries: &[(Joint, usize)]) -> IndexTable {
    let mut t = [None; Joint::COUNT];
    let mut i = 0;
    while i < entries.len() {
        t[entries[i].0 as usize] = Some(entries[i].1);
        i += 1;
    }
    t
}

/// パラメトリック人体モデル（背骨の点を直接出力する）
static SMPL: IndexTable = table(&[
    (Joint::Pelvis, 0),
    (Joint::LeftHip, 1),
    (Joint::RightHip, 2),
    (Joint::Spine, 3),
    (Joint::LeftKnee, 4),
    (Joint::RightKnee, 5),
    (Joint::Spine1, 6),
    (Joint::LeftAnkle, 7),
    (Joint::RightAnkle, 8),
    (Joint::Spine2, 9),
    (Joint::LeftFoot, 10),
    (Joint::RightFoot, 11),
    (Joint::Neck, 12),
    (Joint::LeftShoulder, 13),
    (Joint::RightShoulder, 14),
    (Joint::LeftArm, 16),
    (Joint::RightArm, 17),
    (Joint::LeftElbow, 18),
    (Joint::RightElbow, 19),
    (Joint::LeftWrist, 20),
    (Joint::RightWrist, 21),
    (Joint::LeftIndex, 22),
    (Joint::RightIndex, 23),
    (Joint::LeftEar, 25),
    (Joint::LeftEye, 26),
    (Joint::Nose, 27),
    (Joint::RightEar, 28),
    (Joint::RightEye, 29),
]);

/// モバイル向け姿勢推定モデル（33点 + 補助6点、背骨なし）
static BLAZE_POSE: IndexTable = table(&[
    (Joint::Nose, 0),
    (Joint::LeftEyeInside, 1),
    (Joint::LeftEye, 2),
    (Joint::LeftEyeOutside, 3),
    (Joint::RightEyeInside, 4),
    (Joint::RightEye, 5),
    (Joint::RightEyeOutside, 6),
    (Joint::LeftEar, 7),
    (Joint::RightEar, 8),
    (Joint::LeftMouth, 9),
    (Joint::RightMouth, 10),
    (Joint::LeftShoulder, 11),
    (Joint::RightShoulder, 12),
    (Joint::LeftElbow, 13),
    (Joint::RightElbow, 14),
    (Joint::LeftWrist, 15),
    (Joint::RightWrist, 16),
    (Joint::LeftPinky, 17),
    (Joint::RightPinky, 18),
    (Joint::LeftIndex, 19),
    (Joint::RightIndex, 20),
    (Joint::LeftThumb, 21),
    (Joint::RightThumb, 22),
    (Joint::LeftHip, 23),
    (Joint::RightHip, 24),
    (Joint::LeftKnee, 25),
    (Joint::RightKnee, 26),
    (Joint::LeftAnkle, 27),
    (Joint::RightAnkle, 28),
    (Joint::LeftHeel, 29),
    (Joint::RightHeel, 30),
    (Joint::LeftFoot, 31),
    (Joint::RightFoot, 32),
    (Joint::Pelvis, 33),
    (Joint::BodyTop, 34),
    (Joint::LeftPalm, 35),
    (Joint::LeftHand, 36),
    (Joint::RightPalm, 37),
    (Joint::RightHand, 38),
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeypointModel {
    #[default]
    Smpl,
    BlazePose,
}

impl KeypointModel {
    fn table(self) -> &'static IndexTable {
        match self {
            KeypointModel::Smpl => &SMPL,
            KeypointModel::BlazePose => &BLAZE_POSE,
        }
    }

    /// 関節のキーポイントインデックス。モデルに存在しなければ None
    pub fn index(self, joint: Joint) -> Option<usize> {
        self.table()[joint as usize]
    }

    /// キーポイント配列から関節の座標を引く
    ///
    /// インデックス未定義・配列長不足のどちらでも None（そのフレームはデータなし扱い）。
    pub fn get<'a>(self, keypoints: &'a [Point], joint: Joint) -> Option<&'a Point> {
        self.index(joint).and_then(|i| keypoints.get(i))
    }

    /// 1人分のキーポイント数
    pub fn keypoint_count(self) -> usize {
        self.table()
            .iter()
            .flatten()
            .max()
            .map_or(0, |max| max + 1)
    }

    /// 背骨・骨盤・首を直接出力するか。false ならキネマティクス側で導出する
    pub fn has_spine(self) -> bool {
        self.index(Joint::Spine).is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            KeypointModel::Smpl => "smpl",
            KeypointModel::BlazePose => "blazepose",
        }
    }
}
