//! リグのボーン定義と静的テーブル
//!
//! ボーン名の文字列検索はせず、`Bone` をキーにした固定長配列 `BoneMap` で引く。

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::pose::Joint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum Bone {
    Hips,
    Spine,
    Spine1,
    Spine2,
    Neck,
    Head,
    LeftShoulder,
    LeftArm,
    LeftForeArm,
    LeftHand,
    LeftHandIndex1,
    LeftHandIndex2,
    LeftHandIndex3,
    LeftHandMiddle1,
    LeftHandMiddle2,
    LeftHandMiddle3,
    LeftHandPinky1,
    LeftHandPinky2,
    LeftHandPinky3,
    LeftHandRing1,
    LeftHandRing2,
    LeftHandRing3,
    LeftUpLeg,
    LeftLeg,
    LeftFoot,
    LeftToeBase,
    RightShoulder,
    RightArm,
    RightForeArm,
    RightHand,
    RightHandIndex1,
    RightHandIndex2,
    RightHandIndex3,
    RightHandMiddle1,
    RightHandMiddle2,
    RightHandMiddle3,
    RightHandPinky1,
    RightHandPinky2,
    RightHandPinky3,
    RightHandRing1,
    RightHandRing2,
    RightHandRing3,
    RightUpLeg,
    RightLeg,
    RightFoot,
    RightToeBase,
}

use Bone::*;

impl Bone {
    pub const COUNT: usize = 46;

    pub const ALL: [Bone; Bone::COUNT] = [
        Hips, Spine, Spine1, Spine2, Neck, Head,
        LeftShoulder, LeftArm, LeftForeArm, LeftHand,
        LeftHandIndex1, LeftHandIndex2, LeftHandIndex3,
        LeftHandMiddle1, LeftHandMiddle2, LeftHandMiddle3,
        LeftHandPinky1, LeftHandPinky2, LeftHandPinky3,
        LeftHandRing1, LeftHandRing2, LeftHandRing3,
        LeftUpLeg, LeftLeg, LeftFoot, LeftToeBase,
        RightShoulder, RightArm, RightForeArm, RightHand,
        RightHandIndex1, RightHandIndex2, RightHandIndex3,
        RightHandMiddle1, RightHandMiddle2, RightHandMiddle3,
        RightHandPinky1, RightHandPinky2, RightHandPinky3,
        RightHandRing1, RightHandRing2, RightHandRing3,
        RightUpLeg, RightLeg, RightFoot, RightToeBase,
    ];

    /// リグ上のボーン名（Mixamo 形式）
    pub fn name(self) -> &'static str {
        match self {
            Hips => "Hips",
            Spine => "Spine",
            Spine1 => "Spine1",
            Spine2 => "Spine2",
            Neck => "Neck",
            Head => "Head",
            LeftShoulder => "LeftShoulder",
            LeftArm => "LeftArm",
            LeftForeArm => "LeftForeArm",
            LeftHand => "LeftHand",
            LeftHandIndex1 => "LeftHandIndex1",
            LeftHandIndex2 => "LeftHandIndex2",
            LeftHandIndex3 => "LeftHandIndex3",
            LeftHandMiddle1 => "LeftHandMiddle1",
            LeftHandMiddle2 => "LeftHandMiddle2",
            LeftHandMiddle3 => "LeftHandMiddle3",
            LeftHandPinky1 => "LeftHandPinky1",
            LeftHandPinky2 => "LeftHandPinky2",
            LeftHandPinky3 => "LeftHandPinky3",
            LeftHandRing1 => "LeftHandRing1",
            LeftHandRing2 => "LeftHandRing2",
            LeftHandRing3 => "LeftHandRing3",
            LeftUpLeg => "LeftUpLeg",
            LeftLeg => "LeftLeg",
            LeftFoot => "LeftFoot",
            LeftToeBase => "LeftToeBase",
            RightShoulder => "RightShoulder",
            RightArm => "RightArm",
            RightForeArm => "RightForeArm",
            RightHand => "RightHand",
            RightHandIndex1 => "RightHandIndex1",
            RightHandIndex2 => "RightHandIndex2",
            RightHandIndex3 => "RightHandIndex3",
            RightHandMiddle1 => "RightHandMiddle1",
            RightHandMiddle2 => "RightHandMiddle2",
            RightHandMiddle3 => "RightHandMiddle3",
            RightHandPinky1 => "RightHandPinky1",
            RightHandPinky2 => "RightHandPinky2",
            RightHandPinky3 => "RightHandPinky3",
            RightHandRing1 => "RightHandRing1",
            RightHandRing2 => "RightHandRing2",
            RightHandRing3 => "RightHandRing3",
            RightUpLeg => "RightUpLeg",
            RightLeg => "RightLeg",
            RightFoot => "RightFoot",
            RightToeBase => "RightToeBase",
        }
    }

    pub fn from_name(name: &str) -> Option<Bone> {
        Bone::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn side(self) -> Option<Side> {
        if self >= LeftShoulder && self <= LeftToeBase {
            Some(Side::Left)
        } else if self >= RightShoulder {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// 階層上の親ボーン
    pub fn parent(self) -> Option<Bone> {
        Some(match self {
            Hips => return None,
            Spine | LeftUpLeg | RightUpLeg => Hips,
            Spine1 => Spine,
            Spine2 => Spine1,
            Neck | LeftShoulder | RightShoulder => Spine2,
            Head => Neck,
            LeftArm => LeftShoulder,
            LeftForeArm => LeftArm,
            LeftHand => LeftForeArm,
            LeftHandIndex1 | LeftHandMiddle1 | LeftHandPinky1 | LeftHandRing1 => LeftHand,
            LeftHandIndex2 => LeftHandIndex1,
            LeftHandIndex3 => LeftHandIndex2,
            LeftHandMiddle2 => LeftHandMiddle1,
            LeftHandMiddle3 => LeftHandMiddle2,
            LeftHandPinky2 => LeftHandPinky1,
            LeftHandPinky3 => LeftHandPinky2,
            LeftHandRing2 => LeftHandRing1,
            LeftHandRing3 => LeftHandRing2,
            LeftLeg => LeftUpLeg,
            LeftFoot => LeftLeg,
            LeftToeBase => LeftFoot,
            RightArm => RightShoulder,
            RightForeArm => RightArm,
            RightHand => RightForeArm,
            RightHandIndex1 | RightHandMiddle1 | RightHandPinky1 | RightHandRing1 => RightHand,
            RightHandIndex2 => RightHandIndex1,
            RightHandIndex3 => RightHandIndex2,
            RightHandMiddle2 => RightHandMiddle1,
            RightHandMiddle3 => RightHandMiddle2,
            RightHandPinky2 => RightHandPinky1,
            RightHandPinky3 => RightHandPinky2,
            RightHandRing2 => RightHandRing1,
            RightHandRing3 => RightHandRing2,
            RightLeg => RightUpLeg,
            RightFoot => RightLeg,
            RightToeBase => RightFoot,
        })
    }

    /// ルック制御を持つボーン
    pub fn has_look_controller(self) -> bool {
        matches!(
            self,
            Hips | Head
                | LeftShoulder | LeftArm | LeftForeArm | LeftHand
                | LeftUpLeg | LeftLeg | LeftFoot
                | RightShoulder | RightArm | RightForeArm | RightHand
                | RightUpLeg | RightLeg | RightFoot
        )
    }

    /// ボーン → 向く先のボーン（ボーンターゲットグラフ）
    pub fn look_target(self) -> Option<Bone> {
        match self {
            LeftShoulder => Some(LeftArm),
            LeftArm => Some(LeftForeArm),
            LeftForeArm => Some(LeftHand),
            LeftUpLeg => Some(LeftLeg),
            LeftLeg => Some(LeftFoot),
            LeftFoot => Some(LeftToeBase),
            RightShoulder => Some(RightArm),
            RightArm => Some(RightForeArm),
            RightForeArm => Some(RightHand),
            RightUpLeg => Some(RightLeg),
            RightLeg => Some(RightFoot),
            RightFoot => Some(RightToeBase),
            _ => None,
        }
    }

    /// ルックアンカーを置くキーポイント関節。Hips は平面法線で別扱い
    pub fn look_joint(self) -> Option<Joint> {
        match self {
            Head => Some(Joint::Nose),
            LeftShoulder => Some(Joint::LeftShoulder),
            LeftArm => Some(Joint::LeftElbow),
            LeftForeArm => Some(Joint::LeftWrist),
            LeftHand => Some(Joint::LeftIndex),
            LeftUpLeg => Some(Joint::LeftKnee),
            LeftLeg => Some(Joint::LeftAnkle),
            LeftFoot => Some(Joint::LeftFoot),
            RightShoulder => Some(Joint::RightShoulder),
            RightArm => Some(Joint::RightElbow),
            RightForeArm => Some(Joint::RightWrist),
            RightHand => Some(Joint::RightIndex),
            RightUpLeg => Some(Joint::RightKnee),
            RightLeg => Some(Joint::RightAnkle),
            RightFoot => Some(Joint::RightFoot),
            _ => None,
        }
    }

    /// 簡易IK (ik_level 1) で無効にするボーン
    pub fn disabled_at(self, ik_level: u8) -> bool {
        ik_level >= 1 && self == Head
    }

    /// テレメトリ表示名。None ならテレメトリ対象外
    pub fn telemetry_label(self) -> Option<&'static str> {
        Some(match self {
            Hips => "hips",
            Spine => "lower spine",
            Spine1 => "center spine",
            Spine2 => "upper spine",
            Neck => "neck",
            Head => "head",
            LeftShoulder => "left shoulder",
            RightShoulder => "right shoulder",
            LeftArm => "left upper arm",
            RightArm => "right upper arm",
            LeftForeArm => "left forearm",
            RightForeArm => "right forearm",
            LeftHand => "left hand",
            RightHand => "right hand",
            LeftUpLeg => "left upper leg",
            RightUpLeg => "right upper leg",
            LeftLeg => "left lower leg",
            RightLeg => "right lower leg",
            LeftFoot => "left foot",
            RightFoot => "right foot",
            _ => return None,
        })
    }

    /// 握り推定で曲げる指ボーン
    pub fn fingers(side: Side) -> [Bone; 12] {
        match side {
            Side::Left => [
                LeftHandIndex1, LeftHandIndex2, LeftHandIndex3,
                LeftHandMiddle1, LeftHandMiddle2, LeftHandMiddle3,
                LeftHandPinky1, LeftHandPinky2, LeftHandPinky3,
                LeftHandRing1, LeftHandRing2, LeftHandRing3,
            ],
            Side::Right => [
                RightHandIndex1, RightHandIndex2, RightHandIndex3,
                RightHandMiddle1, RightHandMiddle2, RightHandMiddle3,
                RightHandPinky1, RightHandPinky2, RightHandPinky3,
                RightHandRing1, RightHandRing2, RightHandRing3,
            ],
        }
    }
}

/// `Bone` をキーにした固定長テーブル
#[derive(Debug, Clone, PartialEq)]
pub struct BoneMap<T>([T; Bone::COUNT]);

impl<T> BoneMap<T> {
    pub fn from_fn(mut f: impl FnMut(Bone) -> T) -> Self {
        Self(std::array::from_fn(|i| f(Bone::ALL[i])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bone, &T)> {
        Bone::ALL.iter().copied().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Bone, &mut T)> {
        Bone::ALL.iter().copied().zip(self.0.iter_mut())
    }
}

impl<T: Default> Default for BoneMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Bone> for BoneMap<T> {
    type Output = T;
    fn index(&self, bone: Bone) -> &T {
        &self.0[bone as usize]
    }
}

impl<T> IndexMut<Bone> for BoneMap<T> {
    fn index_mut(&mut self, bone: Bone) -> &mut T {
        &mut self.0[bone as usize]
    }
}
