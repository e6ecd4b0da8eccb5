//! 描画側ボーン階層との境界

use super::bone::{Bone, BoneMap};
use super::look::LookController;
use crate::geometry::{diff, sum, Point, ORIGIN};

/// 描画エンジンのスケルトン
///
/// 位置は人物ローカル座標（ルート位置を含まない）、回転はオイラー角 (x, y, z)。
/// 存在しないボーンへの操作は何もしない。
pub trait Skeleton {
    fn has_bone(&self, bone: Bone) -> bool;
    /// 人物ローカル座標でのボーン位置
    fn bone_position(&self, bone: Bone) -> Option<Point>;
    fn set_bone_position(&mut self, bone: Bone, position: Point);
    fn bone_rotation(&self, bone: Bone) -> Option<Point>;
    fn set_bone_rotation(&mut self, bone: Bone, rotation: Point);
    fn root_position(&self) -> Point;
    fn set_root_position(&mut self, position: Point);
    fn visibility(&self) -> f32;
    fn set_visibility(&mut self, visibility: f32);

    /// ルック制御に従ってボーンを回す
    fn apply_look(&mut self, bone: Bone, look: &LookController) {
        let Some(origin) = self.bone_position(bone) else {
            return;
        };
        if let Some(rotation) = look.solve(&origin) {
            self.set_bone_rotation(bone, rotation);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BoneState {
    /// 親ボーンからのオフセット
    local: Point,
    rotation: Point,
}

/// メモリ上のスケルトン（リプレイ・テスト用）
///
/// 平行移動のみの階層: 子の位置は親の位置 + ローカルオフセット。回転は子の位置に
/// 影響せず、そのまま出力先へ渡される。
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSkeleton {
    bones: BoneMap<Option<BoneState>>,
    root: Point,
    visibility: f32,
}

impl PoseSkeleton {
    /// 身長約1.7mの人型レストポーズ。左が +x、正面が +z
    pub fn humanoid() -> Self {
        let mut bones: BoneMap<Option<BoneState>> = BoneMap::default();
        for bone in Bone::ALL {
            let local = rest_offset(bone);
            bones[bone] = Some(BoneState {
                local,
                rotation: ORIGIN,
            });
        }
        // 反転したモデルを正面に向ける
        if let Some(hips) = bones[Bone::Hips].as_mut() {
            hips.rotation = [0.0, std::f32::consts::PI, 0.0];
        }
        Self {
            bones,
            root: ORIGIN,
            visibility: 1.0,
        }
    }

    /// 指定ボーンを取り除く（ボーンが欠けたリグ用）
    pub fn without(mut self, bones: &[Bone]) -> Self {
        for bone in bones {
            self.bones[*bone] = None;
        }
        self
    }
}

impl Default for PoseSkeleton {
    fn default() -> Self {
        Self::humanoid()
    }
}

fn rest_offset(bone: Bone) -> Point {
    use Bone::*;
    let (x, y, z): (f32, f32, f32) = match bone {
        Hips => (0.0, 0.95, 0.0),
        Spine => (0.0, 0.10, 0.0),
        Spine1 => (0.0, 0.12, 0.0),
        Spine2 => (0.0, 0.14, 0.0),
        Neck => (0.0, 0.15, 0.0),
        Head => (0.0, 0.10, 0.0),
        LeftShoulder => (0.06, 0.10, 0.0),
        LeftArm => (0.12, 0.0, 0.0),
        LeftForeArm => (0.27, 0.0, 0.0),
        LeftHand => (0.25, 0.0, 0.0),
        LeftHandIndex1 => (0.09, 0.0, 0.03),
        LeftHandMiddle1 => (0.09, 0.0, 0.01),
        LeftHandRing1 => (0.085, 0.0, -0.01),
        LeftHandPinky1 => (0.075, 0.0, -0.03),
        LeftHandIndex2 | LeftHandMiddle2 | LeftHandRing2 | LeftHandPinky2 => (0.03, 0.0, 0.0),
        LeftHandIndex3 | LeftHandMiddle3 | LeftHandRing3 | LeftHandPinky3 => (0.025, 0.0, 0.0),
        LeftUpLeg => (0.09, -0.05, 0.0),
        LeftLeg => (0.0, -0.42, 0.0),
        LeftFoot => (0.0, -0.40, 0.0),
        LeftToeBase => (0.0, -0.05, 0.12),
        // 右側は左の鏡像
        right => {
            let left = mirror(right);
            let [x, y, z] = rest_offset(left);
            (-x, y, z)
        }
    };
    [x, y, z]
}

/// 右側のボーンを対応する左側へ。それ以外はそのまま
fn mirror(bone: Bone) -> Bone {
    use Bone::*;
    match bone {
        RightShoulder => LeftShoulder,
        RightArm => LeftArm,
        RightForeArm => LeftForeArm,
        RightHand => LeftHand,
        RightHandIndex1 => LeftHandIndex1,
        RightHandIndex2 => LeftHandIndex2,
        RightHandIndex3 => LeftHandIndex3,
        RightHandMiddle1 => LeftHandMiddle1,
        RightHandMiddle2 => LeftHandMiddle2,
        RightHandMiddle3 => LeftHandMiddle3,
        RightHandPinky1 => LeftHandPinky1,
        RightHandPinky2 => LeftHandPinky2,
        RightHandPinky3 => LeftHandPinky3,
        RightHandRing1 => LeftHandRing1,
        RightHandRing2 => LeftHandRing2,
        RightHandRing3 => LeftHandRing3,
        RightUpLeg => LeftUpLeg,
        RightLeg => LeftLeg,
        RightFoot => LeftFoot,
        RightToeBase => LeftToeBase,
        other => other,
    }
}

impl Skeleton for PoseSkeleton {
    fn has_bone(&self, bone: Bone) -> bool {
        self.bones[bone].is_some()
    }

    fn bone_position(&self, bone: Bone) -> Option<Point> {
        let joint = self.bones[bone]?;
        match bone.parent() {
            Some(parent) => {
                let base = self.bone_position(parent).unwrap_or(ORIGIN);
                Some(sum(&base, &joint.local))
            }
            None => Some(joint.local),
        }
    }

    fn set_bone_position(&mut self, bone: Bone, position: Point) {
        let base = bone
            .parent()
            .and_then(|p| self.bone_position(p))
            .unwrap_or(ORIGIN);
        if let Some(joint) = self.bones[bone].as_mut() {
            joint.local = diff(&position, &base);
        }
    }

    fn bone_rotation(&self, bone: Bone) -> Option<Point> {
        self.bones[bone].map(|j| j.rotation)
    }

    fn set_bone_rotation(&mut self, bone: Bone, rotation: Point) {
        if let Some(joint) = self.bones[bone].as_mut() {
            joint.rotation = rotation;
        }
    }

    fn root_position(&self) -> Point {
        self.root
    }

    fn set_root_position(&mut self, position: Point) {
        self.root = position;
    }

    fn visibility(&self) -> f32 {
        self.visibility
    }

    fn set_visibility(&mut self, visibility: f32) {
        self.visibility = visibility;
    }
}
