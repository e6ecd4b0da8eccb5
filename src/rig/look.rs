//! ルック制御（ターゲット位置 + アップ軸 + yaw/pitch/roll 補正）

use nalgebra::{UnitQuaternion, Vector3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use super::bone::{Bone, Side};
use crate::geometry::{diff, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct LookController {
    /// 向く先（人物ローカル座標）
    pub target: Point,
    pub up_axis: Point,
    pub adjust_yaw: f32,
    pub adjust_pitch: f32,
    pub adjust_roll: f32,
}

impl LookController {
    pub fn new(target: Point) -> Self {
        Self {
            target,
            up_axis: [0.0, 1.0, 0.0],
            adjust_yaw: 0.0,
            adjust_pitch: 0.0,
            adjust_roll: 0.0,
        }
    }

    /// ボーン毎の固定補正を適用した状態で作る
    pub fn for_bone(bone: Bone, target: Point) -> Self {
        let mut look = Self::new(target);
        look.apply_default_corrections(bone);
        look
    }

    /// メッシュのレストポーズとの差を埋める固定角
    pub fn apply_default_corrections(&mut self, bone: Bone) {
        let mirror = match bone.side() {
            Some(Side::Right) => -1.0,
            _ => 1.0,
        };
        match bone {
            Bone::LeftUpLeg | Bone::RightUpLeg => {
                self.adjust_pitch = -FRAC_PI_2;
                self.adjust_roll = 0.0;
            }
            Bone::LeftLeg | Bone::RightLeg => {
                self.adjust_pitch = -FRAC_PI_2;
            }
            Bone::LeftFoot | Bone::RightFoot => {
                // かかとと足首の位置差
                self.adjust_pitch = -0.25;
                self.adjust_roll = mirror * FRAC_PI_4;
            }
            Bone::LeftShoulder | Bone::RightShoulder
            | Bone::LeftArm | Bone::RightArm
            | Bone::LeftForeArm | Bone::RightForeArm => {
                self.adjust_yaw = mirror * FRAC_PI_2;
            }
            Bone::LeftHand | Bone::RightHand => {
                self.adjust_yaw = mirror * FRAC_PI_2;
                self.adjust_pitch = -FRAC_PI_2;
            }
            _ => {}
        }
    }

    /// `origin` からターゲットを向く回転（オイラー角 x, y, z）
    ///
    /// ターゲットが原点と重なる、またはアップ軸と平行な場合は None（回転を更新しない）。
    pub fn solve(&self, origin: &Point) -> Option<Point> {
        let d = diff(&self.target, origin);
        let dir = Vector3::new(d[0], d[1], d[2]);
        let up = Vector3::new(self.up_axis[0], self.up_axis[1], self.up_axis[2]);
        if dir.norm() < 1e-6 || dir.cross(&up).norm() < 1e-6 {
            return None;
        }
        let look = UnitQuaternion::face_towards(&dir, &up);
        // yaw: Y軸, pitch: X軸, roll: Z軸
        let adjust = UnitQuaternion::from_euler_angles(self.adjust_pitch, self.adjust_yaw, self.adjust_roll);
        let (x, y, z) = (look * adjust).euler_angles();
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return None;
        }
        Some([x, y, z])
    }
}
