//! 正規化キーポイント → ボーン原点・ルックターゲット
//!
//! 1人分のリグ状態（ルック制御・アンカー・意図した原点）を持ち、フレーム毎に
//! `update` でスケルトンへ反映する。キーポイントやボーンが欠けている操作は
//! 黙って飛ばす（そのティックはデータなし扱い）。

use std::f32::consts::{FRAC_PI_2, PI};

use super::bone::{Bone, BoneMap, Side};
use super::look::LookController;
use super::skeleton::Skeleton;
use crate::config::MotionConfig;
use crate::geometry::{distance, middle, plane_normal, scale_by, sum, weighted_middle, Point};
use crate::pose::{Joint, KeypointModel};

/// これ未満の移動は無視する
pub const DEADBAND: f32 = 0.001;

/// 補正パスを繰り返す位置誤差のしきい値
pub const ERROR_THRESHOLD: f32 = 0.01;

/// 首の原点を下げる量
const NECK_DROP: f32 = 0.05;

/// 検出器が直接出さない解剖学的ランドマーク
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmarks {
    pub mid_shoulder: Point,
    pub pelvis: Point,
    /// 下部（骨盤寄り）
    pub spine: Point,
    pub spine1: Point,
    /// 上部（肩寄り）
    pub spine2: Point,
    pub head: Point,
    pub neck: Point,
}

impl Landmarks {
    /// 背骨点を持つモデルは直接読み、持たないモデルは肩と腰から導出する
    pub fn derive(model: KeypointModel, kpts: &[Point]) -> Option<Self> {
        let get = |joint| model.get(kpts, joint).copied();
        let mid_shoulder = middle(&get(Joint::LeftShoulder)?, &get(Joint::RightShoulder)?);
        if model.has_spine() {
            let neck = get(Joint::Neck)?;
            let ears = middle(&get(Joint::LeftEar)?, &get(Joint::RightEar)?);
            Some(Self {
                mid_shoulder,
                pelvis: get(Joint::Pelvis)?,
                spine: get(Joint::Spine)?,
                spine1: get(Joint::Spine1)?,
                spine2: get(Joint::Spine2)?,
                head: middle(&neck, &ears),
                neck,
            })
        } else {
            let pelvis = middle(&get(Joint::LeftHip)?, &get(Joint::RightHip)?);
            let nose = get(Joint::Nose)?;
            let head = [mid_shoulder[0], mid_shoulder[1] * 1.3, nose[2] / 4.0];
            Some(Self {
                mid_shoulder,
                pelvis,
                spine: weighted_middle(&pelvis, &mid_shoulder, 2.0, 1.0),
                spine1: weighted_middle(&pelvis, &mid_shoulder, 1.0, 1.0),
                spine2: weighted_middle(&pelvis, &mid_shoulder, 1.0, 2.0),
                neck: middle(&mid_shoulder, &head),
                head,
            })
        }
    }
}

/// `update` の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigOutput {
    /// 頭ボーンの意図位置と実位置の距離
    pub error: f32,
    /// 次のティックでもう一度補正する
    pub should_update: bool,
    /// メッシュの不透明度 `1 - error`（クランプは描画側）
    pub visibility: f32,
    /// 左右の指の曲げ角。簡易IKでは None
    pub fist: Option<[f32; 2]>,
}

pub struct Rig {
    model: KeypointModel,
    ik_level: u8,
    update_position: bool,
    scale_scene: Point,
    looks: BoneMap<Option<LookController>>,
    /// ルックターゲットの置き場所
    anchors: BoneMap<Option<Point>>,
    /// 各ボーンに最後に指示した位置
    origins: BoneMap<Option<Point>>,
    landmarks: Option<Landmarks>,
    error: f32,
}

impl Rig {
    /// スケルトンのレストポーズからアンカーとルック制御を作る
    pub fn new<S: Skeleton + ?Sized>(config: &MotionConfig, skeleton: &S) -> Self {
        let ik_level = config.ik_level;
        let origins = BoneMap::from_fn(|bone| skeleton.bone_position(bone));
        let anchors = BoneMap::from_fn(|bone| {
            if !bone.has_look_controller() || bone.disabled_at(ik_level) {
                return None;
            }
            let own = skeleton.bone_position(bone)?;
            Some(
                bone.look_target()
                    .and_then(|t| skeleton.bone_position(t))
                    .unwrap_or(own),
            )
        });
        let looks = BoneMap::from_fn(|bone| anchors[bone].map(|a| LookController::for_bone(bone, a)));
        Self {
            model: config.keypoint_model,
            ik_level,
            update_position: config.update_position,
            scale_scene: config.scale_scene,
            looks,
            anchors,
            origins,
            landmarks: None,
            error: 0.0,
        }
    }

    pub fn model(&self) -> KeypointModel {
        self.model
    }

    pub fn set_model(&mut self, model: KeypointModel) {
        self.model = model;
    }

    pub fn look(&self, bone: Bone) -> Option<&LookController> {
        self.looks[bone].as_ref()
    }

    pub fn anchor(&self, bone: Bone) -> Option<Point> {
        self.anchors[bone]
    }

    pub fn origin(&self, bone: Bone) -> Option<Point> {
        self.origins[bone]
    }

    pub fn landmarks(&self) -> Option<&Landmarks> {
        self.landmarks.as_ref()
    }

    /// 直近の位置誤差
    pub fn error(&self) -> f32 {
        self.error
    }

    /// 1ティック分のマッピング
    ///
    /// `kpts` は正規化済み（末尾に min / max / position の3点付き）。
    pub fn update<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S, kpts: &[Point]) -> RigOutput {
        let error = self.set_root_positions(skeleton, kpts);
        self.set_look_targets(kpts);
        self.set_limb_rotation(kpts);
        let fist = self.manual_corrections(skeleton, kpts);
        RigOutput {
            error,
            should_update: error > ERROR_THRESHOLD,
            visibility: 1.0 - error,
            fist,
        }
    }

    /// ボーン原点を動かす。デッドバンド内なら何もしない
    pub fn set_origin<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S, bone: Bone, position: &Point) -> bool {
        let Some(current) = skeleton.bone_position(bone) else {
            return false;
        };
        if self.origins[bone].is_none() || distance(position, &current) < DEADBAND {
            return false;
        }
        self.origins[bone] = Some(*position);
        skeleton.set_bone_position(bone, *position);
        true
    }

    /// ルックアンカーを関節位置へ動かし、ルック制御をそこへ向ける
    pub fn set_target(&mut self, bone: Bone, kpts: &[Point], joint: Joint) -> bool {
        let Some(position) = self.model.get(kpts, joint) else {
            return false;
        };
        let (Some(anchor), Some(look)) = (self.anchors[bone].as_mut(), self.looks[bone].as_mut()) else {
            return false;
        };
        if distance(position, anchor) < DEADBAND {
            return false;
        }
        *anchor = *position;
        look.target = *position;
        true
    }

    /// ルート位置と体幹・肩・脚の付け根の原点。戻り値は位置誤差
    pub fn set_root_positions<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S, kpts: &[Point]) -> f32 {
        if self.update_position {
            if let Some(center) = kpts.last() {
                skeleton.set_root_position(scale_by(center, &self.scale_scene));
            }
        }
        let Some(lm) = Landmarks::derive(self.model, kpts) else {
            return self.error;
        };
        self.landmarks = Some(lm);

        self.set_origin(skeleton, Bone::Hips, &lm.pelvis);
        if self.ik_level < 1 {
            self.set_origin(skeleton, Bone::Spine, &lm.spine);
            self.set_origin(skeleton, Bone::Spine1, &lm.spine1);
            self.set_origin(skeleton, Bone::Spine2, &lm.spine2);
            let neck = [lm.neck[0], lm.neck[1] - NECK_DROP, lm.neck[2]];
            self.set_origin(skeleton, Bone::Neck, &neck);
            self.set_origin(skeleton, Bone::Head, &lm.head);
        }
        for (shoulder, arm, joint) in [
            (Bone::LeftShoulder, Bone::LeftArm, Joint::LeftShoulder),
            (Bone::RightShoulder, Bone::RightArm, Joint::RightShoulder),
        ] {
            if let Some(kpt) = self.model.get(kpts, joint).copied() {
                // 検出された肩幅はメッシュには広すぎる
                let narrowed = weighted_middle(&lm.mid_shoulder, &kpt, 2.0, 1.0);
                self.set_origin(skeleton, shoulder, &narrowed);
                self.set_origin(skeleton, arm, &kpt);
            }
        }
        for (leg, joint) in [(Bone::LeftUpLeg, Joint::LeftHip), (Bone::RightUpLeg, Joint::RightHip)] {
            if let Some(kpt) = self.model.get(kpts, joint).copied() {
                self.set_origin(skeleton, leg, &kpt);
            }
        }

        self.error = match (self.origins[Bone::Head], skeleton.bone_position(Bone::Head)) {
            (Some(intended), Some(actual)) => distance(&intended, &actual),
            _ => 0.0,
        };
        self.error
    }

    /// ボーンターゲットグラフの各ボーンを対応関節へ向ける
    pub fn set_look_targets(&mut self, kpts: &[Point]) {
        for bone in Bone::ALL {
            let Some(joint) = bone.look_joint() else {
                continue;
            };
            if bone == Bone::Head && self.ik_level >= 1 {
                continue;
            }
            self.set_target(bone, kpts, joint);
        }
        self.set_hips(kpts);
        self.set_leg_orientation(kpts);
    }

    /// 腰は (左腰, 右腰, 骨盤) の平面法線方向を向く
    fn set_hips(&mut self, kpts: &[Point]) {
        let get = |joint| self.model.get(kpts, joint).copied();
        let (Some(l), Some(r), Some(p)) = (get(Joint::LeftHip), get(Joint::RightHip), get(Joint::Pelvis)) else {
            return;
        };
        let Some(normal) = plane_normal(&l, &r, &p) else {
            return;
        };
        if self.anchors[Bone::Hips].is_none() {
            return;
        }
        self.anchors[Bone::Hips] = Some(normal);
        if let Some(look) = self.looks[Bone::Hips].as_mut() {
            look.target = sum(&p, &normal);
            look.adjust_roll = -f32::atan2((r[0] - l[0]).abs(), (r[1] - l[1]).abs()) + FRAC_PI_2;
        }
    }

    /// 膝が腰より手前か奥かで太ももの曲げ方向を反転
    fn set_leg_orientation(&mut self, kpts: &[Point]) {
        for (bone, hip, knee) in [
            (Bone::LeftUpLeg, Joint::LeftHip, Joint::LeftKnee),
            (Bone::RightUpLeg, Joint::RightHip, Joint::RightKnee),
        ] {
            let (Some(h), Some(k)) = (self.model.get(kpts, hip), self.model.get(kpts, knee)) else {
                continue;
            };
            let flip = h[2] - k[2] > 0.0;
            if let Some(look) = self.looks[bone].as_mut() {
                look.adjust_pitch = if flip { -FRAC_PI_2 } else { FRAC_PI_2 };
                look.adjust_roll = if flip { 0.0 } else { PI };
            }
        }
    }

    /// 体の向きに合わせて手足のアップ軸を決める
    pub fn set_limb_rotation(&mut self, kpts: &[Point]) {
        let (Some(l), Some(r)) = (self.model.get(kpts, Joint::LeftHip), self.model.get(kpts, Joint::RightHip)) else {
            return;
        };
        let f = sign(l[0] - r[0]);
        for (bone, look) in self.looks.iter_mut() {
            let Some(look) = look.as_mut() else {
                continue;
            };
            look.up_axis = match (bone, bone.side()) {
                (Bone::LeftShoulder, _) => [f, 1.0, -f],
                (Bone::RightShoulder, _) => [-f, 1.0, -f],
                (Bone::LeftHand, _) => [0.0, 0.0, f],
                (Bone::RightHand, _) => [0.0, 0.0, -f],
                (_, Some(Side::Left)) => [-f, 1.0, -f],
                (_, Some(Side::Right)) => [f, 1.0, -f],
                (Bone::Hips, None) => continue,
                (_, None) => [0.0, 1.0, 0.0],
            };
        }
    }

    /// 手の握り推定。戻り値は左右の曲げ角
    ///
    /// 肘-手首に対して指先-手首が短いほど握っているとみなし、全ての指に同じ角度を掛ける。
    pub fn manual_corrections<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S, kpts: &[Point]) -> Option<[f32; 2]> {
        if self.ik_level >= 1 {
            return None;
        }
        let left = self.fist_angle(kpts, Side::Left);
        let right = self.fist_angle(kpts, Side::Right).map(|a| -a);
        for (side, hand, angle) in [(Side::Left, Bone::LeftHand, left), (Side::Right, Bone::RightHand, right)] {
            let Some(angle) = angle else {
                continue;
            };
            if !skeleton.has_bone(hand) {
                continue;
            }
            for finger in Bone::fingers(side) {
                skeleton.set_bone_rotation(finger, [0.0, 0.0, angle]);
            }
        }
        Some([left?, right?])
    }

    fn fist_angle(&self, kpts: &[Point], side: Side) -> Option<f32> {
        let (elbow, wrist, index) = match side {
            Side::Left => (Joint::LeftElbow, Joint::LeftWrist, Joint::LeftIndex),
            Side::Right => (Joint::RightElbow, Joint::RightWrist, Joint::RightIndex),
        };
        let get = |joint| self.model.get(kpts, joint);
        let wrist = get(wrist)?;
        let forearm = distance(get(elbow)?, wrist);
        if forearm <= f32::EPSILON {
            return None;
        }
        let fingers = distance(get(index)?, wrist);
        Some(PI * (1.0 - 3.0 * fingers / forearm))
    }

    /// ルック制御をスケルトンへ反映し、つま先を足の回転と逆に曲げて接地させる
    pub fn apply_looks<S: Skeleton + ?Sized>(&self, skeleton: &mut S) {
        for (bone, look) in self.looks.iter() {
            if let Some(look) = look {
                skeleton.apply_look(bone, look);
            }
        }
        for (foot, toe) in [(Bone::LeftFoot, Bone::LeftToeBase), (Bone::RightFoot, Bone::RightToeBase)] {
            if let Some(r) = skeleton.bone_rotation(foot) {
                skeleton.set_bone_rotation(toe, [-r[0], 0.0, 0.0]);
            }
        }
    }
}

/// 0 は 0 のまま
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::skeleton::PoseSkeleton;

    fn approx_eq_3(a: &Point, b: &Point, eps: f32) -> bool {
        (a[0] - b[0]).abs() < eps && (a[1] - b[1]).abs() < eps && (a[2] - b[2]).abs() < eps
    }

    fn put(kpts: &mut [Point], model: KeypointModel, joint: Joint, p: Point) {
        if let Some(i) = model.index(joint) {
            kpts[i] = p;
        }
    }

    /// 正面向き・直立の BlazePose 正規化済みキーポイント
    fn blaze_body() -> Vec<Point> {
        let m = KeypointModel::BlazePose;
        let mut k = vec![[0.0; 3]; m.keypoint_count()];
        put(&mut k, m, Joint::Nose, [0.0, 1.6, 0.1]);
        put(&mut k, m, Joint::LeftShoulder, [0.2, 1.4, 0.0]);
        put(&mut k, m, Joint::RightShoulder, [-0.2, 1.4, 0.0]);
        put(&mut k, m, Joint::LeftElbow, [0.45, 1.4, 0.0]);
        put(&mut k, m, Joint::RightElbow, [-0.45, 1.4, 0.0]);
        put(&mut k, m, Joint::LeftWrist, [0.7, 1.4, 0.0]);
        put(&mut k, m, Joint::RightWrist, [-0.7, 1.4, 0.0]);
        put(&mut k, m, Joint::LeftIndex, [0.8, 1.4, 0.0]);
        put(&mut k, m, Joint::RightIndex, [-0.8, 1.4, 0.0]);
        put(&mut k, m, Joint::LeftHip, [0.1, 0.9, 0.0]);
        put(&mut k, m, Joint::RightHip, [-0.1, 0.9, 0.0]);
        put(&mut k, m, Joint::Pelvis, [0.0, 0.9, 0.02]);
        put(&mut k, m, Joint::LeftKnee, [0.1, 0.5, 0.05]);
        put(&mut k, m, Joint::RightKnee, [-0.1, 0.5, 0.05]);
        put(&mut k, m, Joint::LeftAnkle, [0.1, 0.1, 0.0]);
        put(&mut k, m, Joint::RightAnkle, [-0.1, 0.1, 0.0]);
        put(&mut k, m, Joint::LeftFoot, [0.1, 0.0, 0.1]);
        put(&mut k, m, Joint::RightFoot, [-0.1, 0.0, 0.1]);
        // min, max, position
        k.push([-0.8, 0.0, 0.0]);
        k.push([0.8, 1.6, 0.1]);
        k.push([0.0, 0.0, 0.0]);
        k
    }

    fn config(ik_level: u8) -> MotionConfig {
        MotionConfig {
            keypoint_model: KeypointModel::BlazePose,
            ik_level,
            ..Default::default()
        }
    }

    fn rig(ik_level: u8) -> (Rig, PoseSkeleton) {
        let skeleton = PoseSkeleton::humanoid();
        (Rig::new(&config(ik_level), &skeleton), skeleton)
    }

    #[test]
    fn test_derived_landmarks() {
        let lm = Landmarks::derive(KeypointModel::BlazePose, &blaze_body()).unwrap();
        assert!(approx_eq_3(&lm.mid_shoulder, &[0.0, 1.4, 0.0], 1e-6));
        assert!(approx_eq_3(&lm.pelvis, &[0.0, 0.9, 0.0], 1e-6));
        // 背骨は骨盤寄りから肩寄りへ
        assert!(lm.spine[1] < lm.spine1[1] && lm.spine1[1] < lm.spine2[1]);
        assert!((lm.spine[1] - (0.9 + 0.5 / 3.0)).abs() < 1e-5);
        assert!((lm.spine1[1] - 1.15).abs() < 1e-5);
        assert!(approx_eq_3(&lm.head, &[0.0, 1.4 * 1.3, 0.1 / 4.0], 1e-5));
        assert!(approx_eq_3(&lm.neck, &middle(&lm.mid_shoulder, &lm.head), 1e-6));
    }

    #[test]
    fn test_explicit_spine_landmarks() {
        let m = KeypointModel::Smpl;
        let mut k = vec![[0.0; 3]; m.keypoint_count()];
        put(&mut k, m, Joint::LeftShoulder, [0.2, 1.4, 0.0]);
        put(&mut k, m, Joint::RightShoulder, [-0.2, 1.4, 0.0]);
        put(&mut k, m, Joint::Pelvis, [0.0, 0.95, 0.0]);
        put(&mut k, m, Joint::Spine, [0.0, 1.05, 0.0]);
        put(&mut k, m, Joint::Spine1, [0.0, 1.15, 0.0]);
        put(&mut k, m, Joint::Spine2, [0.0, 1.25, 0.0]);
        put(&mut k, m, Joint::Neck, [0.0, 1.45, 0.0]);
        put(&mut k, m, Joint::LeftEar, [0.05, 1.6, 0.0]);
        put(&mut k, m, Joint::RightEar, [-0.05, 1.6, 0.0]);
        let lm = Landmarks::derive(m, &k).unwrap();
        assert_eq!(lm.pelvis, [0.0, 0.95, 0.0]);
        assert_eq!(lm.spine1, [0.0, 1.15, 0.0]);
        assert_eq!(lm.neck, [0.0, 1.45, 0.0]);
        assert!(approx_eq_3(&lm.head, &[0.0, 1.525, 0.0], 1e-6));
    }

    #[test]
    fn test_missing_keypoints_are_noop() {
        let (mut rig, mut skeleton) = rig(0);
        let before = skeleton.clone();
        let out = rig.update(&mut skeleton, &[[0.0; 3]; 4]);
        assert_eq!(out.error, 0.0);
        assert!(Landmarks::derive(KeypointModel::BlazePose, &[]).is_none());
        // ルートだけは末尾点へ動く
        assert_eq!(skeleton.bone_position(Bone::Head), before.bone_position(Bone::Head));
    }

    #[test]
    fn test_full_ik_places_head_exactly() {
        let (mut rig, mut skeleton) = rig(0);
        let out = rig.update(&mut skeleton, &blaze_body());
        assert!(out.error < 1e-5, "error {}", out.error);
        assert!(!out.should_update);
        assert!((out.visibility - 1.0).abs() < 1e-5);
        let lm = rig.landmarks().unwrap();
        assert!(approx_eq_3(&skeleton.bone_position(Bone::Hips).unwrap(), &lm.pelvis, 1e-5));
    }

    #[test]
    fn test_shoulders_are_narrowed() {
        let (mut rig, mut skeleton) = rig(0);
        rig.update(&mut skeleton, &blaze_body());
        let l = skeleton.bone_position(Bone::LeftShoulder).unwrap();
        assert!(approx_eq_3(&l, &[0.2 / 3.0, 1.4, 0.0], 1e-5));
        let arm = skeleton.bone_position(Bone::LeftArm).unwrap();
        assert!(approx_eq_3(&arm, &[0.2, 1.4, 0.0], 1e-5));
    }

    #[test]
    fn test_reduced_ik_reports_head_error() {
        let (mut rig, mut skeleton) = rig(1);
        let rest_head = skeleton.bone_position(Bone::Head).unwrap();
        let out = rig.update(&mut skeleton, &blaze_body());
        // 腰が 0.95 → 0.9 に下がり、頭は追従するが意図位置はレストのまま
        assert!((out.error - 0.05).abs() < 1e-4, "error {}", out.error);
        assert!(out.should_update);
        assert_eq!(rig.origin(Bone::Head), Some(rest_head));
        assert!(rig.look(Bone::Head).is_none());
        assert!(out.fist.is_none());
    }

    #[test]
    fn test_deadband_keeps_state() {
        for ik in [0, 1] {
            let (mut rig, mut skeleton) = rig(ik);
            let body = blaze_body();
            let first = rig.update(&mut skeleton, &body);
            let snapshot = skeleton.clone();
            let origins: Vec<_> = Bone::ALL.iter().map(|b| rig.origin(*b)).collect();
            let anchors: Vec<_> = Bone::ALL.iter().map(|b| rig.anchor(*b)).collect();

            // デッドバンド未満の揺れ
            let jittered: Vec<Point> = body.iter().map(|p| [p[0] + 0.0004, p[1], p[2] - 0.0004]).collect();
            let second = rig.update(&mut skeleton, &jittered);
            assert_eq!(first.error, second.error);
            for (i, b) in Bone::ALL.iter().enumerate() {
                assert_eq!(rig.origin(*b), origins[i], "{:?}", b);
                if *b != Bone::Hips {
                    assert_eq!(rig.anchor(*b), anchors[i], "{:?}", b);
                }
                assert_eq!(skeleton.bone_position(*b), snapshot.bone_position(*b));
            }
        }
    }

    #[test]
    fn test_look_targets_follow_joints() {
        let (mut rig, mut skeleton) = rig(0);
        let body = blaze_body();
        rig.update(&mut skeleton, &body);
        let m = KeypointModel::BlazePose;
        let elbow = body[m.index(Joint::LeftElbow).unwrap()];
        assert_eq!(rig.look(Bone::LeftArm).unwrap().target, elbow);
        assert_eq!(rig.anchor(Bone::LeftArm), Some(elbow));
        let nose = body[m.index(Joint::Nose).unwrap()];
        assert_eq!(rig.look(Bone::Head).unwrap().target, nose);
    }

    #[test]
    fn test_hips_plane() {
        let (mut rig, mut skeleton) = rig(0);
        rig.update(&mut skeleton, &blaze_body());
        let normal = rig.anchor(Bone::Hips).unwrap();
        assert!((normal[1].abs() - 1.0).abs() < 1e-5, "{:?}", normal);
        // 腰が水平なら roll 補正は 0
        assert!(rig.look(Bone::Hips).unwrap().adjust_roll.abs() < 1e-5);
    }

    #[test]
    fn test_leg_flip() {
        let (mut rig, mut skeleton) = rig(0);
        let mut body = blaze_body();
        rig.update(&mut skeleton, &body);
        // 膝が腰より奥: 反転なし
        let l = rig.look(Bone::LeftUpLeg).unwrap();
        assert_eq!(l.adjust_pitch, FRAC_PI_2);
        assert_eq!(l.adjust_roll, PI);

        let m = KeypointModel::BlazePose;
        body[m.index(Joint::LeftKnee).unwrap()] = [0.1, 0.5, -0.2];
        rig.update(&mut skeleton, &body);
        let l = rig.look(Bone::LeftUpLeg).unwrap();
        assert_eq!(l.adjust_pitch, -FRAC_PI_2);
        assert_eq!(l.adjust_roll, 0.0);
        // 右脚は変わらない
        assert_eq!(rig.look(Bone::RightUpLeg).unwrap().adjust_pitch, FRAC_PI_2);
    }

    #[test]
    fn test_limb_up_axis_follows_facing() {
        let (mut rig, mut skeleton) = rig(0);
        let mut body = blaze_body();
        rig.update(&mut skeleton, &body);
        assert_eq!(rig.look(Bone::LeftArm).unwrap().up_axis, [-1.0, 1.0, -1.0]);
        assert_eq!(rig.look(Bone::RightArm).unwrap().up_axis, [1.0, 1.0, -1.0]);
        assert_eq!(rig.look(Bone::LeftShoulder).unwrap().up_axis, [1.0, 1.0, -1.0]);
        assert_eq!(rig.look(Bone::LeftHand).unwrap().up_axis, [0.0, 0.0, 1.0]);
        assert_eq!(rig.look(Bone::RightHand).unwrap().up_axis, [0.0, 0.0, -1.0]);
        assert_eq!(rig.look(Bone::Head).unwrap().up_axis, [0.0, 1.0, 0.0]);

        // 後ろ向き: 左右の腰が入れ替わる
        let m = KeypointModel::BlazePose;
        body.swap(m.index(Joint::LeftHip).unwrap(), m.index(Joint::RightHip).unwrap());
        rig.update(&mut skeleton, &body);
        assert_eq!(rig.look(Bone::LeftArm).unwrap().up_axis, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_fist_angle() {
        let (mut rig, mut skeleton) = rig(0);
        let out = rig.update(&mut skeleton, &blaze_body());
        // 前腕 0.25, 指 0.1 → π(1 - 1.2)
        let [l, r] = out.fist.unwrap();
        assert!((l - PI * (1.0 - 3.0 * 0.1 / 0.25)).abs() < 1e-4);
        assert!((r + l).abs() < 1e-6);
        for finger in Bone::fingers(Side::Left) {
            assert_eq!(skeleton.bone_rotation(finger), Some([0.0, 0.0, l]));
        }
    }

    #[test]
    fn test_toes_counter_foot() {
        let (mut rig, mut skeleton) = rig(0);
        rig.update(&mut skeleton, &blaze_body());
        rig.apply_looks(&mut skeleton);
        let foot = skeleton.bone_rotation(Bone::LeftFoot).unwrap();
        assert_eq!(skeleton.bone_rotation(Bone::LeftToeBase), Some([-foot[0], 0.0, 0.0]));
    }

    #[test]
    fn test_root_follows_position_point() {
        let (mut rig, mut skeleton) = rig(0);
        let mut body = blaze_body();
        let n = body.len();
        body[n - 1] = [1.0, 0.0, 2.0];
        rig.update(&mut skeleton, &body);
        // scale_scene 既定 [1.5, 1, 1]
        assert!(approx_eq_3(&skeleton.root_position(), &[1.5, 0.0, 2.0], 1e-6));
    }
}
