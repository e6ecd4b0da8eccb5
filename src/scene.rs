//! 人物スロット・リグ・テレメトリをまとめたパイプライン
//!
//! 検出の取り込み (`ingest`) と描画ティック (`tick`)、ユーザー操作（ドラッグ、
//! クローン、削除）はすべて同じスレッドから呼ぶこと。並列化する場合は外側で
//! 排他制御が必要。

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, MotionConfig, TelemetryConfig};
use crate::error::{Result, RigError};
use crate::geometry::{Point, ORIGIN};
use crate::pose::{KeypointModel, RawFrame};
use crate::rig::kinematics::ERROR_THRESHOLD;
use crate::rig::{auto_scale, Bone, Rig, Skeleton};
use crate::telemetry::{Reference, Telemetry};
use crate::tracker::{
    interpolate, normalize, BoundingBox, FrameMatcher, MatchOutcome, MotionData, NormalizeOptions, PersonSlot,
};

/// 新しいデータを「新鮮」とみなす時間 (ms)。補間ステップ数に比例して伸ばす
const FRESH_MS: f64 = 200.0;

/// 新規データ無しで補間を続けるティック数（ステップ数 + 1 倍）
const INTERPOLATION_TICKS: u32 = 10;

/// クローンを親から横にずらす間隔
const CLONE_SPACING: f32 = 0.66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonId {
    /// マッチャーが管理するスロット
    Tracked(usize),
    /// 検出を受け取らない複製
    Clone(usize),
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonId::Tracked(i) => write!(f, "person {}", i + 1),
            PersonId::Clone(i) => write!(f, "clone {}", i + 1),
        }
    }
}

/// 1人分の描画側状態
pub struct Body<S> {
    pub rig: Rig,
    pub skeleton: S,
    pub telemetry: Telemetry,
    /// 直近の位置誤差
    pub error: f32,
    pub fist: Option<[f32; 2]>,
    /// スコアが `min_score` を下回り続けたティック数
    low_score_ticks: u32,
}

impl<S: Skeleton> Body<S> {
    fn new(motion: &MotionConfig, telemetry: &TelemetryConfig, skeleton: S) -> Self {
        Self {
            rig: Rig::new(motion, &skeleton),
            skeleton,
            telemetry: Telemetry::new(telemetry.clone()),
            error: 0.0,
            fist: None,
            low_score_ticks: 0,
        }
    }
}

pub struct ClonePerson<S> {
    pub name: String,
    /// 親（追跡スロット）の番号
    pub parent: usize,
    pub slot: PersonSlot,
    pub body: Body<S>,
}

/// 保存・復元用の1人分のスナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSnapshot {
    pub id: PersonId,
    pub name: String,
    /// クローン元のスロット番号
    pub parent: Option<usize>,
    pub position: Point,
    pub rotation: Point,
    pub offsets: Point,
    pub current: MotionData,
    pub interpolated: MotionData,
    pub normalized: Vec<Point>,
    pub normalized_offsets: Vec<Point>,
    pub bbox: BoundingBox,
}

pub struct Scene<S> {
    motion: MotionConfig,
    normalize: NormalizeOptions,
    telemetry: TelemetryConfig,
    matcher: FrameMatcher,
    /// 人物毎に複製するスケルトン
    template: S,
    slots: Vec<PersonSlot>,
    bodies: Vec<Body<S>>,
    clones: Vec<ClonePerson<S>>,
}

impl<S: Skeleton + Clone> Scene<S> {
    pub fn new(config: &Config, template: S) -> Self {
        Self {
            motion: config.motion.clone(),
            normalize: config.normalize,
            telemetry: config.telemetry.clone(),
            matcher: FrameMatcher::from_config(&config.motion),
            template,
            slots: Vec::new(),
            bodies: Vec::new(),
            clones: Vec::new(),
        }
    }

    pub fn motion_config(&self) -> &MotionConfig {
        &self.motion
    }

    pub fn model(&self) -> KeypointModel {
        self.motion.keypoint_model
    }

    pub fn tracked_count(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// 表示対象の追跡スロット（max_persons 以内）
    pub fn active_ids(&self) -> Vec<PersonId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| PersonId::Tracked(i))
            .collect()
    }

    pub fn clones(&self) -> &[ClonePerson<S>] {
        &self.clones
    }

    /// 追跡スロット → クローンの順
    pub fn ids(&self) -> Vec<PersonId> {
        (0..self.slots.len())
            .map(PersonId::Tracked)
            .chain((0..self.clones.len()).map(PersonId::Clone))
            .collect()
    }

    pub fn name(&self, id: PersonId) -> Option<String> {
        match id {
            PersonId::Tracked(i) if i < self.slots.len() => Some(id.to_string()),
            PersonId::Clone(i) => self.clones.get(i).map(|c| c.name.clone()),
            _ => None,
        }
    }

    pub fn slot(&self, id: PersonId) -> Option<&PersonSlot> {
        match id {
            PersonId::Tracked(i) => self.slots.get(i),
            PersonId::Clone(i) => self.clones.get(i).map(|c| &c.slot),
        }
    }

    pub fn body(&self, id: PersonId) -> Option<&Body<S>> {
        match id {
            PersonId::Tracked(i) => self.bodies.get(i),
            PersonId::Clone(i) => self.clones.get(i).map(|c| &c.body),
        }
    }

    fn slot_mut(&mut self, id: PersonId) -> Result<&mut PersonSlot> {
        let slot = match id {
            PersonId::Tracked(i) => self.slots.get_mut(i),
            PersonId::Clone(i) => self.clones.get_mut(i).map(|c| &mut c.slot),
        };
        slot.ok_or(RigError::UnknownPerson(id))
    }

    fn new_body(&self) -> Body<S> {
        Body::new(&self.motion, &self.telemetry, self.template.clone())
    }

    /// 検出フレームをスロットへ割り当てる
    pub fn ingest(&mut self, frame: &RawFrame, now: f64) -> MatchOutcome {
        let outcome = self.matcher.assign(frame, &mut self.slots, now);
        while self.bodies.len() < self.slots.len() {
            let body = self.new_body();
            self.bodies.push(body);
        }
        outcome
    }

    /// 描画1フレーム分の更新。姿勢を反映した人数を返す
    pub fn tick(&mut self, now: f64) -> usize {
        let mut refreshed = vec![false; self.slots.len()];
        for (i, (slot, body)) in self.slots.iter_mut().zip(self.bodies.iter_mut()).enumerate() {
            if !slot.active {
                continue;
            }
            if step(slot, body, &self.motion, self.normalize, now) {
                body.telemetry.update(&body.skeleton, None, now);
                refreshed[i] = true;
            }
        }

        let mut clones_refreshed = 0;
        for clone in self.clones.iter_mut() {
            let own = step(&mut clone.slot, &mut clone.body, &self.motion, self.normalize, now);
            let parent_moved = refreshed.get(clone.parent).copied().unwrap_or(false);
            if !(own || parent_moved) {
                continue;
            }
            let Some(parent) = self.bodies.get(clone.parent) else {
                continue;
            };
            let name = PersonId::Tracked(clone.parent).to_string();
            let reference = Reference {
                name: &name,
                skeleton: &parent.skeleton,
            };
            clone.body.telemetry.update(&clone.body.skeleton, Some(&reference), now);
            if own {
                clones_refreshed += 1;
            }
        }
        refreshed.iter().filter(|r| **r).count() + clones_refreshed
    }

    /// キーポイントモデルを切り替える。手動補正は新しい点数のゼロで作り直す
    pub fn set_model(&mut self, model: KeypointModel) {
        if model == self.motion.keypoint_model {
            return;
        }
        info!(from = self.motion.keypoint_model.name(), to = model.name(), "keypoint model switched");
        self.motion.keypoint_model = model;
        let count = model.keypoint_count();
        let slots = self.slots.iter_mut().chain(self.clones.iter_mut().map(|c| &mut c.slot));
        for slot in slots {
            slot.reset_offsets(count);
            slot.should_update = true;
        }
        let rigs = self.bodies.iter_mut().chain(self.clones.iter_mut().map(|c| &mut c.body));
        for body in rigs {
            body.rig.set_model(model);
        }
    }

    pub fn set_scale_person(&mut self, scale: Point) {
        self.motion.scale_person = scale;
        self.request_update();
    }

    /// 全員を次のティックで再計算させる
    pub fn request_update(&mut self) {
        for slot in self.slots.iter_mut().chain(self.clones.iter_mut().map(|c| &mut c.slot)) {
            slot.should_update = true;
        }
    }

    /// キーポイントのアンカーをドラッグした分だけ手動補正に足す
    pub fn drag_keypoint(&mut self, id: PersonId, index: usize, delta: &Point) -> Result<()> {
        let slot = self.slot_mut(id)?;
        let count = slot.normalized_offsets.len();
        if !slot.nudge_keypoint(index, delta) {
            return Err(RigError::KeypointOutOfRange {
                person: id,
                index,
                count,
            });
        }
        debug!(person = %id, index, "keypoint dragged");
        Ok(())
    }

    /// 中心アンカーのドラッグ: 人物全体を動かし、検出から切り離す
    pub fn move_person(&mut self, id: PersonId, delta: &Point) -> Result<()> {
        let slot = self.slot_mut(id)?;
        slot.move_by(delta);
        slot.detached = true;
        Ok(())
    }

    /// ドラッグ終了。再び新しい検出に追従する
    pub fn attach_person(&mut self, id: PersonId) -> Result<()> {
        let slot = self.slot_mut(id)?;
        slot.detached = false;
        slot.should_update = true;
        Ok(())
    }

    /// 追跡中の人物の現在の姿勢を複製する
    pub fn clone_person(&mut self, parent: usize, now: f64) -> Result<PersonId> {
        let source = self
            .slots
            .get(parent)
            .ok_or(RigError::UnknownPerson(PersonId::Tracked(parent)))?;
        if source.interpolated.keypoints.is_empty() {
            return Err(RigError::NoPoseData(PersonId::Tracked(parent)));
        }
        let siblings = self.clones.iter().filter(|c| c.parent == parent).count() + 1;
        let index = self.clones.len();
        let mut slot = PersonSlot::new(index);
        slot.offsets = [CLONE_SPACING * siblings as f32 + source.offsets[0], 0.0, 0.0];
        slot.update_data(source.interpolated.keypoints.clone(), source.interpolated.score, now);
        let name = format!("clone {} of {}", siblings, PersonId::Tracked(parent));
        info!(name = %name, "person cloned");
        let body = self.new_body();
        self.clones.push(ClonePerson {
            name,
            parent,
            slot,
            body,
        });
        Ok(PersonId::Clone(index))
    }

    /// 人物を削除する。追跡スロットを消すとそのクローンも消える
    pub fn remove_person(&mut self, id: PersonId) -> Result<()> {
        match id {
            PersonId::Tracked(i) if i < self.slots.len() => {
                self.slots.remove(i);
                self.bodies.remove(i);
                for (n, slot) in self.slots.iter_mut().enumerate() {
                    slot.index = n;
                }
                self.clones.retain(|c| c.parent != i);
                for clone in self.clones.iter_mut().filter(|c| c.parent > i) {
                    clone.parent -= 1;
                }
            }
            PersonId::Clone(i) if i < self.clones.len() => {
                self.clones.remove(i);
            }
            _ => return Err(RigError::UnknownPerson(id)),
        }
        for (n, clone) in self.clones.iter_mut().enumerate() {
            clone.slot.index = n;
        }
        info!(person = %id, "person removed");
        Ok(())
    }

    /// 全員を破棄する（入力ソースの切り替え時）
    pub fn reset(&mut self) {
        info!(persons = self.slots.len(), clones = self.clones.len(), "scene reset");
        self.slots.clear();
        self.bodies.clear();
        self.clones.clear();
    }

    /// 膝の間隔から `scale_person` を推定し、妥当なら採用する
    pub fn auto_scale(&mut self, id: PersonId) -> Result<Option<Point>> {
        let body = self.body(id).ok_or(RigError::UnknownPerson(id))?;
        let scale = auto_scale(&body.skeleton, &body.rig, &self.motion.scale_person);
        if let Some(scale) = scale {
            self.set_scale_person(scale);
        }
        Ok(scale)
    }

    pub fn snapshot(&self) -> Vec<PersonSnapshot> {
        self.ids()
            .into_iter()
            .filter_map(|id| {
                let slot = self.slot(id)?;
                let body = self.body(id)?;
                let parent = match id {
                    PersonId::Clone(i) => self.clones.get(i).map(|c| c.parent),
                    PersonId::Tracked(_) => None,
                };
                Some(PersonSnapshot {
                    id,
                    name: self.name(id)?,
                    parent,
                    position: body.skeleton.root_position(),
                    rotation: body.skeleton.bone_rotation(Bone::Hips).unwrap_or(ORIGIN),
                    offsets: slot.offsets,
                    current: slot.current.clone(),
                    interpolated: slot.interpolated.clone(),
                    normalized: slot.normalized.clone(),
                    normalized_offsets: slot.normalized_offsets.clone(),
                    bbox: slot.bbox,
                })
            })
            .collect()
    }

    /// スナップショットから人物を作り直す。マッチャーは次のフレームから続きを割り当てる
    pub fn restore(&mut self, snapshots: &[PersonSnapshot]) {
        self.reset();
        let restore_slot = |snap: &PersonSnapshot, index: usize| {
            let mut slot = PersonSlot::new(index);
            slot.current = snap.current.clone();
            slot.interpolated = snap.interpolated.clone();
            slot.normalized = snap.normalized.clone();
            slot.normalized_offsets = snap.normalized_offsets.clone();
            slot.offsets = snap.offsets;
            slot.bbox = snap.bbox;
            slot
        };
        for snap in snapshots.iter().filter(|s| matches!(s.id, PersonId::Tracked(_))) {
            let slot = restore_slot(snap, self.slots.len());
            let mut body = self.new_body();
            body.skeleton.set_root_position(snap.position);
            self.slots.push(slot);
            self.bodies.push(body);
        }
        for snap in snapshots.iter() {
            let (PersonId::Clone(_), Some(parent)) = (snap.id, snap.parent) else {
                continue;
            };
            if parent >= self.slots.len() {
                continue;
            }
            let slot = restore_slot(snap, self.clones.len());
            let body = self.new_body();
            self.clones.push(ClonePerson {
                name: snap.name.clone(),
                parent,
                slot,
                body,
            });
        }
        info!(persons = self.slots.len(), clones = self.clones.len(), "scene restored");
    }
}

/// 1人分のティック。ルック制御を反映した（テレメトリを更新すべき）なら true
fn step<S: Skeleton>(
    slot: &mut PersonSlot,
    body: &mut Body<S>,
    motion: &MotionConfig,
    options: NormalizeOptions,
    now: f64,
) -> bool {
    if !slot.has_data() {
        return false;
    }
    let steps = motion.interpolation_steps;
    let fresh = now - slot.current.timestamp < FRESH_MS * (steps as f64 + 1.0);
    let interpolating = slot.interpolation_step < INTERPOLATION_TICKS * (steps + 1);
    if slot.should_update || interpolating || (!slot.detached && fresh) {
        slot.interpolation_step += 1;
        slot.interpolated = interpolate(&slot.current, &slot.interpolated, steps, now);
        slot.normalized = normalize(
            &slot.interpolated.keypoints,
            &motion.scale_person,
            &slot.offsets,
            &slot.normalized_offsets,
            options,
        );
        if let Some(bbox) = BoundingBox::from_normalized(&slot.normalized) {
            slot.bbox = bbox;
        }
        let out = body.rig.update(&mut body.skeleton, &slot.normalized);
        body.error = out.error;
        body.fist = out.fist;
        body.skeleton.set_visibility(out.visibility);
        slot.should_update = true;
    }

    let refreshed = !slot.detached && slot.should_update;
    if refreshed {
        body.rig.apply_looks(&mut body.skeleton);
        if slot.current.score < motion.min_score {
            body.low_score_ticks = body.low_score_ticks.saturating_add(1);
        } else {
            body.low_score_ticks = 0;
        }
        body.skeleton.set_visibility(fade(body.low_score_ticks, motion.fade_frames));
    }
    slot.should_update = body.error > ERROR_THRESHOLD;
    refreshed
}

/// 低スコアが続いたティック数に応じた線形フェード
fn fade(ticks: u32, frames: u32) -> f32 {
    if frames == 0 {
        return if ticks == 0 { 1.0 } else { 0.0 };
    }
    (1.0 - ticks as f32 / frames as f32).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Detection, Joint};
    use crate::rig::PoseSkeleton;

    fn approx_eq_f32(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn config(model: KeypointModel, steps: u32) -> Config {
        let mut config = Config::default();
        config.motion.keypoint_model = model;
        config.motion.interpolation_steps = steps;
        config
    }

    fn scene(steps: u32) -> Scene<PoseSkeleton> {
        Scene::new(&config(KeypointModel::BlazePose, steps), PoseSkeleton::humanoid())
    }

    /// 画像座標系（y 下向き）の直立した人物
    fn body_at(x: f32) -> Vec<Point> {
        let m = KeypointModel::BlazePose;
        let mut k = vec![[x, 100.0, 0.0]; m.keypoint_count()];
        let mut put = |joint, p: Point| {
            if let Some(i) = m.index(joint) {
                k[i] = [x + p[0], p[1], p[2]];
            }
        };
        put(Joint::Nose, [0.0, 20.0, 5.0]);
        put(Joint::LeftShoulder, [20.0, 40.0, 0.0]);
        put(Joint::RightShoulder, [-20.0, 40.0, 0.0]);
        put(Joint::LeftElbow, [45.0, 40.0, 0.0]);
        put(Joint::RightElbow, [-45.0, 40.0, 0.0]);
        put(Joint::LeftWrist, [70.0, 40.0, 0.0]);
        put(Joint::RightWrist, [-70.0, 40.0, 0.0]);
        put(Joint::LeftIndex, [80.0, 40.0, 0.0]);
        put(Joint::RightIndex, [-80.0, 40.0, 0.0]);
        put(Joint::LeftHip, [10.0, 90.0, 0.0]);
        put(Joint::RightHip, [-10.0, 90.0, 0.0]);
        put(Joint::LeftKnee, [10.0, 130.0, 5.0]);
        put(Joint::RightKnee, [-10.0, 130.0, 5.0]);
        put(Joint::LeftAnkle, [10.0, 170.0, 0.0]);
        put(Joint::RightAnkle, [-10.0, 170.0, 0.0]);
        k
    }

    fn frame(xs: &[f32], score: f32, timestamp: f64) -> RawFrame {
        let bodies = xs.iter().map(|x| Detection::new(body_at(*x), score)).collect();
        RawFrame::new(bodies, timestamp)
    }

    #[test]
    fn test_ingest_creates_bodies() {
        let mut s = scene(0);
        let outcome = s.ingest(&frame(&[0.0, 300.0], 0.9, 0.0), 0.0);
        assert_eq!(outcome.created, 2);
        assert_eq!(s.tracked_count(), 2);
        assert!(s.body(PersonId::Tracked(1)).is_some());
        assert_eq!(s.name(PersonId::Tracked(1)).as_deref(), Some("person 2"));
    }

    #[test]
    fn test_crowd_above_max_persons() {
        let mut config = config(KeypointModel::BlazePose, 0);
        config.motion.max_persons = 1;
        let mut s = Scene::new(&config, PoseSkeleton::humanoid());
        s.ingest(&frame(&[0.0, 300.0], 0.9, 0.0), 0.0);
        assert_eq!(s.tracked_count(), 2);
        assert_eq!(s.active_ids(), vec![PersonId::Tracked(0)]);
        assert_eq!(s.tick(0.0), 1);

        // 並び順が逆でも person 1 は x = 0 付近の人物のまま
        s.ingest(&frame(&[305.0, 5.0], 0.9, 10.0), 10.0);
        let slot = s.slot(PersonId::Tracked(0)).unwrap();
        assert!(approx_eq_f32(slot.current.keypoints[0][0], 5.0));
        assert_eq!(s.active_count(), 1);
    }

    #[test]
    fn test_tick_maps_pose() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        let rest = PoseSkeleton::humanoid();
        assert_eq!(s.tick(0.0), 1);
        let body = s.body(PersonId::Tracked(0)).unwrap();
        assert_ne!(body.skeleton.bone_position(Bone::Hips), rest.bone_position(Bone::Hips));
        assert!(!body.telemetry.bones().is_empty());
        assert!(approx_eq_f32(body.skeleton.visibility(), 1.0));
        let slot = s.slot(PersonId::Tracked(0)).unwrap();
        assert_eq!(slot.normalized.len(), slot.current.keypoints.len() + 3);
        assert_eq!(slot.bbox.avg, slot.normalized[slot.normalized.len() - 1]);
    }

    #[test]
    fn test_stale_detached_person_stops_interpolating() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        s.move_person(PersonId::Tracked(0), &[0.1, 0.0, 0.0]).unwrap();
        for _ in 0..15 {
            s.tick(5000.0);
        }
        assert_eq!(s.slot(PersonId::Tracked(0)).unwrap().interpolation_step, 10);
        // 切り離し中はルック制御もテレメトリも更新しない
        assert!(s.body(PersonId::Tracked(0)).unwrap().telemetry.bones().is_empty());
    }

    #[test]
    fn test_fresh_data_keeps_updating() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        for t in 0..15 {
            s.tick(t as f64);
        }
        assert_eq!(s.slot(PersonId::Tracked(0)).unwrap().interpolation_step, 15);
    }

    #[test]
    fn test_low_score_fades() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.05, 0.0), 0.0);
        s.tick(0.0);
        s.tick(1.0);
        let v = s.body(PersonId::Tracked(0)).unwrap().skeleton.visibility();
        assert!(approx_eq_f32(v, 1.0 - 2.0 / 60.0), "{}", v);
        assert_eq!(fade(120, 60), 0.0);
        assert_eq!(fade(0, 0), 1.0);
    }

    #[test]
    fn test_model_switch_resets_offsets() {
        let mut s = Scene::new(&config(KeypointModel::Smpl, 0), PoseSkeleton::humanoid());
        let kpts = vec![[0.0; 3]; 33];
        s.ingest(&RawFrame::new(vec![Detection::new(kpts, 0.9)], 0.0), 0.0);
        s.drag_keypoint(PersonId::Tracked(0), 3, &[0.1, 0.0, 0.0]).unwrap();
        assert_eq!(s.slot(PersonId::Tracked(0)).unwrap().normalized_offsets.len(), 33);

        s.set_model(KeypointModel::BlazePose);
        let slot = s.slot(PersonId::Tracked(0)).unwrap();
        assert_eq!(slot.normalized_offsets.len(), 39);
        assert!(slot.normalized_offsets.iter().all(|o| *o == ORIGIN));
        assert_eq!(s.body(PersonId::Tracked(0)).unwrap().rig.model(), KeypointModel::BlazePose);
    }

    #[test]
    fn test_drag_errors() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        let count = KeypointModel::BlazePose.keypoint_count();
        match s.drag_keypoint(PersonId::Tracked(0), count, &[0.1, 0.0, 0.0]) {
            Err(RigError::KeypointOutOfRange { index, count: c, .. }) => {
                assert_eq!(index, count);
                assert_eq!(c, count);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            s.drag_keypoint(PersonId::Tracked(4), 0, &ORIGIN),
            Err(RigError::UnknownPerson(PersonId::Tracked(4)))
        ));
        assert!(s.move_person(PersonId::Clone(0), &ORIGIN).is_err());
    }

    #[test]
    fn test_move_person_detaches() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        s.move_person(PersonId::Tracked(0), &[0.5, 0.0, 0.0]).unwrap();
        let slot = s.slot(PersonId::Tracked(0)).unwrap();
        assert!(slot.detached);
        assert_eq!(slot.offsets, [0.5, 0.0, 0.0]);
        s.attach_person(PersonId::Tracked(0)).unwrap();
        assert!(!s.slot(PersonId::Tracked(0)).unwrap().detached);
    }

    #[test]
    fn test_clone_person() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        assert!(matches!(s.clone_person(0, 0.0), Err(RigError::NoPoseData(_))));
        s.tick(0.0);
        let id = s.clone_person(0, 1.0).unwrap();
        assert_eq!(id, PersonId::Clone(0));
        let second = s.clone_person(0, 1.0).unwrap();
        assert_eq!(s.slot(second).unwrap().offsets, [2.0 * CLONE_SPACING, 0.0, 0.0]);
        assert_eq!(s.name(id).as_deref(), Some("clone 1 of person 1"));

        s.tick(2.0);
        let head = s.body(id).unwrap().telemetry.bone(Bone::Head).cloned().unwrap();
        assert!(head.text.unwrap().contains("BASE: person 1"));
    }

    #[test]
    fn test_remove_person_reindexes() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0, 300.0], 0.9, 0.0), 0.0);
        s.tick(0.0);
        s.clone_person(0, 0.0).unwrap();
        s.clone_person(1, 0.0).unwrap();
        s.remove_person(PersonId::Tracked(0)).unwrap();
        assert_eq!(s.tracked_count(), 1);
        assert_eq!(s.slot(PersonId::Tracked(0)).unwrap().index, 0);
        assert_eq!(s.clones().len(), 1);
        assert_eq!(s.clones()[0].parent, 0);
        assert!(s.remove_person(PersonId::Clone(3)).is_err());
        s.remove_person(PersonId::Clone(0)).unwrap();
        assert!(s.clones().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0, 300.0], 0.9, 0.0), 0.0);
        s.reset();
        assert_eq!(s.tracked_count(), 0);
        assert_eq!(s.tick(0.0), 0);
        // 次のフレームで作り直される
        assert_eq!(s.ingest(&frame(&[0.0], 0.9, 1.0), 1.0).created, 1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut s = scene(0);
        s.ingest(&frame(&[0.0], 0.9, 0.0), 0.0);
        s.tick(0.0);
        s.clone_person(0, 0.0).unwrap();
        let snaps = s.snapshot();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[1].parent, Some(0));

        let json = serde_json::to_string(&snaps).unwrap();
        let parsed: Vec<PersonSnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1].id, PersonId::Clone(0));
        assert_eq!(parsed[1].name, "clone 1 of person 1");
        assert_eq!(parsed[0].normalized.len(), snaps[0].normalized.len());

        let mut restored = scene(0);
        restored.restore(&parsed);
        assert_eq!(restored.tracked_count(), 1);
        assert_eq!(restored.clones().len(), 1);
        assert_eq!(restored.clones()[0].parent, 0);
        assert_eq!(restored.slot(PersonId::Tracked(0)).unwrap().normalized, parsed[0].normalized);
    }
}
