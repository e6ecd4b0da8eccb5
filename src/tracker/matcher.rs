use tracing::{debug, info};

use super::slot::PersonSlot;
use crate::config::MotionConfig;
use crate::geometry::distance;
use crate::pose::{Detection, RawFrame};

/// 割り当て候補（フレーム内でのみ使う）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub new_index: usize,
    pub slot_index: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// 確定した割り当て（距離の昇順）
    pub assignments: Vec<MatchCandidate>,
    /// 今回新しく作ったスロット数
    pub created: usize,
    /// 有効スロット数 = `min(検出数, スロット数, max_persons)`
    pub active: usize,
}

/// 検出とスロットの対応付け
///
/// 基準キーポイント（先頭点）同士の距離で全ペアを並べ、近い順に貪欲に確定する。
/// 二部グラフの最適割り当てではないため、2人の軌跡が近接して交差すると
/// 入れ替わることがある。
pub struct FrameMatcher {
    max_persons: usize,
}

impl FrameMatcher {
    pub fn new(max_persons: usize) -> Self {
        Self {
            max_persons: max_persons.max(1),
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.max_persons)
    }

    pub fn max_persons(&self) -> usize {
        self.max_persons
    }

    pub fn assign(&self, frame: &RawFrame, slots: &mut Vec<PersonSlot>, now: f64) -> MatchOutcome {
        let bodies = &frame.bodies;
        let mut outcome = MatchOutcome::default();

        if bodies.len() > slots.len() {
            // 人数が増えた: フレーム順にそのまま割り当てる。
            // スロット自体は max_persons を超えて保持し、有効化だけを制限する
            for (i, body) in bodies.iter().enumerate() {
                if i >= slots.len() {
                    slots.push(PersonSlot::new(i));
                    outcome.created += 1;
                    info!(person = i + 1, "person slot created");
                }
                slots[i].update_data(body.keypoints.clone(), body.score, now);
                outcome.assignments.push(MatchCandidate {
                    new_index: i,
                    slot_index: i,
                    distance: reference_distance(body, &slots[i]),
                });
            }
        } else {
            outcome.assignments = greedy_assignments(bodies, slots);
            let mut matched = vec![false; slots.len()];
            for c in &outcome.assignments {
                let body = &bodies[c.new_index];
                slots[c.slot_index].update_data(body.keypoints.clone(), body.score, now);
                matched[c.slot_index] = true;
            }
            // 今回検出されなかったスロットはデータを保持したままスコアだけ落とす
            for (slot, _) in slots.iter_mut().zip(&matched).filter(|(_, m)| !**m) {
                slot.current.score = 0.0;
            }
        }

        // 検出0人のときはスロット数で切る
        let detected = if bodies.is_empty() { usize::MAX } else { bodies.len() };
        outcome.active = detected.min(slots.len()).min(self.max_persons);
        for slot in slots.iter_mut() {
            let active = slot.index < outcome.active;
            if slot.active && !active {
                debug!(person = slot.number(), "person slot retired");
            }
            slot.active = active;
        }

        debug!(
            bodies = bodies.len(),
            slots = slots.len(),
            assigned = outcome.assignments.len(),
            active = outcome.active,
            "frame matched"
        );
        outcome
    }
}

fn reference_distance(body: &Detection, slot: &PersonSlot) -> f32 {
    match (body.reference(), slot.current.keypoints.first()) {
        (Some(a), Some(b)) => distance(a, b),
        _ => f32::INFINITY,
    }
}

/// 全ペア距離を昇順に並べ、使用済みの検出・スロットを含むペアを飛ばしながら確定する
///
/// 同距離は挿入順（検出 → スロットの順）で解決される。
fn greedy_assignments(bodies: &[Detection], slots: &[PersonSlot]) -> Vec<MatchCandidate> {
    let mut candidates = Vec::with_capacity(bodies.len() * slots.len());
    for (new_index, body) in bodies.iter().enumerate() {
        for (slot_index, slot) in slots.iter().enumerate() {
            candidates.push(MatchCandidate {
                new_index,
                slot_index,
                distance: reference_distance(body, slot),
            });
        }
    }
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let mut used_new = vec![false; bodies.len()];
    let mut used_slot = vec![false; slots.len()];
    let mut assignments = Vec::with_capacity(bodies.len().min(slots.len()));
    for c in candidates {
        if used_new[c.new_index] || used_slot[c.slot_index] {
            continue;
        }
        used_new[c.new_index] = true;
        used_slot[c.slot_index] = true;
        assignments.push(c);
    }
    assignments
}
