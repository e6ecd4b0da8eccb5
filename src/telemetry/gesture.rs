//! 簡単な動作カウンタ（手を上げる・腕を開く・足を開く）

use crate::rig::{Bone, Skeleton};

/// 「閉じている」とみなす左右間隔
const CLOSED_SPAN: f32 = 0.25;
/// 「開いている」とみなす左右間隔
const OPEN_SPAN: f32 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    HandsUp,
    ArmsOpen,
    FeetWide,
}

impl Gesture {
    pub const ALL: [Gesture; 3] = [Gesture::HandsUp, Gesture::ArmsOpen, Gesture::FeetWide];

    pub fn name(self) -> &'static str {
        match self {
            Gesture::HandsUp => "hands up",
            Gesture::ArmsOpen => "arms open",
            Gesture::FeetWide => "feet wide",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureCounter {
    pub gesture: Gesture,
    pub count: u32,
    step: u8,
    /// 最初に数えた時刻 (ms)
    started: Option<f64>,
}

impl GestureCounter {
    pub fn new(gesture: Gesture) -> Self {
        Self {
            gesture,
            count: 0,
            step: 0,
            started: None,
        }
    }

    /// 1ティック分の判定。数えたら true
    pub fn update<S: Skeleton + ?Sized>(&mut self, skeleton: &S, now: f64) -> bool {
        let y = |bone| skeleton.bone_position(bone).map(|p| p[1]);
        let x = |bone| skeleton.bone_position(bone).map(|p| p[0]);
        let done = match self.gesture {
            Gesture::HandsUp => {
                let (Some(head), Some(left), Some(right)) = (y(Bone::Head), y(Bone::LeftHand), y(Bone::RightHand)) else {
                    return false;
                };
                // 両手を下ろす → 左右の順に頭より上へ
                if self.step == 0 && left < head {
                    self.step = 1;
                }
                if self.step == 1 && right < head {
                    self.step = 2;
                }
                if self.step == 2 && left > head {
                    self.step = 3;
                }
                if self.step == 3 && right > head {
                    self.step = 4;
                }
                self.step == 4
            }
            Gesture::ArmsOpen | Gesture::FeetWide => {
                let (l, r) = if self.gesture == Gesture::ArmsOpen {
                    (Bone::LeftHand, Bone::RightHand)
                } else {
                    (Bone::LeftFoot, Bone::RightFoot)
                };
                let (Some(l), Some(r)) = (x(l), x(r)) else {
                    return false;
                };
                let span = (l - r).abs();
                if self.step == 0 && span < CLOSED_SPAN {
                    self.step = 1;
                }
                if self.step == 1 && span > OPEN_SPAN {
                    self.step = 2;
                }
                self.step == 2
            }
        };
        if done {
            self.count += 1;
            self.step = 0;
            self.started.get_or_insert(now);
        }
        done
    }

    /// 最初のカウントからの経過秒
    pub fn elapsed_secs(&self, now: f64) -> Option<f64> {
        self.started.map(|t| ((now - t) / 100.0).round() / 10.0)
    }

    pub fn summary(&self, now: f64) -> String {
        match self.elapsed_secs(now) {
            Some(secs) if self.count > 0 => format!("{}: {} in {} sec", self.gesture.name(), self.count, secs),
            _ => format!("{}: {}", self.gesture.name(), self.count),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.gesture);
    }
}

/// 3つのカウンタ一式
#[derive(Debug, Clone, PartialEq)]
pub struct Gestures {
    pub counters: [GestureCounter; 3],
}

impl Default for Gestures {
    fn default() -> Self {
        Self {
            counters: Gesture::ALL.map(GestureCounter::new),
        }
    }
}

impl Gestures {
    pub fn update<S: Skeleton + ?Sized>(&mut self, skeleton: &S, now: f64) {
        for c in &mut self.counters {
            c.update(skeleton, now);
        }
    }

    pub fn reset(&mut self) {
        for c in &mut self.counters {
            c.reset();
        }
    }

    pub fn count(&self, gesture: Gesture) -> u32 {
        self.counters
            .iter()
            .find(|c| c.gesture == gesture)
            .map_or(0, |c| c.count)
    }
}
