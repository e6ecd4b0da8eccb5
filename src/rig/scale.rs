//! スケルトンの自動スケール
//!
//! レストポーズの膝間隔と、検出から置いた膝アンカーの間隔の比から `scale_person` を求める。

use tracing::{info, warn};

use super::bone::Bone;
use super::kinematics::Rig;
use super::skeleton::Skeleton;
use crate::geometry::{diff, Point};

/// 比を使う最小の膝間隔
const MIN_SPAN: f32 = 0.1;

/// 新しい `scale_person` を計算する。妥当でなければ None
///
/// `x > 0.5` かつ `y > 1` のときだけ採用。z は x と y の平均。
pub fn auto_scale<S: Skeleton + ?Sized>(skeleton: &S, rig: &Rig, current: &Point) -> Option<Point> {
    let src = diff(
        &skeleton.bone_position(Bone::LeftLeg)?,
        &skeleton.bone_position(Bone::RightLeg)?,
    );
    let tgt = diff(&rig.anchor(Bone::LeftUpLeg)?, &rig.anchor(Bone::RightUpLeg)?);
    let factor = |axis: usize| {
        if src[axis] > MIN_SPAN && tgt[axis] != 0.0 {
            src[axis] / tgt[axis]
        } else {
            1.0
        }
    };
    let x = current[0] * factor(0);
    let y = current[1] * factor(1);
    let scale = [x, y, (x + y) / 2.0];
    if x > 0.5 && y > 1.0 {
        info!(?current, ?scale, "skeleton auto-scale");
        Some(scale)
    } else {
        warn!(?current, ?scale, "skeleton auto-scale rejected");
        None
    }
}
