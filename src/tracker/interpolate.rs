use super::slot::MotionData;

/// 1次IIRローパス: `(steps * prev + cur) / (steps + 1)`
///
/// `steps == 0` なら素通し。スコアは平滑化せず置き換え、タイムスタンプは `now`。
/// 前回値の無いキーポイントは今回値で初期化する。
pub fn interpolate(current: &MotionData, previous: &MotionData, steps: u32, now: f64) -> MotionData {
    let k = steps as f32;
    let keypoints = current
        .keypoints
        .iter()
        .enumerate()
        .map(|(i, cur)| {
            let prev = previous.keypoints.get(i).unwrap_or(cur);
            [
                (k * prev[0] + cur[0]) / (k + 1.0),
                (k * prev[1] + cur[1]) / (k + 1.0),
                (k * prev[2] + cur[2]) / (k + 1.0),
            ]
        })
        .collect();
    MotionData {
        timestamp: now,
        keypoints,
        scores: current.scores.clone(),
        score: current.score,
    }
}
