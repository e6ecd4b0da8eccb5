//! 検出リクエストのゲート
//!
//! 同時に出すリクエストは1つだけ。結果が返ったら、一時停止中でなければ次を出す。
//! リセット後に届いた古い結果は世代番号で捨てる。再送はしない。

use tracing::debug;

#[derive(Debug, Default)]
pub struct DetectGate {
    busy: bool,
    paused: bool,
    generation: u64,
}

impl DetectGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// リクエストを出してよければ busy にして世代番号を返す
    pub fn try_begin(&mut self) -> Option<u64> {
        if self.busy || self.paused {
            return None;
        }
        self.busy = true;
        Some(self.generation)
    }

    /// 結果の到着。現在の世代の結果なら true（使ってよい）
    pub fn complete(&mut self, generation: u64) -> bool {
        self.busy = false;
        let current = generation == self.generation;
        if !current {
            debug!(generation, current = self.generation, "stale detection discarded");
        }
        current
    }

    /// 新しいリクエストを止める。送信中のものはそのまま完了させる
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// スロットを作り直す時に呼ぶ。送信中の結果は無効になる
    pub fn reset(&mut self) {
        self.generation += 1;
    }

    /// 接続が切れた時に呼ぶ。送信中のリクエストは返ってこないものとして busy を解く
    pub fn cancel(&mut self) {
        self.busy = false;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_outstanding_request() {
        let mut gate = DetectGate::new();
        assert_eq!(gate.try_begin(), Some(0));
        assert!(gate.is_busy());
        assert_eq!(gate.try_begin(), None);
        assert!(gate.complete(0));
        assert_eq!(gate.try_begin(), Some(0));
    }

    #[test]
    fn test_pause_lets_inflight_finish() {
        let mut gate = DetectGate::new();
        let g = gate.try_begin().unwrap();
        gate.pause();
        assert!(gate.complete(g));
        assert_eq!(gate.try_begin(), None);
        gate.resume();
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_reset_discards_stale_result() {
        let mut gate = DetectGate::new();
        let g = gate.try_begin().unwrap();
        gate.reset();
        assert!(!gate.complete(g));
        // busy は解除される
        assert_eq!(gate.try_begin(), Some(1));
        assert!(gate.complete(1));
    }

    #[test]
    fn test_cancel_releases_busy() {
        let mut gate = DetectGate::new();
        let g = gate.try_begin().unwrap();
        gate.cancel();
        assert!(!gate.is_busy());
        assert_eq!(gate.try_begin(), Some(g + 1));
    }
}
