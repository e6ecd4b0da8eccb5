use thiserror::Error;

use crate::scene::PersonId;

/// ライブラリ層の回復可能なエラー
///
/// フレーム毎の処理はエラーを返さない（欠損データは no-op）。ここに来るのは
/// 利用者操作・設定・入出力だけ。
#[derive(Debug, Error)]
pub enum RigError {
    #[error("{0} does not exist")]
    UnknownPerson(PersonId),

    #[error("{0} has no pose data yet")]
    NoPoseData(PersonId),

    #[error("keypoint {index} out of range for {person} ({count} keypoints)")]
    KeypointOutOfRange {
        person: PersonId,
        index: usize,
        count: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("detection connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RigError>;
