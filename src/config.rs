use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::RigError;
use crate::geometry::Point;
use crate::pose::KeypointModel;
use crate::sink::SINK_DEFAULT_ADDR;
use crate::tracker::NormalizeOptions;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub normalize: NormalizeOptions,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    /// 同時に追跡する最大人数
    #[serde(default = "default_max_persons")]
    pub max_persons: usize,
    /// これ未満の信頼度ではメッシュをフェードアウト
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// 平滑化の窓（フレーム数）。0で素通し
    #[serde(default = "default_interpolation_steps")]
    pub interpolation_steps: u32,
    /// 正規化後の人物スケール
    #[serde(default = "default_scale_person")]
    pub scale_person: Point,
    /// 配置位置のスケール
    #[serde(default = "default_scale_scene")]
    pub scale_scene: Point,
    /// 0=全補正, 1=背骨・頭の原点補正と手の握り推定を省略
    #[serde(default)]
    pub ik_level: u8,
    /// 人物の配置位置を毎フレーム更新
    #[serde(default = "default_update_position")]
    pub update_position: bool,
    #[serde(default)]
    pub keypoint_model: KeypointModel,
    /// 低信頼度になってから完全に消えるまでのティック数
    #[serde(default = "default_fade_frames")]
    pub fade_frames: u32,
}

fn default_max_persons() -> usize { 10 }
fn default_min_score() -> f32 { 0.1 }
fn default_interpolation_steps() -> u32 { 10 }
fn default_scale_person() -> Point { [2.70, 1.60, 2.10] }
fn default_scale_scene() -> Point { [1.5, 1.0, 1.0] }
fn default_update_position() -> bool { true }
fn default_fade_frames() -> u32 { 60 }

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_persons: default_max_persons(),
            min_score: default_min_score(),
            interpolation_steps: default_interpolation_steps(),
            scale_person: default_scale_person(),
            scale_scene: default_scale_scene(),
            ik_level: 0,
            update_position: default_update_position(),
            keypoint_model: KeypointModel::default(),
            fade_frames: default_fade_frames(),
        }
    }
}

/// テレメトリ出力の個別スイッチ。互いに依存しない
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// ボーン毎の回転ラベル
    #[serde(default = "default_true")]
    pub rotation: bool,
    /// 偏差に応じた色付け
    #[serde(default = "default_true")]
    pub highlight: bool,
    /// 時系列チャート
    #[serde(default)]
    pub chart: bool,
    /// 最大値・最小値の記録
    #[serde(default = "default_true")]
    pub maximums: bool,
    /// ジェスチャーカウンタ
    #[serde(default)]
    pub track: bool,
    /// チャートに保持するサンプル数
    #[serde(default = "default_chart_length")]
    pub chart_length: usize,
}

fn default_true() -> bool { true }
fn default_chart_length() -> usize { 120 }

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            rotation: true,
            highlight: true,
            chart: false,
            maximums: true,
            track: false,
            chart_length: default_chart_length(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    /// 検出サーバーのアドレス
    #[serde(default = "default_detection_addr")]
    pub addr: String,
    /// 1メッセージの最大バイト数
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

fn default_detection_addr() -> String { "127.0.0.1:9710".to_string() }
fn default_max_frame_length() -> usize { 16 * 1024 * 1024 }

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            addr: default_detection_addr(),
            max_frame_length: default_max_frame_length(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    #[serde(default)]
    pub enabled: bool,
    /// OSC送信先
    #[serde(default = "default_sink_addr")]
    pub addr: String,
}

fn default_sink_addr() -> String { SINK_DEFAULT_ADDR.to_string() }

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_sink_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// RUST_LOG 未設定時のフィルタ
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl LogConfig {
    /// RUST_LOG があればそちらを優先する
    pub fn init(&self) {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .try_init();
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(RigError::from)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(RigError::from)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定を読んでログを初期化する。読めなければ既定値で起動する
    ///
    /// ログのフィルタが設定ファイルにあるため、読み込みの失敗はログ初期化後に警告する。
    pub fn startup<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = Self::load(path);
        let config = loaded.as_ref().map(Clone::clone).unwrap_or_default();
        config.log.init();
        if let Err(e) = loaded {
            warn!("config {} not loaded, using defaults: {:#}", path.display(), e);
        }
        config
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let m = &self.motion;
        if m.max_persons == 0 {
            return Err(RigError::InvalidConfig("motion.max_persons must be at least 1".into()));
        }
        if m.ik_level > 1 {
            return Err(RigError::InvalidConfig(format!(
                "motion.ik_level must be 0 or 1, got {}",
                m.ik_level
            )));
        }
        if m.min_score < 0.0 {
            return Err(RigError::InvalidConfig(format!(
                "motion.min_score must not be negative, got {}",
                m.min_score
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.motion.max_persons, 10);
        assert_eq!(config.motion.interpolation_steps, 10);
        assert_eq!(config.motion.scale_person, [2.70, 1.60, 2.10]);
        assert_eq!(config.motion.keypoint_model, KeypointModel::Smpl);
        assert!(config.normalize.legacy_extents);
        assert_eq!(config.telemetry.chart_length, 120);
        assert_eq!(config.detection.addr, "127.0.0.1:9710");
        assert!(!config.sink.enabled);
        assert_eq!(config.log.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [motion]
            max_persons = 2
            keypoint_model = "blazepose"
            ik_level = 1

            [normalize]
            legacy_extents = false
            "#,
        )
        .unwrap();
        assert_eq!(config.motion.max_persons, 2);
        assert_eq!(config.motion.keypoint_model, KeypointModel::BlazePose);
        assert_eq!(config.motion.min_score, 0.1);
        assert!(!config.normalize.legacy_extents);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = Config::default();
        config.motion.max_persons = 0;
        assert!(matches!(config.validate(), Err(RigError::InvalidConfig(_))));

        let mut config = Config::default();
        config.motion.ik_level = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.motion.min_score = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/motion-rig.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
        assert!(matches!(err.downcast_ref::<RigError>(), Some(RigError::Io(_))));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let path = std::env::temp_dir().join(format!("motion-rig-bad-{}.toml", std::process::id()));
        fs::write(&path, "[motion\nmax_persons = ").unwrap();
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<RigError>(), Some(RigError::Toml(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("motion-rig-test-{}.toml", std::process::id()));
        fs::write(&path, "[motion]\nmax_persons = 0\n").unwrap();
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
