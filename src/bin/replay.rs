//! 録画済み検出データ (JSON) をパイプラインに通して再生する
//!
//! Usage: replay <detections.json> [config.toml]

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use motion_rig::config::Config;
use motion_rig::pose::DetectionBatch;
use motion_rig::rig::PoseSkeleton;
use motion_rig::scene::{PersonId, Scene};
use motion_rig::sink::BoneSink;

const CONFIG_PATH: &str = "config.toml";

/// タイムスタンプの無い録画のフレーム間隔 (ms)
const DEFAULT_FRAME_MS: f64 = 1000.0 / 30.0;

/// この間隔ごとに経過を出す
const REPORT_EVERY: usize = 30;

fn parse_args() -> Result<(String, String)> {
    let args: Vec<String> = std::env::args().collect();
    let input = args
        .get(1)
        .cloned()
        .context("usage: replay <detections.json> [config.toml]")?;
    let config = args.get(2).cloned().unwrap_or_else(|| CONFIG_PATH.to_string());
    Ok((input, config))
}

fn main() -> Result<()> {
    let (input, config_path) = parse_args()?;
    let mut config = Config::startup(&config_path);
    info!("replay ({})", env!("MOTION_RIG_VERSION"));

    let batch = DetectionBatch::load(&input).with_context(|| format!("failed to load {}", input))?;
    info!(frames = batch.len(), joints = batch.joints.len(), "detections loaded");

    // 録画側の上書き
    if let Some(scale) = batch.scale_person {
        config.motion.scale_person = scale;
    }
    if let Some(scale) = batch.scale_scene {
        config.motion.scale_scene = scale;
    }

    let sink = if config.sink.enabled {
        Some(BoneSink::new(&config.sink.addr)?)
    } else {
        None
    };

    let mut scene = Scene::new(&config, PoseSkeleton::humanoid());
    let mut scaled = batch.scale_person.is_some();
    let mut now = 0.0;
    for i in 0..batch.len() {
        let Some(frame) = batch.frame(i) else {
            continue;
        };
        now = match batch.timestamps.get(i) {
            Some(ts) => *ts,
            None => i as f64 * DEFAULT_FRAME_MS,
        };
        scene.ingest(&frame, now);
        let updated = scene.tick(now);
        debug!(frame = i, persons = frame.bodies.len(), updated, "frame");

        if !scaled && scene.tracked_count() > 0 {
            scaled = true;
            match scene.auto_scale(PersonId::Tracked(0)) {
                Ok(Some(scale)) => info!(?scale, "person scale updated from first frame"),
                Ok(None) => info!("auto scale rejected, keeping configured person scale"),
                Err(e) => warn!("auto scale failed: {}", e),
            }
        }

        if let Some(sink) = &sink {
            for id in scene.active_ids() {
                if let (PersonId::Tracked(p), Some(body)) = (id, scene.body(id)) {
                    sink.send_skeleton(p as i32, &body.skeleton)?;
                }
            }
        }

        if i % REPORT_EVERY == 0 {
            for id in scene.ids() {
                let Some(body) = scene.body(id) else {
                    continue;
                };
                info!(
                    frame = i,
                    person = %id,
                    change = body.telemetry.overall_percent(),
                    error = body.error,
                    "telemetry"
                );
            }
        }
    }

    for id in scene.ids() {
        let Some(body) = scene.body(id) else {
            continue;
        };
        for counter in &body.telemetry.gestures().counters {
            info!(person = %id, "{}", counter.summary(now));
        }
    }

    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("snapshot_{}.json", ts);
    std::fs::write(&path, serde_json::to_string_pretty(&scene.snapshot())?)
        .with_context(|| format!("failed to write {}", path))?;
    info!(path = %path, persons = scene.tracked_count(), "replay finished");
    Ok(())
}
