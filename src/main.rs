//! ライブクライアント: 検出サーバーに接続し、結果をシーンへ流して一定間隔で描画ティックを回す

use anyhow::{Context, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use motion_rig::config::Config;
use motion_rig::live::DetectGate;
use motion_rig::protocol::{self, ClientMessage, MessageStream, ServerMessage};
use motion_rig::rig::PoseSkeleton;
use motion_rig::scene::{PersonId, Scene};
use motion_rig::sink::BoneSink;

const CONFIG_PATH: &str = "config.toml";

/// 描画ティックの間隔
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// コンソールからの操作
#[derive(Debug, Clone, Copy)]
enum Command {
    TogglePause,
    Reset,
    Snapshot,
    AutoScale,
    Quit,
}

fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1000.0
}

fn spawn_console(tx: mpsc::UnboundedSender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let cmd = match line.trim() {
                "p" => Command::TogglePause,
                "r" => Command::Reset,
                "s" => Command::Snapshot,
                "a" => Command::AutoScale,
                "q" => Command::Quit,
                _ => continue,
            };
            if tx.send(cmd).is_err() {
                break;
            }
        }
    });
}

fn write_snapshot(scene: &Scene<PoseSkeleton>) -> Result<()> {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("snapshot_{}.json", ts);
    let json = serde_json::to_string_pretty(&scene.snapshot())?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path))?;
    info!(path = %path, "snapshot written");
    Ok(())
}

struct Session<'a> {
    scene: &'a mut Scene<PoseSkeleton>,
    gate: &'a mut DetectGate,
    sink: Option<&'a BoneSink>,
    commands: &'a mut mpsc::UnboundedReceiver<Command>,
}

/// 終了要求で Ok、切断・通信エラーで Err を返す
async fn run_session(stream: MessageStream, s: Session<'_>) -> Result<()> {
    let (mut tx, mut rx) = stream.split();

    let ready: ServerMessage = protocol::recv_message(&mut rx).await?;
    let ServerMessage::Ready { models } = ready else {
        anyhow::bail!("expected Ready from detection server, got {:?}", ready);
    };
    let model = s.scene.model();
    if !models.contains(&model) {
        warn!(model = model.name(), "detection server does not offer the configured model");
    }
    protocol::send_message(&mut tx, &ClientMessage::Warmup { model }).await?;

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        if let Some(generation) = s.gate.try_begin() {
            let msg = ClientMessage::Detect {
                timestamp_us: chrono::Utc::now().timestamp_micros().max(0) as u64,
                generation,
                model: s.scene.model(),
            };
            protocol::send_message(&mut tx, &msg).await?;
        }

        tokio::select! {
            msg = protocol::recv_message::<ServerMessage, _>(&mut rx) => match msg? {
                ServerMessage::Result { generation, frame } => {
                    if s.gate.complete(generation) {
                        s.scene.ingest(&frame, now_ms());
                    }
                }
                ServerMessage::WarmedUp { model } => info!(model = model.name(), "detector warmed up"),
                ServerMessage::Ready { .. } => {}
            },
            _ = ticker.tick() => {
                s.scene.tick(now_ms());
                if let Some(sink) = s.sink {
                    for id in s.scene.active_ids() {
                        if let (PersonId::Tracked(i), Some(body)) = (id, s.scene.body(id)) {
                            sink.send_skeleton(i as i32, &body.skeleton)?;
                        }
                    }
                }
            }
            Some(cmd) = s.commands.recv() => match cmd {
                Command::TogglePause => {
                    if s.gate.is_paused() {
                        s.gate.resume();
                        info!("detection resumed");
                    } else {
                        s.gate.pause();
                        info!("detection paused");
                    }
                }
                Command::Reset => {
                    s.gate.reset();
                    s.scene.reset();
                }
                Command::Snapshot => {
                    if let Err(e) = write_snapshot(&*s.scene) {
                        warn!("snapshot failed: {:#}", e);
                    }
                }
                Command::AutoScale => match s.scene.auto_scale(PersonId::Tracked(0)) {
                    Ok(Some(scale)) => info!(?scale, "person scale updated"),
                    Ok(None) => info!("auto scale rejected"),
                    Err(e) => warn!("auto scale failed: {}", e),
                },
                Command::Quit => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::startup(CONFIG_PATH);
    info!("motion-rig ({})", env!("MOTION_RIG_VERSION"));
    info!(
        model = config.motion.keypoint_model.name(),
        max_persons = config.motion.max_persons,
        ik_level = config.motion.ik_level,
        "config"
    );

    let sink = if config.sink.enabled {
        info!(addr = %config.sink.addr, "OSC sink enabled");
        Some(BoneSink::new(&config.sink.addr)?)
    } else {
        None
    };

    let mut scene = Scene::new(&config, PoseSkeleton::humanoid());
    let mut gate = DetectGate::new();
    let (cmd_tx, mut commands) = mpsc::unbounded_channel();
    spawn_console(cmd_tx);
    info!("commands: p=pause/resume r=reset s=snapshot a=auto scale q=quit");

    // 接続 → セッション → 切断時は再接続
    loop {
        info!(addr = %config.detection.addr, "connecting to detection server");
        match tokio::net::TcpStream::connect(&config.detection.addr).await {
            Ok(tcp) => {
                tcp.set_nodelay(true)?;
                info!("connected");
                let stream = protocol::message_stream(tcp, config.detection.max_frame_length);
                let session = Session {
                    scene: &mut scene,
                    gate: &mut gate,
                    sink: sink.as_ref(),
                    commands: &mut commands,
                };
                match run_session(stream, session).await {
                    Ok(()) => break,
                    Err(e) => warn!("session error: {:#}", e),
                }
                gate.cancel();
            }
            Err(e) => warn!("connection failed: {}", e),
        }
        info!("reconnecting in 2s...");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(2)) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    info!("shutting down");
    Ok(())
}
