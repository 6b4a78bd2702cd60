//! Run the rig headless and write one JSON record per frame.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use glam::Vec3;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use mimic_common::clock::{FrameClock, SessionClock};
use mimic_motion_core::{AvatarRig, GazeTarget, HostFrame, RestPose, RigConfig, TimelineLoader};
use mimic_rig_model::{
    header_line, parse_realized_durations, RecordingHeader, EYELID_CHANNELS, EYE_GAZE_CHANNELS,
    RECORDING_SCHEMA_VERSION,
};

/// Rest eye positions of the simulated head (metres, y up, facing +z).
const LEFT_EYE: Vec3 = Vec3::new(-0.032, 1.6, 0.0);
const RIGHT_EYE: Vec3 = Vec3::new(0.032, 1.6, 0.0);

/// A scripted gaze change.
#[derive(Debug, Clone, PartialEq)]
pub struct GazeCue {
    pub at_secs: f64,
    pub target: GazeTarget,
}

/// Parse `SECS=X,Y,Z` or `SECS=none`.
pub fn parse_gaze_cue(s: &str) -> Result<GazeCue, String> {
    let (at, target) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SECS=X,Y,Z or SECS=none, got '{s}'"))?;
    let at_secs: f64 = at
        .trim()
        .parse()
        .map_err(|_| format!("invalid cue time '{at}'"))?;
    if !(at_secs >= 0.0) {
        return Err(format!("cue time must be non-negative, got {at_secs}"));
    }

    let target = target.trim();
    if target.eq_ignore_ascii_case("none") {
        return Ok(GazeCue {
            at_secs,
            target: GazeTarget::NoTarget,
        });
    }

    let coords = target
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid point '{target}'"))?;
    match coords.as_slice() {
        &[x, y, z] => Ok(GazeCue {
            at_secs,
            target: GazeTarget::TargetAt(Vec3::new(x, y, z)),
        }),
        _ => Err(format!("expected three coordinates, got '{target}'")),
    }
}

pub struct SimulateArgs {
    pub config: Option<PathBuf>,
    pub fps: u32,
    pub duration_secs: f64,
    pub seed: Option<u64>,
    pub gaze: Vec<GazeCue>,
    pub speak: Option<PathBuf>,
    pub speak_at: f64,
    pub neck: bool,
    pub realtime: bool,
    pub host_range: bool,
    pub output: Option<PathBuf>,
}

/// A report read in the background, published when triggered.
struct PendingSpeech {
    trigger: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<usize>>,
}

fn spawn_speech(path: PathBuf, loader: TimelineLoader) -> PendingSpeech {
    let (trigger, armed) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let report = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read durations report {}", path.display()))?;
        let segments = parse_realized_durations(&report)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
        tracing::debug!(phonemes = segments.len(), "Durations report ready");

        // Held back until the scripted speaking time.
        armed.await.ok();
        Ok(loader.load_segments(&segments).len())
    });
    PendingSpeech { trigger, task }
}

pub async fn run(args: SimulateArgs) -> anyhow::Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be positive");
    }
    if !(args.duration_secs >= 0.0) {
        anyhow::bail!("--duration-secs must be non-negative");
    }

    let mut rig_config = match &args.config {
        Some(path) => RigConfig::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load rig config {}: {e}", path.display()))?,
        None => RigConfig::default(),
    };
    if !args.neck {
        rig_config.gaze.enable_neck_rotation = false;
    }

    let rest = RestPose::with_eyes(LEFT_EYE, RIGHT_EYE);
    let mut rig = match args.seed {
        Some(seed) => AvatarRig::seeded(rest, &rig_config, seed),
        None => AvatarRig::new(rest, &rig_config),
    }
    .map_err(|e| anyhow::anyhow!("Failed to build rig: {e}"))?;

    let mut cues = args.gaze.clone();
    cues.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
    let mut cues = cues.into_iter().peekable();

    let mut speech = args
        .speak
        .clone()
        .map(|path| spawn_speech(path, rig.speech().loader()));

    let session = SessionClock::start();
    let header = RecordingHeader {
        schema_version: RECORDING_SCHEMA_VERSION.to_string(),
        epoch_wall: session.epoch_wall().to_string(),
        fps: args.fps,
        blendshape_range: if args.host_range {
            rig_config.output.blendshape_range
        } else {
            1.0
        },
        eye_channels: EYE_GAZE_CHANNELS.iter().map(|s| s.to_string()).collect(),
        eyelid_channels: (0..rig.blinker().channel_count())
            .map(|i| {
                EYELID_CHANNELS
                    .get(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("eyelid_{i}"))
            })
            .collect(),
        mouth_channels: rig.speech().visemes().channels().to_vec(),
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    writeln!(out, "{}", header_line(&header)?)?;

    let mut clock = FrameClock::new(args.fps);
    let total_frames = clock.frames_for(args.duration_secs);
    tracing::info!(
        fps = args.fps,
        frames = total_frames,
        seed = ?args.seed,
        realtime = args.realtime,
        "Starting simulation"
    );

    let mut ticker = args.realtime.then(|| {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / args.fps as f64));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_real: Option<f32> = None;
    let mut written = 0u64;
    let mut blinks = 0u32;
    let mut speaking_frames = 0u64;
    let mut prev_blink = 0.0f32;

    for _ in 0..total_frames {
        let tick = clock.tick();
        let (now, dt) = match ticker.as_mut() {
            Some(ticker) => {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = &mut ctrl_c => {
                        tracing::info!("Interrupted");
                        break;
                    }
                }
                let now = session.now_secs() as f32;
                let dt = last_real.map(|last| now - last).unwrap_or(0.0);
                last_real = Some(now);
                (now, dt)
            }
            None => (tick.now, tick.dt),
        };

        while let Some(cue) = cues.next_if(|c| c.at_secs <= now as f64) {
            tracing::debug!(at = cue.at_secs, target = ?cue.target, "Gaze cue");
            rig.gaze_mut().set_target(cue.target);
        }

        if now as f64 >= args.speak_at {
            if let Some(pending) = speech.take() {
                pending.trigger.send(()).ok();
                let phonemes = pending.task.await.context("Speech loader task failed")??;
                tracing::info!(phonemes, now, "Speaking");
            }
        }

        let frame = rig
            .update(&HostFrame {
                now,
                dt,
                eyes: rest.eyes(),
            })
            .map_err(|e| anyhow::anyhow!("Rig update failed: {e}"))?;

        if frame.blink() > 0.0 && prev_blink == 0.0 {
            blinks += 1;
        }
        prev_blink = frame.blink();
        if frame.speaking {
            speaking_frames += 1;
        }

        let record = if args.host_range {
            rig.to_host(&frame)
        } else {
            frame
        };
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
        written += 1;
    }

    out.flush()?;
    tracing::info!(
        frames = written,
        blinks,
        speaking_frames,
        "Simulation complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gaze_cue_point() {
        let cue = parse_gaze_cue("1.5=-0.5, 1.7, 2").unwrap();
        assert_eq!(cue.at_secs, 1.5);
        assert_eq!(cue.target, GazeTarget::TargetAt(Vec3::new(-0.5, 1.7, 2.0)));
    }

    #[test]
    fn test_parse_gaze_cue_none() {
        let cue = parse_gaze_cue("4=None").unwrap();
        assert_eq!(cue.target, GazeTarget::NoTarget);
    }

    #[test]
    fn test_parse_gaze_cue_rejects_garbage() {
        assert!(parse_gaze_cue("1,2,3").is_err());
        assert!(parse_gaze_cue("x=1,2,3").is_err());
        assert!(parse_gaze_cue("1=1,2").is_err());
        assert!(parse_gaze_cue("-1=1,2,3").is_err());
    }
}
