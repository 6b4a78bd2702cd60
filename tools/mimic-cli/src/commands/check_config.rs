//! Validate a rig tuning file.

use std::path::PathBuf;

use mimic_motion_core::RigConfig;

use super::load_visemes;

pub fn run(path: Option<PathBuf>) -> anyhow::Result<()> {
    let Some(path) = path else {
        println!("{}", serde_json::to_string_pretty(&RigConfig::default())?);
        return Ok(());
    };

    println!("Checking rig config at: {}", path.display());
    let config = RigConfig::load(&path)
        .map_err(|e| anyhow::anyhow!("Invalid rig config: {e}"))?;
    let visemes = load_visemes(config.speech.visemes.as_deref())?;

    let gaze = &config.gaze;
    println!("Gaze:");
    println!(
        "  Eyes: {} deg/s, limits ±{} yaw / ±{} pitch",
        gaze.eyes_rot_speed, gaze.eyes_max_yaw, gaze.eyes_max_pitch
    );
    println!(
        "  Neck: {} (yaw {}..{}, pitch {}..{}, {}s, max {} deg/s, rest {})",
        if gaze.enable_neck_rotation { "on" } else { "off" },
        gaze.neck_min_yaw,
        gaze.neck_max_yaw,
        gaze.neck_min_pitch,
        gaze.neck_max_pitch,
        gaze.neck_rot_time,
        gaze.neck_rot_max_speed,
        gaze.neck_rest_tendency_strength
    );

    let blink = &config.blink;
    println!("Blink:");
    println!(
        "  Every {:.1}s-{:.1}s ({}), close {}/s, open {}/s, {} channel(s)",
        blink.min_delay_secs,
        blink.max_delay_secs,
        if blink.automatic { "automatic" } else { "manual" },
        blink.close_speed,
        blink.open_speed,
        blink.channels
    );

    let speech = &config.speech;
    println!("Speech:");
    println!(
        "  {} visemes, ramp {}..{}/s, lookahead {}s, grace {}s, timing {:?}",
        visemes.channel_count(),
        speech.min_ramp_speed,
        speech.max_ramp_speed,
        speech.anticipation_secs,
        speech.end_grace_secs,
        speech.timing
    );

    println!(
        "Output: range {}, mouth gain {}",
        config.output.blendshape_range, config.output.mouth_gain
    );
    println!("\nConfig is valid.");
    Ok(())
}
