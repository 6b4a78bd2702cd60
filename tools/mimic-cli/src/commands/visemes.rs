//! List the rig's blend-shape channels.

use std::path::PathBuf;

use mimic_rig_model::{EYELID_CHANNELS, EYE_GAZE_CHANNELS};

use super::load_visemes;

pub fn run(visemes: Option<PathBuf>, mesh: Option<PathBuf>) -> anyhow::Result<()> {
    let set = load_visemes(visemes.as_deref())?;

    println!("Eye direction ({}):", EYE_GAZE_CHANNELS.len());
    for name in EYE_GAZE_CHANNELS {
        println!("  {name}");
    }
    println!();

    println!("Eyelids ({}):", EYELID_CHANNELS.len());
    for name in EYELID_CHANNELS {
        println!("  {name}");
    }
    println!();

    println!("Mouth visemes ({}):", set.channel_count());
    for (i, name) in set.channels().iter().enumerate() {
        println!("  {i:>2}  {name}");
    }

    let Some(mesh) = mesh else {
        return Ok(());
    };
    let content = std::fs::read_to_string(&mesh)
        .map_err(|_| anyhow::anyhow!("Mesh channel list not found: {}", mesh.display()))?;
    let available: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut missing: Vec<&str> = EYE_GAZE_CHANNELS
        .iter()
        .chain(EYELID_CHANNELS.iter())
        .copied()
        .filter(|c| !available.contains(c))
        .collect();
    missing.extend(set.missing_channels(available.iter().copied()));

    println!();
    if missing.is_empty() {
        println!("Mesh {} provides every channel.", mesh.display());
    } else {
        println!("Mesh {} lacks {} channel(s):", mesh.display(), missing.len());
        for name in &missing {
            println!("  - {name}");
        }
    }

    Ok(())
}
