//! Show how a durations report maps onto visemes.

use std::path::PathBuf;

use mimic_rig_model::{SpeechTimeline, TimingMode};

use super::load_visemes;

pub fn run(
    path: PathBuf,
    timing: TimingMode,
    visemes: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let set = load_visemes(visemes.as_deref())?;
    let report = std::fs::read_to_string(&path)
        .map_err(|_| anyhow::anyhow!("Durations report not found: {}", path.display()))?;
    let timeline = SpeechTimeline::from_report(&report, &set, timing)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    println!("Timeline: {}", path.display());
    println!("  Timing: {timing:?}");
    println!("  Phonemes: {}", timeline.len());
    println!("  Ends at: {:.3}s", timeline.last_time());
    println!();

    println!("  {:>4}  {:>8}  {:<8}  Viseme", "#", "Time", "Phoneme");
    let mut unmapped = 0;
    for (i, entry) in timeline.entries().iter().enumerate() {
        let label = set.shape_label(entry.shape);
        if label == "etc" {
            unmapped += 1;
        }
        println!(
            "  {:>4}  {:>7.3}s  {:<8}  {}",
            i, entry.time_secs, entry.phoneme, label
        );
    }

    if unmapped > 0 {
        println!();
        println!("{unmapped} phoneme(s) have no dedicated viseme and relax the mouth.");
    }

    Ok(())
}
