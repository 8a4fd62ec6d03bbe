use anyhow::{bail, Context, Result};
use cap_store::{FileCheckpoint, OffsetCheckpoint, OffsetState};

use super::load_config;

fn checkpoint(config_paths: &[String]) -> Result<FileCheckpoint> {
    let (_, cfg) = load_config(config_paths)?;
    Ok(FileCheckpoint::new(&cfg.output.offset_file))
}

pub fn show(config_paths: &[String]) -> Result<()> {
    let mut cp = checkpoint(config_paths)?;
    let state = cp.read_offset().context("read offset")?;
    println!("offset_file={}", cp.path().display());
    println!("offset={}", state.offset);
    println!("processed={}", state.has_processed());
    println!("resume_position={}", state.resume_position());
    Ok(())
}

/// Mark `offset` as the last processed record.
pub fn set(offset: i64, config_paths: &[String], yes: bool) -> Result<()> {
    if offset < 0 {
        bail!("invalid offset {offset}: must be >= 0");
    }
    let mut cp = checkpoint(config_paths)?;
    let previous = cp.read_offset().context("read offset")?;

    if offset < previous.offset && !yes {
        bail!(
            "REFUSING OFFSET REWIND: persisted offset is {}, requested {offset}. Records after {offset} will be reprocessed. Re-run with: `cap-worker offset set {offset} --yes`",
            previous.offset
        );
    }

    let next = OffsetState::processed(offset);
    cp.force(next).context("write offset")?;
    println!("offset_file={}", cp.path().display());
    println!("previous_offset={}", previous.offset);
    println!("offset={offset}");
    println!("resume_position={}", next.resume_position());
    Ok(())
}

/// Forget all progress: the next batch starts at record 0.
pub fn reset(config_paths: &[String], yes: bool) -> Result<()> {
    let mut cp = checkpoint(config_paths)?;
    let previous = cp.read_offset().context("read offset")?;

    if previous.has_processed() && !yes {
        bail!(
            "REFUSING OFFSET RESET: persisted offset is {}. Every record will be reprocessed. Re-run with: `cap-worker offset reset --yes`",
            previous.offset
        );
    }

    cp.force(OffsetState::FRESH).context("write offset")?;
    println!("offset_file={}", cp.path().display());
    println!("previous_offset={}", previous.offset);
    println!("resume_position=0");
    Ok(())
}
