//! Subcommand handlers

use crate::output::{self, ClassifyReport, ClassifyRow, OutputFormat};
use crate::Preset;
use anyhow::{Context, Result};
use portpunch_core::{Policy, PolicyConfig, PolicyStore};
use std::path::Path;
use tracing::debug;

pub fn check(path: &Path, format: OutputFormat) -> Result<()> {
    let config = checked_config(path)?;
    output::policy(&config, format);
    Ok(())
}

pub fn classify(
    config: Option<&Path>,
    preset: Preset,
    port: u16,
    frames: &[String],
    format: OutputFormat,
) -> Result<()> {
    let policy = select_policy(config, preset, port)?;
    let report = classify_frames(policy, frames)?;
    output::report(&report, format);
    Ok(())
}

/// Load a policy file and run validation on it
fn checked_config(path: &Path) -> Result<PolicyConfig> {
    let config = PolicyConfig::load(path)
        .with_context(|| format!("failed to read policy {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("policy {} is invalid", path.display()))?;
    Ok(config)
}

/// Policy file if given, else the preset
fn select_policy(config: Option<&Path>, preset: Preset, port: u16) -> Result<Policy> {
    match config {
        Some(path) => portpunch_core::load_policy(path)
            .with_context(|| format!("failed to load policy {}", path.display())),
        None => Ok(match preset {
            Preset::Pass => Policy::pass_all(),
            Preset::PortPunch => Policy::port_punch(port),
        }),
    }
}

fn classify_frames(policy: Policy, frames: &[String]) -> Result<ClassifyReport> {
    let store = PolicyStore::new(policy);
    let mut results = Vec::with_capacity(frames.len());

    for (index, text) in frames.iter().enumerate() {
        let bytes = decode_frame(text).with_context(|| format!("frame #{} is not valid hex", index))?;
        let decision = store.decide(&bytes);
        debug!(frame = index, bytes = bytes.len(), verdict = %decision.verdict, "frame classified");

        results.push(ClassifyRow {
            frame: index,
            bytes: bytes.len(),
            verdict: decision.verdict.to_string(),
            action_code: decision.verdict.action_code(),
            reason: decision.reason.to_string(),
        });
    }

    Ok(ClassifyReport {
        policy_version: store.version(),
        results,
        stats: store.stats().snapshot(),
    })
}

/// Hex to bytes, ignoring ':' separators and whitespace
fn decode_frame(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .collect();
    hex::decode(cleaned)
}
