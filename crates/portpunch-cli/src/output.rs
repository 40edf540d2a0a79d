//! Output formatting

use clap::ValueEnum;
use portpunch_core::{PolicyConfig, Rule, StatsSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// One classified frame
#[derive(Debug, Serialize)]
pub struct ClassifyRow {
    pub frame: usize,
    pub bytes: usize,
    pub verdict: String,
    pub action_code: u32,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub policy_version: u64,
    pub results: Vec<ClassifyRow>,
    pub stats: StatsSnapshot,
}

pub fn json<T: Serialize>(data: &T) {
    println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
}

pub fn policy(config: &PolicyConfig, format: OutputFormat) {
    match format {
        OutputFormat::Json => json(config),
        OutputFormat::Table => {
            println!("default verdict: {}", config.default_verdict);
            println!(
                "{:<4} {:<20} {:<5} {:<13} {:<13} {:<20} {:<20} {}",
                "#", "NAME", "PROTO", "DST PORT", "SRC PORT", "SRC NET", "DST NET", "VERDICT"
            );
            for (i, rule) in config.rules.iter().enumerate() {
                println!("{}", rule_row(i, rule));
            }
        }
    }
}

fn rule_row(index: usize, rule: &Rule) -> String {
    let any = || "*".to_string();
    format!(
        "{:<4} {:<20} {:<5} {:<13} {:<13} {:<20} {:<20} {}",
        index,
        rule.name,
        rule.protocol,
        rule.dst_port.map(|p| p.to_string()).unwrap_or_else(any),
        rule.src_port.map(|p| p.to_string()).unwrap_or_else(any),
        rule.src_net.map(|n| n.to_string()).unwrap_or_else(any),
        rule.dst_net.map(|n| n.to_string()).unwrap_or_else(any),
        rule.verdict,
    )
}

pub fn report(report: &ClassifyReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => json(report),
        OutputFormat::Table => {
            println!("{:<6} {:<6} {:<9} {}", "FRAME", "BYTES", "VERDICT", "REASON");
            for row in &report.results {
                println!("{:<6} {:<6} {:<9} {}", row.frame, row.bytes, row.verdict, row.reason);
            }
            let s = &report.stats;
            println!(
                "\n{} packets, {} bytes: pass={} drop={} redirect={} transmit={} abort={}",
                s.packets, s.bytes, s.pass, s.drop, s.redirect, s.transmit, s.abort
            );
        }
    }
}
