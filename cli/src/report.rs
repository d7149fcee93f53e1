// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use gpustat::history::HistorySummary;
use gpustat::TIMESTAMP_FORMAT;

const DIVIDER: &str = "---------------------------------";

pub fn print_divider() -> io::Result<()> {
    print_colored_line(DIVIDER, Color::DarkCyan)
}

pub fn print_banner() -> io::Result<()> {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        return writeln!(stdout, "Under SLURM management");
    }
    execute!(
        stdout,
        Print("Under "),
        SetForegroundColor(Color::Cyan),
        Print("SLURM"),
        ResetColor,
        Print(" management\n"),
    )
}

fn print_colored_line(text: &str, color: Color) -> io::Result<()> {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        return writeln!(stdout, "{text}");
    }
    execute!(
        stdout,
        SetForegroundColor(color),
        Print(text),
        ResetColor,
        Print("\n"),
    )
}

/// Cluster capacity by GPU type, least plentiful type first.
pub fn render_type_summary(by_type: &BTreeMap<String, u32>, tag: &str) -> String {
    let total: u32 = by_type.values().sum();
    let mut entries: Vec<(&str, u32)> = by_type
        .iter()
        .map(|(gpu_type, count)| (gpu_type.as_str(), *count))
        .collect();
    entries.sort_by_key(|(gpu_type, count)| (*count, gpu_type.to_string()));

    let mut output = format!("There are a total of {total} gpus [{tag}]\n");
    for (gpu_type, count) in entries {
        output.push_str(&format!("{count} {gpu_type} gpus\n"));
    }
    output
}

/// Per-user usage table, smallest total first.
pub fn render_usage_table(totals: &BTreeMap<String, BTreeMap<String, u32>>) -> String {
    if totals.is_empty() {
        return "No gpus are in use\n".to_string();
    }

    let headers = ["user", "total", "breakdown"];
    let mut rows: Vec<(String, u32, String)> = Vec::new();
    for (user, by_type) in totals {
        let total = by_type.values().sum();
        let breakdown = by_type
            .iter()
            .map(|(gpu_type, count)| format!("{gpu_type}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        rows.push((user.clone(), total, breakdown));
    }
    rows.sort_by_key(|(user, total, _)| (*total, user.clone()));

    let mut widths = [headers[0].len(), headers[1].len()];
    for (user, total, _) in &rows {
        widths[0] = widths[0].max(user.chars().count());
        widths[1] = widths[1].max(total.to_string().len());
    }

    let mut output = String::from("Usage by user:\n");
    output.push_str(&format!(
        "{:<w0$}  {:<w1$}  {}\n",
        headers[0],
        headers[1],
        headers[2],
        w0 = widths[0],
        w1 = widths[1],
    ));
    for (user, total, breakdown) in rows {
        output.push_str(&format!(
            "{:<w0$}  {:<w1$}  {}\n",
            user,
            total,
            breakdown,
            w0 = widths[0],
            w1 = widths[1],
        ));
    }
    output
}

/// Conservative availability by GPU type.
pub fn render_available(by_type: &BTreeMap<String, u32>) -> String {
    let total: u32 = by_type.values().sum();
    let mut output = format!("There are {total} gpus available:\n");
    for (gpu_type, count) in by_type {
        output.push_str(&format!("{gpu_type}: {count}\n"));
    }
    output
}

pub fn render_history(summary: &HistorySummary) -> String {
    let mut output = format!(
        "Historical data contains {} samples ({} to {})\n",
        summary.samples,
        summary.first.format(TIMESTAMP_FORMAT),
        summary.last.format(TIMESTAMP_FORMAT),
    );
    for (user, stats) in &summary.by_user {
        output.push_str(&format!("GPU usage for {user}:\n"));
        for (gpu_type, type_stats) in stats {
            output.push_str(&format!(
                "{gpu_type:5} > avg: {}, max: {}\n",
                type_stats.average, type_stats.peak
            ));
        }
        let total = summary.total_average.get(user).copied().unwrap_or(0);
        output.push_str(&format!("total > avg: {total}\n\n"));
    }
    output
}
