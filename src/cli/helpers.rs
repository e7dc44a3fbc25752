//! Shared formatting helpers for CLI commands.

use std::io::{self, Write};

use console::style;
use serde::Serialize;

use docdash::dashboard::PanelView;
use docdash::models::ChartData;

/// Width of the widest bar in a chart.
const BAR_WIDTH: usize = 40;

/// Format a number with thousands separators.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();
    let chunks: Vec<_> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();
    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Format a money amount: whole units with separators, sign kept.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format_number(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-${}", digits)
    } else {
        format!("${}", digits)
    }
}

/// Format a byte count as a human-readable size.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Truncate a string to `max_chars` characters with an ellipsis.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask for a y/N confirmation on stdin.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Render a chart as horizontal bars, one block per series.
pub fn render_chart(title: &str, chart: &ChartData) {
    println!("\n{}", style(title).bold());
    println!("{}", "-".repeat(60));

    if chart.is_empty() {
        println!("  {}", style("(no data)").dim());
        return;
    }

    for (index, series) in chart.series.iter().enumerate() {
        if chart.series.len() > 1 {
            println!("{}", style(&series.name).cyan());
        }
        let rows = chart.rows(index);
        let max = rows.iter().map(|(_, v)| v.abs()).fold(0.0_f64, f64::max);
        for (label, value) in rows {
            let width = if max > 0.0 {
                ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            println!(
                "  {:<24} {:<40} {:>14}",
                truncate(label, 24),
                style("█".repeat(width)).green(),
                format_amount(value)
            );
        }
        println!(
            "  {:<24} {:<40} {:>14}",
            style("Total").bold(),
            "",
            format_amount(chart.total(index))
        );
    }
}

/// Render a panel, noting when it degraded to an empty chart.
pub fn render_panel(title: &str, view: &PanelView) {
    render_chart(title, &view.chart());
    if let Some(error) = view.error() {
        println!("  {} {}", style("!").yellow(), style(error).dim());
    }
}
