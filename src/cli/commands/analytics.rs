//! Charts, export and AI insights.

use std::path::PathBuf;

use console::style;

use docdash::dashboard::Chart;

use super::session::print_session_banner;
use super::Context;
use crate::cli::helpers::{format_bytes, print_json, render_panel};

pub async fn cmd_chart(ctx: &Context, charts: &[Chart], refresh: bool) -> anyhow::Result<()> {
    print_session_banner(ctx);

    let session = ctx.dashboard.active_session();
    let mut views = Vec::with_capacity(charts.len());
    for &chart in charts {
        if refresh {
            ctx.dashboard
                .queries()
                .invalidate(chart.resource(), session);
        }
        views.push((chart, ctx.dashboard.load_chart(chart).await));
    }

    if ctx.json {
        let value: serde_json::Map<String, serde_json::Value> = views
            .iter()
            .map(|(chart, view)| {
                (
                    chart.resource().as_str().to_string(),
                    serde_json::json!({
                        "session": session,
                        "chart": view.chart(),
                        "error": view.error(),
                    }),
                )
            })
            .collect();
        return print_json(&value);
    }

    for (chart, view) in &views {
        render_panel(chart.title(), view);
    }
    Ok(())
}

pub async fn cmd_export(ctx: &Context, output: Option<PathBuf>) -> anyhow::Result<()> {
    let download = ctx.api().export_products().await?;
    let path =
        output.unwrap_or_else(|| PathBuf::from(download.filename_or("resumen_productos.xlsx")));
    tokio::fs::write(&path, &download.bytes).await?;
    println!(
        "{} Exported product summary to {} ({})",
        style("✓").green(),
        path.display(),
        format_bytes(download.bytes.len() as u64)
    );
    Ok(())
}

pub async fn cmd_insights(ctx: &Context) -> anyhow::Result<()> {
    let insights = ctx.dashboard.insights().await?;
    if ctx.json {
        return print_json(&insights);
    }

    print_session_banner(ctx);
    if insights.is_empty() {
        println!("{} No insights available yet", style("!").yellow());
        return Ok(());
    }

    if !insights.suggestions.is_empty() {
        println!("\n{}", style("Suggestions").bold());
        for suggestion in &insights.suggestions {
            match suggestion.as_str() {
                Some(text) => println!("  {} {}", style("•").cyan(), text),
                None => println!("  {} {}", style("•").cyan(), suggestion),
            }
        }
    }
    if !insights.projections.is_empty() {
        println!("\n{}", style("Projections").bold());
        for (name, value) in &insights.projections {
            println!("  {:<24} {}", name, value);
        }
    }
    Ok(())
}
