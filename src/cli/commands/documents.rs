//! Document commands: upload, browse, download.

use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use docdash::browse::DocumentQuery;
use docdash::dashboard::{Chart, UploadOutcome};
use docdash::models::{Document, DocumentFilter};

use super::session::print_session_banner;
use super::Context;
use crate::cli::helpers::{
    confirm, format_amount, format_bytes, print_json, render_panel, truncate,
};

pub fn print_document_table(documents: &[Document]) {
    if documents.is_empty() {
        println!("  {}", style("(no documents)").dim());
        return;
    }

    println!("{}", "-".repeat(96));
    println!(
        "{:<6} {:<30} {:<5} {:<24} {:<11} {:>14}",
        "ID", "File", "Type", "Supplier", "Date", "Total"
    );
    println!("{}", "-".repeat(96));
    for doc in documents {
        let date = doc
            .doc_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<30} {:<5} {:<24} {:<11} {:>14}",
            doc.id,
            truncate(&doc.filename, 29),
            doc.filetype,
            truncate(doc.supplier_label(), 23),
            date,
            format_amount(doc.invoice_total)
        );
    }
}

pub async fn cmd_upload(ctx: &Context, files: &[PathBuf]) -> anyhow::Result<()> {
    print_session_banner(ctx);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );
    if ctx.json {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let report = ctx
        .dashboard
        .upload(files, |path: &Path, outcome: &UploadOutcome| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match outcome {
                UploadOutcome::Created(n) => {
                    pb.println(format!("{} {} ({} document(s))", style("✓").green(), name, n))
                }
                UploadOutcome::Skipped => pb.println(format!(
                    "{} {} skipped (only PDF and XML are accepted)",
                    style("!").yellow(),
                    name
                )),
                UploadOutcome::Failed(e) => {
                    pb.println(format!("{} {}: {}", style("✗").red(), name, e))
                }
            }
            pb.set_message(truncate(&name, 40));
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    if ctx.json {
        return print_json(&report.created);
    }

    println!(
        "\n{} {} created, {} skipped, {} failed",
        style("Upload:").bold(),
        report.created.len(),
        report.skipped.len(),
        report.failed.len()
    );
    match (report.attached_to, &report.attach_error) {
        (Some(id), _) => println!(
            "  {} Added to session {}",
            style("→").dim(),
            style(id).bold()
        ),
        (None, Some(e)) => println!(
            "  {} Not added to the session: {}",
            style("!").yellow(),
            e
        ),
        (None, None) => {}
    }

    if !report.created.is_empty() {
        render_panel(Chart::Products.title(), &report.products);
        render_panel(Chart::Categories.title(), &report.categories);
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} file(s) failed to upload", report.failed.len());
    }
    Ok(())
}

pub async fn cmd_docs_list(
    ctx: &Context,
    filter: &DocumentFilter,
    query: &DocumentQuery,
) -> anyhow::Result<()> {
    let documents = ctx.api().list_documents(filter).await?;
    let page = query.apply(&documents);
    if ctx.json {
        return print_json(&page);
    }

    print_session_banner(ctx);
    println!(
        "\n{} (page {} of {}, {} matching)",
        style("Documents").bold(),
        page.page,
        page.total_pages.max(1),
        page.total
    );
    print_document_table(&page.items);
    Ok(())
}

pub async fn cmd_docs_show(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let doc = ctx.api().get_document(id).await?;
    if ctx.json {
        return print_json(&doc);
    }

    println!("\n{} {}", style("Document").bold(), style(doc.id).cyan());
    println!("  File:      {} ({})", doc.filename, doc.filetype);
    println!("  Size:      {}", format_bytes(doc.size_bytes));
    if let Some(pages) = doc.pages {
        println!("  Pages:     {}", pages);
    }
    if let Some(ref root) = doc.xml_root {
        println!("  XML root:  {}", root);
    }
    if let Some(uploaded) = doc.upload_date {
        println!("  Uploaded:  {}", uploaded.format("%Y-%m-%d %H:%M"));
    }
    if let Some(date) = doc.doc_date {
        println!("  Date:      {}", date.format("%Y-%m-%d"));
    }
    if let Some(ref number) = doc.invoice_number {
        println!("  Invoice:   {}", number);
    }
    println!("  Supplier:  {}", doc.supplier_label());
    if let Some(ref rut) = doc.supplier_rut {
        println!("  RUT:       {}", rut);
    }
    if let Some(ref address) = doc.invoice_address {
        println!("  Address:   {}", address);
    }
    println!("  Total:     {}", format_amount(doc.invoice_total));
    Ok(())
}

pub async fn cmd_docs_download(
    ctx: &Context,
    id: i64,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let download = ctx.api().download_summary(id).await?;
    let path = output.unwrap_or_else(|| {
        PathBuf::from(download.filename_or(&format!("documento_{}_resumen.pdf", id)))
    });
    tokio::fs::write(&path, &download.bytes).await?;
    println!(
        "{} Saved {} ({})",
        style("✓").green(),
        path.display(),
        format_bytes(download.bytes.len() as u64)
    );
    Ok(())
}

pub async fn cmd_docs_delete_all(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm("Delete ALL documents on the server? This cannot be undone.")? {
        println!("{} Cancelled", style("!").yellow());
        return Ok(());
    }

    let message = ctx.api().delete_all_documents().await?;
    ctx.dashboard.queries().cache().invalidate_all();
    println!("{} {}", style("✓").green(), message);
    Ok(())
}
