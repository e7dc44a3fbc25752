//! Session management commands.

use console::style;
use url::Url;

use docdash::models::{NewSession, Session, SessionId};
use docdash::ApiError;

use super::documents::print_document_table;
use super::Context;
use crate::cli::helpers::{confirm, print_json, truncate};

/// Banner naming the active session, hidden while the sidebar is collapsed.
pub fn print_session_banner(ctx: &Context) {
    if ctx.json || ctx.store().sidebar_collapsed() {
        return;
    }
    match ctx.dashboard.active_session() {
        Some(id) => println!("{} Session {}", style("●").green(), style(id).bold()),
        None => println!(
            "{} No active session (showing all documents)",
            style("○").dim()
        ),
    }
}

fn active_or(ctx: &Context, id: Option<SessionId>) -> anyhow::Result<SessionId> {
    id.or_else(|| ctx.dashboard.active_session())
        .ok_or_else(|| ApiError::NoActiveSession.into())
}

pub async fn cmd_session_list(ctx: &Context) -> anyhow::Result<()> {
    let sessions = ctx.api().list_sessions().await?;
    if ctx.json {
        return print_json(&sessions);
    }

    if sessions.is_empty() {
        println!(
            "{} No sessions yet. Create one with 'docdash session create <name>'.",
            style("!").yellow()
        );
        return Ok(());
    }

    let active = ctx.dashboard.active_session();
    println!("\n{}", style("Sessions").bold());
    println!("{}", "-".repeat(72));
    println!(
        "  {:<6} {:<28} {:>5} {:<22} Created",
        "ID", "Name", "Docs", "Owner"
    );
    println!("{}", "-".repeat(72));

    for session in &sessions {
        let marker = if Some(session.id) == active {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        let created = session
            .created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {:<6} {:<28} {:>5} {:<22} {}",
            marker,
            session.id,
            truncate(&session.name, 27),
            session.document_count(),
            truncate(session.created_by.as_deref().unwrap_or("-"), 21),
            created
        );
    }
    Ok(())
}

fn print_session(session: &Session) {
    println!("\n{} {}", style("Session").bold(), style(session.id).cyan());
    println!("  Name:      {}", session.name);
    if let Some(ref owner) = session.created_by {
        println!("  Owner:     {}", owner);
    }
    if let Some(created) = session.created_at {
        println!("  Created:   {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!("  Documents: {}", session.document_count());
    if !session.user_emails.is_empty() {
        let users: Vec<&str> = session.user_emails.iter().map(String::as_str).collect();
        println!("  Users:     {}", users.join(", "));
    }
}

pub async fn cmd_session_show(ctx: &Context, id: SessionId) -> anyhow::Result<()> {
    let session = ctx.api().get_session(id).await?;
    if ctx.json {
        return print_json(&session);
    }
    print_session(&session);
    Ok(())
}

pub async fn cmd_session_create(
    ctx: &Context,
    name: String,
    documents: Vec<i64>,
    users: Vec<String>,
) -> anyhow::Result<()> {
    let new = NewSession::named(name)
        .with_documents(documents)
        .with_users(users);

    let session = ctx.dashboard.create_session(new).await?;
    if ctx.json {
        return print_json(&session);
    }
    println!(
        "{} Created session {} ({}) and made it active",
        style("✓").green(),
        style(session.id).bold(),
        session.name
    );
    Ok(())
}

pub async fn cmd_session_use(ctx: &Context, id: SessionId) -> anyhow::Result<()> {
    let session = ctx.dashboard.use_session(id).await?;
    println!(
        "{} Active session: {} ({})",
        style("→").cyan(),
        style(session.id).bold(),
        session.name
    );
    Ok(())
}

pub fn cmd_session_clear(ctx: &Context) -> anyhow::Result<()> {
    ctx.dashboard.switch_session(None)?;
    println!("{} No active session", style("✓").green());
    Ok(())
}

pub async fn cmd_session_delete(ctx: &Context, id: SessionId, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm(&format!("Delete session {}?", id))? {
        println!("{} Cancelled", style("!").yellow());
        return Ok(());
    }

    ctx.dashboard.delete_session(id).await?;
    println!("{} Deleted session {}", style("✓").green(), id);
    Ok(())
}

pub async fn cmd_session_documents(ctx: &Context, id: Option<SessionId>) -> anyhow::Result<()> {
    let id = active_or(ctx, id)?;
    let documents = ctx.api().session_documents(id).await?;
    if ctx.json {
        return print_json(&documents);
    }

    println!(
        "\n{} {} ({} documents)",
        style("Session").bold(),
        style(id).cyan(),
        documents.len()
    );
    print_document_table(&documents);
    Ok(())
}

pub async fn cmd_session_add(
    ctx: &Context,
    session: Option<SessionId>,
    ids: &[i64],
) -> anyhow::Result<()> {
    let id = active_or(ctx, session)?;
    ctx.api().add_documents(id, ids).await?;
    ctx.dashboard.queries().invalidate_session(Some(id));
    println!(
        "{} Added {} document(s) to session {}",
        style("✓").green(),
        ids.len(),
        id
    );
    Ok(())
}

pub fn cmd_session_link(ctx: &Context) -> anyhow::Result<()> {
    let base = Url::parse(&ctx.settings.dashboard_url)?;
    let link = ctx.store().link_for(&base);
    println!("{}", link);
    Ok(())
}
