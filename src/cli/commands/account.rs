//! Login, link and layout commands.

use console::style;
use url::Url;

use docdash::models::Identity;
use docdash::session::LinkAction;

use super::Context;
use crate::cli::helpers::print_json;

pub fn cmd_login(ctx: &Context, email: &str, admin: bool) -> anyhow::Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        anyhow::bail!("'{}' is not an email address", email);
    }
    ctx.store().set_identity(Identity::user(email, admin))?;
    println!(
        "{} Logged in as {}{}",
        style("✓").green(),
        style(email).cyan(),
        if admin { " (administrator)" } else { "" }
    );
    Ok(())
}

pub fn cmd_logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.store().logout()?;
    println!("{} Logged out", style("✓").green());
    Ok(())
}

pub fn cmd_whoami(ctx: &Context) -> anyhow::Result<()> {
    let state = ctx.store().snapshot();
    if ctx.json {
        return print_json(&state);
    }

    match state.identity.header_email() {
        Some(email) => println!(
            "User:    {}{}",
            style(email).cyan(),
            if state.identity.is_admin {
                " (administrator)"
            } else {
                ""
            }
        ),
        None => println!("User:    {}", style("not logged in").dim()),
    }
    match state.active_session {
        Some(id) => println!("Session: {}", style(id).bold()),
        None => println!("Session: {}", style("none").dim()),
    }
    Ok(())
}

/// Open a dashboard link: a valid session in the link becomes active, a
/// missing one is filled in from the stored session, and an invalid one is
/// ignored.
pub async fn cmd_open(ctx: &Context, link: &str) -> anyhow::Result<()> {
    let url = Url::parse(link)?;
    let sync = ctx.dashboard.open_link(&url)?;

    match sync.action {
        LinkAction::Adopted => {
            if let Some(id) = sync.session {
                // Confirm the session exists; keep it active either way.
                match ctx.api().get_session(id).await {
                    Ok(session) => println!(
                        "{} Switched to session {} ({})",
                        style("→").cyan(),
                        style(id).bold(),
                        session.name
                    ),
                    Err(e) => println!(
                        "{} Switched to session {} ({})",
                        style("!").yellow(),
                        style(id).bold(),
                        style(e).dim()
                    ),
                }
            }
        }
        LinkAction::InSync => println!("{} Link matches the active session", style("✓").green()),
        LinkAction::Repaired => println!(
            "{} Link had no session; using the active one",
            style("→").cyan()
        ),
        LinkAction::Rejected => println!(
            "{} Link carries an invalid session; ignored",
            style("!").yellow()
        ),
    }
    println!("  {}", sync.url);
    Ok(())
}

pub fn cmd_sidebar(ctx: &Context) -> anyhow::Result<()> {
    let collapsed = ctx.store().toggle_sidebar()?;
    println!(
        "{} Sidebar {}",
        style("✓").green(),
        if collapsed { "collapsed" } else { "expanded" }
    );
    Ok(())
}
