//! Configuration commands.

use console::style;

use super::Context;
use crate::cli::helpers::print_json;

/// Show the effective settings and where they came from.
pub fn cmd_config_show(ctx: &Context) -> anyhow::Result<()> {
    let settings = &ctx.settings;
    if ctx.json {
        return print_json(settings);
    }

    println!("\n{}", style("Configuration").bold());
    println!("{}", "-".repeat(60));
    match ctx.config.source_path {
        Some(ref path) => println!("  {:<16} {}", "Config file", path.display()),
        None => println!("  {:<16} {}", "Config file", style("(defaults)").dim()),
    }
    println!("  {:<16} {}", "API URL", settings.api_url);
    println!("  {:<16} {}", "Dashboard URL", settings.dashboard_url);
    println!("  {:<16} {}s", "Timeout", settings.request_timeout);
    println!("  {:<16} {}s", "Cache TTL", settings.cache_ttl_secs);
    println!("  {:<16} {}", "Page size", settings.page_size);
    println!("  {:<16} {}", "State file", settings.state_file.display());
    Ok(())
}
