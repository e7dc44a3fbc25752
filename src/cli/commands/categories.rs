//! Product category curation.

use console::style;

use super::Context;
use crate::cli::helpers::{print_json, truncate};

pub async fn cmd_categories_list(ctx: &Context, grouped: bool) -> anyhow::Result<()> {
    let assignments = ctx.dashboard.load_categories().await?;
    if ctx.json {
        return print_json(&assignments);
    }

    if assignments.is_empty() {
        println!("{} No products categorized yet", style("!").yellow());
        return Ok(());
    }

    let catalog = ctx.dashboard.catalog();
    if grouped {
        for (category, products) in catalog.by_category() {
            println!(
                "\n{} ({})",
                style(category).bold(),
                products.len()
            );
            for product in products {
                println!("  {}", product);
            }
        }
    } else {
        println!("\n{}", style("Product categories").bold());
        println!("{}", "-".repeat(72));
        println!("{:<40} {:<22} Source", "Product", "Category");
        println!("{}", "-".repeat(72));
        for entry in catalog.iter() {
            let source = if entry.manual {
                style("manual").green().to_string()
            } else {
                style("auto").dim().to_string()
            };
            println!(
                "{:<40} {:<22} {}",
                truncate(&entry.product, 39),
                truncate(entry.category_label(), 21),
                source
            );
        }
    }

    println!(
        "\n{} products, {} manual, {} uncategorized",
        catalog.len(),
        catalog.manual_count(),
        catalog.uncategorized().len()
    );
    Ok(())
}

pub async fn cmd_categories_set(ctx: &Context, product: &str, category: &str) -> anyhow::Result<()> {
    let entry = ctx.dashboard.set_manual_category(product, category).await?;
    if ctx.json {
        return print_json(&entry);
    }
    println!(
        "{} {} → {}",
        style("✓").green(),
        entry.product,
        style(entry.category_label()).cyan()
    );
    Ok(())
}

pub async fn cmd_categories_apply_ml(ctx: &Context, products: &[String]) -> anyhow::Result<()> {
    // Load the current listing first so manual entries are known locally.
    ctx.dashboard.load_categories().await?;
    let result = ctx.dashboard.apply_ml_categories(products).await?;
    if ctx.json {
        return print_json(&result);
    }

    println!(
        "{} Classifier updated {} product(s)",
        style("✓").green(),
        result.updated
    );
    for entry in &result.products {
        println!(
            "  {:<40} {}",
            truncate(&entry.product, 39),
            entry.category_label()
        );
    }
    Ok(())
}
