//! Plant listing and detail views.
//!
//! Used by `greenthumb plants`, `greenthumb show <id>` and deep links.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::Plant;
use crate::preferences;
use crate::store::{PlantStore, SqlitePlantStore};

/// CLI entry point for `greenthumb plants`.
///
/// The first listing on a fresh database also prints a hint to rate
/// gardening experience, then clears the first-load flag.
pub async fn run_list(config: &Config) -> Result<()> {
    let store = SqlitePlantStore::connect(config).await?;
    let plants = store.list_plants().await?;

    println!("{:<4} {:<14} {:>8}   DESCRIPTION", "ID", "NAME", "PRICE");
    println!("{}", "-".repeat(76));
    for plant in &plants {
        println!(
            "{:<4} {:<14} {:>8}   {}",
            plant.id,
            plant.name,
            plant.display_price(),
            truncate(&plant.description, 46)
        );
    }
    println!();
    println!("{} plants", plants.len());

    if preferences::get_first_load(store.pool()).await? {
        println!();
        println!("Tip: rate your gardening experience with `greenthumb rate`.");
        preferences::set_first_load(store.pool(), false).await?;
    }

    store.close().await;
    Ok(())
}

/// CLI entry point for `greenthumb show <id>`.
pub async fn run_show(config: &Config, id: i64) -> Result<()> {
    let store = SqlitePlantStore::connect(config).await?;
    let plant = store.get_plant(id).await?;
    store.close().await;

    let Some(plant) = plant else {
        bail!("plant not found: {}", id);
    };
    print_plant(&plant);
    Ok(())
}

fn print_plant(plant: &Plant) {
    println!("--- Plant ---");
    println!("id:     {}", plant.id);
    println!("name:   {}", plant.name);
    println!("price:  {}", plant.display_price());
    println!();
    println!("{}", plant.description);
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
