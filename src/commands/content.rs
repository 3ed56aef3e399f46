use std::path::Path;

use anyhow::{bail, Result};

use seqlink::config::Config;
use seqlink::http::AppState;
use seqlink::models::{CategoryId, ItemId, SaveRequest};
use seqlink::routing::{RequestContext, RouteOutcome};
use seqlink::storage::{open_repository, ImportData};

fn app_state(config: Config) -> Result<AppState> {
    let repo = open_repository(&config.database)?;
    Ok(AppState::new(config, repo)?)
}

/// Print how a request path would be routed
pub fn resolve(config: Config, target: &str) -> Result<()> {
    let state = app_state(config)?;
    let ctx = RequestContext::parse(target, state.base_path());

    match state.resolver.resolve(&ctx)? {
        RouteOutcome::Serve(item) => {
            println!("200 OK");
            println!("  Item: {} ({}, {})", item.id, item.item_type, item.title);
        }
        RouteOutcome::Terminal(outcome) => {
            println!("{}", outcome.status());
            match outcome.location() {
                Some(location) => println!("  Location: {location}"),
                None => println!("  {outcome}"),
            }
        }
        RouteOutcome::PassThrough => {
            println!("pass-through (no rule matched)");
        }
    }

    Ok(())
}

/// Print an item's canonical permalink
pub fn permalink(config: Config, id: u64) -> Result<()> {
    let state = app_state(config)?;
    let item_id = ItemId(id);

    let Some(item) = state.repo.get_item(item_id)? else {
        bail!("Item not found: {item_id}");
    };

    match state.permalinks.build(&item)? {
        Some(url) => println!("{url}"),
        None => println!("Item {item_id} has no sequential permalink"),
    }
    Ok(())
}

/// Run the save handler with optional overrides
pub fn save(config: Config, id: u64, primary: Option<u64>, sequence: Option<i64>) -> Result<()> {
    let state = app_state(config)?;
    let request = SaveRequest {
        primary_category: primary.map(CategoryId),
        manual_sequence: sequence,
    };

    match state.lifecycle.on_item_saved(ItemId(id), &request)? {
        Some(outcome) => {
            println!("Saved item {id}");
            println!(
                "  Primary: {}",
                outcome.primary.map_or("-".to_string(), |c| c.to_string())
            );
            println!(
                "  Sequence: {}",
                outcome.sequence.map_or("-".to_string(), |s| s.to_string())
            );
            println!("  Permalink: {}", outcome.permalink.as_deref().unwrap_or("-"));
        }
        None => println!("Item {id} is not a target type; nothing assigned"),
    }
    Ok(())
}

/// Delete an item and its sequences
pub fn delete_item(config: Config, id: u64) -> Result<()> {
    let state = app_state(config)?;
    if state.lifecycle.delete_item(ItemId(id))? {
        println!("Deleted item {id}");
    } else {
        println!("Item {id} did not exist; sequences cleaned up");
    }
    Ok(())
}

/// Delete a category and every sequence scoped to it
pub fn delete_category(config: Config, id: u64) -> Result<()> {
    let state = app_state(config)?;
    if state.lifecycle.delete_category(CategoryId(id))? {
        println!("Deleted category {id}");
    } else {
        println!("Category {id} did not exist; sequences cleaned up");
    }
    Ok(())
}

/// Seed the store from a JSON file
pub fn import(config: Config, file: &Path) -> Result<()> {
    let data = ImportData::from_file(file)?;
    let state = app_state(config)?;
    let summary = state.lifecycle.import(&data)?;

    println!(
        "Imported {} categories and {} items from {}",
        summary.categories,
        summary.items.len(),
        file.display()
    );
    if summary.reassigned > 0 {
        println!("{} imported sequences were taken and reassigned", summary.reassigned);
    }
    Ok(())
}
