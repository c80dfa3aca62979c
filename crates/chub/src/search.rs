use anyhow::Result;
use chub_search::render::display_tags;
use chub_search::{AssetRegistry, ResultSet};
use clap::Args;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::time::Duration;

use crate::context::{self, FilterArgs, SettingsArgs};

#[derive(Args, Debug, Clone)]
#[command(about = "Search the catalog and resolve every result's avatar")]
pub struct SearchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: SearchArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.load()?;
    let aggregator = context::aggregator(context::transport()?, settings);
    let filter = args.filter.filter_state();

    let spinner = ProgressBar::new_spinner();
    if !args.json {
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Searching characters...");
    }
    let results = aggregator.search(&filter);
    spinner.finish_and_clear();
    let results = results?;

    if args.json {
        println!("{}", results_json(&results, aggregator.registry())?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No characters found");
        return Ok(());
    }

    println!(
        "{} {} characters (page {}, {:?})",
        "Found".green().bold(),
        results.len(),
        filter.page,
        results.duration
    );
    write_results_table(&results, aggregator.registry(), io::stdout().lock())?;
    if results.missing_assets() > 0 {
        println!(
            "{} {} avatars could not be fetched",
            "!".yellow().bold(),
            results.missing_assets()
        );
    }
    Ok(())
}

fn avatar_size(registry: &AssetRegistry, entry: &chub_search::EnrichedResult) -> Option<usize> {
    entry
        .asset
        .as_ref()
        .and_then(|uri| registry.get(uri))
        .map(|bytes| bytes.len())
}

fn tag_column(tags: &[String]) -> String {
    display_tags(tags).join(", ")
}

pub fn write_results_table<W: Write>(
    results: &ResultSet,
    registry: &AssetRegistry,
    mut writer: W,
) -> io::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);

    for (i, entry) in results.iter().enumerate() {
        let record = &entry.record;
        let name = if record.display_name.is_empty() {
            "Default Name"
        } else {
            record.display_name.as_str()
        };
        let avatar = match avatar_size(registry, entry) {
            Some(size) => format!("{} B", size),
            None => "missing".to_string(),
        };
        table.add_row(vec![
            (i + 1).to_string(),
            name.to_string(),
            record.identifier.clone(),
            tag_column(&record.topic_tags),
            avatar,
        ]);
    }

    table.set_header(vec!["#", "Name", "Identifier", "Tags", "Avatar"]);

    writeln!(writer, "{table}")?;
    Ok(())
}

pub fn results_json(results: &ResultSet, registry: &AssetRegistry) -> Result<String> {
    let json_results: Vec<serde_json::Value> = results
        .iter()
        .map(|entry| {
            let record = &entry.record;
            serde_json::json!({
                "identifier": record.identifier,
                "name": record.display_name,
                "author": record.author_handle,
                "description": record.short_description,
                "tags": record.topic_tags,
                "avatar_bytes": avatar_size(registry, entry),
            })
        })
        .collect();

    Ok(serde_json::to_string_pretty(&json_results)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_column_matches_panel_limit() {
        let tags: Vec<String> = ["elf", "ranger", "fantasy", "forest", "bow", "archer", "sfw"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(tag_column(&tags), "elf, ranger, fantasy, forest, bow");
        assert_eq!(tag_column(&[]), "");
    }
}
