use anyhow::{Context, Result};
use chub_search::DownloadDispatcher;
use clap::Args;
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{self, SettingsArgs};
use crate::host::DirectoryHost;

#[derive(Args, Debug, Clone)]
#[command(about = "Import a character through the host application")]
pub struct DownloadArgs {
    /// Catalog identifier, e.g. author/slug
    #[arg(value_name = "IDENTIFIER")]
    pub identifier: String,

    /// Directory the imported file is written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

pub fn dispatcher(settings: &SettingsArgs, output: PathBuf) -> Result<DownloadDispatcher> {
    let settings = settings.load()?;
    Ok(DownloadDispatcher::new(
        context::transport()?,
        Arc::new(DirectoryHost::new(output)),
        &settings.host_url,
    ))
}

pub fn execute(args: DownloadArgs, settings: &SettingsArgs) -> Result<()> {
    let dispatcher = dispatcher(settings, args.output.clone())?;

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Downloading {}...", args.identifier));
    let outcome = dispatcher.download(&args.identifier);
    spinner.finish_and_clear();

    let outcome =
        outcome.with_context(|| format!("Failed to download {}", args.identifier))?;
    println!(
        "{} {} ({} bytes) to {}",
        "Imported".green().bold(),
        outcome.file_name.bold(),
        outcome.size,
        args.output.display()
    );
    Ok(())
}
