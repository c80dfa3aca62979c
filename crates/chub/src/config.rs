use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::context::SettingsArgs;

#[derive(Args, Debug, Clone)]
#[command(about = "Show the settings file and effective values")]
pub struct ConfigArgs {
    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save: bool,
}

pub fn execute(args: ConfigArgs, settings_args: &SettingsArgs) -> Result<()> {
    let path = settings_args.path()?;
    let settings = settings_args.load()?;

    if args.save {
        chub_search::save_settings_to(&path, &settings)?;
        println!("{} {}", "Saved".green().bold(), path.display());
    }

    println!("{} {}", "Settings:".cyan(), path.display());
    println!("  find_count = {}", settings.find_count);
    println!("  nsfw       = {}", settings.nsfw);
    println!("  host_url   = {}", settings.host_url);
    Ok(())
}
