use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod browse;
mod config;
mod context;
mod download;
mod host;
mod query;
mod search;

#[derive(Parser)]
#[command(name = "chub")]
#[command(about = "Search the CHUB character catalog and import characters", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(flatten)]
    settings: context::SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and resolve avatars
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// Import a character into the host application
    #[command(alias = "d")]
    Download(download::DownloadArgs),

    /// Print the catalog request URL without sending it
    Query(query::QueryArgs),

    /// Interactive search session
    #[command(alias = "b")]
    Browse(browse::BrowseArgs),

    /// Show the settings file and effective values
    Config(config::ConfigArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug, RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Search(args) => search::execute(args, &cli.settings),
        Commands::Download(args) => download::execute(args, &cli.settings),
        Commands::Query(args) => query::execute(args, &cli.settings),
        Commands::Browse(args) => browse::execute(args, &cli.settings),
        Commands::Config(args) => config::execute(args, &cli.settings),
    }
}
