use anyhow::Result;
use chub_search::{
    Action, Dispatched, DownloadDispatcher, ListStatus, MemorySurface, Session, SortKey,
};
use clap::Args;
use colored::Colorize;
use indicatif::ProgressBar;
use inquire::{InquireError, Select, Text};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::{self, SettingsArgs};
use crate::host::DirectoryHost;
use crate::search::write_results_table;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Args, Debug, Clone)]
#[command(about = "Browse the catalog interactively")]
pub struct BrowseArgs {
    /// Initial search term
    #[arg(value_name = "TERM")]
    pub term: Option<String>,

    /// Directory downloaded characters are written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    Search,
    Term,
    IncludeTags,
    ExcludeTags,
    NextPage,
    PreviousPage,
    GoToPage,
    ToggleNsfw,
    Sort,
    Download,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 11] = [
        MenuItem::Search,
        MenuItem::Term,
        MenuItem::IncludeTags,
        MenuItem::ExcludeTags,
        MenuItem::NextPage,
        MenuItem::PreviousPage,
        MenuItem::GoToPage,
        MenuItem::ToggleNsfw,
        MenuItem::Sort,
        MenuItem::Download,
        MenuItem::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Search => "Search again",
            MenuItem::Term => "Set search term",
            MenuItem::IncludeTags => "Include tags",
            MenuItem::ExcludeTags => "Exclude tags",
            MenuItem::NextPage => "Next page",
            MenuItem::PreviousPage => "Previous page",
            MenuItem::GoToPage => "Go to page",
            MenuItem::ToggleNsfw => "Toggle NSFW",
            MenuItem::Sort => "Sort order",
            MenuItem::Download => "Download a character",
            MenuItem::Quit => "Quit",
        };
        write!(f, "{}", label)
    }
}

type BrowseSession = Session<MemorySurface>;

pub fn execute(args: BrowseArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.load()?;
    let transport = context::transport()?;
    let downloads = DownloadDispatcher::new(
        transport.clone(),
        Arc::new(DirectoryHost::new(args.output.clone())),
        &settings.host_url,
    );
    let aggregator = context::aggregator(transport, settings);
    let mut session = Session::new(aggregator, downloads, MemorySurface::new())?;

    session.open_panel()?;
    let first = match args.term {
        Some(term) => Action::SetSearchTerm(term),
        None => Action::Search,
    };
    session.dispatch(first, Instant::now())?;
    wait_and_show(&mut session)?;

    loop {
        let action = match prompt_action(&session) {
            Ok(Some(action)) => action,
            Ok(None) => break,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match session.dispatch(action, Instant::now())? {
            Dispatched::Download(Ok(outcome)) => println!(
                "{} {} ({} bytes)",
                "Imported".green().bold(),
                outcome.file_name.bold(),
                outcome.size
            ),
            Dispatched::Download(Err(e)) => log::debug!("Download failed: {}", e),
            Dispatched::Scheduled | Dispatched::Started(_) => wait_and_show(&mut session)?,
        }
    }

    session.close_panel();
    Ok(())
}

/// `None` means quit
fn prompt_action(session: &BrowseSession) -> Result<Option<Action>, InquireError> {
    let form = session.form();
    let choice = Select::new("What next?", MenuItem::ALL.to_vec())
        .with_page_size(MenuItem::ALL.len())
        .prompt()?;

    let action = match choice {
        MenuItem::Search => Action::Search,
        MenuItem::Term => Action::SetSearchTerm(
            Text::new("Search term:")
                .with_initial_value(&form.search_text)
                .prompt()?,
        ),
        MenuItem::IncludeTags => Action::SetIncludeTags(
            Text::new("Include tags (comma separated):")
                .with_initial_value(&form.include_text)
                .prompt()?,
        ),
        MenuItem::ExcludeTags => Action::SetExcludeTags(
            Text::new("Exclude tags (comma separated):")
                .with_initial_value(&form.exclude_text)
                .prompt()?,
        ),
        MenuItem::NextPage => Action::PageUp,
        MenuItem::PreviousPage => Action::PageDown,
        MenuItem::GoToPage => {
            let page = Text::new("Page:")
                .with_initial_value(&form.page.to_string())
                .prompt()?;
            Action::SetPage(page.trim().parse().unwrap_or(1))
        }
        MenuItem::ToggleNsfw => Action::ToggleNsfw,
        MenuItem::Sort => Action::SelectSort(
            Select::new("Sort by:", SortKey::ALL.to_vec())
                .with_page_size(SortKey::ALL.len())
                .prompt()?,
        ),
        MenuItem::Download => {
            let Some(results) = session.live().filter(|r| !r.is_empty()) else {
                println!("Nothing to download, run a search first");
                return Ok(Some(Action::Search));
            };
            let identifiers: Vec<String> = results
                .iter()
                .map(|entry| entry.record.identifier.clone())
                .collect();
            Action::Download(Select::new("Character:", identifiers).prompt()?)
        }
        MenuItem::Quit => return Ok(None),
    };
    Ok(Some(action))
}

fn wait_and_show(session: &mut BrowseSession) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Searching characters...");
    let finished = session.wait_idle(SEARCH_TIMEOUT);
    spinner.finish_and_clear();

    if !finished? {
        println!("{} search is still running", "!".yellow().bold());
        return Ok(());
    }

    let form = session.form();
    println!(
        "{} page {}, sort {}, nsfw {}",
        "Showing".cyan(),
        form.page,
        form.sort.label(),
        form.nsfw
    );
    match session.status() {
        ListStatus::NoResults => println!("No characters found"),
        ListStatus::Failed => {
            println!(
                "{}",
                "An error occurred while searching. Please try again.".red()
            );
            if let Some(e) = session.last_error() {
                log::debug!("{}", e);
            }
        }
        ListStatus::Idle | ListStatus::Searching => {
            if let Some(results) = session.live() {
                write_results_table(results, session.aggregator().registry(), io::stdout().lock())?;
            }
        }
    }
    Ok(())
}
