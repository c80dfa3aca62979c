use anyhow::Result;
use chub_search::{build_search_request, Endpoints};
use clap::Args;

use crate::context::{FilterArgs, SettingsArgs};

#[derive(Args, Debug, Clone)]
#[command(about = "Print the catalog request URL without sending it")]
pub struct QueryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

pub fn execute(args: QueryArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.load()?;
    let request = build_search_request(&args.filter.filter_state(), &settings, &Endpoints::from_env());
    println!("{}", request.url());
    Ok(())
}
