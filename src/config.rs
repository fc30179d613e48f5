use crate::automation::SessionOptions;
use crate::models::Query;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "job-scout", about = "Scrape job boards through a headless browser")]
pub struct Config {
    /// Run the browser without a visible window
    #[arg(long, env = "JOB_SCOUT_HEADLESS", default_value = "true", action = clap::ArgAction::Set)]
    pub headless: bool,

    /// How long scraped results stay cached, in seconds
    #[arg(long, env = "JOB_SCOUT_CACHE_TTL", default_value = "7200")]
    pub cache_ttl_secs: u64,

    /// Upper bound for a single browser action, in seconds
    #[arg(long, env = "JOB_SCOUT_ACTION_TIMEOUT", default_value = "30")]
    pub action_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Search for jobs (default when no subcommand given)
    Search(SearchArgs),
    /// Print the available filter values
    Filters,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Job board, or "all" for every board
    #[arg(long)]
    pub platform: Option<String>,

    /// Keyword typed into the site's search box
    #[arg(long, short)]
    pub q: Option<String>,

    /// Field, e.g. software-engineering
    #[arg(long)]
    pub field: Option<String>,

    /// Seniority levels, comma separated
    #[arg(long, value_delimiter = ',')]
    pub seniority: Vec<String>,

    /// City, e.g. beograd
    #[arg(long)]
    pub location: Option<String>,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Follow pagination until the last page
    #[arg(long)]
    pub all_pages: bool,

    /// Also write the results to this JSON file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl SearchArgs {
    pub fn to_query(&self) -> Query {
        Query {
            platform: self.platform.clone(),
            q: self.q.clone(),
            field: self.field.clone(),
            seniority: self.seniority.clone(),
            location: self.location.clone(),
            page: self.page,
            all_pages: self.all_pages,
        }
        .normalized()
    }
}

impl Config {
    /// Resolve the command, defaulting to an unfiltered search.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Search(SearchArgs::default()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            headless: self.headless,
            action_timeout: Duration::from_secs(self.action_timeout_secs),
        }
    }
}
