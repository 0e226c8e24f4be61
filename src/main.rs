use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

mod codes;
mod config;
mod download;
mod extract;
mod fetch;
mod resolve;
mod select;
mod thumbnail;
mod types;
mod utils;

use config::{Config, ExtractorKind};
use fetch::{CachedClient, Fetch, HttpClient};
use types::ResolvedTitle;

#[derive(Parser)]
#[command(name = "poster-grabber")]
#[command(about = "Download IMDb poster candidates and pick one keeper per title")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Options {
    /// Title codes, one per line, `#` starts a comment
    #[arg(long, global = true, default_value = config::CODES_FILE)]
    codes: PathBuf,
    /// Existing directory posters are written to
    #[arg(long, global = true, default_value = config::POSTERS_DIR)]
    posters: PathBuf,
    /// Detail page URL prefix, the code and a `/` are appended
    #[arg(long, global = true, default_value = config::ROOT_URL)]
    base_url: String,
    #[arg(long, global = true, default_value = config::USER_AGENT)]
    user_agent: String,
    /// Maximum thumbnail width in pixels
    #[arg(long, global = true, default_value_t = config::POSTER_DIMENSIONS.0)]
    max_width: u32,
    /// Maximum thumbnail height in pixels
    #[arg(long, global = true, default_value_t = config::POSTER_DIMENSIONS.1)]
    max_height: u32,
    /// Give up on a request after this many seconds (default: wait forever)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
    /// Cache fetched pages and images in this directory
    #[arg(long, global = true, value_name = "DIR")]
    cache: Option<PathBuf>,
    /// How fields are pulled out of fetched pages
    #[arg(long, global = true, value_enum, default_value_t = ExtractorKind::Regex)]
    extractor: ExtractorKind,
    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Print URLs and paths without terminal hyperlinks
    #[arg(long, global = true)]
    plain: bool,
    /// More diagnostics (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, download, then choose keepers (the default)
    Run {
        /// Choose keepers without asking first
        #[arg(long, conflicts_with = "no_select")]
        yes: bool,
        /// Stop after downloading
        #[arg(long)]
        no_select: bool,
    },
    /// Resolve codes to titles and gallery pages without downloading
    Resolve {
        /// Print the resolved titles as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve and download posters without choosing keepers
    Download,
    /// Choose keepers among posters already downloaded
    Choose,
}

impl Options {
    fn to_config(&self) -> Config {
        Config {
            codes_file: self.codes.clone(),
            posters_dir: self.posters.clone(),
            root_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            max_width: self.max_width,
            max_height: self.max_height,
            timeout: self.timeout.map(Duration::from_secs),
            cache_dir: self.cache.clone(),
            extractor: self.extractor,
            quiet: self.quiet,
            plain: self.plain,
        }
    }

    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn build_client(config: &Config) -> Result<Box<dyn Fetch>> {
    let client = HttpClient::new(&config.user_agent, config.timeout)?;
    Ok(match &config.cache_dir {
        Some(dir) => {
            log::info!("caching responses in {}", dir.display());
            Box::new(CachedClient::new(client, dir))
        }
        None => Box::new(client),
    })
}

fn load_and_resolve(config: &Config, client: &dyn Fetch) -> Result<Vec<ResolvedTitle>> {
    if !config.quiet {
        println!(" --- LOADING MOVIE METADATA --- ");
        println!("Loading IMDB codes...");
    }
    let codes = codes::load_codes(&config.codes_file)?;
    if !config.quiet {
        println!("Codes loaded\n");
    }

    let extractor = extract::extractor_for(config.extractor);
    let (resolved, _skipped) = resolve::resolve_all(client, extractor.as_ref(), config, &codes);
    Ok(resolved)
}

fn run_download(config: &Config) -> Result<()> {
    download::ensure_posters_dir(&config.posters_dir)?;
    let client = build_client(config)?;
    let resolved = load_and_resolve(config, client.as_ref())?;

    if !config.quiet {
        println!(" --- DOWNLOADING POSTERS --- ");
    }
    let extractor = extract::extractor_for(config.extractor);
    download::download_all(client.as_ref(), extractor.as_ref(), config, &resolved);
    Ok(())
}

fn run_resolve(config: &Config, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let resolved = load_and_resolve(config, client.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    }
    Ok(())
}

fn run_choose(config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let kept = select::choose_keepers(&config.posters_dir, &mut input, &mut output)?;
    if !config.quiet {
        println!("Kept {} posters", kept.len());
    }
    Ok(())
}

/// Anything but an answer whose first character is `n` or `N` means yes
fn wants_selection(answer: &str) -> bool {
    !answer.starts_with(['n', 'N'])
}

fn ask_to_choose<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "Done downloading. Choose posters to keep? (Y/n) ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(wants_selection(&answer))
}

fn run_all(config: &Config, yes: bool, no_select: bool) -> Result<()> {
    run_download(config)?;

    let choose = if no_select {
        false
    } else if yes {
        true
    } else {
        ask_to_choose(&mut io::stdin().lock(), &mut io::stdout())?
    };

    if choose {
        run_choose(config)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, cli.options.log_level());
    clog.init();

    let config = cli.options.to_config();

    match cli.command.unwrap_or(Commands::Run {
        yes: false,
        no_select: false,
    }) {
        Commands::Run { yes, no_select } => run_all(&config, yes, no_select),
        Commands::Resolve { json } => run_resolve(&config, json),
        Commands::Download => run_download(&config),
        Commands::Choose => run_choose(&config),
    }
}
