//! Run configuration: the fixed locations and limits of a poster run

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

pub const CODES_FILE: &str = "imdb_codes.txt";
pub const POSTERS_DIR: &str = "posters";
pub const ROOT_URL: &str = "https://www.imdb.com/title/";
/// The site rejects default client identifiers, this exact value is accepted
pub const USER_AGENT: &str = "Mozilla/5.0";
/// Height is big so width always binds for poster-shaped images
pub const POSTER_DIMENSIONS: (u32, u32) = (145, 400);
/// Keeps the (possibly empty) posters dir under version control
pub const PLACEHOLDER_FILE: &str = ".gitkeep";

/// Strategy used to pull fields out of fetched pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExtractorKind {
    /// Minimal text patterns over the raw markup
    #[default]
    Regex,
    /// Queries over a parsed HTML document
    Html,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub codes_file: PathBuf,
    pub posters_dir: PathBuf,
    pub root_url: String,
    pub user_agent: String,
    pub max_width: u32,
    pub max_height: u32,
    pub timeout: Option<Duration>,
    pub cache_dir: Option<PathBuf>,
    pub extractor: ExtractorKind,
    pub quiet: bool,
    pub plain: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codes_file: PathBuf::from(CODES_FILE),
            posters_dir: PathBuf::from(POSTERS_DIR),
            root_url: ROOT_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            max_width: POSTER_DIMENSIONS.0,
            max_height: POSTER_DIMENSIONS.1,
            timeout: None,
            cache_dir: None,
            extractor: ExtractorKind::default(),
            quiet: false,
            plain: false,
        }
    }
}

impl Config {
    /// Detail page URL for an identifier
    pub fn detail_url(&self, code: &str) -> String {
        format!("{}{}/", self.root_url, code)
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}
