use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "data/tmdb_5000_movies_mergedwith_movie_metadata.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/tableau";
pub const DEFAULT_PORT: u16 = 3001;

/// Contents of the optional TOML file. Every key may be omitted.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub input: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub directors: Option<usize>,
    pub actors: Option<usize>,
    pub genres: Option<usize>,
    pub content_ratings: Option<usize>,
    pub genre_funnel: Option<usize>,
    pub top_n: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::parse(&content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Values given on the command line. `None` means the flag was absent.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Minimum group sizes for the leaderboard-style dashboard views, and how
/// many rows a leaderboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinSupport {
    pub directors: usize,
    pub actors: usize,
    pub genres: usize,
    pub content_ratings: usize,
    pub genre_funnel: usize,
    pub top_n: usize,
}

impl Default for MinSupport {
    fn default() -> Self {
        MinSupport {
            directors: 3,
            actors: 3,
            genres: 10,
            content_ratings: 20,
            genre_funnel: 20,
            top_n: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub port: u16,
    pub min_support: MinSupport,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            port: DEFAULT_PORT,
            min_support: MinSupport::default(),
        }
    }
}

impl AppConfig {
    /// Command-line values win over the file, the file wins over the
    /// built-in defaults.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let defaults = AppConfig::default();

        let input = cli
            .input
            .clone()
            .or_else(|| file.paths.input.map(PathBuf::from))
            .unwrap_or(defaults.input);
        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| file.paths.output_dir.map(PathBuf::from))
            .unwrap_or(defaults.output_dir);
        let port = cli.port.or(file.server.port).unwrap_or(defaults.port);

        let lb = file.leaderboard;
        let base = defaults.min_support;
        let min_support = MinSupport {
            directors: lb.directors.unwrap_or(base.directors),
            actors: lb.actors.unwrap_or(base.actors),
            genres: lb.genres.unwrap_or(base.genres),
            content_ratings: lb.content_ratings.unwrap_or(base.content_ratings),
            genre_funnel: lb.genre_funnel.unwrap_or(base.genre_funnel),
            top_n: lb.top_n.unwrap_or(base.top_n),
        };
        if min_support.top_n == 0 {
            return Err(ReportError::Config(
                "leaderboard.top_n must be at least 1".to_string(),
            ));
        }

        Ok(AppConfig {
            input,
            output_dir,
            port,
            min_support,
        })
    }
}
