//! Command-line interface parsing for restoview
//!
//! This module handles parsing of CLI arguments using clap: which server to
//! talk to, where the offline cache lives, the initial filters, and the
//! print-only modes that skip the terminal UI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use reqwest::Url;
use thiserror::Error;

use crate::cache::CacheManager;
use crate::data::gateway::DEFAULT_BASE_URL;
use crate::data::{Filter, GatewayConfig, Restaurant, RestaurantId, ALL};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The server URL is not an http(s) URL
    #[error("Invalid server URL: '{0}'. Expected something like http://localhost:1337")]
    InvalidServer(String),

    /// The request timeout must be positive
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,

    /// A filter value was empty
    #[error("Invalid {0} filter: value must not be empty (use 'all' for no filter)")]
    EmptyFilter(&'static str),
}

/// restoview - Browse restaurant reviews, online or from the offline cache
#[derive(Parser, Debug)]
#[command(name = "restoview")]
#[command(about = "Browse a restaurant-review server, with an offline cache")]
#[command(version)]
#[command(group(
    ArgGroup::new("print")
        .args(["list", "cuisines", "neighborhoods", "show"])
        .multiple(false)
))]
pub struct Cli {
    /// Root URL of the restaurant server
    #[arg(long, env = "RESTOVIEW_SERVER", default_value = DEFAULT_BASE_URL)]
    pub server: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Directory for the offline cache (defaults to the XDG cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Run without the offline cache
    #[arg(long, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Only show restaurants serving this cuisine ('all' for any)
    #[arg(long, default_value = ALL)]
    pub cuisine: String,

    /// Only show restaurants in this neighborhood ('all' for any)
    #[arg(long, default_value = ALL)]
    pub neighborhood: String,

    /// Print the filtered restaurants and exit
    #[arg(long)]
    pub list: bool,

    /// Print the known cuisines and exit
    #[arg(long)]
    pub cuisines: bool,

    /// Print the known neighborhoods and exit
    #[arg(long)]
    pub neighborhoods: bool,

    /// Print one restaurant by id and exit
    #[arg(long, value_name = "ID")]
    pub show: Option<RestaurantId>,
}

/// What the binary does after startup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Interactive terminal UI
    #[default]
    Browse,
    /// Print the filtered list
    List,
    /// Print distinct cuisines
    Cuisines,
    /// Print distinct neighborhoods
    Neighborhoods,
    /// Print one restaurant
    Show(RestaurantId),
}

impl Mode {
    /// Returns true for the modes that print and exit
    pub fn is_print(&self) -> bool {
        !matches!(self, Mode::Browse)
    }
}

/// Where the offline cache should live
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheLocation {
    /// XDG cache directory
    #[default]
    Default,
    /// Explicit directory
    Dir(PathBuf),
    /// No cache
    Disabled,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Server root URL
    pub server: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Offline cache location
    pub cache: CacheLocation,
    /// Initial filter
    pub filter: Filter,
    /// What to do after startup
    pub mode: Mode,
}

impl Default for StartupConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            server: gateway.base_url,
            timeout: gateway.timeout,
            cache: CacheLocation::Default,
            filter: Filter::default(),
            mode: Mode::Browse,
        }
    }
}

/// Checks that the server is an absolute http(s) URL
pub fn parse_server_arg(s: &str) -> Result<String, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidServer(s.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(s.trim_end_matches('/').to_string()),
        _ => Err(CliError::InvalidServer(s.to_string())),
    }
}

fn parse_filter_arg(value: &str, dimension: &'static str) -> Result<String, CliError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::EmptyFilter(dimension));
    }
    Ok(value.to_string())
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the server, timeout or a filter is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let server = parse_server_arg(&cli.server)?;

        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let cache = match (&cli.cache_dir, cli.no_cache) {
            (_, true) => CacheLocation::Disabled,
            (Some(dir), false) => CacheLocation::Dir(dir.clone()),
            (None, false) => CacheLocation::Default,
        };

        let filter = Filter::new(
            parse_filter_arg(&cli.cuisine, "cuisine")?,
            parse_filter_arg(&cli.neighborhood, "neighborhood")?,
        );

        let mode = if cli.list {
            Mode::List
        } else if cli.cuisines {
            Mode::Cuisines
        } else if cli.neighborhoods {
            Mode::Neighborhoods
        } else if let Some(id) = &cli.show {
            Mode::Show(id.clone())
        } else {
            Mode::Browse
        };

        Ok(StartupConfig {
            server,
            timeout: Duration::from_secs(cli.timeout),
            cache,
            filter,
            mode,
        })
    }

    /// Gateway settings for this configuration
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.server.clone(),
            timeout: self.timeout,
        }
    }

    /// Opens the configured cache, if any
    pub fn cache_manager(&self) -> Option<CacheManager> {
        match &self.cache {
            CacheLocation::Default => CacheManager::new(),
            CacheLocation::Dir(dir) => Some(CacheManager::with_dir(dir.clone())),
            CacheLocation::Disabled => None,
        }
    }
}

/// Formats one restaurant as a line of `--list` output
pub fn format_listing_line(restaurant: &Restaurant) -> String {
    let favorite = if restaurant.is_favorite { " \u{2605}" } else { "" };
    format!(
        "{:>4}  {:<32} {:<14} {}{}",
        restaurant.id, restaurant.name, restaurant.cuisine_type, restaurant.neighborhood, favorite
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_restaurant;

    #[test]
    fn test_parse_server_arg_accepts_http_and_https() {
        assert_eq!(
            parse_server_arg("http://localhost:1337").unwrap(),
            "http://localhost:1337"
        );
        assert_eq!(
            parse_server_arg("https://reviews.example.com/").unwrap(),
            "https://reviews.example.com"
        );
    }

    #[test]
    fn test_parse_server_arg_invalid() {
        for bad in ["localhost:1337", "ftp://example.com", "not a url", ""] {
            let err = parse_server_arg(bad).unwrap_err();
            assert!(err.to_string().contains("Invalid server URL"), "{}", bad);
        }
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["restoview"]);
        assert_eq!(cli.cuisine, "all");
        assert_eq!(cli.neighborhood, "all");
        assert_eq!(cli.timeout, 30);
        assert!(!cli.list);
        assert!(cli.show.is_none());
    }

    #[test]
    fn test_cli_print_modes_conflict() {
        let result = Cli::try_parse_from(["restoview", "--list", "--cuisines"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_cache_conflicts_with_cache_dir() {
        let result = Cli::try_parse_from(["restoview", "--no-cache", "--cache-dir", "/tmp/x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_config_default() {
        let config = StartupConfig::default();
        assert_eq!(config.server, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cache, CacheLocation::Default);
        assert!(config.filter.is_unfiltered());
        assert_eq!(config.mode, Mode::Browse);
    }

    #[test]
    fn test_startup_config_from_cli_browse() {
        let cli = Cli::parse_from(["restoview", "--server", "http://127.0.0.1:8000"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.server, "http://127.0.0.1:8000");
        assert_eq!(config.mode, Mode::Browse);
        assert!(!config.mode.is_print());
    }

    #[test]
    fn test_startup_config_from_cli_modes() {
        let cases = [
            (vec!["restoview", "--list"], Mode::List),
            (vec!["restoview", "--cuisines"], Mode::Cuisines),
            (vec!["restoview", "--neighborhoods"], Mode::Neighborhoods),
            (vec!["restoview", "--show", "7"], Mode::Show(RestaurantId::Number(7))),
            (
                vec!["restoview", "--show", "tu-casa"],
                Mode::Show(RestaurantId::Text("tu-casa".to_string())),
            ),
        ];
        for (args, expected) in cases {
            let config = StartupConfig::from_cli(&Cli::parse_from(args)).unwrap();
            assert_eq!(config.mode, expected);
            assert!(config.mode.is_print());
        }
    }

    #[test]
    fn test_startup_config_from_cli_filters() {
        let cli = Cli::parse_from([
            "restoview",
            "--cuisine",
            "Thai",
            "--neighborhood",
            " Queens ",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.filter, Filter::new("Thai", "Queens"));
    }

    #[test]
    fn test_startup_config_from_cli_empty_filter() {
        let cli = Cli::parse_from(["restoview", "--cuisine", "  "]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::EmptyFilter("cuisine")));
    }

    #[test]
    fn test_startup_config_from_cli_zero_timeout() {
        let cli = Cli::parse_from(["restoview", "--timeout", "0"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_startup_config_cache_locations() {
        let disabled = StartupConfig::from_cli(&Cli::parse_from(["restoview", "--no-cache"])).unwrap();
        assert_eq!(disabled.cache, CacheLocation::Disabled);
        assert!(disabled.cache_manager().is_none());

        let dir = StartupConfig::from_cli(&Cli::parse_from([
            "restoview",
            "--cache-dir",
            "/tmp/restoview-test",
        ]))
        .unwrap();
        let manager = dir.cache_manager().expect("Explicit dir always yields a cache");
        assert_eq!(manager.cache_dir(), std::path::Path::new("/tmp/restoview-test"));
    }

    #[test]
    fn test_format_listing_line() {
        let mut restaurant = sample_restaurant(3, "Thai", "Uptown");
        let line = format_listing_line(&restaurant);
        assert!(line.starts_with("   3  Restaurant 3"));
        assert!(line.contains("Thai"));
        assert!(line.trim_end().ends_with("Uptown"));

        restaurant.is_favorite = true;
        assert!(format_listing_line(&restaurant).ends_with('\u{2605}'));
    }
}
