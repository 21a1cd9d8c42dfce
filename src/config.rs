//! Command line flags and layered settings.
//!
//! Settings are resolved from three layers, later ones winning:
//!
//! 1. an optional TOML file (`--config`),
//! 2. `PROMSCATTER_*` environment variables,
//! 3. command line flags.
//!
//! ```toml
//! addr = "http://localhost:9090"
//! from = "6h"
//! units = "bytes"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use promscatter_types::parse_duration;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::plot::Units;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "PROMSCATTER";

const DEFAULT_FROM: &str = "2h";
const DEFAULT_TO: &str = "1s";
const DEFAULT_OUT: &str = "query.png";
const DEFAULT_FLOOR: f64 = 1.0;
const STEPS_PER_RANGE: u32 = 360;
const MIN_STEP: Duration = Duration::from_millis(1);

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "promscatter")]
#[command(about = "Scatter-plot a Prometheus range query to a PNG")]
pub struct Args {
    /// Prometheus server address (e.g., "http://localhost:9090")
    #[arg(long)]
    pub addr: Option<String>,

    /// Start of the range, as a duration before now (default "2h")
    #[arg(long)]
    pub from: Option<String>,

    /// End of the range, as a duration before now (default "1s")
    #[arg(long)]
    pub to: Option<String>,

    /// Query resolution (default: range / 360)
    #[arg(long)]
    pub step: Option<String>,

    /// Output image path (default "query.png")
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Lower bound applied to every plotted value (default 1)
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Y axis units: duration, bytes or unitless
    #[arg(long)]
    pub units: Option<String>,

    /// TOML file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// PromQL query; words are joined with spaces
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,
}

impl Args {
    /// The query words joined by single spaces.
    pub fn query(&self) -> String {
        self.query.join(" ").trim().to_string()
    }
}

/// Settings as they appear in the config file and environment.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    addr: Option<String>,
    from: Option<String>,
    to: Option<String>,
    step: Option<String>,
    out: Option<PathBuf>,
    min: Option<f64>,
    units: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub address: String,
    pub query: String,
    pub from: Duration,
    pub to: Duration,
    pub step: Duration,
    pub out: PathBuf,
    pub floor: f64,
    pub units: Units,
}

impl Settings {
    /// Resolve settings from flags, the config file and the process
    /// environment.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        Self::load_with_env(args, Environment::with_prefix(ENV_PREFIX))
    }

    /// Resolve settings with an explicit environment source.
    pub fn load_with_env(args: &Args, env: Environment) -> Result<Self, ConfigError> {
        let query = args.query();
        if query.is_empty() {
            return Err(ConfigError::NoQuery);
        }

        let mut builder = Config::builder();
        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()));
        }
        let config = builder
            .add_source(env.try_parsing(true))
            .set_override_option("addr", args.addr.clone())?
            .set_override_option("from", args.from.clone())?
            .set_override_option("to", args.to.clone())?
            .set_override_option("step", args.step.clone())?
            .set_override_option(
                "out",
                args.out.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("min", args.min)?
            .set_override_option("units", args.units.clone())?
            .build()?;
        let raw: RawSettings = config.try_deserialize()?;

        Self::resolve(raw, query)
    }

    fn resolve(raw: RawSettings, query: String) -> Result<Self, ConfigError> {
        let address = raw
            .addr
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(ConfigError::MissingAddress)?;

        let from_text = raw.from.unwrap_or_else(|| DEFAULT_FROM.to_string());
        let to_text = raw.to.unwrap_or_else(|| DEFAULT_TO.to_string());
        let from = duration("from", &from_text)?;
        let to = duration("to", &to_text)?;
        if from <= to {
            return Err(ConfigError::InvalidRange {
                from: from_text,
                to: to_text,
            });
        }

        let step = match raw.step {
            Some(text) => {
                let step = duration("step", &text)?;
                if step.is_zero() {
                    return Err(ConfigError::InvalidDuration {
                        field: "step",
                        value: text,
                    });
                }
                step
            }
            None => ((from - to) / STEPS_PER_RANGE).max(MIN_STEP),
        };

        let units = match raw.units.as_deref() {
            None => Units::default(),
            Some(name) => Units::from_name(name).unwrap_or_else(|| {
                warn!(units = name, "unknown units, labeling values as unitless");
                Units::Unitless
            }),
        };

        Ok(Self {
            address,
            query,
            from,
            to,
            step,
            out: raw.out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT)),
            floor: raw.min.unwrap_or(DEFAULT_FLOOR),
            units,
        })
    }
}

fn duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|_| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}
