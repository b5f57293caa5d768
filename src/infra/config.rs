use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::flagging::Thresholds;
use crate::core::verdict::EvidenceLayout;

/// Config files looked up in priority order
const CONFIG_FILES: [&str; 4] = ["plagscan.toml", "plagscan.yaml", "plagscan.json", ".plagscan.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Classification and verdict thresholds
    pub thresholds: Thresholds,

    /// Worker settings
    pub engine: EngineConfig,

    /// Payload formatting
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig
{
    /// Worker threads for pair comparison (0 = one per core)
    pub threads: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{
    pub evidence_layout: EvidenceLayout,
    pub pretty: bool,
}

/// Load configuration from the working directory.
pub fn load_config() -> Result<Config>
{
    load_config_in(Path::new("."))
}

/// Load configuration from `dir`, overlaid by `PLAGSCAN_*` variables.
///
/// Nested keys use a double underscore, e.g.
/// `PLAGSCAN_THRESHOLDS__REJECT=0.25`.
pub fn load_config_in(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PLAGSCAN")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    parsed
        .thresholds
        .validate()
        .context("Invalid [thresholds] configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
