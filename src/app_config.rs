//! Application configuration: optional config file plus CLI overrides.
//!
//! Precedence is CLI flag, then config file value, then built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sku_images_core::DEFAULT_ERROR_LOG;
use sku_images_core::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MAX_DELAY_MS, MIN_CONCURRENCY,
    READ_TIMEOUT_SECS,
};

use crate::cli::Args;

/// Default parent of the per-batch output directories.
pub const DEFAULT_OUTPUT_ROOT: &str = "images";

/// File-backed defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Parent of the per-batch output directory.
    pub output_root: Option<PathBuf>,
    /// Rows admitted per batch (1..=100).
    pub concurrency: Option<u8>,
    /// Fixed delay before each fetch in milliseconds.
    pub delay_ms: Option<u64>,
    /// Error log path.
    pub error_log: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&usize::from(concurrency))
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: {MIN_CONCURRENCY}..={MAX_CONCURRENCY}"
            );
        }

        if let Some(delay_ms) = self.delay_ms
            && delay_ms > MAX_DELAY_MS
        {
            bail!(
                "Invalid config value for `delay_ms`: {delay_ms}. Expected range: 0..={MAX_DELAY_MS}"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub error_log: PathBuf,
    pub concurrency: usize,
    pub delay: Duration,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

/// Merges CLI arguments over file config over defaults.
///
/// The batch name defaults to the input file stem, so `products.csv` lands
/// in `images/products/`.
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<Settings> {
    let file = file.cloned().unwrap_or_default();

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => {
            let batch = match &args.batch {
                Some(batch) => batch.clone(),
                None => batch_name_from_input(&args.input)?,
            };
            file.output_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
                .join(batch)
        }
    };

    let concurrency = args
        .concurrency
        .or(file.concurrency)
        .map_or(DEFAULT_CONCURRENCY, usize::from);
    let delay_ms = args.delay.or(file.delay_ms).unwrap_or(0);

    Ok(Settings {
        input: args.input.clone(),
        output_dir,
        error_log: args
            .error_log
            .clone()
            .or(file.error_log)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_LOG)),
        concurrency,
        delay: Duration::from_millis(delay_ms),
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    })
}

fn batch_name_from_input(input: &Path) -> Result<String> {
    let Some(stem) = input.file_stem().and_then(|s| s.to_str()) else {
        bail!(
            "Cannot derive a batch name from input '{}'; pass --batch or --output-dir",
            input.display()
        );
    };
    Ok(stem.to_string())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/sku-images/config.toml`
/// 2. `$HOME/.config/sku-images/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("sku-images")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("sku-images")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_root" => {
                cfg.output_root = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(context)?);
            }
            "delay_ms" => {
                cfg.delay_ms = Some(parse_integer_u64(value).with_context(context)?);
            }
            "error_log" => {
                cfg.error_log = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
