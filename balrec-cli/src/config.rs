use anyhow::{Context, Result};
use balrec_core::ReconConfig;
use clap::Args;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "balrec.toml";

/// Flags that override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file (default: ./balrec.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Header of the date column
    #[arg(long)]
    pub date_col: Option<String>,

    /// Header of the closing balance column
    #[arg(long)]
    pub closing_col: Option<String>,

    /// Largest absolute difference still treated as a match
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Read ambiguous dates as MM/DD instead of DD/MM
    #[arg(long)]
    pub month_first: bool,
}

impl ConfigArgs {
    /// Defaults, then the config file, then flags.
    pub fn resolve(&self) -> Result<ReconConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.exists() {
                    load_config(p)?
                } else {
                    ReconConfig::default()
                }
            }
        };

        if let Some(col) = &self.date_col {
            cfg.date_col = col.clone();
        }
        if let Some(col) = &self.closing_col {
            cfg.closing_col = col.clone();
        }
        if let Some(tol) = self.tolerance {
            cfg.tolerance = tol;
        }
        if self.month_first {
            cfg.dayfirst = false;
        }

        cfg.validate().context("invalid settings")?;
        Ok(cfg)
    }
}

pub fn load_config(path: &Path) -> Result<ReconConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    ReconConfig::from_toml(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    let s = ReconConfig::default().to_toml().context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
