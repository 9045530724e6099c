use anyhow::{Context, Result};
use recoverable_ecdsa::{Curve, CurveId};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub curve: CurveConfig,
    #[serde(default)]
    pub multisig: MultiSigConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurveConfig {
    pub name: CurveId, // "p224" or "p256"
}

impl CurveConfig {
    pub fn curve(&self) -> &'static Curve {
        self.name.curve()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MultiSigConfig {
    #[serde(default = "default_partners")]
    pub partners: u16,
}

impl Default for MultiSigConfig {
    fn default() -> Self {
        MultiSigConfig {
            partners: default_partners(),
        }
    }
}

fn default_partners() -> u16 {
    2
}

impl ConfigFile {
    pub fn load(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=255).contains(&self.multisig.partners) {
            anyhow::bail!(
                "Invalid partners: {}. Must be between 1 and 255",
                self.multisig.partners
            );
        }
        Ok(())
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve.curve()
    }

    /// Group size as stamped on partner keys. Call `validate` first.
    pub fn partners(&self) -> u8 {
        u8::try_from(self.multisig.partners).unwrap_or(u8::MAX)
    }
}
