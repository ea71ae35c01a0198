use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::series::Timeframe;
use crate::swipe::SwipeConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub swipe: SwipeConfig,
    /// Timeframe a chart opens on
    pub default_timeframe: Timeframe,
}

impl Config {
    /// Defaults overridden by `VITALS_*` variables, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("VITALS_SWIPE_THRESHOLD") {
            config.swipe.threshold = v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("VITALS_SWIPE_THRESHOLD={}", v))?;
        }
        if let Some(v) = lookup("VITALS_SWIPE_BUTTON_WIDTH") {
            config.swipe.button_width = v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("VITALS_SWIPE_BUTTON_WIDTH={}", v))?;
        }
        if let Some(v) = lookup("VITALS_DEFAULT_TIMEFRAME") {
            config.default_timeframe = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let SwipeConfig {
            threshold,
            button_width,
        } = self.swipe;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(anyhow!("Swipe threshold must be positive, got {}", threshold));
        }
        if !(button_width.is_finite() && button_width > 0.0) {
            return Err(anyhow!(
                "Swipe button width must be positive, got {}",
                button_width
            ));
        }
        Ok(())
    }
}
