use std::ops::RangeInclusive;

use lineage_core::{EngineConfig, ViewMode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=1000;
pub const MAX_ASSET_PAGES_RANGE: RangeInclusive<u32> = 1..=100_000;

/// Session settings. Every field has a default, so a partial JSON document
/// only overrides what it names.
///
/// ```json
/// {
///   "default_view_mode": "actual",
///   "page_size": 250,
///   "layout": { "level_spacing": 360.0 },
///   "classifier": { "edge_rules": [] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Layout constants and stage rule tables.
    #[serde(flatten)]
    pub engine: EngineConfig,
    /// View mode a new session starts in.
    pub default_view_mode: ViewMode,
    /// Assets requested per page from the asset source.
    pub page_size: u32,
    /// Upper bound on pages fetched for one snapshot.
    pub max_asset_pages: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            default_view_mode: ViewMode::Hierarchical,
            page_size: 100,
            max_asset_pages: 1000,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_range("page_size", self.page_size, &PAGE_SIZE_RANGE)?;
        check_range("max_asset_pages", self.max_asset_pages, &MAX_ASSET_PAGES_RANGE)?;

        let layout = &self.engine.layout;
        check_positive("layout.level_spacing", layout.level_spacing)?;
        check_positive("layout.node_spacing", layout.node_spacing)?;
        check_non_negative("layout.group_gap", layout.group_gap)?;
        check_non_negative("layout.top_margin", layout.top_margin)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SessionError::Config {
            name,
            reason: format!(
                "{} is outside {}..={}",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SessionError::Config {
            name,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SessionError::Config {
            name,
            reason: format!("must be non-negative, got {}", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = SessionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.engine.layout.level_spacing, 300.0);
        assert_eq!(cfg.default_view_mode, ViewMode::Hierarchical);
    }

    #[test]
    fn test_partial_json_overrides() {
        let cfg = SessionConfig::from_json(
            r#"{"default_view_mode": "actual", "page_size": 250, "layout": {"level_spacing": 360.0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.default_view_mode, ViewMode::Actual);
        assert_eq!(cfg.page_size, 250);
        assert_eq!(cfg.engine.layout.level_spacing, 360.0);
        assert_eq!(cfg.engine.layout.node_spacing, 100.0);
        assert_eq!(cfg.max_asset_pages, 1000);
    }

    #[test]
    fn test_page_size_out_of_range() {
        let err = SessionConfig::from_json(r#"{"page_size": 0}"#).unwrap_err();
        assert!(matches!(err, SessionError::Config { name: "page_size", .. }));
    }

    #[test]
    fn test_negative_spacing_rejected() {
        let err = SessionConfig::from_json(r#"{"layout": {"node_spacing": -5.0}}"#).unwrap_err();
        assert!(matches!(err, SessionError::Config { name: "layout.node_spacing", .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SessionConfig::from_json("{page_size:"),
            Err(SessionError::Json(_))
        ));
    }
}
