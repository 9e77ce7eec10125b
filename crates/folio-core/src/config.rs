#![forbid(unsafe_code)]

//! Startup configuration for the navigation core.
//!
//! [`FolioConfig`] groups the section list and every timing/observer knob in
//! one struct that can be loaded from TOML or JSON. Every field has a default
//! equal to the stock portfolio layout, so `FolioConfig::default()` is a
//! complete configuration on its own.
//!
//! ```toml
//! home_section = "hero"
//! focus_class = "section-focus"
//!
//! [timing]
//! settle_ms = 800
//!
//! [[sections]]
//! id = "hero"
//! label = "Home"
//! icon = "home"
//! ```

use std::collections::HashSet;
use std::path::Path;

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::section::{SectionIcon, is_valid_section_id};

/// Delay before re-scanning for section elements missing at observer setup.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);
/// Window after a programmatic scroll starts during which observer feedback
/// is suppressed.
pub const SETTLE_DELAY: Duration = Duration::from_millis(800);
/// How long the transient focus marker stays on a target section.
pub const FOCUS_MARKER_DURATION: Duration = Duration::from_millis(1000);

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Sections in page order.
    pub sections: Vec<SectionConfig>,
    /// Section addressed by `/`. Defaults to the first section.
    pub home_section: Option<String>,
    pub timing: TimingConfig,
    pub observer: ObserverConfig,
    /// CSS class toggled on a section while it holds transient focus.
    pub focus_class: String,
    /// Element id of the scroll container, if the layout scrolls inside one.
    pub scroll_container_id: Option<String>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            sections: vec![
                SectionConfig::new("hero", "Home", SectionIcon::Home),
                SectionConfig::new("tech-stack", "Tech Stack", SectionIcon::Code),
                SectionConfig::new("projects", "Projects", SectionIcon::Folder),
                SectionConfig::new("experience", "Experience", SectionIcon::Briefcase),
                SectionConfig::new("philosophy", "Philosophy", SectionIcon::Lightbulb),
                SectionConfig::new("contact", "Contact", SectionIcon::Mail),
            ],
            home_section: None,
            timing: TimingConfig::default(),
            observer: ObserverConfig::default(),
            focus_class: "section-focus".to_owned(),
            scroll_container_id: Some("main-scroll".to_owned()),
        }
    }
}

/// One section entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: SectionIcon,
}

impl SectionConfig {
    #[must_use]
    pub fn new(id: &str, label: &str, icon: SectionIcon) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            icon,
        }
    }
}

/// Fixed delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub retry_ms: u64,
    pub settle_ms: u64,
    pub focus_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_ms: RETRY_DELAY.as_millis() as u64,
            settle_ms: SETTLE_DELAY.as_millis() as u64,
            focus_ms: FOCUS_MARKER_DURATION.as_millis() as u64,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }

    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub const fn focus(&self) -> Duration {
        Duration::from_millis(self.focus_ms)
    }
}

/// Intersection observer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Fraction of a section that must be visible to count as entered.
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin: "0px".to_owned(),
        }
    }
}

impl FolioConfig {
    /// Load from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check every field; an empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sections.is_empty() {
            errors.push("sections: at least one section is required".to_owned());
        }
        if self.sections.len() > usize::from(u16::MAX) {
            errors.push(format!("sections: too many sections ({})", self.sections.len()));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if !is_valid_section_id(&section.id) {
                errors.push(format!(
                    "sections: id {:?} must be lowercase ascii, digits or '-'",
                    section.id
                ));
            }
            if !seen.insert(section.id.as_str()) {
                errors.push(format!("sections: duplicate id {:?}", section.id));
            }
        }

        if let Some(home) = &self.home_section {
            if !self.sections.iter().any(|s| &s.id == home) {
                errors.push(format!("home_section: {home:?} is not a registered section"));
            }
        }

        if !(self.observer.threshold > 0.0 && self.observer.threshold <= 1.0) {
            errors.push(format!(
                "observer.threshold must be in (0, 1], got {}",
                self.observer.threshold
            ));
        }
        if self.timing.settle_ms == 0 {
            errors.push("timing.settle_ms must be > 0".to_owned());
        }
        if self.focus_class.trim().is_empty() {
            errors.push("focus_class must not be empty".to_owned());
        }

        errors
    }
}

/// Errors from loading a [`FolioConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates_clean() {
        assert!(FolioConfig::default().validate().is_empty());
    }

    #[test]
    fn default_timing_matches_constants() {
        let timing = TimingConfig::default();
        assert_eq!(timing.retry(), RETRY_DELAY);
        assert_eq!(timing.settle(), SETTLE_DELAY);
        assert_eq!(timing.focus(), FOCUS_MARKER_DURATION);
    }

    #[test]
    fn validate_catches_duplicate_and_bad_ids() {
        let mut config = FolioConfig::default();
        config.sections.push(SectionConfig::new("hero", "Again", SectionIcon::Home));
        config.sections.push(SectionConfig::new("About Me", "About", SectionIcon::Home));
        let errors = config.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn validate_catches_unknown_home() {
        let config = FolioConfig {
            home_section: Some("blog".into()),
            ..FolioConfig::default()
        };
        assert!(config.validate()[0].contains("home_section"));
    }

    #[test]
    fn validate_catches_bad_threshold() {
        let mut config = FolioConfig::default();
        config.observer.threshold = 0.0;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn empty_sections_rejected() {
        let config = FolioConfig {
            sections: Vec::new(),
            home_section: None,
            ..FolioConfig::default()
        };
        assert!(!config.validate().is_empty());
    }

    #[test]
    fn partial_json_override_preserves_defaults() {
        let config = FolioConfig::from_json_str(r#"{"timing":{"settle_ms":600}}"#).unwrap();
        assert_eq!(config.timing.settle_ms, 600);
        assert_eq!(config.timing.retry_ms, 500);
        assert_eq!(config.sections.len(), 6);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn toml_sections_replace_defaults() {
        let config = FolioConfig::from_toml_str(
            r#"
            home_section = "intro"

            [[sections]]
            id = "intro"
            label = "Intro"

            [[sections]]
            id = "work"
            label = "Work"
            icon = "briefcase"
            "#,
        )
        .unwrap();
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[1].icon, SectionIcon::Briefcase);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn json_syntax_error_reported() {
        let err = FolioConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, serde_json::to_string(&FolioConfig::default()).unwrap()).unwrap();
        assert_eq!(FolioConfig::from_json_file(&path).unwrap(), FolioConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FolioConfig::from_json_file("/nonexistent/folio.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
