#![forbid(unsafe_code)]

//! Section registry: the single ordered map from section id to metadata.
//!
//! Every other component refers to sections through [`SectionKey`] handles
//! minted by a [`SectionRegistry`]. Raw strings only enter at the boundary
//! ([`SectionRegistry::resolve`], [`SectionRegistry::resolve_path`]), so a
//! mistyped id fails exactly once, at lookup, instead of silently at every
//! call site.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, FolioConfig, SectionConfig};

/// Icon shown next to a section in navigation menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionIcon {
    #[default]
    Home,
    Code,
    Folder,
    Briefcase,
    Lightbulb,
    Mail,
}

impl SectionIcon {
    /// Stable name for the host's icon set.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Code => "code",
            Self::Folder => "folder",
            Self::Briefcase => "briefcase",
            Self::Lightbulb => "lightbulb",
            Self::Mail => "mail",
        }
    }
}

/// Index handle for a registered section.
///
/// Only a [`SectionRegistry`] creates keys, so holding one proves the
/// section exists. Keys are not meaningful across registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey(u16);

impl SectionKey {
    /// Ordinal position in the registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_index(idx: usize) -> Self {
        Self(idx as u16)
    }
}

/// One anchorable region of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: String,
    label: String,
    icon: SectionIcon,
}

impl Section {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn icon(&self) -> SectionIcon {
        self.icon
    }
}

/// Ordered, immutable set of sections plus the designated home section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRegistry {
    sections: Vec<Section>,
    home: SectionKey,
}

impl SectionRegistry {
    /// Build from validated configuration.
    pub fn from_config(config: &FolioConfig) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        Ok(Self::build(config))
    }

    /// The six-section portfolio layout used when no config is supplied.
    #[must_use]
    pub fn portfolio() -> Self {
        Self::build(&FolioConfig::default())
    }

    fn build(config: &FolioConfig) -> Self {
        let sections: Vec<Section> = config
            .sections
            .iter()
            .map(|SectionConfig { id, label, icon }| Section {
                id: id.clone(),
                label: label.clone(),
                icon: *icon,
            })
            .collect();
        let home = config
            .home_section
            .as_deref()
            .and_then(|home| sections.iter().position(|s| s.id == home))
            .unwrap_or(0);
        Self {
            sections,
            home: SectionKey(home as u16),
        }
    }

    /// Look up a section by id.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<SectionKey> {
        self.sections
            .iter()
            .position(|s| s.id == id)
            .map(|idx| SectionKey(idx as u16))
    }

    #[must_use]
    pub fn get(&self, key: SectionKey) -> &Section {
        &self.sections[key.index()]
    }

    #[must_use]
    pub fn id(&self, key: SectionKey) -> &str {
        &self.get(key).id
    }

    /// First registered section; the initial active section.
    #[must_use]
    pub const fn first(&self) -> SectionKey {
        SectionKey(0)
    }

    /// Section addressed by the root path.
    #[must_use]
    pub const fn home(&self) -> SectionKey {
        self.home
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate `(key, section)` pairs in page order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &Section)> + '_ {
        self.sections
            .iter()
            .enumerate()
            .map(|(idx, section)| (SectionKey(idx as u16), section))
    }

    /// URL path for a section: `/` for home, `/<id>` otherwise.
    #[must_use]
    pub fn path_for(&self, key: SectionKey) -> String {
        if key == self.home {
            "/".to_owned()
        } else {
            format!("/{}", self.id(key))
        }
    }

    /// Section entries in page order, as configuration.
    #[must_use]
    pub fn section_configs(&self) -> Vec<SectionConfig> {
        self.sections
            .iter()
            .map(|s| SectionConfig::new(&s.id, &s.label, s.icon))
            .collect()
    }

    /// Map a URL path back to a section.
    ///
    /// The root path (and an empty path) maps to home. Any other path must be
    /// a single registered segment; trailing slashes are tolerated.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<SectionKey> {
        let segment = path.trim_matches('/');
        if segment.is_empty() {
            return Some(self.home);
        }
        if segment.contains('/') {
            return None;
        }
        self.resolve(segment)
    }
}

/// Whether `id` can double as a URL path segment.
pub(crate) fn is_valid_section_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
