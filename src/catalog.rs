//! Bundled plant catalog and description datasets.
//!
//! The catalog ships inside the binary (`resources/plants.toml`). It holds the
//! seed rows for the plant store and two positional description datasets:
//! entry `i` of a dataset describes the plant with store id `i + 1`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;

/// Remote config key selecting the description dataset.
pub const PLANT_DESCRIPTIONS_KEY: &str = "plant_description";

/// Level string that selects the basic dataset. Any other value selects the
/// advanced one.
pub const DEFAULT_DESCRIPTION_LEVEL: &str = "basic";

const BUNDLED_CATALOG: &str = include_str!("../resources/plants.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionLevel {
    Basic,
    Advanced,
}

impl DescriptionLevel {
    /// Map a configuration value to a level.
    ///
    /// This is a binary branch: only an exact match on
    /// [`DEFAULT_DESCRIPTION_LEVEL`] selects [`Basic`](Self::Basic). Empty
    /// strings and unrecognized values fall through to
    /// [`Advanced`](Self::Advanced).
    pub fn from_config_value(value: &str) -> Self {
        if value == DEFAULT_DESCRIPTION_LEVEL {
            DescriptionLevel::Basic
        } else {
            DescriptionLevel::Advanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionLevel::Basic => "basic",
            DescriptionLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DescriptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seed row for the plant store.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantSeed {
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    plants: Vec<PlantSeed>,
    descriptions: DescriptionsFile,
}

#[derive(Debug, Deserialize)]
struct DescriptionsFile {
    basic: Vec<String>,
    advanced: Vec<String>,
}

/// An ordered set of descriptions, selected wholesale by level.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionDataset<'a> {
    pub level: DescriptionLevel,
    pub entries: &'a [String],
}

impl<'a> DescriptionDataset<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs of `(store id, description)`, ids starting at 1.
    pub fn targets(self) -> impl Iterator<Item = (i64, &'a str)> + 'a {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, text)| (i as i64 + 1, text.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    plants: Vec<PlantSeed>,
    basic: Vec<String>,
    advanced: Vec<String>,
}

impl Catalog {
    pub fn new(plants: Vec<PlantSeed>, basic: Vec<String>, advanced: Vec<String>) -> Self {
        Self {
            plants,
            basic,
            advanced,
        }
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CATALOG).context("Bundled plant catalog is invalid")
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text)?;

        // Seeding pairs plant i with basic description i.
        if file.plants.len() != file.descriptions.basic.len() {
            bail!(
                "catalog has {} plants but {} basic descriptions",
                file.plants.len(),
                file.descriptions.basic.len()
            );
        }

        Ok(Self::new(
            file.plants,
            file.descriptions.basic,
            file.descriptions.advanced,
        ))
    }

    pub fn plants(&self) -> &[PlantSeed] {
        &self.plants
    }

    pub fn dataset(&self, level: DescriptionLevel) -> DescriptionDataset<'_> {
        let entries = match level {
            DescriptionLevel::Basic => &self.basic,
            DescriptionLevel::Advanced => &self.advanced,
        };
        DescriptionDataset { level, entries }
    }
}
