//! Applying description datasets to the plant store.
//!
//! [`apply_descriptions`] resolves the `plant_description` level from the
//! active configuration, picks the matching dataset and writes entry `i` to
//! plant id `i + 1`, one update per entry, in ascending id order.
//!
//! Updates are independent. A row that does not exist or a failing statement
//! is recorded in the [`ApplyReport`] and the loop moves on; nothing is
//! wrapped in a transaction and nothing is retried.

use crate::catalog::{Catalog, DescriptionDataset, DescriptionLevel, PLANT_DESCRIPTIONS_KEY};
use crate::remote_config::RemoteConfig;
use crate::store::{PlantStore, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The statement ran but matched no row.
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub id: i64,
    pub outcome: UpdateOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// The raw configuration value the level was resolved from.
    pub value: String,
    pub level: DescriptionLevel,
    pub results: Vec<UpdateResult>,
}

impl ApplyReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Updated))
    }

    pub fn missing(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Missing))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&UpdateOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Resolve the description level from `remote` and apply that dataset.
pub async fn apply_descriptions(
    remote: &RemoteConfig,
    catalog: &Catalog,
    store: &dyn PlantStore,
) -> ApplyReport {
    let value = remote.get_string(PLANT_DESCRIPTIONS_KEY);
    tracing::debug!("{} = {}", PLANT_DESCRIPTIONS_KEY, value);

    let level = DescriptionLevel::from_config_value(&value);
    if level == DescriptionLevel::Advanced && value != DescriptionLevel::Advanced.as_str() {
        tracing::debug!(value = %value, "unrecognized description level, using advanced");
    }

    let results = apply_dataset(catalog.dataset(level), store).await;
    ApplyReport {
        value,
        level,
        results,
    }
}

/// Write every entry of `dataset` to its plant id.
pub async fn apply_dataset(
    dataset: DescriptionDataset<'_>,
    store: &dyn PlantStore,
) -> Vec<UpdateResult> {
    let mut results = Vec::with_capacity(dataset.len());

    for (id, description) in dataset.targets() {
        let outcome = match store
            .update_description(description, &Selection::by_id(id))
            .await
        {
            Ok(0) => UpdateOutcome::Missing,
            Ok(_) => UpdateOutcome::Updated,
            Err(e) => {
                tracing::warn!(plant_id = id, error = %e, "description update failed");
                UpdateOutcome::Failed(e.to_string())
            }
        };
        results.push(UpdateResult { id, outcome });
    }

    results
}
