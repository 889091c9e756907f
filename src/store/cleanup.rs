use serde::Serialize;

use crate::domain::features::FeatureTaxonomy;

use super::errors::StoreError;
use super::projects::ProjectRepository;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Records rewritten.
    pub cleaned: usize,
    /// Feature references dropped across all records.
    pub removed: usize,
}

/// Drops feature names that no taxonomy type defines. A name defined for any
/// type counts as valid on every record.
pub fn remove_undefined_features(
    repository: &ProjectRepository,
    taxonomy: &FeatureTaxonomy,
) -> Result<CleanupSummary, StoreError> {
    let valid = taxonomy.all_names();
    let mut summary = CleanupSummary::default();

    for mut project in repository.list() {
        let before = project.features.len();
        project
            .features
            .retain(|feature| valid.contains(feature.as_str()));
        let dropped = before - project.features.len();
        if dropped == 0 {
            continue;
        }
        repository.write_metadata(&project)?;
        summary.cleaned += 1;
        summary.removed += dropped;
    }

    Ok(summary)
}
