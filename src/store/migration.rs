use std::collections::BTreeMap;

use crate::domain::features::{FeatureDefinition, FeatureTaxonomy, StoredFeature, StoredTaxonomy};
use crate::domain::palette::color_at;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub taxonomy: FeatureTaxonomy,
    /// Number of bare-string entries that were upgraded.
    pub upgraded: usize,
}

impl Migration {
    pub fn changed(&self) -> bool {
        self.upgraded > 0
    }
}

/// Upgrades bare feature names to `{name, color}`, picking the color from
/// `palette` by the entry's position within its type's list. Entries already
/// in the current shape pass through untouched.
pub fn migrate_taxonomy(stored: StoredTaxonomy, palette: &[&str]) -> Migration {
    let mut upgraded = 0usize;
    let mut by_type = BTreeMap::new();
    for (project_type, entries) in stored {
        let features: Vec<FeatureDefinition> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                StoredFeature::Current(definition) => definition,
                StoredFeature::Legacy(name) => {
                    upgraded += 1;
                    FeatureDefinition {
                        name,
                        color: color_at(palette, index),
                        icon: None,
                    }
                }
            })
            .collect();
        by_type.insert(project_type, features);
    }
    Migration {
        taxonomy: FeatureTaxonomy::new(by_type),
        upgraded,
    }
}

impl FeatureTaxonomy {
    pub fn to_stored(&self) -> StoredTaxonomy {
        self.by_type()
            .iter()
            .map(|(project_type, features)| {
                (
                    *project_type,
                    features
                        .iter()
                        .cloned()
                        .map(StoredFeature::Current)
                        .collect(),
                )
            })
            .collect()
    }
}
