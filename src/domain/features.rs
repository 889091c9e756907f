use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::palette::is_hex_color;
use super::project_type::ProjectType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureDefinition {
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Feature names per project type, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FeatureTaxonomy(BTreeMap<ProjectType, Vec<FeatureDefinition>>);

impl Default for FeatureTaxonomy {
    fn default() -> Self {
        Self(
            ProjectType::ALL
                .iter()
                .map(|project_type| (*project_type, Vec::new()))
                .collect(),
        )
    }
}

impl FeatureTaxonomy {
    pub fn new(by_type: BTreeMap<ProjectType, Vec<FeatureDefinition>>) -> Self {
        let mut taxonomy = Self(by_type);
        taxonomy.fill_missing_types();
        taxonomy
    }

    pub fn features_for(&self, project_type: ProjectType) -> &[FeatureDefinition] {
        self.0.get(&project_type).map_or(&[], Vec::as_slice)
    }

    pub fn by_type(&self) -> &BTreeMap<ProjectType, Vec<FeatureDefinition>> {
        &self.0
    }

    /// Every feature name across all types. Validity is deliberately not
    /// scoped to a record's own type.
    pub fn all_names(&self) -> HashSet<&str> {
        self.0
            .values()
            .flat_map(|features| features.iter().map(|feature| feature.name.as_str()))
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (project_type, features) in &self.0 {
            let mut seen = HashSet::new();
            for feature in features {
                let name = feature.name.trim();
                if name.is_empty() {
                    return Err(format!("{project_type} feature names cannot be empty"));
                }
                if !seen.insert(name) {
                    return Err(format!(
                        "duplicate {project_type} feature '{name}'"
                    ));
                }
                if !is_hex_color(&feature.color) {
                    return Err(format!(
                        "feature '{}' has invalid color '{}'; expected #RRGGBB",
                        name, feature.color
                    ));
                }
            }
        }
        Ok(())
    }

    fn fill_missing_types(&mut self) {
        for project_type in ProjectType::ALL {
            self.0.entry(project_type).or_default();
        }
    }
}

/// On-disk entry shape: either the current object or a bare legacy name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StoredFeature {
    Legacy(String),
    Current(FeatureDefinition),
}

pub type StoredTaxonomy = BTreeMap<ProjectType, Vec<StoredFeature>>;
