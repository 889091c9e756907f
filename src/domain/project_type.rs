use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectType {
    #[default]
    Interior,
    Exterior,
}

impl ProjectType {
    pub const ALL: [ProjectType; 2] = [ProjectType::Interior, ProjectType::Exterior];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Interior => "interior",
            ProjectType::Exterior => "exterior",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = ParseProjectTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "interior" => Ok(ProjectType::Interior),
            "exterior" => Ok(ProjectType::Exterior),
            _ => Err(ParseProjectTypeError {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for ProjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProjectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProjectType::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProjectTypeError {
    value: String,
}

impl fmt::Display for ParseProjectTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid project type '{}': expected one of {}",
            self.value,
            ProjectType::ALL
                .iter()
                .map(|pt| pt.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseProjectTypeError {}
