use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{PrefixTreeConfig, SourceConfig, ValidationError};

/// Top-level configuration for the delta engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DeltaConfig {
    #[serde(default)]
    pub prefix_tree: PrefixTreeConfig,
    #[serde(default)]
    pub sources: SourceConfig,
}

impl DeltaConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.prefix_tree.validate()?;
        self.sources.validate()
    }
}

impl Config for DeltaConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
