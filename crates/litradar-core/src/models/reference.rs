use serde::{Deserialize, Serialize};

use crate::keys::{Keyed, non_blank};

/// Read-only identity projection of a catalogued reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingReference {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ExistingReference {
    pub fn new(title: Option<&str>, doi: Option<&str>) -> Self {
        Self {
            title: title.map(ToOwned::to_owned),
            doi: doi.map(ToOwned::to_owned),
            url: None,
        }
    }
}

impl Keyed for ExistingReference {
    fn doi(&self) -> Option<&str> {
        self.doi.as_deref().and_then(non_blank)
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().and_then(non_blank)
    }
}
