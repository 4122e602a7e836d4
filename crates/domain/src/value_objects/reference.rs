use serde::{Deserialize, Serialize};

/// Pointer to a rules resource: condition, skill or monster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiReference {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl ApiReference {
    pub fn new(index: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            name: name.into(),
            url: String::new(),
        }
    }

    /// Skill entry offered to the DM when requesting an initiative roll.
    pub fn initiative() -> Self {
        Self::new("initiative", "Initiative")
    }
}

/// Paged listing envelope used by the rules API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceList {
    pub count: usize,
    pub results: Vec<ApiReference>,
}

impl ResourceList {
    pub fn from_results(results: Vec<ApiReference>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }

    /// Prepend an entry unless one with the same index is already listed.
    pub fn with_leading(mut self, reference: ApiReference) -> Self {
        if !self.results.iter().any(|r| r.index == reference.index) {
            self.results.insert(0, reference);
            self.count = self.results.len();
        }
        self
    }
}
