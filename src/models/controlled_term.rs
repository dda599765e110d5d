//! Controlled terms (annotations) such as `Life Stage` / `Adult`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlledTermValue {
    pub id: u64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlledTerm {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub values: Vec<ControlledTermValue>,
}

impl ControlledTerm {
    /// Case-insensitive match on the term label.
    pub fn matches(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label)
    }

    pub fn value(&self, label: &str) -> Option<&ControlledTermValue> {
        self.values
            .iter()
            .find(|v| v.label.eq_ignore_ascii_case(label))
    }
}
