use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping stored next to the component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Free-form notes; omitted from the file when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl ComponentMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created: now,
            modified: now,
            notes: String::new(),
        }
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.modified = Utc::now().max(self.created);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_never_precedes_creation() {
        let mut m = ComponentMetadata::new("drawer");
        m.touch();
        assert!(m.modified >= m.created);
        assert_eq!(m.name, "drawer");
    }
}
