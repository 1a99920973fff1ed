use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::foundation::error::{ScopeError, ScopeResult};
use crate::scene::model::{EventDef, ScopeOptions};

/// JSON input: `{ "events": [...], "options": {...} }`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct InputDocument {
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub options: ScopeOptions,
}

impl InputDocument {
    pub fn from_json_str(s: &str) -> ScopeResult<Self> {
        let doc: Self = serde_json::from_str(s)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_reader(r: impl Read) -> ScopeResult<Self> {
        let doc: Self = serde_json::from_reader(r)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ScopeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ScopeError::configuration(format!("open input JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ScopeResult<()> {
        if self.events.is_empty() {
            return Err(ScopeError::configuration("event set is empty"));
        }
        self.options.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
