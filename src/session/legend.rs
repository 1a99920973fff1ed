use crate::foundation::core::Rgba8;
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::playback::state::ActiveCategories;
use crate::scene::model::{CategoryId, LegendEntryDef};

/// One clickable legend key, with its current state.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LegendKey {
    pub category: CategoryId,
    pub label: String,
    pub color: Option<Rgba8>,
    /// Image source drawn instead of a colored circle.
    pub shape: Option<String>,
    pub active: bool,
}

/// Legend entries laid out `columns` per row. Rendering the rows is the host's job.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Legend {
    entries: Vec<LegendEntryDef>,
    columns: usize,
}

impl Legend {
    pub fn new(entries: Vec<LegendEntryDef>, columns: usize) -> ScopeResult<Self> {
        if columns == 0 {
            return Err(ScopeError::configuration("legend needs at least one column"));
        }
        Ok(Self { entries, columns })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.entries.iter().map(|e| &e.category)
    }

    /// Keys in entry order, a new row every `columns` entries.
    pub fn rows(&self, active: &ActiveCategories) -> Vec<Vec<LegendKey>> {
        self.entries
            .chunks(self.columns)
            .map(|row| {
                row.iter()
                    .map(|e| LegendKey {
                        category: e.category.clone(),
                        label: e.label.clone(),
                        color: e.color,
                        shape: e.shape.clone(),
                        active: active.is_active(&e.category),
                    })
                    .collect()
            })
            .collect()
    }

    /// Filter with every legend category switched off.
    pub fn none_active(&self) -> ActiveCategories {
        ActiveCategories::only(self.categories(), &Default::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/legend.rs"]
mod tests;
