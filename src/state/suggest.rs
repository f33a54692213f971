/// Autocomplete for free-text fields
///
/// Suggestions come from what is already in the library, so a clay body
/// or glaze typed once is offered again everywhere.

use tracing::debug;

use super::library::Library;
use crate::store::StoreError;

/// Most suggestions offered at once
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestField {
    Clay,
    Glaze,
    Color,
    KilnTag,
}

impl SuggestField {
    /// Distinct non-empty values, byte-wise sorted
    fn query(self) -> &'static str {
        match self {
            SuggestField::Clay => {
                "SELECT DISTINCT clay_type FROM item
                 WHERE clay_type IS NOT NULL AND clay_type <> '' ORDER BY clay_type"
            }
            SuggestField::Glaze => {
                "SELECT DISTINCT name FROM glaze_entry WHERE name <> '' ORDER BY name"
            }
            SuggestField::Color => {
                "SELECT DISTINCT name FROM color_entry WHERE name <> '' ORDER BY name"
            }
            SuggestField::KilnTag => {
                "SELECT DISTINCT kiln_load_tag FROM stage_log
                 WHERE kiln_load_tag IS NOT NULL AND kiln_load_tag <> '' ORDER BY kiln_load_tag"
            }
        }
    }
}

impl Library {
    /// Every value already used for a field
    pub fn distinct_values(&self, field: SuggestField) -> Result<Vec<String>, StoreError> {
        let conn = self.read()?;
        let mut stmt = conn.prepare_cached(field.query())?;
        let values = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }

    /// Up to `MAX_SUGGESTIONS` values containing `query`, ignoring case.
    /// An empty query offers the first values.
    pub fn suggestions(&self, field: SuggestField, query: &str) -> Result<Vec<String>, StoreError> {
        let needle = query.to_lowercase();
        let suggestions: Vec<String> = self
            .distinct_values(field)?
            .into_iter()
            .filter(|value| needle.is_empty() || value.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .collect();
        debug!(field = ?field, query, count = suggestions.len(), "suggestions");
        Ok(suggestions)
    }
}
