use serde::{Deserialize, Serialize};

/// Renaming contract for one field crossing a server boundary: the value
/// produced under `source_field` on `source_server` is expected as
/// `dest_field` by tools on `dest_server`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source_server: String,
    pub source_field: String,
    pub dest_server: String,
    pub dest_field: String,
}

/// The full mapping table, validated at load time to be injective per
/// destination server so no translation can silently overwrite a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMappings {
    entries: Vec<FieldMapping>,
}

impl FieldMappings {
    pub(super) fn new(entries: Vec<FieldMapping>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    /// Destination field name for a source field travelling between the two
    /// given servers, if one is registered.
    pub fn destination(
        &self,
        source_server: &str,
        source_field: &str,
        dest_server: &str,
    ) -> Option<&str> {
        self.entries
            .iter()
            .find(|mapping| {
                mapping.source_server == source_server
                    && mapping.source_field == source_field
                    && mapping.dest_server == dest_server
            })
            .map(|mapping| mapping.dest_field.as_str())
    }
}
