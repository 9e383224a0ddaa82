use std::collections::HashMap;

use crate::engine::{text_at, QueryResult};
use crate::phone::normalize_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactValueType {
    Phone,
    Email,
    Other,
}

impl ContactValueType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "phone" => ContactValueType::Phone,
            "email" => ContactValueType::Email,
            _ => ContactValueType::Other,
        }
    }
}

/// One joined contact row. Consumed once while building the identifier map
/// and dropped; missing fields arrive as empty strings, never as errors.
#[derive(Debug, Clone)]
pub struct RawContactRow {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub value_type: ContactValueType,
    pub value: String,
}

/// Normalized identifier (canonical phone or raw email) to display name.
/// Built once per import and shared read-only by both assemblers.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    entries: HashMap<String, String>,
}

impl IdentifierMap {
    /// Exact-key lookup; the only fuzziness is the phone normalization
    /// already applied when the map was built.
    pub fn resolve(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    /// Like `resolve`, but a contact whose display name came out empty does
    /// not shadow the raw identifier at use sites.
    pub fn display_name_for(&self, identifier: &str) -> Option<&str> {
        self.resolve(identifier).filter(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// "First Last (Organization)", trimmed. A row with no name data at all
/// yields an empty string.
pub fn display_name(first_name: &str, last_name: &str, organization: &str) -> String {
    let mut name = format!("{} {}", first_name, last_name);
    if !organization.is_empty() {
        name.push_str(&format!(" ({})", organization));
    }
    name.trim().to_string()
}

/// Later rows overwrite earlier ones on key collision; collisions are rare
/// and source row order is the only tie-break.
pub fn build_identifier_map(rows: &[RawContactRow], default_region: &str) -> IdentifierMap {
    let mut entries = HashMap::new();
    for row in rows {
        let name = display_name(&row.first_name, &row.last_name, &row.organization);
        let key = match row.value_type {
            ContactValueType::Email => row.value.clone(),
            _ => normalize_phone(&row.value, default_region),
        };
        entries.insert(key, name);
    }
    IdentifierMap { entries }
}

pub fn decode_contact_rows(result: &QueryResult) -> Vec<RawContactRow> {
    result
        .rows
        .iter()
        .map(|row| RawContactRow {
            first_name: text_at(row, 0),
            last_name: text_at(row, 1),
            organization: text_at(row, 2),
            value_type: ContactValueType::parse(&text_at(row, 3)),
            value: text_at(row, 4),
        })
        .collect()
}
