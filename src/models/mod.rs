//! Data models for tender records and the field mapping that drives extraction

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder written in place of a field whose position does not exist on the page.
pub const SCRAPE_ERROR: &str = "Scrape Error";

/// Keys every record carries regardless of the field mapping.
pub const RESERVED_KEYS: [&str; 3] = ["id", "source_url", "source_agency"];

/// Location of a value on a detail page: table index, then cell index within
/// that table's flattened `td` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPosition(pub usize, pub usize);

impl FieldPosition {
    pub fn table(self) -> usize {
        self.0
    }

    pub fn cell(self) -> usize {
        self.1
    }
}

/// A named field and where to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub position: FieldPosition,
}

/// Ordered field mapping. Order follows the configuration document and is
/// the order fields appear in emitted records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<FieldSpec>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing the position of an existing field with the same name.
    pub fn insert(&mut self, name: impl Into<String>, position: FieldPosition) {
        let name = name.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.position = position,
            None => self.fields.push(FieldSpec { name, position }),
        }
    }

    pub fn get(&self, name: &str) -> Option<FieldPosition> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldPosition)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (S, FieldPosition)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (name, position) in iter {
            mapping.insert(name, position);
        }
        mapping
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = FieldMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to [table_index, cell_index] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = FieldMapping::new();
                while let Some((name, position)) = access.next_entry::<String, FieldPosition>()? {
                    mapping.insert(name, position);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// Value extracted for one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// The mapped table or cell does not exist on the page.
    Unavailable,
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Unavailable => SCRAPE_ERROR,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// One tender, as scraped from its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderRecord {
    pub id: String,
    pub fields: Vec<(String, FieldValue)>,
    pub source_url: String,
    pub source_agency: Option<String>,
}

impl TenderRecord {
    /// Looks up any key of the serialized record, fixed keys included.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "id" => Some(&self.id),
            "source_url" => Some(&self.source_url),
            "source_agency" => self.source_agency.as_deref(),
            _ => self
                .fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Names of the fields that fell back to the sentinel.
    pub fn unavailable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, value)| value.is_unavailable())
            .map(|(name, _)| name.as_str())
    }
}

impl Serialize for TenderRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + 2 + usize::from(self.source_agency.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value.as_str())?;
        }
        map.serialize_entry("source_url", &self.source_url)?;
        if let Some(agency) = &self.source_agency {
            map.serialize_entry("source_agency", agency)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TenderRecord {
        TenderRecord {
            id: "12345".to_string(),
            fields: vec![
                ("title".to_string(), FieldValue::Text("Road works".to_string())),
                ("closing_date".to_string(), FieldValue::Unavailable),
            ],
            source_url: "https://portal.example/detail?No_Proj=12345".to_string(),
            source_agency: None,
        }
    }

    #[test]
    fn serializes_keys_in_record_order() {
        let mut record = record();
        record.source_agency = Some("JKR".to_string());

        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"id":"12345","title":"Road works","closing_date":"Scrape Error","source_url":"https://portal.example/detail?No_Proj=12345","source_agency":"JKR"}"#
        );
    }

    #[test]
    fn omits_agency_until_set() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("source_agency").is_none());
    }

    #[test]
    fn get_covers_fixed_and_mapped_keys() {
        let record = record();
        assert_eq!(record.get("id"), Some("12345"));
        assert_eq!(record.get("title"), Some("Road works"));
        assert_eq!(record.get("closing_date"), Some(SCRAPE_ERROR));
        assert_eq!(record.get("nope"), None);
        assert_eq!(record.unavailable_fields().collect::<Vec<_>>(), ["closing_date"]);
    }

    #[test]
    fn mapping_keeps_document_order() {
        let mapping: FieldMapping =
            serde_json::from_str(r#"{"zeta": [1, 4], "alpha": [0, 2], "mid": [2, 0]}"#).unwrap();

        let names: Vec<_> = mapping.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(mapping.get("alpha"), Some(FieldPosition(0, 2)));
    }

    #[test]
    fn mapping_rejects_malformed_positions() {
        assert!(serde_json::from_str::<FieldMapping>(r#"{"title": [0]}"#).is_err());
        assert!(serde_json::from_str::<FieldMapping>(r#"{"title": "0,2"}"#).is_err());
        // no from-the-end indexing
        assert!(serde_json::from_str::<FieldMapping>(r#"{"title": [-1, 3]}"#).is_err());
    }
}
