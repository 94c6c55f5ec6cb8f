use crate::error::ProcessingError;
use crate::models::{CategoryDescriptor, FieldCatalog, FieldValue, SubFieldKind};
use crate::utils::constants::{
    ADDITIONAL_DATA_MARKER, CATEGORY_CODE_LEN, ELEMENT_QUALITY_MARKER, ORIGINAL_OBSERVATION_MARKER,
    REMARKS_MARKER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Variable-length section after the mandatory part, with the leading `ADD`
/// marker removed and everything from the first remarks, quality or original
/// observation marker dropped
pub fn additional_remainder(tail: &str) -> &str {
    let rest = tail.strip_prefix(ADDITIONAL_DATA_MARKER).unwrap_or(tail);
    let end = [REMARKS_MARKER, ELEMENT_QUALITY_MARKER, ORIGINAL_OBSERVATION_MARKER]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Which additional-data categories become columns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    /// Mandatory columns only
    #[default]
    None,
    /// Every category seen at least once in the batch
    All,
    /// Listed categories that are seen at least once in the batch
    Only(Vec<String>),
}

impl CategorySelection {
    /// Parse a comma separated list of codes, case-insensitive
    pub fn from_list(list: &str) -> Self {
        let codes: Vec<String> = list
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        CategorySelection::Only(codes)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CategorySelection::None)
    }

    /// Listed codes of an allow-list
    pub fn codes(&self) -> Option<&[String]> {
        match self {
            CategorySelection::Only(codes) => Some(codes),
            _ => None,
        }
    }
}

/// Positions of the category segments inside one record's remainder.
///
/// Segments are tokenized left to right: a known code whose payload fits is
/// recorded and skipped over; anything else stops tokenization and leaves an
/// untokenized tail. Codes that were not tokenized are looked up in that tail
/// by first occurrence, with the payload running to the end of the tail.
#[derive(Debug, Clone)]
pub struct SegmentIndex<'a> {
    segments: HashMap<&'a str, &'a str>,
    order: Vec<&'a str>,
    tail: &'a str,
}

impl<'a> SegmentIndex<'a> {
    pub fn tokenize(remainder: &'a str, catalog: &FieldCatalog) -> Self {
        let mut segments = HashMap::new();
        let mut order = Vec::new();
        let mut pos = 0;

        while pos < remainder.len() {
            let Some(code) = remainder.get(pos..pos + CATEGORY_CODE_LEN) else {
                break;
            };
            let Some(descriptor) = catalog.get(code) else {
                break;
            };
            let payload_start = pos + CATEGORY_CODE_LEN;
            let Some(payload) = remainder.get(payload_start..payload_start + descriptor.payload_len())
            else {
                break;
            };

            if !segments.contains_key(code) {
                segments.insert(code, payload);
                order.push(code);
            }
            pos = payload_start + payload.len();
        }

        Self {
            segments,
            order,
            tail: remainder.get(pos..).unwrap_or_default(),
        }
    }

    /// Payload following `code`, if the record carries it
    pub fn payload(&self, code: &str) -> Option<&'a str> {
        if let Some(payload) = self.segments.get(code) {
            return Some(payload);
        }
        let start = self.tail.find(code)? + code.len();
        self.tail.get(start..)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.segments.contains_key(code) || self.tail.contains(code)
    }

    /// Codes recognised by tokenization, in record order
    pub fn tokenized_codes(&self) -> &[&'a str] {
        &self.order
    }

    pub fn tail(&self) -> &'a str {
        self.tail
    }

    pub fn is_fully_tokenized(&self) -> bool {
        self.tail.is_empty()
    }
}

/// Sub-field values of one category plus any mismatches found on the way
#[derive(Debug, Default)]
pub struct CategoryValues {
    pub values: Vec<Option<FieldValue>>,
    pub mismatches: Vec<ProcessingError>,
}

/// Slice a category payload into typed sub-field values.
///
/// A missing payload, a slice running past the payload, or a blank slice
/// gives null. A non-blank numeric slice that does not parse gives null and a
/// `CatalogMismatch`.
pub fn decode_category(descriptor: &CategoryDescriptor, payload: Option<&str>) -> CategoryValues {
    let mut out = CategoryValues {
        values: Vec::with_capacity(descriptor.field_count()),
        mismatches: Vec::new(),
    };

    let Some(payload) = payload else {
        out.values.resize(descriptor.field_count(), None);
        return out;
    };

    let mut start = 0;
    for (i, &len) in descriptor.sub_field_lengths.iter().enumerate() {
        let slice = payload.get(start..start + len);
        start += len;

        let value = match (slice, descriptor.sub_field_types[i]) {
            (None, _) => None,
            (Some(raw), SubFieldKind::Text) => Some(FieldValue::Text(raw.to_string())),
            (Some(raw), SubFieldKind::Numeric) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    match trimmed.parse::<i64>() {
                        Ok(n) => {
                            let scale = descriptor.sub_field_scales[i].unwrap_or(1.0);
                            Some(FieldValue::Number(n as f64 / scale))
                        }
                        Err(_) => {
                            out.mismatches.push(ProcessingError::CatalogMismatch {
                                category: descriptor.code.clone(),
                                field: i + 1,
                                value: raw.to_string(),
                            });
                            None
                        }
                    }
                }
            }
        };
        out.values.push(value);
    }

    out
}

/// Number of records carrying each catalog category, in catalog order
pub fn count_categories(indexes: &[SegmentIndex<'_>], catalog: &FieldCatalog) -> Vec<usize> {
    catalog
        .iter()
        .map(|descriptor| {
            indexes
                .iter()
                .filter(|index| index.contains(&descriptor.code))
                .count()
        })
        .collect()
}

/// Categories that become columns for this batch, in catalog order.
///
/// Only categories seen at least once qualify; allow-list entries that never
/// occur are dropped without error.
pub fn select_categories<'c>(
    catalog: &'c FieldCatalog,
    counts: &[usize],
    selection: &CategorySelection,
) -> Vec<&'c CategoryDescriptor> {
    let present = catalog
        .iter()
        .zip(counts)
        .filter(|(_, &count)| count > 0)
        .map(|(descriptor, _)| descriptor);

    match selection {
        CategorySelection::None => Vec::new(),
        CategorySelection::All => present.collect(),
        CategorySelection::Only(codes) => {
            let wanted: Vec<String> = codes.iter().map(|c| c.to_uppercase()).collect();
            let selected: Vec<&CategoryDescriptor> = present
                .filter(|d| wanted.iter().any(|w| *w == d.code))
                .collect();
            for code in &wanted {
                if !selected.iter().any(|d| d.code == *code) {
                    debug!("Category {} not present in batch, dropping from selection", code);
                }
            }
            selected
        }
    }
}
