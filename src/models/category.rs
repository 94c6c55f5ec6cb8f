use crate::error::{ProcessingError, Result};
use crate::models::table::{ColumnKind, ColumnSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Field catalog shipped with the crate
const BUILTIN_CATALOG: &str = include_str!("../../data/field_catalog.csv");

static BUILTIN: OnceLock<FieldCatalog> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubFieldKind {
    Numeric,
    Text,
}

impl SubFieldKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "n" => Some(SubFieldKind::Numeric),
            "t" => Some(SubFieldKind::Text),
            _ => None,
        }
    }
}

/// Layout of one additional-data category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    pub code: String,
    pub description: String,
    pub sub_field_lengths: Vec<usize>,
    pub sub_field_scales: Vec<Option<f64>>,
    pub sub_field_types: Vec<SubFieldKind>,
}

impl CategoryDescriptor {
    pub fn new(
        code: &str,
        description: &str,
        sub_field_lengths: Vec<usize>,
        sub_field_scales: Vec<Option<f64>>,
        sub_field_types: Vec<SubFieldKind>,
    ) -> Result<Self> {
        let descriptor = Self {
            code: code.to_string(),
            description: description.to_string(),
            sub_field_lengths,
            sub_field_scales,
            sub_field_types,
        };
        descriptor.check()?;
        Ok(descriptor)
    }

    fn check(&self) -> Result<()> {
        let code = self.code.as_bytes();
        let well_formed = code.len() == 3
            && code[0].is_ascii_uppercase()
            && code[1].is_ascii_uppercase()
            && code[2].is_ascii_digit();
        if !well_formed {
            return Err(ProcessingError::Catalog(format!(
                "Invalid category code: '{}'",
                self.code
            )));
        }

        let n = self.sub_field_lengths.len();
        if n == 0 || self.sub_field_scales.len() != n || self.sub_field_types.len() != n {
            return Err(ProcessingError::Catalog(format!(
                "{}: {} lengths, {} scales, {} types",
                self.code,
                n,
                self.sub_field_scales.len(),
                self.sub_field_types.len()
            )));
        }

        if self.sub_field_lengths.contains(&0) {
            return Err(ProcessingError::Catalog(format!(
                "{}: zero-width sub-field",
                self.code
            )));
        }

        for (i, (scale, kind)) in self
            .sub_field_scales
            .iter()
            .zip(&self.sub_field_types)
            .enumerate()
        {
            match (scale, kind) {
                (Some(_), SubFieldKind::Text) => {
                    return Err(ProcessingError::Catalog(format!(
                        "{}: text sub-field {} has a scale",
                        self.code,
                        i + 1
                    )))
                }
                (Some(s), SubFieldKind::Numeric) if !s.is_finite() || *s == 0.0 => {
                    return Err(ProcessingError::Catalog(format!(
                        "{}: sub-field {} has unusable scale {}",
                        self.code,
                        i + 1,
                        s
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Payload width after the code
    pub fn payload_len(&self) -> usize {
        self.sub_field_lengths.iter().sum()
    }

    pub fn field_count(&self) -> usize {
        self.sub_field_lengths.len()
    }

    /// Column names in sub-field order, e.g. `aa1_1`, `aa1_2`
    pub fn column_names(&self) -> Vec<String> {
        let prefix = self.code.to_lowercase();
        (1..=self.field_count())
            .map(|i| format!("{}_{}", prefix, i))
            .collect()
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.column_names()
            .into_iter()
            .zip(&self.sub_field_types)
            .map(|(name, kind)| ColumnSpec {
                name,
                kind: match kind {
                    SubFieldKind::Numeric => ColumnKind::Numeric,
                    SubFieldKind::Text => ColumnKind::Text,
                },
                category: Some(self.code.clone()),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    code: String,
    lengths: String,
    scales: String,
    kinds: String,
    #[serde(default)]
    description: String,
}

impl CatalogRow {
    fn into_descriptor(self) -> Result<CategoryDescriptor> {
        let code = self.code.trim().to_uppercase();

        let lengths = self
            .lengths
            .split_whitespace()
            .map(|s| {
                s.parse::<usize>().map_err(|_| {
                    ProcessingError::Catalog(format!("{}: invalid length '{}'", code, s))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scales = self
            .scales
            .split_whitespace()
            .map(|s| match s {
                "-" => Ok(None),
                _ => s.parse::<f64>().map(Some).map_err(|_| {
                    ProcessingError::Catalog(format!("{}: invalid scale '{}'", code, s))
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let kinds = self
            .kinds
            .split_whitespace()
            .map(|s| {
                SubFieldKind::parse(s).ok_or_else(|| {
                    ProcessingError::Catalog(format!("{}: invalid kind '{}'", code, s))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        CategoryDescriptor::new(&code, self.description.trim(), lengths, scales, kinds)
    }
}

/// Immutable lookup of category descriptors, kept in declaration order
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    descriptors: Vec<CategoryDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldCatalog {
    /// The catalog embedded in the crate, parsed on first use
    pub fn builtin() -> &'static FieldCatalog {
        BUILTIN.get_or_init(|| {
            FieldCatalog::from_reader(BUILTIN_CATALOG.as_bytes())
                .expect("embedded field catalog is well-formed")
        })
    }

    pub fn from_descriptors(descriptors: Vec<CategoryDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            descriptor.check()?;
            if index.insert(descriptor.code.clone(), i).is_some() {
                return Err(ProcessingError::Catalog(format!(
                    "Duplicate category code: {}",
                    descriptor.code
                )));
            }
        }
        Ok(Self { descriptors, index })
    }

    /// Read a catalog table with columns `code,lengths,scales,kinds,description`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut descriptors = Vec::new();
        for row in csv_reader.deserialize::<CatalogRow>() {
            descriptors.push(row?.into_descriptor()?);
        }

        Self::from_descriptors(descriptors)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn get(&self, code: &str) -> Option<&CategoryDescriptor> {
        self.index.get(code).map(|&i| &self.descriptors[i])
    }

    /// Declaration position of a code
    pub fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDescriptor> {
        self.descriptors.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = FieldCatalog::builtin();
        assert!(catalog.len() >= 90);
        assert_eq!(catalog.codes().next(), Some("AA1"));
        for descriptor in catalog.iter() {
            assert_eq!(descriptor.sub_field_lengths.len(), descriptor.sub_field_scales.len());
            assert_eq!(descriptor.sub_field_lengths.len(), descriptor.sub_field_types.len());
        }
    }

    // These widths differ from the inconsistent sums carried by older
    // catalogs; they follow the published ISD layout.
    #[test]
    fn test_pinned_payload_lengths() {
        let catalog = FieldCatalog::builtin();
        let expected = [
            ("AA1", 8),
            ("AJ1", 14),
            ("AW1", 3),
            ("GA1", 13),
            ("GF1", 23),
            ("KA1", 10),
            ("MA1", 12),
            ("OC1", 5),
        ];
        for (code, len) in expected {
            let descriptor = catalog.get(code).unwrap();
            assert_eq!(descriptor.payload_len(), len, "payload length of {}", code);
        }
    }

    #[test]
    fn test_column_names() {
        let descriptor = FieldCatalog::builtin().get("AA1").unwrap();
        assert_eq!(
            descriptor.column_names(),
            vec!["aa1_1", "aa1_2", "aa1_3", "aa1_4"]
        );
        assert_eq!(descriptor.sub_field_scales[1], Some(10.0));
        assert_eq!(descriptor.sub_field_scales[0], None);
        assert_eq!(descriptor.sub_field_types[3], SubFieldKind::Text);
    }

    #[test]
    fn test_mismatched_list_lengths_rejected() {
        let result = CategoryDescriptor::new(
            "ZZ1",
            "broken",
            vec![2, 4],
            vec![None],
            vec![SubFieldKind::Numeric, SubFieldKind::Numeric],
        );
        assert!(matches!(result, Err(ProcessingError::Catalog(_))));
    }

    #[test]
    fn test_scaled_text_field_rejected() {
        let result = CategoryDescriptor::new(
            "ZZ1",
            "broken",
            vec![2],
            vec![Some(10.0)],
            vec![SubFieldKind::Text],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_catalog_and_duplicates() {
        let csv = "code,lengths,scales,kinds,description\n\
                   ZZ1,2 3,- 10,t n,test category\n";
        let catalog = FieldCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("ZZ1").unwrap().payload_len(), 5);

        let duplicated = "code,lengths,scales,kinds,description\n\
                          ZZ1,2,-,t,a\n\
                          ZZ1,2,-,t,b\n";
        assert!(FieldCatalog::from_reader(duplicated.as_bytes()).is_err());
    }
}
