//! Read-only view of the JSON garment catalog.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::garment::{
    CategoryKeywords, CoverageRatio, GarmentCategory, GarmentDescriptor, TryOnMethod,
};
use crate::{TryOnError, TryOnResult};

/// One catalog entry. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GarmentRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub height_ratio: Option<f32>,
    #[serde(default)]
    pub try_on_method: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub height_range: String,
}

impl GarmentRecord {
    /// Build the pipeline descriptor for this garment.
    ///
    /// An invalid `height_ratio` or `try_on_method` is ignored with a warning.
    pub fn descriptor(&self, keywords: &CategoryKeywords) -> GarmentDescriptor {
        let category = GarmentCategory::resolve(self.category.as_deref(), &self.name, keywords);

        let coverage = self.height_ratio.and_then(|ratio| match CoverageRatio::new(ratio) {
            Ok(coverage) => Some(coverage),
            Err(err) => {
                tracing::warn!(id = %self.id, error = %err, "ignoring height_ratio");
                None
            }
        });

        let method = match self.try_on_method.as_deref() {
            None => TryOnMethod::default(),
            Some(raw) => TryOnMethod::parse(raw).unwrap_or_else(|| {
                tracing::warn!(id = %self.id, method = raw, "unknown try_on_method, using auto");
                TryOnMethod::default()
            }),
        };

        GarmentDescriptor::new(self.name.clone(), category)
            .with_coverage(coverage)
            .with_method(method)
    }

    /// Stored image URL, or the conventional local path for legacy entries.
    pub fn image_url(&self) -> String {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("/images/{}.jpg", self.id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GarmentCatalog {
    records: Vec<GarmentRecord>,
}

impl GarmentCatalog {
    pub fn from_path(path: impl AsRef<Path>) -> TryOnResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            entries = catalog.len(),
            "loaded garment catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(text: &str) -> TryOnResult<Self> {
        let records: Vec<GarmentRecord> = serde_json::from_str(text)?;
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[GarmentRecord] {
        &self.records
    }

    /// Look up a garment by id; a trailing `.jpg` on the query is ignored.
    pub fn get(&self, id: &str) -> TryOnResult<&GarmentRecord> {
        let bare = id.strip_suffix(".jpg").unwrap_or(id);
        self.records
            .iter()
            .find(|record| record.id == id || record.id == bare)
            .ok_or_else(|| TryOnError::GarmentNotFound { id: id.to_string() })
    }

    /// Entries whose gender and height range contain the given substrings.
    pub fn filter(&self, gender: Option<&str>, height: Option<&str>) -> Vec<&GarmentRecord> {
        self.records
            .iter()
            .filter(|record| gender.is_none_or(|g| record.gender.contains(g)))
            .filter(|record| height.is_none_or(|h| record.height_range.contains(h)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {"id": "001", "name": "Linen Shirt", "category": "Upper-body", "gender": "male",
         "style": "casual", "height_range": "170-180", "image_url": "https://cdn/001.jpg"},
        {"id": "002", "name": "Slim Jeans", "height_ratio": 0.6, "gender": "female",
         "height_range": "160-170", "try_on_method": "overlay", "color": "blue"},
        {"id": "003", "name": "Floral Dress", "category": "Dress", "height_ratio": 1.7,
         "gender": "female", "height_range": "150-160", "try_on_method": "sideways"}
    ]"#;

    fn catalog() -> GarmentCatalog {
        GarmentCatalog::from_json_str(CATALOG).unwrap()
    }

    #[test]
    fn get_accepts_jpg_suffix() {
        let catalog = catalog();
        assert_eq!(catalog.get("002").unwrap().name, "Slim Jeans");
        assert_eq!(catalog.get("002.jpg").unwrap().name, "Slim Jeans");
        assert!(matches!(
            catalog.get("999"),
            Err(TryOnError::GarmentNotFound { .. })
        ));
    }

    #[test]
    fn descriptor_uses_explicit_fields() {
        let keywords = CategoryKeywords::default();
        let descriptor = catalog().get("001").unwrap().descriptor(&keywords);
        assert_eq!(descriptor.category, GarmentCategory::UpperBody);
        assert_eq!(descriptor.coverage, None);
        assert_eq!(descriptor.method, TryOnMethod::Auto);
    }

    #[test]
    fn descriptor_infers_category_and_reads_ratio() {
        let keywords = CategoryKeywords::default();
        let descriptor = catalog().get("002").unwrap().descriptor(&keywords);
        assert_eq!(descriptor.category, GarmentCategory::LowerBody);
        assert_eq!(descriptor.coverage.map(CoverageRatio::get), Some(0.6));
        assert_eq!(descriptor.method, TryOnMethod::Overlay);
    }

    #[test]
    fn descriptor_ignores_invalid_values() {
        let keywords = CategoryKeywords::default();
        let descriptor = catalog().get("003").unwrap().descriptor(&keywords);
        assert_eq!(descriptor.category, GarmentCategory::Dress);
        assert_eq!(descriptor.coverage, None);
        assert_eq!(descriptor.method, TryOnMethod::Auto);
    }

    #[test]
    fn image_url_falls_back_to_local_path() {
        let catalog = catalog();
        assert_eq!(catalog.get("001").unwrap().image_url(), "https://cdn/001.jpg");
        assert_eq!(catalog.get("002").unwrap().image_url(), "/images/002.jpg");
    }

    #[test]
    fn filter_by_gender_and_height() {
        let catalog = catalog();
        let ids = |records: Vec<&GarmentRecord>| -> Vec<String> {
            records.iter().map(|r| r.id.clone()).collect()
        };
        assert_eq!(ids(catalog.filter(Some("female"), None)), vec!["002", "003"]);
        assert_eq!(ids(catalog.filter(Some("female"), Some("160"))), vec!["002", "003"]);
        assert_eq!(ids(catalog.filter(None, Some("170-"))), vec!["001"]);
        assert_eq!(catalog.filter(None, None).len(), 3);
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = GarmentCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn malformed_catalog_is_a_json_error() {
        let err = GarmentCatalog::from_json_str("{\"id\": 1}").unwrap_err();
        assert!(matches!(err, TryOnError::Json(_)));
    }
}
