use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single government welfare scheme as published in the dataset.
///
/// Records are immutable after load; every field is required at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRecord {
    pub id: String,
    pub name: String,
    pub ministry: String,
    pub beneficiary: String,
    pub benefit: String,
    pub description: String,
    pub category: String,
    pub source_url: String,
}

/// Error enumeration for dataset loading failures.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("scheme dataset unavailable at {path}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scheme dataset malformed: {detail}")]
    Malformed { detail: String },
}

/// The dataset document carries the scheme list under a top-level `schemes`
/// key. A document without the key is treated as an empty catalog, matching
/// the published dataset contract; a key holding anything but a list is a
/// malformed dataset.
#[derive(Debug, Deserialize)]
struct DatasetDocument {
    #[serde(default)]
    schemes: Option<Vec<SchemeRecord>>,
}

/// Ordered, immutable collection of schemes, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct SchemeCatalog {
    schemes: Vec<SchemeRecord>,
}

impl SchemeCatalog {
    /// Build a catalog from an already-parsed record list, enforcing id
    /// uniqueness.
    pub fn from_records(schemes: Vec<SchemeRecord>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for scheme in &schemes {
            if !seen.insert(scheme.id.as_str()) {
                return Err(CatalogError::Malformed {
                    detail: format!("duplicate scheme id '{}'", scheme.id),
                });
            }
        }
        Ok(Self { schemes })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, CatalogError> {
        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .map_err(|err| CatalogError::Malformed {
                detail: err.to_string(),
            })?;
        Self::from_str(&raw)
    }

    pub fn from_str(raw: &str) -> Result<Self, CatalogError> {
        let document: DatasetDocument =
            serde_json::from_str(raw).map_err(|err| CatalogError::Malformed {
                detail: err.to_string(),
            })?;
        Self::from_records(document.schemes.unwrap_or_default())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Unavailable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&raw)
    }

    pub fn schemes(&self) -> &[SchemeRecord] {
        &self.schemes
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SchemeRecord> {
        self.schemes.iter().find(|scheme| scheme.id == id)
    }

    /// Distinct, sorted values backing the ministry/beneficiary/category
    /// selectors.
    pub fn facets(&self) -> CatalogFacets {
        fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
            values
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }

        CatalogFacets {
            ministries: distinct(self.schemes.iter().map(|s| s.ministry.as_str())),
            beneficiaries: distinct(self.schemes.iter().map(|s| s.beneficiary.as_str())),
            categories: distinct(self.schemes.iter().map(|s| s.category.as_str())),
        }
    }
}

/// Distinct filter options derived from the loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogFacets {
    pub ministries: Vec<String>,
    pub beneficiaries: Vec<String>,
    pub categories: Vec<String>,
}

/// Catalog shared across the process lifetime.
///
/// A load failure degrades to an empty catalog plus a displayable notice; the
/// process never terminates on a data error.
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    catalog: Arc<SchemeCatalog>,
    notice: Option<String>,
}

impl CatalogHandle {
    pub fn load(path: impl AsRef<Path>) -> Self {
        match SchemeCatalog::from_path(path.as_ref()) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.as_ref().display(),
                    schemes = catalog.len(),
                    "scheme catalog loaded"
                );
                Self::loaded(catalog)
            }
            Err(err) => {
                tracing::error!(path = %path.as_ref().display(), error = %err, "scheme catalog degraded");
                Self::degraded(err.to_string())
            }
        }
    }

    pub fn loaded(catalog: SchemeCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            notice: None,
        }
    }

    pub fn degraded(notice: String) -> Self {
        Self {
            catalog: Arc::new(SchemeCatalog::default()),
            notice: Some(notice),
        }
    }

    pub fn catalog(&self) -> &SchemeCatalog {
        &self.catalog
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
