//! Domain tables that operators edit without touching code: selector
//! options, the carrier and concept rows of the form, company-name
//! equivalences, spreadsheet column positions and report assets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::ColumnLayout;
use crate::error::{RegopError, Result};

pub const CATALOG_FILE: &str = "catalog.json";

/// Enumerated option list a concept row's programmed value is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceSet {
    Sector,
    Product,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<ChoiceSet>,
}

impl Concept {
    fn free(label: &str) -> Self {
        Self {
            label: label.to_string(),
            choices: None,
        }
    }

    fn bound(label: &str, choices: ChoiceSet) -> Self {
        Self {
            label: label.to_string(),
            choices: Some(choices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Asset directory; relative paths resolve against the data directory.
    pub dir: String,
    pub banner: String,
    /// Canonical company name -> logo file name inside `dir`.
    pub logos: BTreeMap<String, String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: "assets".to_string(),
            banner: "banner.png".to_string(),
            logos: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub safety_categories: Vec<String>,
    pub carriers: Vec<String>,
    pub concepts: Vec<Concept>,
    pub sectors: Vec<String>,
    pub products: Vec<String>,
    pub destinations: Vec<String>,
    /// Name variant -> canonical company name. Keys are normalized on use.
    pub company_equivalences: BTreeMap<String, String>,
    pub columns: ColumnLayout,
    pub assets: AssetConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Catalog {
    fn default() -> Self {
        let company_equivalences = [
            ("M AND Q SPA", "M&Q SPA"),
            ("M AND Q", "M&Q SPA"),
            ("M Y Q SPA", "M&Q SPA"),
            ("MYQ SPA", "M&Q SPA"),
            ("TRANSPORTES M AND Q SPA", "M&Q SPA"),
            ("MSD", "MSD SPA"),
            ("TRANSPORTES MSD", "MSD SPA"),
            ("TRANSPORTES MSD SPA", "MSD SPA"),
            ("COSEDUCAM", "COSEDUCAM SA"),
            ("COSEDUCAM S A", "COSEDUCAM SA"),
            ("TRANSPORTES COSEDUCAM", "COSEDUCAM SA"),
            ("JORQUERA", "TRANSPORTES JORQUERA"),
            ("TRANSP JORQUERA", "TRANSPORTES JORQUERA"),
            ("AG SERVICES", "AG SERVICES SPA"),
            ("A G SERVICES SPA", "AG SERVICES SPA"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            safety_categories: strings(&["A", "B", "C"]),
            carriers: strings(&[
                "MSD Bateas",
                "M&Q Bateas",
                "M&Q Aljibes",
                "Coseducam Bateas",
                "Coseducam Aljibes",
                "Jorquera Aljibes",
                "Ramplas AG Services",
                "Ramplas MSD",
                "Ramplas Coseducam",
            ]),
            concepts: vec![
                Concept::bound("Sector", ChoiceSet::Sector),
                Concept::bound("Producto", ChoiceSet::Product),
                Concept::bound("Destino", ChoiceSet::Destination),
                Concept::free("Despacho Tonelaje"),
                Concept::free("% Cumplimiento"),
                Concept::free("Equipos General"),
                Concept::free("M&Q Aljibes"),
                Concept::free("Coseducam Aljibes"),
                Concept::free("Jorquera Aljibes"),
                Concept::free("% Regulaciones"),
                Concept::free("Promedio de Carga"),
                Concept::free("Tiempo Interior Faena"),
            ],
            sectors: strings(&["MOP-I", "MOP-II", "POZAS"]),
            products: strings(&[
                "BISCHOFITA", "MOP 70", "MOP TALCO", "MOP TALCO MAXIS", "MOP-G",
                "MOP-G (Rojo)", "MOP-G 59", "MOP-G O", "MOP-G PLUS", "MOP-G R 59",
                "MOP-GR PLUS", "MOP-H-AL", "MOP-H-BL", "MOP-S", "MOP-S 59",
                "MOP-S PLUS", "NACL", "SAL 27/15", "SILVINITA", "SLIT",
                "SOP-G", "SOP-H", "SOP-O", "SOP-S Talco", "USOP52",
                "MOP 50", "SOP FINO", "LSI (S)",
            ]),
            destinations: strings(&[
                "Calama",
                "Mejillones",
                "Pto. Angamos",
                "Antofagasta",
                "Tocopilla",
            ]),
            company_equivalences,
            columns: ColumnLayout::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl Catalog {
    pub fn options(&self, set: ChoiceSet) -> &[String] {
        match set {
            ChoiceSet::Sector => &self.sectors,
            ChoiceSet::Product => &self.products,
            ChoiceSet::Destination => &self.destinations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.carriers.is_empty() {
            return Err(RegopError::Catalog("at least one carrier is required".to_string()));
        }
        if self.carriers.iter().any(|c| c.trim().is_empty()) {
            return Err(RegopError::Catalog("carrier names cannot be blank".to_string()));
        }
        if self.safety_categories.is_empty() {
            return Err(RegopError::Catalog(
                "at least one safety category is required".to_string(),
            ));
        }
        for concept in &self.concepts {
            if let Some(set) = concept.choices {
                if self.options(set).is_empty() {
                    return Err(RegopError::Catalog(format!(
                        "concept {:?} is bound to an empty {set:?} list",
                        concept.label
                    )));
                }
            }
        }
        self.columns.check_distinct()?;
        Ok(())
    }

    /// Resolved asset directory for a given data directory.
    pub fn asset_dir(&self, data_dir: &Path) -> PathBuf {
        let dir = PathBuf::from(&self.assets.dir);
        if dir.is_absolute() {
            dir
        } else {
            data_dir.join(dir)
        }
    }
}

pub fn catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

/// Load the catalog for a data directory, falling back to the built-in
/// tables when no file exists. A file that exists but does not parse is
/// an error rather than a silent fallback.
pub fn load_catalog(data_dir: &Path) -> Result<Catalog> {
    let path = catalog_path(data_dir);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no catalog file, using defaults");
        return Ok(Catalog::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let catalog: Catalog = serde_json::from_str(&content)
        .map_err(|e| RegopError::Catalog(format!("{}: {e}", path.display())))?;
    catalog.validate()?;
    Ok(catalog)
}

pub fn save_catalog(data_dir: &Path, catalog: &Catalog) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let json = serde_json::to_string_pretty(catalog)
        .map_err(|e| RegopError::Catalog(e.to_string()))?;
    std::fs::write(catalog_path(data_dir), format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let c = Catalog::default();
        c.validate().unwrap();
        assert_eq!(c.carriers.len(), 9);
        assert_eq!(c.concepts.len(), 12);
        assert_eq!(c.concepts[0].choices, Some(ChoiceSet::Sector));
        assert_eq!(c.concepts[1].choices, Some(ChoiceSet::Product));
        assert_eq!(c.concepts[2].choices, Some(ChoiceSet::Destination));
        assert!(c.concepts[3..].iter().all(|k| k.choices.is_none()));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = load_catalog(dir.path()).unwrap();
        assert_eq!(c, Catalog::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = Catalog::default();
        c.sectors.push("MOP-III".to_string());
        c.columns.company = 12;
        save_catalog(dir.path(), &c).unwrap();
        let loaded = load_catalog(dir.path()).unwrap();
        assert_eq!(loaded.sectors.last().map(String::as_str), Some("MOP-III"));
        assert_eq!(loaded.columns.company, 12);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            catalog_path(dir.path()),
            r#"{"sectors": ["NORTE", "SUR"], "columns": {"date": 1}}"#,
        )
        .unwrap();
        let c = load_catalog(dir.path()).unwrap();
        assert_eq!(c.sectors, vec!["NORTE", "SUR"]);
        assert_eq!(c.columns.date, 1);
        assert_eq!(c.columns.hour, 14);
        assert_eq!(c.carriers.len(), 9);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(catalog_path(dir.path()), "{ not json").unwrap();
        assert!(matches!(load_catalog(dir.path()), Err(RegopError::Catalog(_))));
    }

    #[test]
    fn test_validate_rejects_empty_bound_list() {
        let mut c = Catalog::default();
        c.products.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let mut c = Catalog::default();
        c.columns.hour = c.columns.date;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_asset_dir_relative_to_data_dir() {
        let c = Catalog::default();
        assert_eq!(c.asset_dir(Path::new("/data")), PathBuf::from("/data/assets"));
    }
}
