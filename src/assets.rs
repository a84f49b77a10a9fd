use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::fmt::slug;

const LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Non-fatal condition surfaced to the operator while a report is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub String);

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image files found for one company report. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportAssets {
    pub banner: Option<PathBuf>,
    pub logo: Option<PathBuf>,
}

fn logo_candidates(dir: &Path, catalog: &Catalog, company: &str) -> Vec<PathBuf> {
    if let Some(file) = catalog.assets.logos.get(company) {
        return vec![dir.join(file)];
    }
    let base = slug(company);
    LOGO_EXTENSIONS
        .iter()
        .map(|ext| dir.join("logos").join(format!("{base}.{ext}")))
        .collect()
}

/// Look up the banner and the logo of a canonical company name.
pub fn resolve(catalog: &Catalog, data_dir: &Path, company: &str) -> (ReportAssets, Vec<Notice>) {
    let dir = catalog.asset_dir(data_dir);
    let mut notices = Vec::new();

    let banner_path = dir.join(&catalog.assets.banner);
    let banner = if banner_path.is_file() {
        Some(banner_path)
    } else {
        notices.push(Notice(format!("Banner not found at {}", banner_path.display())));
        None
    };

    let candidates = logo_candidates(&dir, catalog, company);
    let logo = candidates.iter().find(|p| p.is_file()).cloned();
    if logo.is_none() {
        let looked = candidates
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        notices.push(Notice(format!("No logo for {company} (looked for {looked})")));
    }

    (ReportAssets { banner, logo }, notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_assets_are_notices() {
        let dir = tempfile::tempdir().unwrap();
        let (assets, notices) = resolve(&Catalog::default(), dir.path(), "M&Q SPA");
        assert_eq!(assets, ReportAssets::default());
        assert_eq!(notices.len(), 2);
        assert!(notices[0].to_string().starts_with("Banner not found"));
        assert!(notices[1].to_string().contains("m_q_spa.png"));
    }

    #[test]
    fn test_logo_resolved_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        let logos = dir.path().join("assets").join("logos");
        std::fs::create_dir_all(&logos).unwrap();
        std::fs::write(logos.join("msd_spa.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("assets").join("banner.png"), b"x").unwrap();
        let (assets, notices) = resolve(&Catalog::default(), dir.path(), "MSD SPA");
        assert!(notices.is_empty());
        assert_eq!(assets.logo, Some(logos.join("msd_spa.jpg")));
        assert!(assets.banner.is_some());
    }

    #[test]
    fn test_logo_override_from_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::default();
        catalog.assets.dir = dir.path().to_string_lossy().to_string();
        catalog
            .assets
            .logos
            .insert("COSEDUCAM SA".to_string(), "cosed.png".to_string());
        std::fs::write(dir.path().join("cosed.png"), b"x").unwrap();
        let (assets, _) = resolve(&catalog, Path::new("/unused"), "COSEDUCAM SA");
        assert_eq!(assets.logo, Some(dir.path().join("cosed.png")));
    }
}
