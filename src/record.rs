use std::path::{Path, PathBuf};

use crate::error::{RegopError, Result};
use crate::session::{CarrierRowKind, Review};

pub const CARRIER_PREFIX: &str = "Empresa_";
pub const OPERATIONAL_PREFIX: &str = "Operacional_";

/// Header and values of the single-row export of a reviewed session.
pub fn flatten(review: &Review) -> (Vec<String>, Vec<String>) {
    let p = &review.principal;
    let mut headers: Vec<String> = ["fecha", "abc_seguridad", "tiempo_salar", "tiempo_pto"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut values = vec![
        p.date.clone(),
        p.safety_category.clone(),
        p.salar_minutes.to_string(),
        p.port_minutes.to_string(),
    ];

    for row in review.carriers.iter().filter(|r| r.kind != CarrierRowKind::Separator) {
        headers.push(format!("{CARRIER_PREFIX}{}_Prog.", row.name));
        values.push(row.programmed.to_string());
        headers.push(format!("{CARRIER_PREFIX}{}_Real", row.name));
        values.push(row.actual.to_string());
    }

    for row in &review.operational {
        headers.push(format!("{OPERATIONAL_PREFIX}{}_Programado", row.concept));
        values.push(row.programmed.clone());
        headers.push(format!("{OPERATIONAL_PREFIX}{}_Real", row.concept));
        values.push(row.actual.clone());
    }

    (headers, values)
}

pub fn to_csv(review: &Review) -> Result<Vec<u8>> {
    let (headers, values) = flatten(review);
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&headers)?;
    wtr.write_record(&values)?;
    wtr.into_inner()
        .map_err(|e| RegopError::Io(e.into_error()))
}

/// Write the export under `dir`, named after the record date and the save time.
pub fn save(review: &Review, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("registro-{}-{stamp}.csv", review.principal.date));
    std::fs::write(&path, to_csv(review)?)?;
    tracing::info!(path = %path.display(), "record saved");
    Ok(path)
}
