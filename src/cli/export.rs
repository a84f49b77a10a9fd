use std::collections::HashSet;
use std::path::PathBuf;

use colored::Colorize;

use crate::assets::{self, Notice};
use crate::cli::dashboard::prepare;
use crate::cli::Selection;
use crate::error::Result;
use crate::fmt::slug;
use crate::pdf::{render_company_report, ReportContext};
use crate::settings::load_settings;

fn write_pdf(bytes: &[u8], path: &PathBuf) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    let display = format!("{}", path.display());
    println!("Wrote {display}");
    Ok(display)
}

fn file_stem(company: &str) -> String {
    let stem = slug(company);
    if stem.is_empty() {
        "company".to_string()
    } else {
        stem
    }
}

/// File names for each company's report. Companies whose names reduce to the
/// same slug get a numeric suffix instead of overwriting one another.
fn report_file_names<'a>(companies: impl IntoIterator<Item = &'a str>, date: &str) -> Vec<String> {
    let mut taken = HashSet::new();
    companies
        .into_iter()
        .map(|company| {
            let base = file_stem(company);
            let mut stem = base.clone();
            let mut n = 2;
            while !taken.insert(stem.clone()) {
                stem = format!("{base}_{n}");
                n += 1;
            }
            format!("{stem}-{date}.pdf")
        })
        .collect()
}

/// One PDF per selected company. A company whose report cannot be written
/// is reported and skipped; the others are still exported.
pub fn run(sel: &Selection, output_dir: Option<String>) -> Result<()> {
    let Some(prepared) = prepare(sel)? else {
        return Ok(());
    };
    let settings = load_settings()?;
    let dir = output_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| prepared.data_dir.join("exports"));
    let ctx = ReportContext {
        date: prepared.filter.date,
        hours: prepared.filter.hours.clone(),
        operator: &settings.operator,
    };
    let date = prepared.filter.date.format("%Y-%m-%d").to_string();

    let file_names = report_file_names(prepared.reports.iter().map(|r| r.company.as_str()), &date);

    let mut written = 0usize;
    let mut failed = 0usize;
    for (report, file_name) in prepared.reports.iter().zip(&file_names) {
        let (found, mut notices) =
            assets::resolve(&prepared.catalog, &prepared.data_dir, &report.company);
        if *file_name != format!("{}-{date}.pdf", file_stem(&report.company)) {
            notices.push(Notice(format!(
                "{} shares a file name with another company, writing {file_name}",
                report.company
            )));
        }
        let result = render_company_report(report, &found, &ctx).and_then(|(bytes, more)| {
            notices.extend(more);
            write_pdf(&bytes, &dir.join(file_name))
        });
        for notice in &notices {
            println!("{}", format!("  {notice}").yellow());
        }
        match result {
            Ok(path) => {
                tracing::info!(company = %report.company, %path, "report exported");
                written += 1;
            }
            Err(e) => {
                tracing::warn!(company = %report.company, error = %e, "report export failed");
                eprintln!("{}", format!("Could not export {}: {e}", report.company).red());
                failed += 1;
            }
        }
    }

    println!("{written} reports exported to {}", dir.display());
    if failed > 0 {
        println!("{}", format!("{failed} reports failed").red());
    }
    Ok(())
}
