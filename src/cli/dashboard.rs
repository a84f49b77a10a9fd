use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::aggregator::{self, CompanyReport, Filter, TOTAL_LABEL};
use crate::catalog::{load_catalog, Catalog};
use crate::cli::Selection;
use crate::dataset::{parse_date_dayfirst, Dataset};
use crate::error::{RegopError, Result};
use crate::names::Canonicalizer;
use crate::settings::get_data_dir;

/// Everything a dashboard or export run works from.
pub(crate) struct Prepared {
    pub data_dir: PathBuf,
    pub catalog: Catalog,
    pub filter: Filter,
    pub reports: Vec<CompanyReport>,
}

fn load_dataset(file: &str) -> Result<(PathBuf, Catalog, Canonicalizer, Dataset)> {
    let data_dir = get_data_dir()?;
    let catalog = load_catalog(&data_dir)?;
    let names = Canonicalizer::new(&catalog.company_equivalences);
    let dataset = Dataset::load(Path::new(file), &catalog.columns, &names)?;
    if dataset.dropped > 0 || dataset.unparsed > 0 {
        println!(
            "{}",
            format!(
                "Skipped {} rows with missing values; {} rows had an unreadable date or hour.",
                dataset.dropped, dataset.unparsed
            )
            .yellow()
        );
    }
    Ok((data_dir, catalog, names, dataset))
}

/// Load the file and apply the selection. `None` when the file holds no
/// usable dates, which is reported to the operator rather than failing.
pub(crate) fn prepare(sel: &Selection) -> Result<Option<Prepared>> {
    let (data_dir, catalog, names, dataset) = load_dataset(&sel.file)?;

    let dates = aggregator::available_dates(&dataset);
    let Some(latest) = dates.last().copied() else {
        println!("{}", "No dispatches with a valid date in this file.".yellow());
        return Ok(None);
    };
    let date = match &sel.date {
        Some(raw) => parse_date_dayfirst(raw)
            .ok_or_else(|| RegopError::Filter(format!("invalid date {raw:?}")))?,
        None => latest,
    };

    let destinations = if sel.destinations.is_empty() {
        aggregator::destinations(&dataset)
    } else {
        sel.destinations.clone()
    };
    let companies = if sel.companies.is_empty() {
        aggregator::companies(&dataset)
    } else {
        sel.companies.clone()
    };
    let filter = Filter::new(date, destinations, companies, sel.from_hour, sel.to_hour, &names)?;
    let reports = aggregator::build_reports(&dataset, &filter);
    Ok(Some(Prepared {
        data_dir,
        catalog,
        filter,
        reports,
    }))
}

pub fn dates(file: &str) -> Result<()> {
    let (_, _, _, dataset) = load_dataset(file)?;
    let dates = aggregator::available_dates(&dataset);
    if dates.is_empty() {
        println!("{}", "No dispatches with a valid date in this file.".yellow());
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Dispatches"]);
    for d in &dates {
        let n = dataset.records.iter().filter(|r| r.date == Some(*d)).count();
        table.add_row(vec![Cell::new(d.format("%Y-%m-%d")), Cell::new(n)]);
    }
    println!("Available dates\n{table}");
    Ok(())
}

fn series_table(report: &CompanyReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Hour", "Destination", "Count"]);
    for hc in &report.series {
        table.add_row(vec![
            Cell::new(format!("{:02}", hc.hour)),
            Cell::new(&hc.destination),
            Cell::new(hc.count),
        ]);
    }
    table
}

fn matrix_table(report: &CompanyReport) -> Table {
    let matrix = report.matrix.trimmed();
    let mut table = Table::new();
    let mut header = vec!["Interval".to_string()];
    header.extend(matrix.destinations.iter().cloned());
    table.set_header(header);
    for row in &matrix.rows {
        let mut cells = vec![Cell::new(&row.label)];
        cells.extend(row.counts.iter().map(|c| Cell::new(c)));
        table.add_row(cells);
    }
    let mut totals = vec![Cell::new(TOTAL_LABEL.bold())];
    totals.extend(matrix.totals.iter().map(|c| Cell::new(c.to_string().bold())));
    table.add_row(totals);
    table
}

pub fn run(sel: &Selection) -> Result<()> {
    let Some(prepared) = prepare(sel)? else {
        return Ok(());
    };
    let f = &prepared.filter;
    println!(
        "{}",
        format!(
            "Dispatches on {}  {:02}:00 - {:02}:59",
            f.date.format("%Y-%m-%d"),
            f.hours.start(),
            f.hours.end()
        )
        .bold()
    );

    for report in &prepared.reports {
        println!();
        println!(
            "{}  {} dispatches",
            report.company.bold(),
            report.matrix.grand_total()
        );
        if report.is_empty() {
            println!("{}", "  No dispatches for this selection.".dimmed());
            continue;
        }
        println!("{}", series_table(report));
        println!("{}", matrix_table(report));
    }
    Ok(())
}
