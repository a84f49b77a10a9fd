use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input, Select};

use crate::catalog::{load_catalog, Catalog};
use crate::error::{FormError, Result};
use crate::fmt::minutes_to_hhmm;
use crate::record;
use crate::session::{CarrierRowKind, PrincipalInput, Review, Session, Step};
use crate::settings::get_data_dir;

enum Flow {
    Continue,
    Quit,
}

pub fn run() -> Result<()> {
    let data_dir = get_data_dir()?;
    let catalog = load_catalog(&data_dir)?;
    let mut session = Session::new(&catalog);

    loop {
        let step = session.step();
        println!();
        println!("{}", format!("Step {step}").bold());
        println!("{}", "\u{2500}".repeat(60));
        let flow = match step {
            Step::PrincipalData => principal_step(&mut session, &catalog)?,
            Step::CarrierTable => carrier_step(&mut session)?,
            Step::OperationalTable => operational_step(&mut session)?,
            Step::Review => review_step(&mut session, &catalog, &data_dir)?,
        };
        if let Flow::Quit = flow {
            return Ok(());
        }
    }
}

/// Print a rejected submission and keep the wizard where it is.
fn report_form_error(err: FormError) -> Result<Flow> {
    match err {
        FormError::InvalidDuration { .. } | FormError::InvalidDate(_) => {
            println!("{}", format!("\u{26a0} {err}").red());
            Ok(Flow::Continue)
        }
        other => Err(other.into()),
    }
}

fn principal_step(session: &mut Session, catalog: &Catalog) -> Result<Flow> {
    let previous = session.principal().cloned();
    let default_date = previous
        .as_ref()
        .map(|p| p.date.clone())
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

    let raw_date: String = Input::new()
        .with_prompt("Date (YYYY-MM-DD)")
        .default(default_date)
        .interact_text()?;
    let Ok(date) = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d") else {
        return report_form_error(FormError::InvalidDate(raw_date));
    };

    let categories = &catalog.safety_categories;
    let current = previous
        .as_ref()
        .and_then(|p| categories.iter().position(|c| *c == p.safety_category))
        .unwrap_or(0);
    let category = Select::new()
        .with_prompt("Safety ABC")
        .items(categories)
        .default(current)
        .interact()?;

    let salar_time: String = Input::new()
        .with_prompt("Salar de Atacama time (HH:MM)")
        .default(
            previous
                .as_ref()
                .map(|p| minutes_to_hhmm(p.salar_minutes))
                .unwrap_or_else(|| "00:00".to_string()),
        )
        .interact_text()?;
    let port_time: String = Input::new()
        .with_prompt("Pto. Angamos time (HH:MM)")
        .default(
            previous
                .as_ref()
                .map(|p| minutes_to_hhmm(p.port_minutes))
                .unwrap_or_else(|| "00:00".to_string()),
        )
        .interact_text()?;

    let input = PrincipalInput {
        date,
        safety_category: categories[category].clone(),
        salar_time,
        port_time,
    };
    match session.submit_principal(input) {
        Ok(()) => Ok(Flow::Continue),
        Err(e) => report_form_error(e),
    }
}

fn carrier_table(session: &Session) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Transport company", "Prog.", "Real"]);
    for row in session.carriers() {
        match row.kind {
            CarrierRowKind::Carrier => {
                table.add_row(vec![
                    Cell::new(&row.name),
                    Cell::new(row.programmed),
                    Cell::new(row.actual),
                ]);
            }
            CarrierRowKind::Separator => {}
            CarrierRowKind::Totals => {
                let (prog, real) = session.carrier_totals();
                table.add_row(vec![
                    Cell::new(row.name.as_str().bold()),
                    Cell::new(prog.to_string().bold()),
                    Cell::new(real.to_string().bold()),
                ]);
            }
        }
    }
    table
}

fn carrier_step(session: &mut Session) -> Result<Flow> {
    println!("Enter programmed and actual values.");
    let editable: Vec<(usize, String, u32, u32)> = session
        .carriers()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == CarrierRowKind::Carrier)
        .map(|(i, r)| (i, r.name.clone(), r.programmed, r.actual))
        .collect();

    for (index, name, programmed, actual) in editable {
        let programmed: u32 = Input::new()
            .with_prompt(format!("{name} Prog."))
            .default(programmed)
            .interact_text()?;
        let actual: u32 = Input::new()
            .with_prompt(format!("{name} Real"))
            .default(actual)
            .interact_text()?;
        session.set_carrier(index, programmed, actual)?;
    }
    println!("{}", carrier_table(session));

    let choice = Select::new()
        .items(&["Next \u{2192}", "\u{2190} Back"])
        .default(0)
        .interact()?;
    if choice == 0 {
        session.submit_carriers()?;
    } else {
        session.go_back(Step::PrincipalData)?;
    }
    Ok(Flow::Continue)
}

fn operational_step(session: &mut Session) -> Result<Flow> {
    println!("Complete programmed and actual values for each indicator.");
    let rows = session.operational().to_vec();
    for (index, row) in rows.iter().enumerate() {
        let programmed = match row.choices {
            Some(set) => {
                let options = session.options(set).to_vec();
                let current = options.iter().position(|o| *o == row.programmed).unwrap_or(0);
                let picked = Select::new()
                    .with_prompt(format!("{} (Programado)", row.concept))
                    .items(&options)
                    .default(current)
                    .interact()?;
                options[picked].clone()
            }
            None => Input::new()
                .with_prompt(format!("{} (Programado)", row.concept))
                .default(row.programmed.clone())
                .allow_empty(true)
                .interact_text()?,
        };
        let actual: String = Input::new()
            .with_prompt(format!("{} (Real)", row.concept))
            .default(row.actual.clone())
            .allow_empty(true)
            .interact_text()?;
        session.set_operational(index, &programmed, &actual)?;
    }

    let choice = Select::new()
        .items(&["Review all data \u{2192}", "\u{2190} Back to companies"])
        .default(0)
        .interact()?;
    if choice == 0 {
        session.submit_operational()?;
    } else {
        session.go_back(Step::CarrierTable)?;
    }
    Ok(Flow::Continue)
}

fn print_review(review: &Review) {
    let p = &review.principal;
    println!("{}", "Principal data".bold());
    println!("  Date:                {}", p.date);
    println!("  Safety ABC:          {}", p.safety_category);
    println!("  Salar de Atacama:    {}", review.salar_time());
    println!("  Pto. Angamos:        {}", review.port_time());
    println!();

    let mut carriers = Table::new();
    carriers.set_header(vec!["Transport company", "Prog.", "Real"]);
    let (total_prog, total_real) = review.totals();
    for row in &review.carriers {
        let bold = row.kind == CarrierRowKind::Totals;
        let (prog, real) = if bold {
            (total_prog, total_real)
        } else {
            (row.programmed, row.actual)
        };
        let cells = [row.name.clone(), prog.to_string(), real.to_string()];
        carriers.add_row(cells.into_iter().map(|c| {
            if bold {
                Cell::new(c.bold())
            } else {
                Cell::new(c)
            }
        }));
    }
    println!("{}\n{carriers}\n", "Transport companies".bold());

    let mut operational = Table::new();
    operational.set_header(vec!["Concept", "Programado", "Real"]);
    for row in &review.operational {
        operational.add_row(vec![&row.concept, &row.programmed, &row.actual]);
    }
    println!("{}\n{operational}", "Operational data".bold());
}

/// Save the reviewed record. A failed write is reported and the session is
/// kept at Review so the operator can retry or go back.
fn save_record(review: &Review, dir: &Path) -> Option<PathBuf> {
    match record::save(review, dir) {
        Ok(path) => {
            println!("{}", format!("Record saved to {}", path.display()).green());
            Some(path)
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "record save failed");
            println!("{}", format!("Could not save record: {e}").red());
            None
        }
    }
}

fn review_step(session: &mut Session, catalog: &Catalog, data_dir: &Path) -> Result<Flow> {
    let review = session.review()?;
    print_review(&review);

    let choice = Select::new()
        .items(&[
            "Save record",
            "\u{2190} Edit operational data",
            "\u{21bb} Edit principal data",
            "Quit without saving",
        ])
        .default(0)
        .interact()?;
    match choice {
        0 => {
            if save_record(&review, &data_dir.join("registros")).is_none() {
                return Ok(Flow::Continue);
            }
            let again = Confirm::new()
                .with_prompt("Start a new record?")
                .default(false)
                .interact()?;
            if again {
                session.reset(catalog)?;
                Ok(Flow::Continue)
            } else {
                Ok(Flow::Quit)
            }
        }
        1 => {
            session.go_back(Step::OperationalTable)?;
            Ok(Flow::Continue)
        }
        2 => {
            session.go_back(Step::PrincipalData)?;
            Ok(Flow::Continue)
        }
        _ => {
            println!("{}", "Record discarded.".yellow());
            Ok(Flow::Quit)
        }
    }
}
