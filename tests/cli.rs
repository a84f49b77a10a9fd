use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn regop(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("regop").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("REGOP_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn dispatch_row(date: &str, destination: &str, company: &str, hour: &str) -> String {
    let mut cols = vec!["x".to_string(); 15];
    cols[0] = date.to_string();
    cols[3] = destination.to_string();
    cols[11] = company.to_string();
    cols[14] = hour.to_string();
    cols.join(",")
}

fn write_dispatches(dir: &Path) -> PathBuf {
    let header: Vec<String> = (0..15).map(|i| format!("col{i}")).collect();
    let mut lines = vec![header.join(",")];
    for _ in 0..3 {
        lines.push(dispatch_row("01/01/2024", "Calama", "M AND Q SPA", "08:15:00"));
    }
    for _ in 0..2 {
        lines.push(dispatch_row("01/01/2024", "Mejillones", "M AND Q SPA", "09:05:00"));
    }
    lines.push(dispatch_row("02/01/2024", "Calama", "M AND Q SPA", "08:30:00"));
    lines.push(dispatch_row("01/01/2024", "Calama", "MSD", "10:00:00"));
    lines.push(dispatch_row("01/01/2024", "", "MSD", "11:00:00"));

    let path = dir.join("despachos.csv");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[test]
fn test_init_writes_settings_and_catalog() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");

    regop(home.path())
        .args(["init", "--data-dir", data.to_str().unwrap(), "--operator", "Turno Norte"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized regop"));

    assert!(data.join("catalog.json").exists());
    assert!(data.join("registros").is_dir());
    assert!(data.join("exports").is_dir());
    assert!(home.path().join(".config/regop/settings.json").exists());

    regop(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Turno Norte"))
        .stdout(predicate::str::contains("catalog.json"));
}

#[test]
fn test_status_without_init_uses_defaults() {
    let home = TempDir::new().unwrap();
    regop(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults"))
        .stdout(predicate::str::contains("regop init"));
}

#[test]
fn test_dates_lists_each_day() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());

    regop(home.path())
        .args(["dates", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01"))
        .stdout(predicate::str::contains("2024-01-02"))
        .stdout(predicate::str::contains("Skipped 1 rows"));
}

#[test]
fn test_dashboard_counts_by_hour_and_destination() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());

    regop(home.path())
        .args([
            "dashboard",
            file.to_str().unwrap(),
            "--date",
            "2024-01-01",
            "--destination",
            "Calama",
            "--destination",
            "Mejillones",
            "--company",
            "M AND Q SPA",
            "--from-hour",
            "8",
            "--to-hour",
            "9",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("M&Q SPA"))
        .stdout(predicate::str::contains("08:00 - 08:59"))
        .stdout(predicate::str::contains("09:00 - 09:59"))
        .stdout(predicate::str::contains("TOTAL"))
        .stdout(predicate::str::contains("MSD SPA").not());
}

#[test]
fn test_dashboard_reports_company_without_dispatches() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());

    regop(home.path())
        .args(["dashboard", file.to_str().unwrap(), "--date", "02/01/2024", "--company", "MSD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MSD SPA"))
        .stdout(predicate::str::contains("No dispatches for this selection"));
}

#[test]
fn test_dashboard_rejects_inverted_hour_range() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());

    regop(home.path())
        .args(["dashboard", file.to_str().unwrap(), "--from-hour", "12", "--to-hour", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_narrow_sheet_is_a_layout_error() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("narrow.csv");
    std::fs::write(&file, "a,b,c,d,e\n01/01/2024,x,x,Calama,x\n").unwrap();

    regop(home.path())
        .args(["dates", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sheet has 5 columns"));
}

#[test]
fn test_unsupported_extension_fails() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("despachos.json");
    std::fs::write(&file, "{}").unwrap();

    regop(home.path())
        .args(["dates", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[cfg(feature = "pdf")]
#[test]
fn test_export_writes_one_pdf_per_company() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());
    let out = home.path().join("out");

    regop(home.path())
        .args([
            "export",
            file.to_str().unwrap(),
            "--date",
            "2024-01-01",
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 reports exported"));

    let mq = std::fs::read(out.join("m_q_spa-2024-01-01.pdf")).unwrap();
    assert!(mq.starts_with(b"%PDF"));
    assert!(out.join("msd_spa-2024-01-01.pdf").exists());
}

#[cfg(feature = "pdf")]
#[test]
fn test_export_continues_after_one_company_fails() {
    let home = TempDir::new().unwrap();
    let file = write_dispatches(home.path());
    let out = home.path().join("out");
    // A directory where the M&Q report should go makes that write fail.
    std::fs::create_dir_all(out.join("m_q_spa-2024-01-01.pdf")).unwrap();

    regop(home.path())
        .args([
            "export",
            file.to_str().unwrap(),
            "--date",
            "2024-01-01",
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 reports exported"))
        .stdout(predicate::str::contains("1 reports failed"))
        .stderr(predicate::str::contains("Could not export M&Q SPA"));

    let msd = std::fs::read(out.join("msd_spa-2024-01-01.pdf")).unwrap();
    assert!(msd.starts_with(b"%PDF"));
}

#[test]
fn test_malformed_settings_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".config/regop");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("settings.json"), "{ data_dir: ").unwrap();

    regop(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings error"));
}
