//! The four-step data-entry wizard.
//!
//! A [`Session`] owns everything the operator has typed so far. Steps only
//! move the step pointer and write into the session's own tables, so going
//! back and forward never loses edits. Nothing is persisted until the
//! caller exports the [`Review`].

use std::fmt;

use chrono::NaiveDate;

use crate::catalog::{Catalog, ChoiceSet};
use crate::error::FormError;
use crate::fmt::{minutes_to_hhmm, parse_hhmm};

pub const TOTALS_LABEL: &str = "Totales";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    PrincipalData,
    CarrierTable,
    OperationalTable,
    Review,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Self::PrincipalData => 1,
            Self::CarrierTable => 2,
            Self::OperationalTable => 3,
            Self::Review => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::PrincipalData => "Principal data",
            Self::CarrierTable => "Transport companies",
            Self::OperationalTable => "Operational data",
            Self::Review => "Final review",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// Raw values of the first step as the operator typed them.
#[derive(Debug, Clone)]
pub struct PrincipalInput {
    pub date: NaiveDate,
    pub safety_category: String,
    pub salar_time: String,
    pub port_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalData {
    /// `YYYY-MM-DD`
    pub date: String,
    pub safety_category: String,
    pub salar_minutes: u32,
    pub port_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierRowKind {
    Carrier,
    Separator,
    Totals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierRow {
    pub name: String,
    pub kind: CarrierRowKind,
    pub programmed: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalRow {
    pub concept: String,
    pub choices: Option<ChoiceSet>,
    pub programmed: String,
    pub actual: String,
}

/// Read-only snapshot shown at the last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub principal: PrincipalData,
    pub carriers: Vec<CarrierRow>,
    pub operational: Vec<OperationalRow>,
}

impl Review {
    pub fn salar_time(&self) -> String {
        minutes_to_hhmm(self.principal.salar_minutes)
    }

    pub fn port_time(&self) -> String {
        minutes_to_hhmm(self.principal.port_minutes)
    }

    pub fn totals(&self) -> (u32, u32) {
        self.carriers
            .iter()
            .find(|r| r.kind == CarrierRowKind::Totals)
            .map(|r| (r.programmed, r.actual))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    step: Step,
    principal: Option<PrincipalData>,
    carriers: Vec<CarrierRow>,
    operational: Vec<OperationalRow>,
    options: Options,
}

/// Choice lists copied out of the catalog at session start.
#[derive(Debug, Clone, Default)]
struct Options {
    sectors: Vec<String>,
    products: Vec<String>,
    destinations: Vec<String>,
}

impl Options {
    fn get(&self, set: ChoiceSet) -> &[String] {
        match set {
            ChoiceSet::Sector => &self.sectors,
            ChoiceSet::Product => &self.products,
            ChoiceSet::Destination => &self.destinations,
        }
    }
}

fn blank_carriers(names: &[String]) -> Vec<CarrierRow> {
    let mut rows: Vec<CarrierRow> = names
        .iter()
        .map(|name| CarrierRow {
            name: name.clone(),
            kind: CarrierRowKind::Carrier,
            programmed: 0,
            actual: 0,
        })
        .collect();
    rows.push(CarrierRow {
        name: String::new(),
        kind: CarrierRowKind::Separator,
        programmed: 0,
        actual: 0,
    });
    rows.push(CarrierRow {
        name: TOTALS_LABEL.to_string(),
        kind: CarrierRowKind::Totals,
        programmed: 0,
        actual: 0,
    });
    rows
}

impl Session {
    pub fn new(catalog: &Catalog) -> Self {
        let operational = catalog
            .concepts
            .iter()
            .map(|c| OperationalRow {
                concept: c.label.clone(),
                choices: c.choices,
                programmed: String::new(),
                actual: String::new(),
            })
            .collect();
        Self {
            step: Step::PrincipalData,
            principal: None,
            carriers: blank_carriers(&catalog.carriers),
            operational,
            options: Options {
                sectors: catalog.sectors.clone(),
                products: catalog.products.clone(),
                destinations: catalog.destinations.clone(),
            },
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn principal(&self) -> Option<&PrincipalData> {
        self.principal.as_ref()
    }

    pub fn carriers(&self) -> &[CarrierRow] {
        &self.carriers
    }

    pub fn operational(&self) -> &[OperationalRow] {
        &self.operational
    }

    pub fn options(&self, set: ChoiceSet) -> &[String] {
        self.options.get(set)
    }

    fn expect_step(&self, expected: Step) -> Result<(), FormError> {
        if self.step != expected {
            return Err(FormError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step 1
    // -----------------------------------------------------------------------

    pub fn submit_principal(&mut self, input: PrincipalInput) -> Result<(), FormError> {
        self.expect_step(Step::PrincipalData)?;
        let salar_minutes =
            parse_hhmm(&input.salar_time).ok_or_else(|| FormError::InvalidDuration {
                field: "Salar de Atacama time",
                value: input.salar_time.clone(),
            })?;
        let port_minutes =
            parse_hhmm(&input.port_time).ok_or_else(|| FormError::InvalidDuration {
                field: "Pto. Angamos time",
                value: input.port_time.clone(),
            })?;
        self.principal = Some(PrincipalData {
            date: input.date.format("%Y-%m-%d").to_string(),
            safety_category: input.safety_category,
            salar_minutes,
            port_minutes,
        });
        self.step = Step::CarrierTable;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step 2
    // -----------------------------------------------------------------------

    pub fn set_carrier(&mut self, index: usize, programmed: u32, actual: u32) -> Result<(), FormError> {
        self.expect_step(Step::CarrierTable)?;
        let row = self
            .carriers
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange(index))?;
        if row.kind != CarrierRowKind::Carrier {
            return Err(FormError::ReadOnlyRow(index));
        }
        row.programmed = programmed;
        row.actual = actual;
        Ok(())
    }

    /// Sum of the named carrier rows, computed fresh on every call.
    pub fn carrier_totals(&self) -> (u32, u32) {
        self.carriers
            .iter()
            .filter(|r| r.kind == CarrierRowKind::Carrier)
            .fold((0u32, 0u32), |(p, a), r| {
                (p.saturating_add(r.programmed), a.saturating_add(r.actual))
            })
    }

    pub fn submit_carriers(&mut self) -> Result<(), FormError> {
        self.expect_step(Step::CarrierTable)?;
        for row in &mut self.operational {
            if let Some(set) = row.choices {
                if row.programmed.is_empty() {
                    if let Some(first) = self.options.get(set).first() {
                        row.programmed = first.clone();
                    }
                }
            }
        }
        self.step = Step::OperationalTable;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step 3
    // -----------------------------------------------------------------------

    pub fn set_operational(
        &mut self,
        index: usize,
        programmed: &str,
        actual: &str,
    ) -> Result<(), FormError> {
        self.expect_step(Step::OperationalTable)?;
        let row = self
            .operational
            .get(index)
            .ok_or(FormError::RowOutOfRange(index))?;
        if let Some(set) = row.choices {
            if !self.options.get(set).iter().any(|o| o == programmed) {
                return Err(FormError::UnknownOption {
                    concept: row.concept.clone(),
                    value: programmed.to_string(),
                });
            }
        }
        let row = &mut self.operational[index];
        row.programmed = programmed.to_string();
        row.actual = actual.to_string();
        Ok(())
    }

    pub fn submit_operational(&mut self) -> Result<(), FormError> {
        self.expect_step(Step::OperationalTable)?;
        self.step = Step::Review;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Navigation, review, reset
    // -----------------------------------------------------------------------

    /// Move the step pointer back. Entered data is kept.
    pub fn go_back(&mut self, to: Step) -> Result<(), FormError> {
        if to >= self.step {
            return Err(FormError::ForwardJump {
                from: self.step,
                to,
            });
        }
        self.step = to;
        Ok(())
    }

    pub fn review(&self) -> Result<Review, FormError> {
        self.expect_step(Step::Review)?;
        let principal = self.principal.clone().ok_or(FormError::WrongStep {
            expected: Step::PrincipalData,
            actual: self.step,
        })?;
        let (prog, real) = self.carrier_totals();
        let carriers = self
            .carriers
            .iter()
            .map(|r| match r.kind {
                CarrierRowKind::Totals => CarrierRow {
                    programmed: prog,
                    actual: real,
                    ..r.clone()
                },
                _ => r.clone(),
            })
            .collect();
        Ok(Review {
            principal,
            carriers,
            operational: self.operational.clone(),
        })
    }

    /// Discard everything and start over. Only offered from the review step.
    pub fn reset(&mut self, catalog: &Catalog) -> Result<(), FormError> {
        self.expect_step(Step::Review)?;
        *self = Session::new(catalog);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(salar: &str, port: &str) -> PrincipalInput {
        PrincipalInput {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            safety_category: "B".to_string(),
            salar_time: salar.to_string(),
            port_time: port.to_string(),
        }
    }

    fn at_review(catalog: &Catalog) -> Session {
        let mut s = Session::new(catalog);
        s.submit_principal(input("01:30", "00:45")).unwrap();
        s.submit_carriers().unwrap();
        s.submit_operational().unwrap();
        s
    }

    #[test]
    fn test_new_session_layout() {
        let s = Session::new(&Catalog::default());
        assert_eq!(s.step(), Step::PrincipalData);
        assert_eq!(s.carriers().len(), 11);
        assert_eq!(s.carriers()[9].kind, CarrierRowKind::Separator);
        assert_eq!(s.carriers()[10].name, TOTALS_LABEL);
        assert_eq!(s.operational().len(), 12);
        assert!(s.principal().is_none());
    }

    #[test]
    fn test_principal_stores_iso_date_and_minutes() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("01:30", "02:05")).unwrap();
        assert_eq!(s.step(), Step::CarrierTable);
        let p = s.principal().unwrap();
        assert_eq!(p.date, "2024-01-01");
        assert_eq!(p.safety_category, "B");
        assert_eq!(p.salar_minutes, 90);
        assert_eq!(p.port_minutes, 125);
    }

    #[test]
    fn test_invalid_duration_blocks_transition() {
        for bad in ["abc", "12", ""] {
            let mut s = Session::new(&Catalog::default());
            let err = s.submit_principal(input(bad, "00:00")).unwrap_err();
            assert!(matches!(err, FormError::InvalidDuration { .. }));
            assert_eq!(s.step(), Step::PrincipalData);
            assert!(s.principal().is_none());

            let err = s.submit_principal(input("00:00", bad)).unwrap_err();
            assert!(matches!(err, FormError::InvalidDuration { field: "Pto. Angamos time", .. }));
            assert_eq!(s.step(), Step::PrincipalData);
        }
    }

    #[test]
    fn test_totals_are_sum_of_named_carriers() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("00:00", "00:00")).unwrap();
        let mut expected = (0, 0);
        for i in 0..9 {
            let (p, a) = (i as u32 * 3, i as u32 * 7 + 1);
            s.set_carrier(i, p, a).unwrap();
            expected.0 += p;
            expected.1 += a;
        }
        assert_eq!(s.carrier_totals(), expected);
        s.set_carrier(4, 100, 0).unwrap();
        assert_eq!(s.carrier_totals().0, expected.0 - 12 + 100);
    }

    #[test]
    fn test_separator_and_totals_rows_are_read_only() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("00:00", "00:00")).unwrap();
        assert_eq!(s.set_carrier(9, 1, 1), Err(FormError::ReadOnlyRow(9)));
        assert_eq!(s.set_carrier(10, 1, 1), Err(FormError::ReadOnlyRow(10)));
        assert_eq!(s.set_carrier(11, 1, 1), Err(FormError::RowOutOfRange(11)));
    }

    #[test]
    fn test_edits_outside_their_step_are_rejected() {
        let mut s = Session::new(&Catalog::default());
        assert!(matches!(s.set_carrier(0, 1, 1), Err(FormError::WrongStep { .. })));
        assert!(matches!(s.submit_carriers(), Err(FormError::WrongStep { .. })));
        assert!(matches!(s.review(), Err(FormError::WrongStep { .. })));
    }

    #[test]
    fn test_constrained_rows_default_to_first_option() {
        let catalog = Catalog::default();
        let mut s = Session::new(&catalog);
        s.submit_principal(input("00:00", "00:00")).unwrap();
        s.submit_carriers().unwrap();
        assert_eq!(s.operational()[0].programmed, "MOP-I");
        assert_eq!(s.operational()[1].programmed, "BISCHOFITA");
        assert_eq!(s.operational()[2].programmed, "Calama");
        assert_eq!(s.operational()[3].programmed, "");
    }

    #[test]
    fn test_constrained_rows_reject_unknown_options() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("00:00", "00:00")).unwrap();
        s.submit_carriers().unwrap();
        let err = s.set_operational(1, "GRAVEL", "x").unwrap_err();
        assert!(matches!(err, FormError::UnknownOption { .. }));
        s.set_operational(1, "MOP-S", "anything").unwrap();
        assert_eq!(s.operational()[1].actual, "anything");
    }

    #[test]
    fn test_free_rows_accept_any_text() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("00:00", "00:00")).unwrap();
        s.submit_carriers().unwrap();
        s.set_operational(4, "98,5%", "").unwrap();
        s.set_operational(11, "", "not a number").unwrap();
        assert_eq!(s.operational()[4].programmed, "98,5%");
        assert_eq!(s.operational()[11].actual, "not a number");
    }

    #[test]
    fn test_back_navigation_keeps_edits() {
        let mut s = Session::new(&Catalog::default());
        s.submit_principal(input("00:10", "00:20")).unwrap();
        s.set_carrier(0, 5, 4).unwrap();
        s.submit_carriers().unwrap();
        s.set_operational(3, "1200", "1100").unwrap();
        s.submit_operational().unwrap();

        s.go_back(Step::PrincipalData).unwrap();
        assert_eq!(s.step(), Step::PrincipalData);
        s.submit_principal(input("00:10", "00:20")).unwrap();
        assert_eq!(s.carriers()[0].programmed, 5);
        s.submit_carriers().unwrap();
        assert_eq!(s.operational()[3].programmed, "1200");
    }

    #[test]
    fn test_forward_jump_is_rejected() {
        let mut s = Session::new(&Catalog::default());
        let err = s.go_back(Step::Review).unwrap_err();
        assert!(matches!(err, FormError::ForwardJump { .. }));
        assert!(s.go_back(Step::PrincipalData).is_err());
    }

    #[test]
    fn test_review_recomputes_totals_row() {
        let catalog = Catalog::default();
        let mut s = Session::new(&catalog);
        s.submit_principal(input("01:30", "00:45")).unwrap();
        s.set_carrier(0, 2, 1).unwrap();
        s.set_carrier(8, 3, 3).unwrap();
        s.submit_carriers().unwrap();
        s.submit_operational().unwrap();
        let r = s.review().unwrap();
        assert_eq!(r.totals(), (5, 4));
        assert_eq!(r.carriers[10].programmed, 5);
        assert_eq!(r.salar_time(), "01:30");
        assert_eq!(r.port_time(), "00:45");

        s.go_back(Step::CarrierTable).unwrap();
        s.set_carrier(1, 10, 10).unwrap();
        s.submit_carriers().unwrap();
        s.submit_operational().unwrap();
        assert_eq!(s.review().unwrap().totals(), (15, 14));
    }

    #[test]
    fn test_reset_only_from_review() {
        let catalog = Catalog::default();
        let mut s = Session::new(&catalog);
        assert!(s.reset(&catalog).is_err());

        let mut s = at_review(&catalog);
        s.reset(&catalog).unwrap();
        assert_eq!(s.step(), Step::PrincipalData);
        assert!(s.principal().is_none());
        assert!(s.operational().iter().all(|r| r.programmed.is_empty()));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::CarrierTable.to_string(), "2 (Transport companies)");
        assert!(Step::PrincipalData < Step::Review);
    }
}
