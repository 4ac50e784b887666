//! Patient search: one query-and-render cycle, plus the tabbed profile view.
//!
//! A [`SearchSession`] is recreated logically on every submission: query,
//! result list, and status are transient and shared with nothing else. The
//! status distinctions matter to the user:
//!
//! - an **empty result** is `NotFound` — the backend answered, nobody matched;
//! - a **failed call** is `Error` — the message is surfaced verbatim;
//! - an **empty query** is neither — it never leaves the client at all.
//!
//! The status logic is split into pure functions ([`SearchSession::submit`],
//! [`SearchSession::apply_result`]) so tests can drive every render state
//! without a network; [`SearchSession::run`] composes them around the actual
//! API call.

use crate::api::ApiClient;
use crate::patient::Patient;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Render state of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// No query submitted yet (or the last submission was blank).
    #[default]
    Idle,
    /// Search call in flight.
    Loading,
    /// At least one record matched.
    Success,
    /// The backend answered with zero records; the query is still shown.
    NotFound,
    /// Transport or service failure; the message is surfaced.
    Error,
}

/// One query-and-render cycle against the patient search endpoint.
#[derive(Debug, Default)]
pub struct SearchSession {
    query: String,
    results: Vec<Patient>,
    status: SearchStatus,
    error: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// The trimmed query of the current cycle.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Ordered results of the last successful search.
    pub fn results(&self) -> &[Patient] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submit a query. Returns the trimmed term to search for, or `None` when
    /// the query is blank — in which case the session resets to `Idle` and no
    /// network call must be made.
    pub fn submit(&mut self, raw_query: &str) -> Option<String> {
        let trimmed = raw_query.trim();
        if trimmed.is_empty() {
            self.query.clear();
            self.results.clear();
            self.error = None;
            self.status = SearchStatus::Idle;
            return None;
        }
        self.query = trimmed.to_string();
        self.results.clear();
        self.error = None;
        self.status = SearchStatus::Loading;
        Some(self.query.clone())
    }

    /// Fold the search call's result into the session.
    pub fn apply_result(&mut self, result: Result<Vec<Patient>, String>) {
        match result {
            Ok(patients) if patients.is_empty() => {
                self.results.clear();
                self.status = SearchStatus::NotFound;
            }
            Ok(patients) => {
                self.results = patients;
                self.status = SearchStatus::Success;
            }
            Err(message) => {
                self.results.clear();
                self.error = Some(message);
                self.status = SearchStatus::Error;
            }
        }
    }

    /// Run one full cycle: submit, call the backend, fold the result.
    ///
    /// A blank query is a no-op that leaves the session `Idle`.
    pub async fn run(&mut self, api: &ApiClient, raw_query: &str) {
        let Some(term) = self.submit(raw_query) else {
            debug!("Blank search query; not issuing a request");
            return;
        };
        let result = api
            .search_patients(&term)
            .await
            .map_err(|e| e.to_string());
        self.apply_result(result);
    }
}

// ── Profile view ─────────────────────────────────────────────────────────

/// The five fixed category tabs of a patient profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileTab {
    #[default]
    Personal,
    Sociodemographic,
    Academic,
    Health,
    Employment,
}

impl ProfileTab {
    /// All tabs, in display order.
    pub const ALL: [ProfileTab; 5] = [
        ProfileTab::Personal,
        ProfileTab::Sociodemographic,
        ProfileTab::Academic,
        ProfileTab::Health,
        ProfileTab::Employment,
    ];

    /// Human-readable tab label.
    pub fn label(self) -> &'static str {
        match self {
            ProfileTab::Personal => "Personal Data",
            ProfileTab::Sociodemographic => "Sociodemographic",
            ProfileTab::Academic => "Academic",
            ProfileTab::Health => "Health",
            ProfileTab::Employment => "Employment",
        }
    }
}

/// One expandable patient profile with its locally selected tab.
///
/// Tab selection is pure view state: switching tabs re-reads fields from the
/// record already in memory and never triggers a new fetch.
#[derive(Debug)]
pub struct ProfileView {
    patient: Patient,
    active_tab: ProfileTab,
}

impl ProfileView {
    /// Wrap a record, starting on the personal tab.
    pub fn new(patient: Patient) -> Self {
        Self {
            patient,
            active_tab: ProfileTab::Personal,
        }
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn active_tab(&self) -> ProfileTab {
        self.active_tab
    }

    /// Select a tab. Local state only — no I/O.
    pub fn select(&mut self, tab: ProfileTab) {
        self.active_tab = tab;
    }

    /// Header line: full name plus cédula, shown above every tab.
    pub fn header(&self) -> (&str, &str) {
        (
            &self.patient.personal.full_name,
            &self.patient.personal.cedula,
        )
    }

    /// The active tab's fields as label/value pairs, in display order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let p = &self.patient;
        match self.active_tab {
            ProfileTab::Personal => vec![
                ("Full Name", p.personal.full_name.clone()),
                ("Cédula", p.personal.cedula.clone()),
                ("Date of Birth", p.personal.birth_date.clone()),
                ("Age", p.personal.age.to_string()),
                ("Gender", p.personal.gender.clone()),
                ("Marital Status", p.personal.marital_status.clone()),
                ("Place of Birth", p.personal.birth_place.clone()),
                ("Nationality", p.personal.nationality.clone()),
            ],
            ProfileTab::Sociodemographic => vec![
                ("Address", p.sociodemographic.address.clone()),
                ("Neighborhood", p.sociodemographic.neighborhood.clone()),
                ("Locality", p.sociodemographic.locality.clone()),
                ("Stratum", p.sociodemographic.stratum.to_string()),
                ("Phone", p.sociodemographic.phone.clone()),
                ("Email", p.sociodemographic.email.clone()),
                ("Housing Type", p.sociodemographic.housing_type.clone()),
                ("Dependents", p.sociodemographic.dependents.to_string()),
            ],
            ProfileTab::Academic => vec![
                ("Education Level", p.academic.education_level.clone()),
                ("Degree", p.academic.degree.clone()),
                ("Institution", p.academic.institution.clone()),
                ("Year of Graduation", p.academic.graduation_year.to_string()),
            ],
            ProfileTab::Health => vec![
                ("EPS", p.health.eps.clone()),
                ("Regime", p.health.regime.clone()),
                ("Disability Type", p.health.disability_type.clone()),
                ("Primary Diagnosis", p.health.primary_diagnosis.clone()),
                ("Medical History", p.health.medical_history.join(", ")),
                (
                    "Current Medications",
                    p.health.current_medications.join(", "),
                ),
                ("Last Consultation", p.health.last_consultation.clone()),
            ],
            ProfileTab::Employment => vec![
                ("Employment Status", p.employment.employment_status.clone()),
                ("Occupation", p.employment.occupation.clone()),
                ("Company", p.employment.company.clone()),
                ("Monthly Income (COP)", p.employment.monthly_income.clone()),
            ],
        }
    }
}
