use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::client::StudentClient;
use crate::fallback;
use crate::models::{Student, Study};
use crate::refresh::{trigger_stats_refresh, RefreshHandle};

pub const FALLBACK_ADVISORY: &str =
    "Failed to load live data. Displaying cached mock data as a fallback.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StatKey {
    #[default]
    Overall,
    Speed,
    Memory,
    Attention,
    Flexibility,
    ProblemSolving,
    Math,
}

impl StatKey {
    pub const ALL: [StatKey; 7] = [
        StatKey::Overall,
        StatKey::Speed,
        StatKey::Memory,
        StatKey::Attention,
        StatKey::Flexibility,
        StatKey::ProblemSolving,
        StatKey::Math,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKey::Overall => "Overall LPI",
            StatKey::Speed => "Speed",
            StatKey::Memory => "Memory",
            StatKey::Attention => "Attention",
            StatKey::Flexibility => "Flexibility",
            StatKey::ProblemSolving => "Problem Solving",
            StatKey::Math => "Math",
        }
    }

    pub fn value(self, student: &Student) -> i64 {
        let lpi = &student.lpi;
        match self {
            StatKey::Overall => lpi.overall,
            StatKey::Speed => lpi.speed,
            StatKey::Memory => lpi.memory,
            StatKey::Attention => lpi.attention,
            StatKey::Flexibility => lpi.flexibility,
            StatKey::ProblemSolving => lpi.problem_solving,
            StatKey::Math => lpi.math,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonEntry {
    pub id: u32,
    pub name: String,
    pub value: i64,
    pub is_selected: bool,
}

/// Ranks students by one LPI stat, highest first. Ties keep input order.
pub fn compare(students: &[Student], stat: StatKey, selected_id: Option<u32>) -> Vec<ComparisonEntry> {
    let mut entries: Vec<ComparisonEntry> = students
        .iter()
        .map(|student| ComparisonEntry {
            id: student.id,
            name: student.name.clone(),
            value: stat.value(student),
            is_selected: Some(student.id) == selected_id,
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

#[derive(Debug)]
struct ViewState {
    students: Arc<[Student]>,
    advisory: Option<String>,
    is_refreshing: bool,
}

/// Loaded student list plus the flags the views render from.
pub struct Dashboard {
    client: StudentClient,
    refresh_delay: Duration,
    state: Arc<Mutex<ViewState>>,
}

impl Dashboard {
    /// Loads the live results, substituting the bundled snapshot on failure.
    pub async fn load(client: StudentClient, refresh_delay: Duration) -> Self {
        let (students, advisory) = match client.fetch_student_data().await {
            Ok(students) => {
                info!(students = students.len(), "loaded live student data");
                (students, None)
            }
            Err(err) => {
                warn!(error = %err, "falling back to bundled student data");
                (fallback::students(), Some(FALLBACK_ADVISORY.to_string()))
            }
        };

        Self {
            client,
            refresh_delay,
            state: Arc::new(Mutex::new(ViewState {
                students: students.into(),
                advisory,
                is_refreshing: false,
            })),
        }
    }

    pub fn students(&self) -> Arc<[Student]> {
        Arc::clone(&self.state.lock().students)
    }

    pub fn in_study(&self, study: Study) -> Vec<Student> {
        self.students()
            .iter()
            .filter(|student| student.study == study)
            .cloned()
            .collect()
    }

    pub fn find(&self, id: u32) -> Option<Student> {
        self.students().iter().find(|student| student.id == id).cloned()
    }

    pub fn advisory(&self) -> Option<String> {
        self.state.lock().advisory.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().is_refreshing
    }

    /// Starts a refresh unless one is already running.
    pub fn refresh(&self) -> Option<RefreshHandle> {
        {
            let mut state = self.state.lock();
            if state.is_refreshing {
                debug!("refresh already in progress; ignoring request");
                return None;
            }
            state.is_refreshing = true;
            state.advisory = None;
        }

        let loading_state = Arc::clone(&self.state);
        let data_state = Arc::clone(&self.state);
        Some(trigger_stats_refresh(
            &self.client,
            self.refresh_delay,
            Some(Box::new(move |loading: bool| {
                loading_state.lock().is_refreshing = loading;
            })),
            Some(Box::new(move |students: Vec<Student>| {
                info!(students = students.len(), "student data updated");
                data_state.lock().students = students.into();
            })),
        ))
    }

    /// Cancels a pending refresh. The orchestrator skips its own loading
    /// reset when cancelled, so the flag is cleared here. Once the timer has
    /// fired the fetch runs to completion and clears the flag itself.
    pub fn cancel_refresh(&self, handle: &mut RefreshHandle) -> bool {
        let cancelled = handle.cancel();
        if cancelled {
            self.state.lock().is_refreshing = false;
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::stub_client;
    use crate::client::RESULTS_URL;
    use crate::refresh::RefreshOutcome;
    use serde_json::json;

    fn roster() -> serde_json::Value {
        json!({"success": true, "data": [
            {"summary": {"user": "Amy"}, "accountInfo": {"study": "first"}, "lpi": {"overall": 700}},
            {"summary": {"user": "Ben"}, "accountInfo": {"study": "second"}, "lpi": {"overall": 900}},
            {"summary": {"user": "Cal"}, "accountInfo": {"study": "first"}, "lpi": {"overall": 800}}
        ]})
    }

    #[tokio::test]
    async fn live_data_loads_without_advisory() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &roster());

        let dashboard = Dashboard::load(client, Duration::from_secs(1)).await;
        assert_eq!(dashboard.students().len(), 3);
        assert_eq!(dashboard.advisory(), None);
        assert!(!dashboard.is_refreshing());
    }

    #[tokio::test]
    async fn failed_load_substitutes_fallback() {
        let (transport, client) = stub_client();
        transport.reply(RESULTS_URL, 502, "");

        let dashboard = Dashboard::load(client, Duration::from_secs(1)).await;
        assert_eq!(dashboard.students().len(), fallback::students().len());
        assert_eq!(dashboard.advisory().as_deref(), Some(FALLBACK_ADVISORY));
    }

    #[tokio::test]
    async fn study_filter_and_lookup() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &roster());
        let dashboard = Dashboard::load(client, Duration::from_secs(1)).await;

        let first: Vec<String> = dashboard
            .in_study(Study::First)
            .into_iter()
            .map(|student| student.name)
            .collect();
        assert_eq!(first, vec!["amy", "cal"]);
        assert_eq!(dashboard.find(2).map(|student| student.name), Some("ben".to_string()));
        assert!(dashboard.find(9).is_none());
    }

    #[test]
    fn comparison_sorts_descending_and_flags_selection() {
        let students = fallback::students();
        let entries = compare(&students, StatKey::Memory, Some(5));

        let values: Vec<i64> = entries.iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec![1147, 1045, 824, 773, 469]);
        assert!(entries[0].is_selected);
        assert_eq!(entries.iter().filter(|entry| entry.is_selected).count(), 1);
    }

    #[test]
    fn comparison_keeps_input_order_on_ties() {
        let students = crate::transform::transform_students(&json!([
            {"summary": {"user": "Amy"}, "lpi": {"overall": 500}},
            {"summary": {"user": "Ben"}, "lpi": {"overall": 700}},
            {"summary": {"user": "Cal"}, "lpi": {"overall": 500}}
        ]));
        let entries = compare(&students, StatKey::Overall, None);
        let order: Vec<u32> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert!(entries.iter().all(|entry| !entry.is_selected));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_replaces_the_list_and_guards_reentry() {
        let (transport, client) = stub_client();
        transport.reply(RESULTS_URL, 500, "");
        let dashboard = Dashboard::load(client, Duration::from_secs(30)).await;
        let before = dashboard.students();

        transport.reply_json(RESULTS_URL, 200, &roster());
        let mut handle = dashboard.refresh().expect("first refresh starts");
        assert!(dashboard.is_refreshing());
        assert_eq!(dashboard.advisory(), None);
        assert!(dashboard.refresh().is_none());

        assert_eq!(handle.wait().await, RefreshOutcome::Updated { students: 3 });
        assert!(!dashboard.is_refreshing());
        assert_eq!(dashboard.students().len(), 3);
        assert_eq!(before.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_resets_the_refresh_flag() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &roster());
        let dashboard = Dashboard::load(client, Duration::from_secs(30)).await;

        let mut handle = dashboard.refresh().expect("refresh starts");
        assert!(dashboard.cancel_refresh(&mut handle));
        assert!(!dashboard.is_refreshing());
        assert_eq!(handle.wait().await, RefreshOutcome::Cancelled);
        assert!(dashboard.refresh().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn late_cancel_keeps_the_refresh_guard() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &roster());
        let dashboard = Dashboard::load(client, Duration::from_secs(5)).await;
        transport.slow_down(RESULTS_URL, Duration::from_secs(10));

        let mut handle = dashboard.refresh().expect("refresh starts");
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(!dashboard.cancel_refresh(&mut handle));
        assert!(dashboard.is_refreshing());
        assert!(dashboard.refresh().is_none());

        assert_eq!(handle.wait().await, RefreshOutcome::Updated { students: 3 });
        assert!(!dashboard.is_refreshing());
    }
}
