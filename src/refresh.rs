use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::StudentClient;
use crate::models::Student;

/// How long the backend is expected to need to recompute its stats.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(150);

pub type LoadingCallback = Box<dyn FnOnce(bool) + Send>;
pub type DataCallback = Box<dyn FnOnce(Vec<Student>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { students: usize },
    Failed,
    Cancelled,
}

/// Handle to a pending refresh. Dropping it does not cancel the refresh.
pub struct RefreshHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<RefreshOutcome>,
    outcome: Option<RefreshOutcome>,
}

impl RefreshHandle {
    /// Stops the deferred fetch if its timer has not fired yet. Returns
    /// whether the cancellation took effect.
    pub fn cancel(&mut self) -> bool {
        self.cancel
            .take()
            .is_some_and(|signal| signal.send(()).is_ok())
    }

    /// Resolves once the refresh has finished, been cancelled, or failed.
    pub async fn wait(&mut self) -> RefreshOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let outcome = match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "refresh task did not complete");
                RefreshOutcome::Failed
            }
        };
        self.outcome = Some(outcome);
        outcome
    }
}

/// Turns the loading state off however the deferred fetch ends.
struct LoadingReset(Option<LoadingCallback>);

impl Drop for LoadingReset {
    fn drop(&mut self) {
        if let Some(on_loading_change) = self.0.take() {
            on_loading_change(false);
            debug!("loading state turned off");
        }
    }
}

/// Kicks off a backend recompute and re-fetches the results once `delay`
/// has passed.
///
/// The recompute request is detached and its failure only logged. Must be
/// called from within a Tokio runtime.
pub fn trigger_stats_refresh(
    client: &StudentClient,
    delay: Duration,
    on_loading_change: Option<LoadingCallback>,
    on_data_update: Option<DataCallback>,
) -> RefreshHandle {
    info!(delay_secs = delay.as_secs(), "starting stats refresh timer");

    let recompute = client.clone();
    tokio::spawn(async move {
        if let Err(err) = recompute.trigger_recompute().await {
            warn!(error = %err, "initial refresh API call failed");
        }
    });

    let (cancel, mut cancelled) = oneshot::channel::<()>();
    let client = client.clone();
    let task = tokio::spawn(async move {
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        tokio::select! {
            biased;
            signal = &mut cancelled => {
                if signal.is_ok() {
                    info!("stats refresh cancelled before the timer fired");
                    return RefreshOutcome::Cancelled;
                }
                timer.await;
            }
            _ = &mut timer => {}
        }

        // A signal that lands after the race but before the close still wins.
        cancelled.close();
        if cancelled.try_recv().is_ok() {
            info!("stats refresh cancelled as the timer fired");
            return RefreshOutcome::Cancelled;
        }

        let _loading = LoadingReset(on_loading_change);
        info!("timer complete, fetching updated results");
        match client.fetch_student_data().await {
            Ok(students) => {
                let count = students.len();
                if let Some(on_data_update) = on_data_update {
                    on_data_update(students);
                }
                RefreshOutcome::Updated { students: count }
            }
            Err(err) => {
                error!(error = %err, "error fetching refreshed results");
                RefreshOutcome::Failed
            }
        }
    });

    RefreshHandle {
        cancel: Some(cancel),
        task,
        outcome: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::stub_client;
    use crate::client::{RECOMPUTE_URL, RESULTS_URL};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorded {
        loading: Mutex<Vec<bool>>,
        updates: Mutex<Vec<Vec<Student>>>,
    }

    fn callbacks(recorded: &Arc<Recorded>) -> (Option<LoadingCallback>, Option<DataCallback>) {
        let loading = Arc::clone(recorded);
        let updates = Arc::clone(recorded);
        (
            Some(Box::new(move |state| loading.loading.lock().push(state))),
            Some(Box::new(move |students| updates.updates.lock().push(students))),
        )
    }

    fn live_results() -> serde_json::Value {
        json!({"success": true, "data": [{"summary": {"user": "Syed Arman"}}]})
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fetches_once_after_the_delay() {
        let (transport, client) = stub_client();
        transport.reply(RECOMPUTE_URL, 200, "");
        transport.reply_json(RESULTS_URL, 200, &live_results());
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        let started = Instant::now();
        let mut handle = trigger_stats_refresh(&client, DEFAULT_REFRESH_DELAY, on_loading, on_data);

        tokio::time::sleep(Duration::from_secs(149)).await;
        assert_eq!(transport.calls(), vec![RECOMPUTE_URL.to_string()]);
        assert!(recorded.updates.lock().is_empty());
        assert!(recorded.loading.lock().is_empty());

        let outcome = handle.wait().await;
        assert_eq!(outcome, RefreshOutcome::Updated { students: 1 });
        assert!(started.elapsed() >= DEFAULT_REFRESH_DELAY);
        assert_eq!(
            transport.calls(),
            vec![RECOMPUTE_URL.to_string(), RESULTS_URL.to_string()]
        );

        let updates = recorded.updates.lock();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0][0].name, "syed arman");
        assert_eq!(*recorded.loading.lock(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_still_clears_loading() {
        let (transport, client) = stub_client();
        transport.reply(RESULTS_URL, 500, "");
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        let mut handle = trigger_stats_refresh(&client, DEFAULT_REFRESH_DELAY, on_loading, on_data);

        assert_eq!(handle.wait().await, RefreshOutcome::Failed);
        assert!(recorded.updates.lock().is_empty());
        assert_eq!(*recorded.loading.lock(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_refresh_never_calls_back() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &live_results());
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        let mut handle = trigger_stats_refresh(&client, DEFAULT_REFRESH_DELAY, on_loading, on_data);
        assert!(handle.cancel());
        assert!(!handle.cancel());

        assert_eq!(handle.wait().await, RefreshOutcome::Cancelled);
        tokio::time::sleep(DEFAULT_REFRESH_DELAY * 2).await;

        assert!(recorded.updates.lock().is_empty());
        assert!(recorded.loading.lock().is_empty());
        assert!(!transport.calls().contains(&RESULTS_URL.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_beats_an_elapsed_timer() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &live_results());
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        let mut handle = trigger_stats_refresh(&client, Duration::ZERO, on_loading, on_data);
        assert!(handle.cancel());

        assert_eq!(handle.wait().await, RefreshOutcome::Cancelled);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(recorded.updates.lock().is_empty());
        assert!(recorded.loading.lock().is_empty());
        assert!(!transport.calls().contains(&RESULTS_URL.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_the_timer_has_no_effect() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &live_results());
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        let mut handle = trigger_stats_refresh(&client, Duration::from_secs(5), on_loading, on_data);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!handle.cancel());
        assert_eq!(handle.wait().await, RefreshOutcome::Updated { students: 1 });
        assert_eq!(*recorded.loading.lock(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_keeps_the_refresh_alive() {
        let (transport, client) = stub_client();
        transport.reply_json(RESULTS_URL, 200, &live_results());
        let recorded = Arc::new(Recorded::default());
        let (on_loading, on_data) = callbacks(&recorded);

        drop(trigger_stats_refresh(&client, DEFAULT_REFRESH_DELAY, on_loading, on_data));
        tokio::time::sleep(DEFAULT_REFRESH_DELAY + Duration::from_secs(1)).await;

        assert_eq!(recorded.updates.lock().len(), 1);
        assert_eq!(*recorded.loading.lock(), vec![false]);
    }
}
