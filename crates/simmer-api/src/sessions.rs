// Cooking-session status
//
// Read side of the cloud: the active-sessions document and an optional
// background poller. Polling is display-only plumbing -- it shares
// nothing with the command path and never blocks it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::CloudClient;
use crate::error::Error;
use crate::models::{CookingSession, ProgramState, SessionsResponse};

impl CloudClient {
    /// Active cooking sessions for the account.
    ///
    /// `GET /cooking/sessions/`
    pub async fn list_sessions(&self) -> Result<Vec<CookingSession>, Error> {
        debug!("fetching cooking sessions");
        let resp: SessionsResponse = self.get_json("cooking/sessions/").await?;
        Ok(resp.sessions)
    }

    /// Fold a sessions snapshot into the program-state mirror: tracked
    /// devices with a session become Active, the rest Idle. Untracked
    /// devices in the snapshot are ignored.
    pub fn apply_sessions(&self, tracked: &[String], sessions: &[CookingSession]) {
        let active: HashSet<&str> = sessions
            .iter()
            .filter_map(|s| s.device_id.as_deref())
            .collect();

        for device_id in tracked {
            let state = if active.contains(device_id.as_str()) {
                ProgramState::Active
            } else {
                ProgramState::Idle
            };
            self.note_state(device_id, state);
        }
    }
}

/// Background status poller.
///
/// Fetches the sessions document on a fixed cadence, folds it into the
/// client's state mirror, and publishes each snapshot through a watch
/// channel. Poll failures are logged and skipped -- the next tick tries
/// again, and the command path is unaffected throughout.
pub struct StatusPoller {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    rx: watch::Receiver<Vec<CookingSession>>,
}

impl StatusPoller {
    /// Spawn the poll task. `tracked` is the set of device ids whose
    /// state mirror the poller maintains.
    pub fn spawn(client: Arc<CloudClient>, tracked: Vec<String>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(Vec::new());

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match client.list_sessions().await {
                            Ok(sessions) => {
                                client.apply_sessions(&tracked, &sessions);
                                let _ = tx.send(sessions);
                            }
                            Err(err) => warn!(error = %err, "status poll failed"),
                        }
                    }
                }
            }
            debug!("status poller stopped");
        });

        Self { handle, cancel, rx }
    }

    /// Subscribe to session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Vec<CookingSession>> {
        self.rx.clone()
    }

    /// Stop the poll task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
