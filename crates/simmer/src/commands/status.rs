//! Status command: one-shot session listing and `--watch` polling.

use std::time::Duration;

use tabled::Tabled;

use simmer_api::{CookingSession, StatusPoller};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::commands::App;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&CookingSession> for SessionRow {
    fn from(s: &CookingSession) -> Self {
        Self {
            device: s.device_id.clone().unwrap_or_default(),
            state: s.state_label().unwrap_or("-").to_owned(),
        }
    }
}

pub async fn handle(args: StatusArgs, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let sessions = app.client.list_sessions().await?;
    print_snapshot(&sessions, global);

    if !args.watch {
        return Ok(());
    }

    // Track the configured device when there is one, otherwise every
    // appliance on the account.
    let tracked = match app.target(global) {
        Ok(target) => vec![target.device_id],
        Err(_) => {
            let devices = app.client.list_devices().await?;
            devices.into_iter().map(|d| d.device_id).collect()
        }
    };

    let poller = StatusPoller::spawn(
        app.client.clone(),
        tracked,
        Duration::from_secs(args.interval.max(1)),
    );
    let mut rx = poller.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                print_snapshot(&snapshot, global);
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn print_snapshot(sessions: &[CookingSession], global: &GlobalOpts) {
    if sessions.is_empty() {
        if !global.quiet {
            println!("no active cooking sessions");
        }
        return;
    }
    println!(
        "{}",
        output::render_list(&global.output, sessions, SessionRow::from, |s| {
            s.device_id.clone().unwrap_or_default()
        })
    );
}
