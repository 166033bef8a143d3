use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};

use crate::{
    commands::{self, Command, Reply},
    events::SanctuaryEvent,
    session::SanctuarySession,
    settings::SettingsStore,
    streamer::RunOutcome,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_warn};

/// Line-oriented front end: one command per stdin line, events printed as
/// they arrive. Returns on `quit` or end of input, after tearing the
/// session down.
pub async fn run_console(session: SanctuarySession, settings: Arc<SettingsStore>) -> Result<()> {
    let printer = tokio::spawn(print_events(session.subscribe()));

    println!("{}", commands::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };

        match commands::execute(&session, &settings, command).await {
            Ok(Reply::Text(text)) if text.is_empty() => {}
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::RunStarted) => {
                let session = session.clone();
                tokio::spawn(async move {
                    let outcome = session.run_script().await;
                    // Finished runs are reported by the event printer.
                    if outcome == RunOutcome::Busy {
                        println!("{}", outcome_notice(&outcome));
                    }
                });
            }
            Ok(Reply::Quit) => break,
            Err(err) => {
                log_error!("command failed: {err:#}");
                println!("error: {err:#}");
            }
        }
    }

    session.shutdown().await;
    printer.abort();
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<SanctuaryEvent>) {
    // Bytes of the current run's output already written to stdout.
    let mut printed = 0usize;

    loop {
        match rx.recv().await {
            Ok(SanctuaryEvent::ScriptStarted { .. }) => printed = 0,
            Ok(SanctuaryEvent::OutputUpdated { output, .. }) => {
                let fresh = if printed <= output.len() && output.is_char_boundary(printed) {
                    &output[printed..]
                } else {
                    output.as_str()
                };
                print!("{fresh}");
                let _ = io::stdout().flush();
                printed = output.len();
            }
            Ok(SanctuaryEvent::ScriptFinished { outcome, .. }) => {
                println!("{}", outcome_notice(&outcome));
            }
            Ok(SanctuaryEvent::FocusCompleted { .. }) => {
                println!("focus session complete, your garden grew");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                log_warn!("console fell behind by {skipped} events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Line printed once a run is over. Failures already carry their message in
/// the output, so they only close the line.
fn outcome_notice(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed => "\n[script finished]",
        RunOutcome::Cancelled => "\n[script cancelled]",
        RunOutcome::Rejected { .. } | RunOutcome::Failed { .. } => "",
        RunOutcome::Busy => "script already running",
    }
}
