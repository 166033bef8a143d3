use std::{
    pin::pin,
    sync::{Arc, Mutex as StdMutex, PoisonError, RwLock},
    time::Duration,
};

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::{EventBus, SanctuaryEvent};

use super::{StreamBuffer, StreamError, Utf8StreamDecoder};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const CONNECT_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_SCRIPT_ENDPOINT: &str = "http://localhost:4000/run-script";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Publish after every chunk read from the body.
    #[default]
    Incremental,
    /// Read the whole body, then publish once.
    Buffered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    Completed,
    /// Server answered with a non-success status.
    Rejected { status: u16 },
    Failed { message: String },
    Cancelled,
    /// Another run was still in flight; nothing was touched.
    Busy,
}

struct ActiveRun {
    id: String,
    token: CancellationToken,
}

/// Claim on the single run slot. Releasing happens on drop, so a `run()`
/// future that is dropped mid-flight (timeout, aborted task) frees the slot.
struct RunSlot<'a> {
    active: &'a StdMutex<Option<ActiveRun>>,
    id: String,
}

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        let mut guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|active| active.id == self.id) {
            *guard = None;
        }
    }
}

/// Fetches the script endpoint and republishes its output as it arrives.
#[derive(Clone)]
pub struct ScriptRunner {
    client: reqwest::Client,
    endpoint: Arc<RwLock<String>>,
    mode: StreamMode,
    buffer: Arc<Mutex<StreamBuffer>>,
    active: Arc<StdMutex<Option<ActiveRun>>>,
    events: EventBus,
}

impl ScriptRunner {
    pub fn new(endpoint: impl Into<String>, mode: StreamMode, events: EventBus) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: Arc::new(RwLock::new(endpoint.into())),
            mode,
            buffer: Arc::new(Mutex::new(StreamBuffer::new())),
            active: Arc::new(StdMutex::new(None)),
            events,
        })
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Takes effect from the next run.
    pub fn set_endpoint(&self, endpoint: impl Into<String>) {
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = endpoint.into();
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub async fn output(&self) -> String {
        self.buffer.lock().await.as_str().to_string()
    }

    /// Executes one streaming run to completion, failure or cancellation.
    pub async fn run(&self) -> RunOutcome {
        let Some((slot, token)) = self.begin_run() else {
            log_warn!("script run rejected: another run is in flight");
            return RunOutcome::Busy;
        };
        let run_id = slot.id.clone();

        let endpoint = self.endpoint();
        self.buffer.lock().await.reset();
        self.events.emit(SanctuaryEvent::ScriptStarted {
            run_id: run_id.clone(),
        });
        log_info!("script run {run_id} started against {endpoint}");

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => RunOutcome::Cancelled,
            outcome = self.execute(&run_id, &endpoint) => outcome,
        };

        self.end_run(slot, &outcome);
        outcome
    }

    /// Aborts the in-flight run, if any. Output gathered so far stays.
    pub fn cancel(&self) -> bool {
        let guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(active) => {
                active.token.cancel();
                log_info!("script run {} cancellation requested", active.id);
                true
            }
            None => false,
        }
    }

    async fn execute(&self, run_id: &str, endpoint: &str) -> RunOutcome {
        let response = match self.client.get(endpoint).send().await {
            Ok(response) => response,
            Err(err) => return self.fail(run_id, StreamError::from(err)).await,
        };

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            log_warn!("script run {run_id}: server responded with {code}");
            self.replace_output(run_id, format!("Server responded with {code}"))
                .await;
            return RunOutcome::Rejected { status: code };
        }

        match self.mode {
            StreamMode::Incremental => self.drive(run_id, response.bytes_stream()).await,
            StreamMode::Buffered => match response.text().await {
                Ok(text) => {
                    self.replace_output(run_id, text).await;
                    RunOutcome::Completed
                }
                Err(err) => self.fail(run_id, StreamError::read(err)).await,
            },
        }
    }

    /// Consumes a body stream, turning a mid-stream failure into an
    /// appended diagnostic.
    pub(crate) async fn drive<S, E>(&self, run_id: &str, stream: S) -> RunOutcome
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        match self.consume(run_id, stream).await {
            Ok(()) => RunOutcome::Completed,
            Err(err) => self.fail(run_id, err).await,
        }
    }

    async fn consume<S, E>(&self, run_id: &str, stream: S) -> std::result::Result<(), StreamError>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut stream = pin!(stream);
        let mut decoder = Utf8StreamDecoder::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(StreamError::read)?;
            let text = decoder.decode(&bytes);
            if !text.is_empty() {
                self.append_output(run_id, &text).await;
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            self.append_output(run_id, &tail).await;
        }
        Ok(())
    }

    async fn fail(&self, run_id: &str, err: StreamError) -> RunOutcome {
        let message = err.to_string();
        log_warn!("script run {run_id} failed: {message}");
        self.append_output(run_id, &format!("\n[error] {message}"))
            .await;
        RunOutcome::Failed { message }
    }

    async fn append_output(&self, run_id: &str, text: &str) {
        let output = {
            let mut buffer = self.buffer.lock().await;
            buffer.push_str(text);
            buffer.as_str().to_string()
        };
        self.publish(run_id, output);
    }

    async fn replace_output(&self, run_id: &str, text: String) {
        let output = {
            let mut buffer = self.buffer.lock().await;
            buffer.replace(text);
            buffer.as_str().to_string()
        };
        self.publish(run_id, output);
    }

    fn publish(&self, run_id: &str, output: String) {
        self.events.emit(SanctuaryEvent::OutputUpdated {
            run_id: run_id.to_string(),
            output,
        });
    }

    fn begin_run(&self) -> Option<(RunSlot<'_>, CancellationToken)> {
        let mut guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return None;
        }

        let run = ActiveRun {
            id: Uuid::new_v4().to_string(),
            token: CancellationToken::new(),
        };
        let claimed = (
            RunSlot {
                active: &self.active,
                id: run.id.clone(),
            },
            run.token.clone(),
        );
        *guard = Some(run);
        Some(claimed)
    }

    fn end_run(&self, slot: RunSlot<'_>, outcome: &RunOutcome) {
        let run_id = slot.id.clone();
        drop(slot);

        log_info!("script run {run_id} finished: {outcome:?}");
        self.events.emit(SanctuaryEvent::ScriptFinished {
            run_id: run_id.to_string(),
            outcome: outcome.clone(),
        });
    }
}
