//! Session facade: one uniform operation set over any engine.
//!
//! A keep-alive session holds its connection between operations:
//! `connect()` brings it ONLINE, operations require ONLINE, `quit()` takes
//! it OFFLINE for good. An ephemeral session stays OFFLINE and runs a full
//! connect → authenticate → negotiate → operate → quit cycle per
//! operation; its `connect()` is a connection test.
//!
//! Every control response is kept in the session trace, and errors carry
//! the trace accumulated up to the failure.

use crate::commands::{Operation, OperationOutput, OperationReport};
use crate::config::{ConnectionParameters, Protocol};
use crate::engine::Engine;
use chrono::{DateTime, Utc};
use filehop_core::{ConnectionState, ControlResponse, Entity, XferError, XferResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Snapshot of a session, for display or logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub keep_alive: bool,
    pub state: ConnectionState,
    pub connected_at: Option<DateTime<Utc>>,
}

pub struct Session {
    info: SessionInfo,
    engine: Engine,
    closed: bool,
    trace: Vec<ControlResponse>,
}

impl Session {
    /// Validate the parameters and pick the engine. No I/O happens here.
    pub fn new(params: ConnectionParameters) -> XferResult<Self> {
        params.validate()?;
        let info = SessionInfo {
            id: Uuid::new_v4().to_string(),
            host: params.host().to_string(),
            port: params.port(),
            protocol: params.protocol(),
            keep_alive: params.keep_alive(),
            state: ConnectionState::Offline,
            connected_at: None,
        };
        Ok(Self {
            info,
            engine: Engine::new(params),
            closed: false,
            trace: Vec::new(),
        })
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn state(&self) -> ConnectionState {
        self.info.state
    }

    /// Every control response of the session, oldest first.
    pub fn trace(&self) -> &[ControlResponse] {
        &self.trace
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Keep-alive: connect, log in and go ONLINE (no-op when already
    /// ONLINE). Ephemeral: connect, log in and quit again.
    ///
    /// Returns the responses exchanged by this call.
    pub async fn connect(&mut self) -> XferResult<Vec<ControlResponse>> {
        if self.closed {
            return Err(self.fail(XferError::state("session has been closed")));
        }
        let start = self.trace.len();

        let result = if !self.info.keep_alive {
            self.cycle(&Operation::ConnectTest).await.map(|_| ())
        } else if self.info.state == ConnectionState::Online {
            Ok(())
        } else {
            let opened = self.engine.open().await;
            if opened.is_ok() {
                self.info.state = ConnectionState::Online;
                self.info.connected_at = Some(Utc::now());
                tracing::info!(session = %self.info.id, host = %self.info.host, "session online");
            }
            opened
        };

        self.collect_trace();
        match result {
            Ok(()) => Ok(self.trace[start..].to_vec()),
            Err(e) => {
                self.info.state = ConnectionState::Offline;
                Err(self.fail(e))
            }
        }
    }

    /// Close the connection (QUIT on FTP). Calling it on an OFFLINE session
    /// succeeds with no responses. Later operations fail with a state error.
    pub async fn quit(&mut self) -> XferResult<Vec<ControlResponse>> {
        self.closed = true;
        if !self.engine.is_connected() {
            self.info.state = ConnectionState::Offline;
            return Ok(Vec::new());
        }

        let start = self.trace.len();
        let result = self.engine.close().await;
        self.info.state = ConnectionState::Offline;
        self.collect_trace();
        tracing::info!(session = %self.info.id, "session closed");
        match result {
            Ok(()) => Ok(self.trace[start..].to_vec()),
            Err(e) => Err(self.fail(e)),
        }
    }

    // ─── Operations ──────────────────────────────────────────────

    pub async fn list(&mut self, path: &str) -> XferResult<Vec<Entity>> {
        let op = Operation::List { path: path.into() };
        match self.perform(&op).await? {
            OperationOutput::Entities(entities) => Ok(entities),
            other => Err(unexpected(&op, other)),
        }
    }

    pub async fn upload(&mut self, local: &Path, remote: &str) -> XferResult<u64> {
        let op = Operation::Upload {
            local: local.to_path_buf(),
            remote: remote.into(),
        };
        self.bytes(op).await
    }

    pub async fn download(&mut self, remote: &str, local: &Path) -> XferResult<u64> {
        let op = Operation::Download {
            remote: remote.into(),
            local: local.to_path_buf(),
        };
        self.bytes(op).await
    }

    pub async fn delete(&mut self, path: &str) -> XferResult<()> {
        self.perform(&Operation::Delete { path: path.into() }).await.map(|_| ())
    }

    pub async fn mkdir(&mut self, path: &str) -> XferResult<()> {
        self.perform(&Operation::Mkdir { path: path.into() }).await.map(|_| ())
    }

    pub async fn rmdir(&mut self, path: &str) -> XferResult<()> {
        self.perform(&Operation::Rmdir { path: path.into() }).await.map(|_| ())
    }

    pub async fn rename(&mut self, from: &str, to: &str) -> XferResult<()> {
        let op = Operation::Rename {
            from: from.into(),
            to: to.into(),
        };
        self.perform(&op).await.map(|_| ())
    }

    /// Run `op` and describe the outcome, errors included.
    pub async fn execute(&mut self, op: Operation) -> OperationReport {
        let start = self.trace.len();
        let result = match op {
            Operation::ConnectTest => self.connect().await.map(|_| OperationOutput::None),
            _ => self.perform(&op).await,
        };
        let trace = self.trace[start..].to_vec();
        match result {
            Ok(output) => OperationReport::done(&op, output, trace),
            Err(e) => {
                tracing::warn!(command = op.name(), error = %e, "operation failed");
                OperationReport::failed(&op, e, trace)
            }
        }
    }

    // ─── Internals ───────────────────────────────────────────────

    async fn bytes(&mut self, op: Operation) -> XferResult<u64> {
        match self.perform(&op).await? {
            OperationOutput::Bytes(n) => Ok(n),
            other => Err(unexpected(&op, other)),
        }
    }

    async fn perform(&mut self, op: &Operation) -> XferResult<OperationOutput> {
        if self.closed {
            return Err(self.fail(XferError::state("session has been closed")));
        }
        if !self.info.keep_alive {
            let result = self.cycle(op).await;
            self.collect_trace();
            return result.map_err(|e| self.fail(e));
        }
        if self.info.state != ConnectionState::Online {
            return Err(self.fail(XferError::state("session is offline")));
        }

        let result = self.engine.apply(op).await;
        if !self.engine.is_connected() {
            self.info.state = ConnectionState::Offline;
            self.closed = true;
            tracing::warn!(session = %self.info.id, "connection lost, session unusable");
        }
        self.collect_trace();
        result.map_err(|e| self.fail(e))
    }

    /// One ephemeral round: open, run `op`, close. The first error wins.
    async fn cycle(&mut self, op: &Operation) -> XferResult<OperationOutput> {
        self.engine.open().await?;
        let result = self.engine.apply(op).await;
        let closed = self.engine.close().await;
        match (result, closed) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(output), Ok(())) => Ok(output),
        }
    }

    fn collect_trace(&mut self) {
        self.trace.extend(self.engine.take_transcript());
    }

    fn fail(&self, error: XferError) -> XferError {
        error.with_trace(self.trace.clone())
    }
}

fn unexpected(op: &Operation, output: OperationOutput) -> XferError {
    XferError::state(format!("{} produced unexpected output {:?}", op.name(), output))
}
