//! The closed set of operations a session can run, and their reports.

use filehop_core::{ControlResponse, Entity, XferError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file-transfer operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    ConnectTest,
    List { path: String },
    Download { remote: String, local: PathBuf },
    Upload { local: PathBuf, remote: String },
    Delete { path: String },
    Mkdir { path: String },
    Rmdir { path: String },
    Rename { from: String, to: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectTest => "connectTest",
            Self::List { .. } => "list",
            Self::Download { .. } => "download",
            Self::Upload { .. } => "upload",
            Self::Delete { .. } => "delete",
            Self::Mkdir { .. } => "mkdir",
            Self::Rmdir { .. } => "rmdir",
            Self::Rename { .. } => "rename",
        }
    }
}

/// Value produced by a successful operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(untagged)]
pub enum OperationOutput {
    #[default]
    None,
    Entities(Vec<Entity>),
    Bytes(u64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReportState {
    Done,
    Error,
}

/// Outcome of `Session::execute`, ready to be written out as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub state: ReportState,
    pub command: String,
    pub result: OperationOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<XferError>,
    /// Control responses exchanged by this operation.
    #[serde(default)]
    pub trace: Vec<ControlResponse>,
}

impl OperationReport {
    pub fn done(op: &Operation, result: OperationOutput, trace: Vec<ControlResponse>) -> Self {
        Self {
            state: ReportState::Done,
            command: op.name().to_string(),
            result,
            error: None,
            trace,
        }
    }

    pub fn failed(op: &Operation, error: XferError, trace: Vec<ControlResponse>) -> Self {
        Self {
            state: ReportState::Error,
            command: op.name().to_string(),
            result: OperationOutput::None,
            error: Some(error),
            trace,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ReportState::Done
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_deserialize_from_tagged_json() {
        let op: Operation =
            serde_json::from_str(r#"{"op":"rename","from":"/a","to":"/b"}"#).unwrap();
        assert_eq!(
            op,
            Operation::Rename {
                from: "/a".into(),
                to: "/b".into()
            }
        );
        let op: Operation = serde_json::from_str(r#"{"op":"connectTest"}"#).unwrap();
        assert_eq!(op.name(), "connectTest");
    }

    #[test]
    fn report_json_shape() {
        let op = Operation::Upload {
            local: "/tmp/x".into(),
            remote: "x".into(),
        };
        let ok = OperationReport::done(&op, OperationOutput::Bytes(42), Vec::new());
        let v: serde_json::Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();
        assert_eq!(v["state"], "done");
        assert_eq!(v["command"], "upload");
        assert_eq!(v["result"], 42);
        assert!(v.get("error").is_none());

        let failed = OperationReport::failed(&op, XferError::state("offline"), Vec::new());
        let v: serde_json::Value = serde_json::from_str(&failed.to_json().unwrap()).unwrap();
        assert_eq!(v["state"], "error");
        assert!(v["result"].is_null());
        assert_eq!(v["error"]["kind"], "State");
    }
}
