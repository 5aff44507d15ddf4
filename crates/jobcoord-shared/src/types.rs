//! # Wire Types
//!
//! JSON request/response bodies exchanged between clients, the
//! coordinator and the task runners. Field names are camelCase on the
//! wire; status values are the literal strings `"StatusBusy"`,
//! `"StatusSuccess"` and `"StatusFailure"`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoordError, CoordResult};

/// Free-form parameter bag attached to a task start request.
pub type Params = Map<String, Value>;

/// An immutable description of one task: a registered procedure name plus
/// an optional parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub proc_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl TaskSpec {
    pub fn new(proc_name: impl Into<String>) -> Self {
        Self {
            proc_name: proc_name.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

/// Externally observable task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "StatusBusy")]
    Busy,
    #[serde(rename = "StatusSuccess")]
    Success,
    #[serde(rename = "StatusFailure")]
    Failure,
}

impl TaskStatus {
    /// Busy is the only non-terminal state; transitions out of it are
    /// one-way.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Busy)
    }
}

/// Response body of `POST /start` on a task runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartResponse {
    pub id: String,
}

/// Response body of `GET /status/{id}` on a task runner: the original
/// spec echoed back, the derived status, and any result values once the
/// task is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    #[serde(flatten)]
    pub spec: TaskSpec,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_values: Option<Params>,
}

/// Response body of `GET /tasks` on a task runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<String>,
}

/// A client-submitted job: an ordered, non-empty bag of task specs plus
/// optional runner address filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub tasks: Vec<TaskSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_filters: Option<Vec<String>>,
}

/// Response body of `POST /start` on the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStartResponse {
    pub id: String,
}

/// Response body of `GET /status/{id}` on the coordinator.
///
/// `task_statuses` holds one entry per placement whose runner answered;
/// while workers are still dispatching (or a runner is unreachable) it may
/// be shorter than the job's task list. Consumers must tolerate this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub busy: bool,
    pub task_statuses: Vec<TaskStatusResponse>,
}

/// Request body of `POST /connect` and `POST /disconnect` on the
/// coordinator. The address is a full URL prefix, no trailing slash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub address: String,
}

/// Response body of `GET /runners` on the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerListResponse {
    pub runners: Vec<String>,
}

/// Response body of `GET /jobs` on the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<String>,
}

/// Decode a spec's parameter bag into a typed per-procedure params struct.
///
/// The bag stays dynamic at the transport boundary; factories call this to
/// cross into typed land. Missing or mistyped fields surface as
/// `BadParams` for the spec's procedure.
pub fn decode_params<T: DeserializeOwned>(spec: &TaskSpec) -> CoordResult<T> {
    let params = spec.params.clone().unwrap_or_default();
    serde_json::from_value(Value::Object(params))
        .map_err(|err| CoordError::bad_params(&spec.proc_name, err.to_string()))
}

/// Encode a typed value into a parameter bag, the inverse of
/// [`decode_params`]. Useful for clients composing task specs from typed
/// request structs.
pub fn encode_params<T: Serialize>(value: &T) -> CoordResult<Params> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoordError::bad_params(
            "",
            format!("expected a JSON object, got {other}"),
        )),
        Err(err) => Err(CoordError::bad_params("", err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_spec_wire_names_are_camel_case() {
        let spec = TaskSpec::new("Echo").with_params(
            json!({"Value": "hello"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, json!({"procName": "Echo", "params": {"Value": "hello"}}));
    }

    #[test]
    fn task_spec_params_may_be_absent() {
        let spec: TaskSpec = serde_json::from_value(json!({"procName": "Echo"})).unwrap();
        assert_eq!(spec.proc_name, "Echo");
        assert!(spec.params.is_none());

        // A null bag decodes the same way the Go encoder produced it.
        let spec: TaskSpec =
            serde_json::from_value(json!({"procName": "Echo", "params": null})).unwrap();
        assert!(spec.params.is_none());
    }

    #[test]
    fn status_serializes_to_literal_strings() {
        assert_eq!(
            serde_json::to_value(TaskStatus::Busy).unwrap(),
            json!("StatusBusy")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Success).unwrap(),
            json!("StatusSuccess")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Failure).unwrap(),
            json!("StatusFailure")
        );
    }

    #[test]
    fn only_busy_is_non_terminal() {
        assert!(!TaskStatus::Busy.is_terminal());
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
    }

    #[test]
    fn task_status_response_flattens_the_spec() {
        let response = TaskStatusResponse {
            spec: TaskSpec::new("Echo").with_params(
                json!({"Value": "hi"}).as_object().cloned().unwrap_or_default(),
            ),
            status: TaskStatus::Success,
            result_values: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "procName": "Echo",
                "params": {"Value": "hi"},
                "status": "StatusSuccess",
            })
        );
    }

    #[test]
    fn job_spec_round_trips_target_filters() {
        let body = json!({
            "tasks": [{"procName": "Echo", "params": {"Value": "hi"}}],
            "targetFilters": ["b:"],
        });
        let spec: JobSpec = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(spec.tasks.len(), 1);
        assert_eq!(spec.target_filters.as_deref(), Some(&["b:".to_string()][..]));
        assert_eq!(serde_json::to_value(&spec).unwrap(), body);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SampleParams {
        #[serde(rename = "IntValue")]
        int_value: i64,
        #[serde(rename = "FloatValue")]
        float_value: f64,
        #[serde(rename = "StringArray")]
        string_array: Vec<String>,
    }

    #[test]
    fn typed_params_round_trip() {
        let value = SampleParams {
            int_value: 0,
            float_value: -10.0,
            string_array: vec!["A".into(), "B".into(), "C".into()],
        };
        let bag = encode_params(&value).unwrap();
        let spec = TaskSpec::new("Sample").with_params(bag);
        let decoded: SampleParams = decode_params(&spec).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn decode_params_reports_bad_params() {
        let spec = TaskSpec::new("Sample").with_params(
            json!({"IntValue": "not a number"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        let err = decode_params::<SampleParams>(&spec).unwrap_err();
        assert!(matches!(err, CoordError::BadParams { ref proc_name, .. } if proc_name == "Sample"));
    }

    #[test]
    fn encode_params_rejects_non_objects() {
        let err = encode_params(&42).unwrap_err();
        assert!(matches!(err, CoordError::BadParams { .. }));
    }
}
