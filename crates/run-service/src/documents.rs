//! JSON:API documents exchanged with the run service.
//!
//! Only the members the relay reads or writes are modelled; everything else
//! in the run service's responses is ignored.

use runtask::{VerdictResult, WorkspaceVariable};
use serde::{Deserialize, Serialize};

const TASK_RESULT_TYPE: &str = "task-results";

// ---------------------------------------------------------------------------
// Workspace variables
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct VariablesDocument {
    pub data: Vec<VariableResource>,
}

impl VariablesDocument {
    pub fn into_variables(self) -> Vec<WorkspaceVariable> {
        self.data
            .into_iter()
            .map(|resource| WorkspaceVariable {
                key: resource.attributes.key,
                value: resource.attributes.value,
                sensitive: resource.attributes.sensitive.unwrap_or_default(),
                category: resource.attributes.category.unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableResource {
    pub attributes: VariableAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableAttributes {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub sensitive: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Task result callback
// ---------------------------------------------------------------------------

/// Body of the callback PATCH.
#[derive(Debug, Serialize)]
pub(crate) struct TaskResultDocument<'a> {
    data: TaskResultData<'a>,
}

#[derive(Debug, Serialize)]
struct TaskResultData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: TaskResultAttributes<'a>,
}

#[derive(Debug, Serialize)]
struct TaskResultAttributes<'a> {
    status: &'static str,
    message: &'a str,
    url: &'a str,
}

impl<'a> TaskResultDocument<'a> {
    pub fn from_verdict(verdict: &'a VerdictResult) -> Self {
        Self {
            data: TaskResultData {
                kind: TASK_RESULT_TYPE,
                attributes: TaskResultAttributes {
                    status: verdict.status.as_str(),
                    message: &verdict.message,
                    url: &verdict.url,
                },
            },
        }
    }
}

/// The task-result resource echoed back by the callback endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TaskResultResponse {
    data: Option<TaskResultResource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskResultResource {
    attributes: Option<TaskResultResponseAttributes>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskResultResponseAttributes {
    status: Option<String>,
}

impl TaskResultResponse {
    /// Status the run service recorded, e.g. `passed` or `failed`.
    pub fn recorded_status(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .attributes
            .as_ref()?
            .status
            .as_deref()
    }
}
