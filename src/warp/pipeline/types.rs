// SPDX-License-Identifier: MIT

//! Pipeline script definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A linear script of node invocations sharing one bundle store
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PipelineDef {
    /// Name of the pipeline
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Steps, executed in order
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

/// A single node invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepDef {
    /// Unique identifier for this step
    pub id: String,
    /// Registered node name (`Warp`, `Unwarp`)
    pub node: String,
    /// Earlier step whose token feeds this step's `warp` socket
    #[serde(default)]
    pub from: Option<String>,
    /// Field name to value; `null` means not connected
    #[serde(default)]
    pub inputs: BTreeMap<String, serde_json::Value>,
}
