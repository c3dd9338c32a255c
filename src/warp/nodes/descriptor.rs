// SPDX-License-Identifier: MIT

//! Node descriptors exposed to the host

use serde::Serialize;
use serde_json::Value;

use crate::warp::bundle::FieldName;
use crate::warp::samplers::{SAMPLERS, SCHEDULERS};

/// Category both nodes are listed under
pub const CATEGORY: &str = "Custom/WarpPipe Nodes";

/// Type tag of the socket carrying a bundle token
pub const CONTROL: &str = "CONTROL";

/// Static description of a node: its sockets and how the host calls it
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescriptor {
    pub name: &'static str,
    pub category: &'static str,
    /// Entry point name the host invokes
    pub function: &'static str,
    /// Output nodes run even when nothing consumes their result
    pub output_node: bool,
    pub inputs: Vec<InputSocket>,
    pub outputs: Vec<OutputSocket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSocket {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<&'static [&'static str]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSocket {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: &'static str,
}

impl NodeDescriptor {
    pub fn input(&self, name: &str) -> Option<&InputSocket> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

impl InputSocket {
    /// The bundle token socket
    pub fn control(required: bool) -> Self {
        Self {
            name: "warp".to_string(),
            type_tag: CONTROL,
            required,
            default: None,
            min: None,
            max: None,
            choices: None,
        }
    }

    /// Optional socket or widget for a bundle field
    pub fn field(name: FieldName) -> Self {
        let mut socket = Self {
            name: name.as_str().to_string(),
            type_tag: name.type_tag(),
            required: false,
            default: None,
            min: None,
            max: None,
            choices: None,
        };

        match name {
            FieldName::PromptPositive | FieldName::PromptNegative => {
                socket.default = Some(Value::from(""));
            }
            FieldName::InitialSteps => socket.range(Value::from(20), 1.0, 200.0),
            FieldName::DetailerSteps | FieldName::UpscalerSteps => {
                socket.range(Value::from(0), 0.0, 200.0)
            }
            FieldName::Cfg => socket.range(Value::from(7.0), 0.0, 50.0),
            FieldName::SamplerName => socket.choices = Some(SAMPLERS),
            FieldName::Scheduler => socket.choices = Some(SCHEDULERS),
            _ => {}
        }
        socket
    }

    fn range(&mut self, default: Value, min: f64, max: f64) {
        self.default = Some(default);
        self.min = Some(min);
        self.max = Some(max);
    }
}

impl OutputSocket {
    pub fn control() -> Self {
        Self {
            name: "warp".to_string(),
            type_tag: CONTROL,
        }
    }

    pub fn field(name: FieldName) -> Self {
        Self {
            name: name.as_str().to_string(),
            type_tag: name.type_tag(),
        }
    }
}
