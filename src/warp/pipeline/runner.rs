// SPDX-License-Identifier: MIT

//! Pipeline runner
//!
//! Executes a script's steps in order, threading bundle tokens from each
//! step to the steps that name it in `from`.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::types::PipelineDef;
use crate::common::error::{PipelineError, Result};
use crate::warp::bundle::{BundleStore, FieldMap};
use crate::warp::nodes::{NodeOutput, NodeRegistry, Warp, WarpToken};

/// Outputs of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub pipeline: String,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub id: String,
    pub node: String,
    pub output: Value,
}

impl PipelineReport {
    pub fn step(&self, id: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.id == id)
    }
}

pub struct PipelineRunner {
    registry: NodeRegistry,
    store: Arc<BundleStore>,
}

impl PipelineRunner {
    pub fn new(registry: NodeRegistry, store: Arc<BundleStore>) -> Self {
        Self { registry, store }
    }

    pub fn store(&self) -> &BundleStore {
        &self.store
    }

    /// Run every step of `def` against the shared store
    pub fn run(&self, def: &PipelineDef) -> Result<PipelineReport> {
        let mut tokens: HashMap<&str, WarpToken> = HashMap::new();
        let mut steps = Vec::with_capacity(def.steps.len());

        for step in &def.steps {
            let node = self.registry.require(&step.node)?;

            let source = match &step.from {
                Some(from) => Some(tokens.get(from.as_str()).cloned().ok_or_else(|| {
                    PipelineError::UnknownSource {
                        step: step.id.clone(),
                        source_step: from.clone(),
                    }
                })?),
                None => None,
            };

            let inputs = FieldMap::from_json_inputs(&step.inputs)?;
            let fingerprint = Warp::fingerprint(source.as_ref(), &inputs);

            log::info!("Executing step: {} ({})", step.id, step.node);
            let output = match node.invoke(&self.store, source.as_ref(), inputs) {
                NodeOutput::Token(token) => {
                    let output = json!({ "warp": token, "fingerprint": fingerprint });
                    tokens.insert(step.id.as_str(), token);
                    output
                }
                NodeOutput::Outputs(outputs) => outputs.to_json(),
            };

            steps.push(StepReport {
                id: step.id.clone(),
                node: step.node.clone(),
                output,
            });
        }

        Ok(PipelineReport {
            pipeline: def.name.clone(),
            steps,
        })
    }

    /// Run `copies` instances of `def` at once on the blocking pool
    pub async fn run_concurrent(
        self: Arc<Self>,
        def: Arc<PipelineDef>,
        copies: usize,
    ) -> Result<Vec<PipelineReport>> {
        let handles: Vec<_> = (0..copies)
            .map(|_| {
                let runner = Arc::clone(&self);
                let def = Arc::clone(&def);
                tokio::task::spawn_blocking(move || runner.run(&def))
            })
            .collect();

        let mut reports = Vec::with_capacity(copies);
        for handle in handles {
            reports.push(handle.await??);
        }
        Ok(reports)
    }
}
