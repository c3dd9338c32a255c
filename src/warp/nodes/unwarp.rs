// SPDX-License-Identifier: MIT

//! Unwarp: unpack a bundle into independent outputs
//!
//! Never fails. A missing or expired bundle yields every default, and each
//! field missing from a resident bundle yields its own default.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::descriptor::{InputSocket, NodeDescriptor, OutputSocket, CATEGORY};
use super::warp::WarpToken;
use super::{Node, NodeOutput};
use crate::warp::bundle::{BundleStore, FieldMap, FieldName, Payload};
use crate::warp::samplers::{coerce_sampler, coerce_scheduler, DEFAULT_SAMPLER, DEFAULT_SCHEDULER};

pub const DEFAULT_BATCH_SIZE: i64 = 1;
pub const DEFAULT_INITIAL_STEPS: i64 = 20;
pub const DEFAULT_CFG: f64 = 7.0;

static UNWARP_DESCRIPTOR: Lazy<NodeDescriptor> = Lazy::new(|| NodeDescriptor {
    name: "Unwarp",
    category: CATEGORY,
    function: "unwarp",
    output_node: false,
    inputs: vec![InputSocket::control(true)],
    outputs: FieldName::ALL.iter().map(|f| OutputSocket::field(*f)).collect(),
});

/// One output slot per bundle field
#[derive(Debug, Clone, PartialEq)]
pub struct UnwarpOutputs {
    pub model: Option<Payload>,
    pub model_2: Option<Payload>,
    pub clip: Option<Payload>,
    pub clip_vision: Option<Payload>,
    pub vae: Option<Payload>,
    pub conditioning_positive: Option<Payload>,
    pub conditioning_negative: Option<Payload>,
    pub image: Option<Payload>,
    pub mask: Option<Payload>,
    pub latent: Option<Payload>,
    pub prompt_positive: String,
    pub prompt_negative: String,
    pub batch_size: i64,
    pub seed: i64,
    pub initial_steps: i64,
    pub detailer_steps: i64,
    pub upscaler_steps: i64,
    pub width: i64,
    pub height: i64,
    pub cfg: f64,
    pub sampler_name: String,
    pub scheduler: String,
}

impl Default for UnwarpOutputs {
    fn default() -> Self {
        Self {
            model: None,
            model_2: None,
            clip: None,
            clip_vision: None,
            vae: None,
            conditioning_positive: None,
            conditioning_negative: None,
            image: None,
            mask: None,
            latent: None,
            prompt_positive: String::new(),
            prompt_negative: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 0,
            initial_steps: DEFAULT_INITIAL_STEPS,
            detailer_steps: 0,
            upscaler_steps: 0,
            width: 0,
            height: 0,
            cfg: DEFAULT_CFG,
            sampler_name: DEFAULT_SAMPLER.to_string(),
            scheduler: DEFAULT_SCHEDULER.to_string(),
        }
    }
}

impl UnwarpOutputs {
    /// Read every slot from `fields`, defaulting the ones that are absent
    pub fn from_fields(fields: &FieldMap) -> Self {
        let d = Self::default();
        let handle = |name| fields.handle(name).cloned();
        let text = |name, default: String| fields.text(name).map(str::to_string).unwrap_or(default);
        let int = |name, default| fields.int(name).unwrap_or(default);

        Self {
            model: handle(FieldName::Model),
            model_2: handle(FieldName::Model2),
            clip: handle(FieldName::Clip),
            clip_vision: handle(FieldName::ClipVision),
            vae: handle(FieldName::Vae),
            conditioning_positive: handle(FieldName::ConditioningPositive),
            conditioning_negative: handle(FieldName::ConditioningNegative),
            image: handle(FieldName::Image),
            mask: handle(FieldName::Mask),
            latent: handle(FieldName::Latent),
            prompt_positive: text(FieldName::PromptPositive, d.prompt_positive),
            prompt_negative: text(FieldName::PromptNegative, d.prompt_negative),
            batch_size: int(FieldName::BatchSize, d.batch_size),
            seed: int(FieldName::Seed, d.seed),
            initial_steps: int(FieldName::InitialSteps, d.initial_steps),
            detailer_steps: int(FieldName::DetailerSteps, d.detailer_steps),
            upscaler_steps: int(FieldName::UpscalerSteps, d.upscaler_steps),
            width: int(FieldName::Width, d.width),
            height: int(FieldName::Height, d.height),
            cfg: fields.float(FieldName::Cfg).unwrap_or(d.cfg),
            sampler_name: coerce_sampler(fields.choice(FieldName::SamplerName)).to_string(),
            scheduler: coerce_scheduler(fields.choice(FieldName::Scheduler)).to_string(),
        }
    }

    /// JSON rendering in output order; absent payloads render as `null`
    pub fn to_json(&self) -> Value {
        let handle = |p: &Option<Payload>| match p {
            Some(p) => Value::String(
                p.label()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:?}", p)),
            ),
            None => Value::Null,
        };

        let slots = [
            (FieldName::Model, handle(&self.model)),
            (FieldName::Model2, handle(&self.model_2)),
            (FieldName::Clip, handle(&self.clip)),
            (FieldName::ClipVision, handle(&self.clip_vision)),
            (FieldName::Vae, handle(&self.vae)),
            (FieldName::ConditioningPositive, handle(&self.conditioning_positive)),
            (FieldName::ConditioningNegative, handle(&self.conditioning_negative)),
            (FieldName::Image, handle(&self.image)),
            (FieldName::Mask, handle(&self.mask)),
            (FieldName::Latent, handle(&self.latent)),
            (FieldName::PromptPositive, Value::from(self.prompt_positive.as_str())),
            (FieldName::PromptNegative, Value::from(self.prompt_negative.as_str())),
            (FieldName::BatchSize, Value::from(self.batch_size)),
            (FieldName::Seed, Value::from(self.seed)),
            (FieldName::InitialSteps, Value::from(self.initial_steps)),
            (FieldName::DetailerSteps, Value::from(self.detailer_steps)),
            (FieldName::UpscalerSteps, Value::from(self.upscaler_steps)),
            (FieldName::Width, Value::from(self.width)),
            (FieldName::Height, Value::from(self.height)),
            (FieldName::Cfg, Value::from(self.cfg)),
            (FieldName::SamplerName, Value::from(self.sampler_name.as_str())),
            (FieldName::Scheduler, Value::from(self.scheduler.as_str())),
        ];

        let map: Map<String, Value> = slots
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();
        Value::Object(map)
    }
}

/// The Unwarp node
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwarp;

impl Unwarp {
    /// Read the bundle behind `token` out of `store`
    pub fn unwarp(store: &BundleStore, token: Option<&WarpToken>) -> UnwarpOutputs {
        match token.and_then(|t| store.get(&t.id)) {
            Some(bundle) => UnwarpOutputs::from_fields(bundle.fields()),
            None => UnwarpOutputs::default(),
        }
    }
}

impl Node for Unwarp {
    fn descriptor(&self) -> &NodeDescriptor {
        &UNWARP_DESCRIPTOR
    }

    fn invoke(&self, store: &BundleStore, source: Option<&WarpToken>, _inputs: FieldMap) -> NodeOutput {
        NodeOutput::Outputs(Box::new(Self::unwarp(store, source)))
    }
}
