// SPDX-License-Identifier: MIT

//! Warp: pack values into a bundle
//!
//! A Warp copies the fields of an optional source bundle, overlays every
//! supplied input and stores the result as a new bundle. The source is
//! never modified. A source token that no longer resolves is treated as
//! no source at all.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::descriptor::{InputSocket, NodeDescriptor, OutputSocket, CATEGORY};
use super::{Node, NodeOutput};
use crate::warp::bundle::{BundleId, BundleStore, FieldMap, FieldName, FieldValue, Payload};

static WARP_DESCRIPTOR: Lazy<NodeDescriptor> = Lazy::new(|| NodeDescriptor {
    name: "Warp",
    category: CATEGORY,
    function: "warp",
    output_node: true,
    inputs: std::iter::once(InputSocket::control(false))
        .chain(FieldName::ALL.iter().map(|f| InputSocket::field(*f)))
        .collect(),
    outputs: vec![OutputSocket::control()],
});

/// Token that crosses graph edges; serialises as `{"id": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarpToken {
    pub id: BundleId,
}

impl WarpToken {
    pub fn new(id: BundleId) -> Self {
        Self { id }
    }
}

/// Values supplied directly to a Warp; `None` means "not provided"
#[derive(Debug, Clone, Default)]
pub struct WarpInputs {
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
    pub prompt_positive: Option<String>,
    pub prompt_negative: Option<String>,
    pub batch_size: Option<i64>,
    pub seed: Option<i64>,
    pub initial_steps: Option<i64>,
    pub detailer_steps: Option<i64>,
    pub upscaler_steps: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub cfg: Option<f64>,
    pub sampler_name: Option<String>,
    pub scheduler: Option<String>,
}

impl WarpInputs {
    /// Collect the supplied inputs into a field map
    pub fn into_fields(self) -> FieldMap {
        let handles = [
            (FieldName::Model, self.model),
            (FieldName::Model2, self.model_2),
            (FieldName::Clip, self.clip),
            (FieldName::ClipVision, self.clip_vision),
            (FieldName::Vae, self.vae),
            (FieldName::ConditioningPositive, self.conditioning_positive),
            (FieldName::ConditioningNegative, self.conditioning_negative),
            (FieldName::Image, self.image),
            (FieldName::Mask, self.mask),
            (FieldName::Latent, self.latent),
        ];
        let texts = [
            (FieldName::PromptPositive, self.prompt_positive),
            (FieldName::PromptNegative, self.prompt_negative),
        ];
        let ints = [
            (FieldName::BatchSize, self.batch_size),
            (FieldName::Seed, self.seed),
            (FieldName::InitialSteps, self.initial_steps),
            (FieldName::DetailerSteps, self.detailer_steps),
            (FieldName::UpscalerSteps, self.upscaler_steps),
            (FieldName::Width, self.width),
            (FieldName::Height, self.height),
        ];
        let choices = [
            (FieldName::SamplerName, self.sampler_name),
            (FieldName::Scheduler, self.scheduler),
        ];

        let mut fields = FieldMap::new();
        for (name, value) in handles {
            if let Some(v) = value {
                fields.set(name, FieldValue::Handle(v));
            }
        }
        for (name, value) in texts {
            if let Some(v) = value {
                fields.set(name, FieldValue::Text(v));
            }
        }
        for (name, value) in ints {
            if let Some(v) = value {
                fields.set(name, FieldValue::Int(v));
            }
        }
        if let Some(v) = self.cfg {
            fields.set(FieldName::Cfg, FieldValue::Float(v));
        }
        for (name, value) in choices {
            if let Some(v) = value {
                fields.set(name, FieldValue::Choice(v));
            }
        }
        fields
    }
}

/// The Warp node
#[derive(Debug, Clone, Copy, Default)]
pub struct Warp;

impl Warp {
    /// Build a bundle from `source` plus `inputs` and register it in `store`
    pub fn warp(store: &BundleStore, source: Option<&WarpToken>, inputs: WarpInputs) -> WarpToken {
        Self::extend(store, source, inputs.into_fields())
    }

    /// Same as [`Warp::warp`] for an already collected field map
    pub fn extend(store: &BundleStore, source: Option<&WarpToken>, updates: FieldMap) -> WarpToken {
        let mut fields = match source {
            Some(token) => match store.get(&token.id) {
                Some(bundle) => bundle.fields().clone(),
                None => {
                    log::debug!("Source bundle {} not resident, starting fresh", token.id);
                    FieldMap::new()
                }
            },
            None => FieldMap::new(),
        };
        fields.overlay(updates);

        WarpToken::new(store.put(fields))
    }

    /// Hex SHA-256 over the source token and supplied inputs.
    ///
    /// The host compares fingerprints between runs to decide whether the
    /// node needs to execute again. Labeled payloads contribute their label,
    /// unlabeled ones their identity.
    pub fn fingerprint(source: Option<&WarpToken>, updates: &FieldMap) -> String {
        let mut hasher = Sha256::new();
        match source {
            Some(token) => {
                hasher.update([1u8]);
                hasher.update(token.id.as_str().as_bytes());
            }
            None => hasher.update([0u8]),
        }
        updates.hash_into(&mut hasher);
        format!("{:x}", hasher.finalize())
    }
}

impl Node for Warp {
    fn descriptor(&self) -> &NodeDescriptor {
        &WARP_DESCRIPTOR
    }

    fn invoke(&self, store: &BundleStore, source: Option<&WarpToken>, inputs: FieldMap) -> NodeOutput {
        NodeOutput::Token(Self::extend(store, source, inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(seed: i64, cfg: f64) -> WarpInputs {
        WarpInputs {
            seed: Some(seed),
            cfg: Some(cfg),
            ..Default::default()
        }
    }

    #[test]
    fn test_warp_without_source() {
        let store = BundleStore::new();
        let token = Warp::warp(&store, None, inputs(42, 7.0));

        let bundle = store.get(&token.id).unwrap();
        assert_eq!(bundle.fields().int(FieldName::Seed), Some(42));
        assert_eq!(bundle.fields().float(FieldName::Cfg), Some(7.0));
        assert_eq!(bundle.fields().len(), 2);
    }

    #[test]
    fn test_warp_chain_overlays_source() {
        let store = BundleStore::new();
        let a = Warp::warp(&store, None, inputs(42, 7.0));
        let b = Warp::warp(
            &store,
            Some(&a),
            WarpInputs {
                seed: Some(99),
                ..Default::default()
            },
        );

        assert_ne!(a, b);
        let fields = store.get(&b.id).unwrap().fields().clone();
        assert_eq!(fields.int(FieldName::Seed), Some(99));
        assert_eq!(fields.float(FieldName::Cfg), Some(7.0));

        // Source untouched
        let source = store.get(&a.id).unwrap();
        assert_eq!(source.fields().int(FieldName::Seed), Some(42));
    }

    #[test]
    fn test_stale_source_starts_fresh() {
        let store = BundleStore::new();
        let stale = WarpToken::new(BundleId::from("0123456789abcdef0123456789abcdef"));
        let token = Warp::warp(&store, Some(&stale), inputs(1, 2.0));

        let fields = store.get(&token.id).unwrap().fields().clone();
        assert_eq!(fields, inputs(1, 2.0).into_fields());
    }

    #[test]
    fn test_empty_text_overrides_source() {
        let store = BundleStore::new();
        let a = Warp::warp(
            &store,
            None,
            WarpInputs {
                prompt_positive: Some("a castle".into()),
                ..Default::default()
            },
        );
        let b = Warp::warp(
            &store,
            Some(&a),
            WarpInputs {
                prompt_positive: Some(String::new()),
                ..Default::default()
            },
        );
        let fields = store.get(&b.id).unwrap().fields().clone();
        assert_eq!(fields.text(FieldName::PromptPositive), Some(""));
    }

    #[test]
    fn test_payloads_are_shared_not_copied() {
        let store = BundleStore::new();
        let model = Payload::labeled("sdxl", vec![0u8; 16]);
        let a = Warp::warp(
            &store,
            None,
            WarpInputs {
                model: Some(model.clone()),
                ..Default::default()
            },
        );
        let b = Warp::warp(&store, Some(&a), WarpInputs::default());

        let stored = store.get(&b.id).unwrap();
        assert!(stored.fields().handle(FieldName::Model).unwrap().same_object(&model));
    }

    #[test]
    fn test_into_fields_skips_none() {
        assert!(WarpInputs::default().into_fields().is_empty());
    }

    #[test]
    fn test_fingerprint_stable_and_sensitive() {
        let fields = inputs(42, 7.0).into_fields();
        let same = inputs(42, 7.0).into_fields();
        let other = inputs(43, 7.0).into_fields();

        let fp = Warp::fingerprint(None, &fields);
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, Warp::fingerprint(None, &same));
        assert_ne!(fp, Warp::fingerprint(None, &other));

        let token = WarpToken::new(BundleId::from("abc"));
        assert_ne!(fp, Warp::fingerprint(Some(&token), &fields));
    }

    #[test]
    fn test_token_wire_form() {
        let token = WarpToken::new(BundleId::from("deadbeef"));
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json, serde_json::json!({"id": "deadbeef"}));

        let parsed: WarpToken = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_descriptor() {
        let desc = Warp.descriptor();
        assert_eq!(desc.name, "Warp");
        assert_eq!(desc.category, CATEGORY);
        assert!(desc.output_node);
        assert_eq!(desc.inputs.len(), FieldName::ALL.len() + 1);
        assert_eq!(desc.inputs[0].name, "warp");
        assert!(desc.inputs.iter().all(|i| !i.required));
        assert_eq!(desc.outputs.len(), 1);
    }
}
