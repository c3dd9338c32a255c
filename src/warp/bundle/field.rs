// SPDX-License-Identifier: MIT

//! Bundle field vocabulary and values
//!
//! A bundle carries at most one value per [`FieldName`]. Model, image and
//! conditioning payloads are opaque to this crate and travel as [`Payload`]
//! handles; scalar parameters are stored by value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::common::error::{Result, WarpError};

/// The fixed set of fields a bundle can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Model,
    #[serde(rename = "model_2")]
    Model2,
    Clip,
    ClipVision,
    Vae,
    ConditioningPositive,
    ConditioningNegative,
    Image,
    Mask,
    Latent,
    PromptPositive,
    PromptNegative,
    BatchSize,
    Seed,
    InitialSteps,
    DetailerSteps,
    UpscalerSteps,
    Width,
    Height,
    Cfg,
    SamplerName,
    Scheduler,
}

/// What kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque host object (model, tensor, conditioning)
    Handle,
    Text,
    Int,
    Float,
    /// Member of an enumerated vocabulary (sampler, scheduler)
    Choice,
}

impl FieldName {
    /// Every field, in node output order
    pub const ALL: [FieldName; 22] = [
        FieldName::Model,
        FieldName::Model2,
        FieldName::Clip,
        FieldName::ClipVision,
        FieldName::Vae,
        FieldName::ConditioningPositive,
        FieldName::ConditioningNegative,
        FieldName::Image,
        FieldName::Mask,
        FieldName::Latent,
        FieldName::PromptPositive,
        FieldName::PromptNegative,
        FieldName::BatchSize,
        FieldName::Seed,
        FieldName::InitialSteps,
        FieldName::DetailerSteps,
        FieldName::UpscalerSteps,
        FieldName::Width,
        FieldName::Height,
        FieldName::Cfg,
        FieldName::SamplerName,
        FieldName::Scheduler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Model => "model",
            FieldName::Model2 => "model_2",
            FieldName::Clip => "clip",
            FieldName::ClipVision => "clip_vision",
            FieldName::Vae => "vae",
            FieldName::ConditioningPositive => "conditioning_positive",
            FieldName::ConditioningNegative => "conditioning_negative",
            FieldName::Image => "image",
            FieldName::Mask => "mask",
            FieldName::Latent => "latent",
            FieldName::PromptPositive => "prompt_positive",
            FieldName::PromptNegative => "prompt_negative",
            FieldName::BatchSize => "batch_size",
            FieldName::Seed => "seed",
            FieldName::InitialSteps => "initial_steps",
            FieldName::DetailerSteps => "detailer_steps",
            FieldName::UpscalerSteps => "upscaler_steps",
            FieldName::Width => "width",
            FieldName::Height => "height",
            FieldName::Cfg => "cfg",
            FieldName::SamplerName => "sampler_name",
            FieldName::Scheduler => "scheduler",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldName::Model
            | FieldName::Model2
            | FieldName::Clip
            | FieldName::ClipVision
            | FieldName::Vae
            | FieldName::ConditioningPositive
            | FieldName::ConditioningNegative
            | FieldName::Image
            | FieldName::Mask
            | FieldName::Latent => FieldKind::Handle,
            FieldName::PromptPositive | FieldName::PromptNegative => FieldKind::Text,
            FieldName::BatchSize
            | FieldName::Seed
            | FieldName::InitialSteps
            | FieldName::DetailerSteps
            | FieldName::UpscalerSteps
            | FieldName::Width
            | FieldName::Height => FieldKind::Int,
            FieldName::Cfg => FieldKind::Float,
            FieldName::SamplerName | FieldName::Scheduler => FieldKind::Choice,
        }
    }

    /// Host type tag for this field's socket
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldName::Model | FieldName::Model2 => "MODEL",
            FieldName::Clip => "CLIP",
            FieldName::ClipVision => "CLIP_VISION",
            FieldName::Vae => "VAE",
            FieldName::ConditioningPositive | FieldName::ConditioningNegative => "CONDITIONING",
            FieldName::Image => "IMAGE",
            FieldName::Mask => "MASK",
            FieldName::Latent => "LATENT",
            FieldName::PromptPositive | FieldName::PromptNegative => "STRING",
            FieldName::BatchSize
            | FieldName::Seed
            | FieldName::InitialSteps
            | FieldName::DetailerSteps
            | FieldName::UpscalerSteps
            | FieldName::Width
            | FieldName::Height => "INT",
            FieldName::Cfg => "FLOAT",
            FieldName::SamplerName => "SAMPLER",
            FieldName::Scheduler => "SCHEDULER",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self> {
        FieldName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| WarpError::UnknownField(s.to_string()))
    }
}

/// Opaque handle to a host object.
///
/// The crate never looks inside a payload. Two handles are equal only when
/// they point at the same object, so copying a bundle shares payloads
/// rather than duplicating them. For fingerprints, a labeled handle is
/// identified by its label and an unlabeled one by its address.
#[derive(Clone)]
pub struct Payload {
    inner: Arc<dyn Any + Send + Sync>,
    label: Option<Arc<str>>,
}

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            label: None,
        }
    }

    /// Create a handle with a human-readable label used in debug output
    pub fn labeled<T: Any + Send + Sync>(label: impl Into<String>, value: T) -> Self {
        Self {
            inner: Arc::new(value),
            label: Some(Arc::from(label.into())),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Borrow the underlying object if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// True when both handles refer to the same object
    pub fn same_object(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "Payload({})", label),
            None => write!(f, "Payload({:#x})", self.identity()),
        }
    }
}

/// A single stored field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Handle(Payload),
    Text(String),
    Int(i64),
    Float(f64),
    Choice(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Handle(_) => FieldKind::Handle,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Choice(_) => FieldKind::Choice,
        }
    }

    /// Convert a pipeline-script value into the kind `field` carries.
    ///
    /// Returns `Ok(None)` for `null`, which means "not provided". Any
    /// non-null value is accepted for handle fields and wrapped as an
    /// opaque payload labeled with its text.
    pub fn from_json(field: FieldName, value: &Value) -> Result<Option<FieldValue>> {
        if value.is_null() {
            return Ok(None);
        }

        let converted = match field.kind() {
            FieldKind::Handle => {
                let label = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(FieldValue::Handle(Payload::labeled(label, value.clone())))
            }
            FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
            FieldKind::Int => value.as_i64().map(FieldValue::Int),
            FieldKind::Float => value.as_f64().map(FieldValue::Float),
            FieldKind::Choice => value.as_str().map(|s| FieldValue::Choice(s.to_string())),
        };

        converted
            .map(Some)
            .ok_or_else(|| WarpError::field_kind(field, value.to_string()))
    }

    /// JSON rendering for reports; payloads render as their label
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Handle(p) => match p.label() {
                Some(label) => Value::String(label.to_string()),
                None => Value::String(format!("{:?}", p)),
            },
            FieldValue::Text(s) | FieldValue::Choice(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            FieldValue::Handle(p) => match p.label() {
                Some(label) => {
                    hasher.update([5u8]);
                    hasher.update((label.len() as u64).to_le_bytes());
                    hasher.update(label.as_bytes());
                }
                None => {
                    hasher.update([0u8]);
                    hasher.update(p.identity().to_le_bytes());
                }
            },
            FieldValue::Text(s) => {
                hasher.update([1u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            FieldValue::Int(i) => {
                hasher.update([2u8]);
                hasher.update(i.to_le_bytes());
            }
            FieldValue::Float(f) => {
                hasher.update([3u8]);
                hasher.update(f.to_bits().to_le_bytes());
            }
            FieldValue::Choice(s) => {
                hasher.update([4u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
        }
    }
}

/// Field name to value mapping. Absent keys mean "not provided".
///
/// [`FieldMap::insert`] rejects a value whose kind does not match its field.
/// Collecting from an iterator skips such entries instead, so a collected
/// map may hold fewer entries than the iterator yielded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<FieldName, FieldValue>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, rejecting one whose kind does not match the field
    pub fn insert(&mut self, name: FieldName, value: FieldValue) -> Result<Option<FieldValue>> {
        if value.kind() != name.kind() {
            return Err(WarpError::field_kind(name, format!("{:?}", value)));
        }
        Ok(self.fields.insert(name, value))
    }

    /// Insert without a kind check; callers construct the value from the field's typed slot
    pub(crate) fn set(&mut self, name: FieldName, value: FieldValue) {
        debug_assert_eq!(value.kind(), name.kind());
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.fields.get(&name)
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Overwrite entries with every entry present in `updates`
    pub fn overlay(&mut self, updates: FieldMap) {
        self.fields.extend(updates.fields);
    }

    pub fn handle(&self, name: FieldName) -> Option<&Payload> {
        match self.fields.get(&name) {
            Some(FieldValue::Handle(p)) => Some(p),
            _ => None,
        }
    }

    pub fn text(&self, name: FieldName) -> Option<&str> {
        match self.fields.get(&name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: FieldName) -> Option<i64> {
        match self.fields.get(&name) {
            Some(FieldValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, name: FieldName) -> Option<f64> {
        match self.fields.get(&name) {
            Some(FieldValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn choice(&self, name: FieldName) -> Option<&str> {
        match self.fields.get(&name) {
            Some(FieldValue::Choice(s)) => Some(s),
            _ => None,
        }
    }

    /// Build a map from pipeline-script inputs keyed by field name
    pub fn from_json_inputs(inputs: &BTreeMap<String, Value>) -> Result<Self> {
        let mut map = FieldMap::new();
        for (key, value) in inputs {
            let name: FieldName = key.parse()?;
            if let Some(converted) = FieldValue::from_json(name, value)? {
                map.set(name, converted);
            }
        }
        Ok(map)
    }

    /// Feed every entry, in field order, into a running digest
    pub(crate) fn hash_into(&self, hasher: &mut Sha256) {
        for (name, value) in &self.fields {
            hasher.update(name.as_str().as_bytes());
            hasher.update([0u8]);
            value.hash_into(hasher);
        }
    }
}

impl FromIterator<(FieldName, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (FieldName, FieldValue)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            if value.kind() == name.kind() {
                map.fields.insert(name, value);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_round_trip_through_str() {
        for name in FieldName::ALL {
            assert_eq!(name.as_str().parse::<FieldName>().unwrap(), name);
        }
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for name in FieldName::ALL {
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, json!(name.as_str()));
        }
    }

    #[test]
    fn test_unknown_field_name() {
        let err = "steps".parse::<FieldName>().unwrap_err();
        assert!(matches!(err, WarpError::UnknownField(ref s) if s == "steps"));
    }

    #[test]
    fn test_payload_identity_equality() {
        let a = Payload::new(vec![1u8, 2, 3]);
        let b = Payload::new(vec![1u8, 2, 3]);
        let a2 = a.clone();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        assert!(a.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_insert_rejects_wrong_kind() {
        let mut map = FieldMap::new();
        assert!(map.insert(FieldName::Seed, FieldValue::Int(1)).is_ok());
        let err = map
            .insert(FieldName::Seed, FieldValue::Text("1".into()))
            .unwrap_err();
        assert!(matches!(err, WarpError::FieldKind { field: FieldName::Seed, .. }));
        assert_eq!(map.int(FieldName::Seed), Some(1));
    }

    #[test]
    fn test_overlay_newer_wins() {
        let mut base: FieldMap = [
            (FieldName::Seed, FieldValue::Int(1)),
            (FieldName::Cfg, FieldValue::Float(7.0)),
        ]
        .into_iter()
        .collect();
        let updates: FieldMap = [(FieldName::Seed, FieldValue::Int(2))].into_iter().collect();

        base.overlay(updates);
        assert_eq!(base.int(FieldName::Seed), Some(2));
        assert_eq!(base.float(FieldName::Cfg), Some(7.0));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_from_json_conversions() {
        assert_eq!(
            FieldValue::from_json(FieldName::Seed, &json!(42)).unwrap(),
            Some(FieldValue::Int(42))
        );
        assert_eq!(
            FieldValue::from_json(FieldName::Cfg, &json!(7)).unwrap(),
            Some(FieldValue::Float(7.0))
        );
        assert_eq!(
            FieldValue::from_json(FieldName::Scheduler, &json!("karras")).unwrap(),
            Some(FieldValue::Choice("karras".into()))
        );
        assert_eq!(FieldValue::from_json(FieldName::Seed, &Value::Null).unwrap(), None);
        assert!(FieldValue::from_json(FieldName::Seed, &json!("abc")).is_err());
        assert!(FieldValue::from_json(FieldName::Seed, &json!(1.5)).is_err());

        let handle = FieldValue::from_json(FieldName::Model, &json!("sdxl_base"))
            .unwrap()
            .unwrap();
        assert_eq!(handle.to_json(), json!("sdxl_base"));
    }

    #[test]
    fn test_from_json_inputs() {
        let mut inputs = BTreeMap::new();
        inputs.insert("seed".to_string(), json!(7));
        inputs.insert("prompt_positive".to_string(), json!(""));
        inputs.insert("vae".to_string(), Value::Null);

        let map = FieldMap::from_json_inputs(&inputs).unwrap();
        assert_eq!(map.int(FieldName::Seed), Some(7));
        assert_eq!(map.text(FieldName::PromptPositive), Some(""));
        assert!(!map.contains(FieldName::Vae));
    }

    #[test]
    fn test_model_2_serde_name() {
        assert_eq!(serde_json::to_value(FieldName::Model2).unwrap(), json!("model_2"));
        let parsed: FieldName = serde_json::from_value(json!("model_2")).unwrap();
        assert_eq!(parsed, FieldName::Model2);
    }

    fn digest(map: &FieldMap) -> String {
        let mut hasher = Sha256::new();
        map.hash_into(&mut hasher);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn test_labeled_handles_hash_by_label() {
        let a: FieldMap = [(FieldName::Model, FieldValue::Handle(Payload::labeled("sdxl", 1u8)))]
            .into_iter()
            .collect();
        let b: FieldMap = [(FieldName::Model, FieldValue::Handle(Payload::labeled("sdxl", 2u8)))]
            .into_iter()
            .collect();
        let c: FieldMap = [(FieldName::Model, FieldValue::Handle(Payload::labeled("sd15", 1u8)))]
            .into_iter()
            .collect();
        assert_eq!(digest(&a), digest(&b));
        assert_ne!(digest(&a), digest(&c));
    }

    #[test]
    fn test_unlabeled_handles_hash_by_identity() {
        let shared = Payload::new(1u8);
        let a: FieldMap = [(FieldName::Vae, FieldValue::Handle(shared.clone()))]
            .into_iter()
            .collect();
        let b: FieldMap = [(FieldName::Vae, FieldValue::Handle(shared))].into_iter().collect();
        let other = Payload::new(1u8);
        let c: FieldMap = [(FieldName::Vae, FieldValue::Handle(other))].into_iter().collect();
        assert_eq!(digest(&a), digest(&b));
        assert_ne!(digest(&a), digest(&c));
    }

    #[test]
    fn test_from_iter_drops_mismatched_kinds() {
        let map: FieldMap = [
            (FieldName::Width, FieldValue::Float(1.0)),
            (FieldName::Height, FieldValue::Int(768)),
        ]
        .into_iter()
        .collect();
        assert!(!map.contains(FieldName::Width));
        assert_eq!(map.int(FieldName::Height), Some(768));
    }
}
