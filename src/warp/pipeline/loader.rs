// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::types::PipelineDef;
use crate::common::error::{PipelineError, Result};

/// Loads and validates pipeline scripts
pub struct PipelineLoader;

impl PipelineLoader {
    /// Load a pipeline definition from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<PipelineDef> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse and validate a pipeline definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<PipelineDef> {
        let def: PipelineDef = serde_yaml::from_str(content)?;
        Self::validate(&def)?;
        Ok(def)
    }

    /// Check step ids are unique and every `from` names an earlier step.
    ///
    /// Node names are resolved against the registry at run time.
    pub fn validate(def: &PipelineDef) -> Result<()> {
        if def.steps.is_empty() {
            return Err(PipelineError::Empty(def.name.clone()).into());
        }

        let mut seen = HashSet::new();
        for step in &def.steps {
            if let Some(source) = &step.from {
                if !seen.contains(source.as_str()) {
                    return Err(PipelineError::UnknownSource {
                        step: step.id.clone(),
                        source_step: source.clone(),
                    }
                    .into());
                }
            }
            if step.node == "Unwarp" && !step.inputs.is_empty() {
                return Err(PipelineError::UnexpectedInputs(step.id.clone()).into());
            }
            if !seen.insert(step.id.as_str()) {
                return Err(PipelineError::DuplicateStep(step.id.clone()).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::WarpError;

    #[test]
    fn test_parse_chained_pipeline() {
        let yaml = r#"
name: Chained
description: "Pack, extend, unpack"
steps:
  - id: pack
    node: Warp
    inputs:
      seed: 42
      cfg: 7.0
  - id: extend
    node: Warp
    from: pack
    inputs:
      seed: 99
  - id: unpack
    node: Unwarp
    from: extend
"#;
        let def = PipelineLoader::parse_yaml(yaml).unwrap();
        assert_eq!(def.name, "Chained");
        assert_eq!(def.steps.len(), 3);
        assert_eq!(def.steps[2].from.as_deref(), Some("extend"));
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineLoader::parse_yaml("name: Nothing\n").unwrap_err();
        assert!(matches!(err, WarpError::Pipeline(PipelineError::Empty(_))));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let yaml = r#"
name: Dup
steps:
  - id: a
    node: Warp
  - id: a
    node: Warp
"#;
        let err = PipelineLoader::parse_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            WarpError::Pipeline(PipelineError::DuplicateStep(ref id)) if id == "a"
        ));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let yaml = r#"
name: Forward
steps:
  - id: unpack
    node: Unwarp
    from: pack
  - id: pack
    node: Warp
"#;
        let err = PipelineLoader::parse_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            WarpError::Pipeline(PipelineError::UnknownSource { .. })
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let yaml = r#"
name: Loop
steps:
  - id: pack
    node: Warp
    from: pack
"#;
        assert!(PipelineLoader::parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_unwarp_inputs_rejected() {
        let yaml = r#"
name: Bad
steps:
  - id: unpack
    node: Unwarp
    inputs:
      seed: 1
"#;
        let err = PipelineLoader::parse_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            WarpError::Pipeline(PipelineError::UnexpectedInputs(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineLoader::load("/nonexistent/pipeline.yaml").unwrap_err();
        assert!(matches!(
            err,
            WarpError::Pipeline(PipelineError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
name:
  - invalid structure
"#;
        assert!(matches!(
            PipelineLoader::parse_yaml(yaml),
            Err(WarpError::Yaml(_))
        ));
    }
}
