// ============================================================
// Layer 3 — Pipeline Error
// ============================================================
// The one typed error in the toolkit. Everything else travels
// as anyhow::Error with context attached at the failure site.

use thiserror::Error;

use crate::domain::kinds::ModelKind;

/// Raised when a training pipeline is handed a model of the wrong family,
/// e.g. a PRover passed to the RuleTaker pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model '{found}' is not compatible with the {pipeline} pipeline (expected '{expected}')")]
pub struct ModelNotCompatibleError {
    pub pipeline: &'static str,
    pub expected: ModelKind,
    pub found:    ModelKind,
}

impl ModelNotCompatibleError {
    pub fn new(pipeline: &'static str, expected: ModelKind, found: ModelKind) -> Self {
        Self { pipeline, expected, found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_both_models() {
        let err = ModelNotCompatibleError::new("ruletaker", ModelKind::RuleTaker, ModelKind::Prover);
        let msg = err.to_string();
        assert!(msg.contains("prover"));
        assert!(msg.contains("ruletaker pipeline"));
    }
}
