// ============================================================
// Layer 5 — Architecture Presets
// ============================================================
// Models are referred to by the name of the architecture they
// reproduce. The numbers follow the published configurations:
//
//   preset                 d_model  heads  layers  d_ff
//   tiny                        64      4       2    128
//   bert-base-*, roberta-base  768     12      12   3072
//   roberta-large             1024     16      24   4096
//   t5-small                   512      8       6   2048
//   t5-base                    768     12      12   3072
//   t5-large                  1024     16      24   4096
//   google/t5-v1_1-large      1024     16      24   2816
//
// `tiny` exists for smoke runs and tests.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::domain::kinds::ModelKind;

pub const PRESET_NAMES: [&str; 9] = [
    "tiny",
    "bert-base-cased",
    "bert-base-uncased",
    "roberta-base",
    "roberta-large",
    "t5-small",
    "t5-base",
    "t5-large",
    "google/t5-v1_1-large",
];

#[derive(Config, Debug)]
pub struct ArchConfig {
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_layers: usize,
    pub d_ff:       usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

/// The architecture each family is published with.
pub fn default_preset(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::RuleTaker | ModelKind::Prover => "roberta-large",
        ModelKind::ProofWriter                  => "google/t5-v1_1-large",
        ModelKind::BertNot                      => "bert-base-cased",
        ModelKind::Fld                          => "t5-base",
    }
}

/// Look up an architecture by preset name.
pub fn preset(name: &str) -> Result<ArchConfig> {
    let (d_model, num_heads, num_layers, d_ff) = match name {
        "tiny"                                  => (64, 4, 2, 128),
        "bert-base-cased" | "bert-base-uncased" => (768, 12, 12, 3072),
        "roberta-base"                          => (768, 12, 12, 3072),
        "roberta-large"                         => (1024, 16, 24, 4096),
        "t5-small"                              => (512, 8, 6, 2048),
        "t5-base"                               => (768, 12, 12, 3072),
        "t5-large"                              => (1024, 16, 24, 4096),
        "google/t5-v1_1-large"                  => (1024, 16, 24, 2816),
        other => bail!(
            "unknown architecture preset '{other}' (expected one of: {})",
            PRESET_NAMES.join(", ")
        ),
    };
    Ok(ArchConfig::new(d_model, num_heads, num_layers, d_ff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_preset_resolves() {
        for name in PRESET_NAMES {
            let arch = preset(name).unwrap();
            assert_eq!(arch.d_model % arch.num_heads, 0, "{name}");
        }
    }

    #[test]
    fn test_known_values() {
        let arch = preset("roberta-large").unwrap();
        assert_eq!((arch.d_model, arch.num_layers), (1024, 24));
        assert_eq!(preset("t5-small").unwrap().d_ff, 2048);
    }

    #[test]
    fn test_defaults_are_known_presets() {
        for kind in ModelKind::ALL {
            assert!(PRESET_NAMES.contains(&default_preset(kind)), "{kind}");
        }
    }

    #[test]
    fn test_unknown_preset() {
        let err = preset("gpt-2").unwrap_err().to_string();
        assert!(err.contains("gpt-2"));
    }
}
