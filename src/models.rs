//! Medaka polishing-model identifiers.
//!
//! Identifiers are compact underscore-joined tokens such as
//! `r941_min_sup_g507` or `r104_e81_sup_variant_g5015`. Field counts are
//! irregular: the device field and the trailing training-flavor suffix are
//! both optional, so decoding walks the fields as a small deterministic
//! grammar (`pore [device] variant+ version [suffix]`) instead of indexing
//! into fixed positions.

use crate::conda::ToolSet;
use crate::consts::*;
use crate::error::Error;

/// A decoded model identifier.
///
/// # Fields
///
/// * `pore` - Pore/flow-cell designation, always the first field (e.g. `r941`).
/// * `device` - Sequencing device class (`min`/`prom`), when present.
/// * `variant` - Training-variant segment, underscore-joined (e.g. `e81_sup`).
/// * `basecaller` - Upstream basecaller version field (e.g. `g507`).
/// * `suffix` - Trailing training-flavor marker after the version (e.g. `rle`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub pore: String,
    pub device: Option<String>,
    pub variant: String,
    pub basecaller: String,
    pub suffix: Option<String>,
}

impl Model {
    /// Decode a compact model identifier into its attributes.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier token.
    ///
    /// # Returns
    ///
    /// A Result containing the decoded Model, or `Error::MalformedModel`
    /// naming the offending token.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use nanoamp::models::Model;
    ///
    /// let model = Model::decode("r941_min_sup_g507").unwrap();
    ///
    /// assert_eq!(model.pore, "r941");
    /// assert_eq!(model.device.as_deref(), Some("min"));
    /// assert_eq!(model.variant, "sup");
    /// assert_eq!(model.basecaller, "g507");
    /// ```
    pub fn decode(id: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedModel(id.to_string());

        let fields: Vec<&str> = id.split(MODEL_SEPARATOR).collect();
        if fields.len() < 3 || fields.iter().any(|f| f.is_empty()) {
            return Err(malformed());
        }

        let pore = fields[0].to_string();

        let (device, body_start) = if DEVICE_TOKENS.contains(&fields[1]) {
            (Some(fields[1].to_string()), 2)
        } else {
            (None, 1)
        };

        // the version field anchors the tail: either last, or second-to-last
        // with a flavor suffix trailing it
        let last = fields.len() - 1;
        let (version_at, suffix) = if is_version_field(fields[last]) {
            (last, None)
        } else if last >= 1 && is_version_field(fields[last - 1]) {
            (last - 1, Some(fields[last].to_string()))
        } else {
            return Err(malformed());
        };

        if body_start >= version_at {
            return Err(malformed());
        }

        Ok(Self {
            pore,
            device,
            variant: fields[body_start..version_at].join("_"),
            basecaller: fields[version_at].to_string(),
            suffix,
        })
    }

    /// Re-encode the model into its compact identifier form.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use nanoamp::models::Model;
    ///
    /// let model = Model::decode("r104_e81_sup_variant_g5015").unwrap();
    ///
    /// assert_eq!(model.encode(), "r104_e81_sup_variant_g5015");
    /// ```
    pub fn encode(&self) -> String {
        let mut fields = vec![self.pore.as_str()];
        if let Some(device) = &self.device {
            fields.push(device);
        }
        fields.extend(self.variant.split(MODEL_SEPARATOR));
        fields.push(&self.basecaller);
        if let Some(suffix) = &self.suffix {
            fields.push(suffix);
        }
        fields.join("_")
    }
}

/// A version field is the prefix character followed by digits only.
fn is_version_field(field: &str) -> bool {
    let mut chars = field.chars();
    chars.next() == Some(VERSION_FIELD_PREFIX)
        && field.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

/// Selection criteria for model filtering; `None` fields are wildcards.
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub pore: Option<String>,
    pub device: Option<String>,
    pub basecaller: Option<String>,
    pub variant: Option<String>,
}

impl ModelFilter {
    fn matches(&self, model: &Model) -> bool {
        if let Some(pore) = &self.pore {
            if &model.pore != pore {
                return false;
            }
        }
        if let Some(device) = &self.device {
            if model.device.as_ref() != Some(device) {
                return false;
            }
        }
        if let Some(basecaller) = &self.basecaller {
            if &model.basecaller != basecaller {
                return false;
            }
        }
        if let Some(variant) = &self.variant {
            if &model.variant != variant {
                return false;
            }
        }
        true
    }
}

/// Filter model identifiers down to those matching all set criteria.
///
/// Identifiers that do not decode are skipped with a warning; the selector
/// surface must not abort on a single odd entry in medaka's listing.
pub fn filter_models(models: &[String], filter: &ModelFilter) -> Vec<String> {
    models
        .iter()
        .filter(|id| match Model::decode(id) {
            Ok(model) => filter.matches(&model),
            Err(e) => {
                log::warn!("WARN: skipping unrecognized model: {}", e);
                false
            }
        })
        .cloned()
        .collect()
}

/// Candidate pore values for a selector, `--` sentinel first.
pub fn pores(models: &[String]) -> Vec<String> {
    candidates(models, |m| Some(m.pore))
}

/// Candidate device values for a selector, `--` sentinel first.
pub fn devices(models: &[String]) -> Vec<String> {
    candidates(models, |m| m.device)
}

/// Candidate basecaller versions for a selector, `--` sentinel first.
pub fn basecallers(models: &[String]) -> Vec<String> {
    candidates(models, |m| Some(m.basecaller))
}

/// Candidate variant values for a selector, `--` sentinel first.
pub fn variants(models: &[String]) -> Vec<String> {
    candidates(models, |m| Some(m.variant))
}

fn candidates(models: &[String], attr: fn(Model) -> Option<String>) -> Vec<String> {
    let mut out = vec![NO_SELECTION.to_string()];
    for id in models {
        if let Some(value) = Model::decode(id).ok().and_then(attr) {
            if !out.contains(&value) {
                out.push(value);
            }
        }
    }
    out
}

/// Query medaka for its installed model list.
///
/// Runs `medaka tools list_models` with the resolved medaka prefix on PATH
/// and parses the first output line: drop the leading `Available:` marker
/// and strip the trailing comma from every entry but the last.
pub fn list_models(tools: &ToolSet) -> Result<Vec<String>, Error> {
    let output = tools.command(MEDAKA, MEDAKA)?.args(["tools", "list_models"]).output()?;

    if !output.status.success() {
        return Err(Error::EnvManager {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().unwrap_or_default();

    Ok(line
        .split_whitespace()
        .skip(1)
        .map(|entry| entry.trim_end_matches(',').to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_device_no_suffix() {
        let model = Model::decode("r941_min_sup_g507").unwrap();
        assert_eq!(model.pore, "r941");
        assert_eq!(model.device.as_deref(), Some("min"));
        assert_eq!(model.variant, "sup");
        assert_eq!(model.basecaller, "g507");
        assert_eq!(model.suffix, None);
        assert_eq!(model.encode(), "r941_min_sup_g507");
    }

    #[test]
    fn decode_no_device_no_suffix() {
        let model = Model::decode("r104_e81_sup_variant_g5015").unwrap();
        assert_eq!(model.pore, "r104");
        assert_eq!(model.device, None);
        assert_eq!(model.variant, "e81_sup_variant");
        assert_eq!(model.basecaller, "g5015");
        assert_eq!(model.suffix, None);
        assert_eq!(model.encode(), "r104_e81_sup_variant_g5015");
    }

    #[test]
    fn decode_device_with_suffix() {
        let model = Model::decode("r941_prom_high_g344_rle").unwrap();
        assert_eq!(model.pore, "r941");
        assert_eq!(model.device.as_deref(), Some("prom"));
        assert_eq!(model.variant, "high");
        assert_eq!(model.basecaller, "g344");
        assert_eq!(model.suffix.as_deref(), Some("rle"));
        assert_eq!(model.encode(), "r941_prom_high_g344_rle");
    }

    #[test]
    fn decode_no_device_with_suffix() {
        let model = Model::decode("r103_hac_g507_rle").unwrap();
        assert_eq!(model.pore, "r103");
        assert_eq!(model.device, None);
        assert_eq!(model.variant, "hac");
        assert_eq!(model.basecaller, "g507");
        assert_eq!(model.suffix.as_deref(), Some("rle"));
        assert_eq!(model.encode(), "r103_hac_g507_rle");
    }

    #[test]
    fn decode_multifield_variant_with_device() {
        let model = Model::decode("r1041_min_e82_400bps_sup_variant_g615").unwrap();
        assert_eq!(model.device.as_deref(), Some("min"));
        assert_eq!(model.variant, "e82_400bps_sup_variant");
        assert_eq!(model.basecaller, "g615");
        assert_eq!(model.encode(), "r1041_min_e82_400bps_sup_variant_g615");
    }

    #[test]
    fn decode_rejects_malformed() {
        for bad in ["r941", "r941_min", "r941_min_sup", "r941__sup_g507", "r941_min_g507", ""] {
            let err = Model::decode(bad).unwrap_err();
            match err {
                Error::MalformedModel(token) => assert_eq!(token, bad),
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn version_field_requires_digits() {
        assert!(is_version_field("g507"));
        assert!(!is_version_field("g"));
        assert!(!is_version_field("gfast"));
        assert!(!is_version_field("sup"));
    }

    fn sample() -> Vec<String> {
        [
            "r941_min_sup_g507",
            "r941_min_fast_g507",
            "r941_prom_sup_g507",
            "r104_e81_sup_variant_g5015",
            "r103_hac_g507_rle",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn filter_all_wildcards_keeps_everything() {
        let models = sample();
        assert_eq!(filter_models(&models, &ModelFilter::default()), models);
    }

    #[test]
    fn filter_matches_all_set_criteria() {
        let models = sample();
        let filter = ModelFilter {
            pore: Some("r941".into()),
            device: Some("min".into()),
            basecaller: Some("g507".into()),
            variant: None,
        };
        assert_eq!(
            filter_models(&models, &filter),
            vec!["r941_min_sup_g507".to_string(), "r941_min_fast_g507".to_string()]
        );
    }

    #[test]
    fn filter_device_criterion_excludes_deviceless_models() {
        let models = sample();
        let filter = ModelFilter {
            device: Some("prom".into()),
            ..Default::default()
        };
        assert_eq!(filter_models(&models, &filter), vec!["r941_prom_sup_g507".to_string()]);
    }

    #[test]
    fn selectors_prepend_sentinel() {
        let models = sample();
        let pores = pores(&models);
        assert_eq!(pores[0], NO_SELECTION);
        assert!(pores.contains(&"r941".to_string()));
        assert!(pores.contains(&"r104".to_string()));
        assert!(pores.contains(&"r103".to_string()));

        let devices = devices(&models);
        assert_eq!(devices[0], NO_SELECTION);
        assert!(devices.contains(&"min".to_string()));
        assert!(devices.contains(&"prom".to_string()));
        // deviceless models contribute nothing besides the sentinel
        assert_eq!(devices.len(), 3);

        let variants = variants(&models);
        assert!(variants.contains(&"e81_sup_variant".to_string()));
    }
}
