use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::api::apply_override_to_policy;
use crate::defaults::default_policy;
use crate::errors::PolicyError;
use crate::model::{HealPolicy, PolicySource};

const ENV_PREFIX: &str = "SELFHEAL_POLICY__";
const ENV_JSON: &str = "SELFHEAL_POLICY_OVERRIDE_JSON";
const ENV_CLI_OVERRIDES: &str = "SELFHEAL_POLICY_CLI_OVERRIDES";

#[derive(Debug, Default)]
pub struct LoadOptions {
    /// YAML policy file; skipped when absent on disk
    pub path: Option<PathBuf>,
    /// Read the `SELFHEAL_POLICY*` environment overlays
    pub include_env: bool,
}

/// Defaults, then the YAML file (when it exists), then environment overlays.
pub fn load_policy(path: Option<&Path>) -> Result<HealPolicy, PolicyError> {
    load_policy_with_options(&LoadOptions {
        path: path.map(Path::to_path_buf),
        include_env: true,
    })
}

pub fn load_policy_with_options(options: &LoadOptions) -> Result<HealPolicy, PolicyError> {
    let mut policy = default_policy();
    bootstrap_builtin_provenance(&mut policy)?;

    if let Some(path) = options.path.as_deref().filter(|path| path.exists()) {
        debug!(path = %path.display(), "loading policy file");
        apply_overlays(&mut policy, overlays_from_file(path)?)?;
    }

    if options.include_env {
        apply_overlays(&mut policy, overlays_from_env()?)?;
        apply_overlays(&mut policy, overlays_from_cli_env())?;
    }

    Ok(policy)
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(policy: &mut HealPolicy, overlays: Vec<PolicyOverlay>) -> Result<(), PolicyError> {
    for overlay in overlays {
        apply_override_to_policy(policy, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(err.to_string()))?;
    let document: Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::Invalid(err.to_string()))?;
    Ok(flatten_sections(document, PolicySource::File))
}

/// `SELFHEAL_POLICY__FUZZY__MIN_SCORE=40` addresses `fuzzy.min_score`.
fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = env::vars()
        .filter_map(|(key, raw)| {
            let path = key
                .strip_prefix(ENV_PREFIX)?
                .split("__")
                .map(str::to_ascii_lowercase)
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                return None;
            }
            Some(PolicyOverlay {
                path,
                value: parse_scalar(&raw),
                source: PolicySource::Env,
            })
        })
        .collect::<Vec<_>>();

    if let Some(raw_json) = env::var(ENV_JSON).ok().filter(|raw| !raw.trim().is_empty()) {
        let document: Value =
            serde_json::from_str(&raw_json).map_err(|err| PolicyError::Invalid(err.to_string()))?;
        overlays.extend(flatten_sections(document, PolicySource::Env));
    }

    Ok(overlays)
}

/// `a.b=1,c.d=false`. A token without `=` continues the previous value, so
/// `heuristics.disabled=id-to-xpath,name-to-xpath` stays one list; commas
/// inside `[...]` or double quotes never split.
fn overlays_from_cli_env() -> Vec<PolicyOverlay> {
    let Ok(raw) = env::var(ENV_CLI_OVERRIDES) else {
        return Vec::new();
    };
    let mut overlays: Vec<PolicyOverlay> = Vec::new();
    for token in split_overrides(&raw) {
        match token.split_once('=') {
            Some((path, value)) if !path.trim().is_empty() => overlays.push(PolicyOverlay {
                path: path.trim().to_string(),
                value: parse_scalar(value.trim()),
                source: PolicySource::Cli,
            }),
            _ => {
                if let Some(Value::String(previous)) = overlays.last_mut().map(|o| &mut o.value) {
                    previous.push(',');
                    previous.push_str(token);
                }
            }
        }
    }
    overlays
}

fn split_overrides(raw: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (offset, ch) in raw.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            _ if quoted => {}
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(raw[start..offset].trim());
                start = offset + 1;
            }
            _ => {}
        }
    }
    tokens.push(raw[start..].trim());
    tokens.retain(|token| !token.is_empty());
    tokens
}

/// JSON literal when it parses (`40`, `false`, `["a"]`), bare string otherwise.
fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `{section: {key: value}}` into `section.key` overlays; values are leaves.
fn flatten_sections(document: Value, source: PolicySource) -> Vec<PolicyOverlay> {
    let Value::Object(sections) = document else {
        return Vec::new();
    };
    let mut overlays = Vec::new();
    for (section, body) in sections {
        let section = section.trim().to_ascii_lowercase();
        match body {
            Value::Object(keys) => overlays.extend(keys.into_iter().map(|(key, value)| {
                PolicyOverlay {
                    path: format!("{}.{}", section, key.trim().to_ascii_lowercase()),
                    value,
                    source,
                }
            })),
            value => overlays.push(PolicyOverlay {
                path: section,
                value,
                source,
            }),
        }
    }
    overlays
}

fn bootstrap_builtin_provenance(policy: &mut HealPolicy) -> Result<(), PolicyError> {
    let mut sections = serde_json::Map::new();
    for (name, value) in [
        ("stages", serde_json::to_value(&policy.stages)),
        ("heuristics", serde_json::to_value(&policy.heuristics)),
        ("fuzzy", serde_json::to_value(&policy.fuzzy)),
        ("logging", serde_json::to_value(&policy.logging)),
    ] {
        let value = value.map_err(|err| PolicyError::Invalid(err.to_string()))?;
        sections.insert(name.to_string(), value);
    }
    for overlay in flatten_sections(Value::Object(sections), PolicySource::Builtin) {
        policy.set_provenance(&overlay.path, overlay.source);
    }
    Ok(())
}
