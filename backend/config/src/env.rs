//! `${ENV_VAR}` substitution in config values.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are recognized; `$${VAR}`
//! escapes to a literal `${VAR}`. Resolution walks the whole value tree
//! and touches string leaves only.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());
static ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error for a `${VAR}` reference with no matching environment variable.
#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{var}\" referenced at config path: {path}")]
pub struct MissingEnvVar {
    pub var: String,
    pub path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references from an explicit map (used by tests).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    walk(value, env, "")
}

fn walk(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute(s, env, path)?)),
        Value::Array(items) => {
            let resolved: Result<Vec<_>> = items
                .iter()
                .enumerate()
                .map(|(i, v)| walk(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut resolved = serde_json::Map::new();
            for (key, v) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                resolved.insert(key.clone(), walk(v, env, &child_path)?);
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}

fn substitute(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    // Hide escaped references (dropping their `$`) so the main pass cannot
    // see them, then restore the `$` to leave a literal `${VAR}`.
    const MARKER: &str = "\u{0}ESC\u{0}";
    let masked = ESCAPE_RE.replace_all(s, format!("{MARKER}{{$1}}"));

    let mut missing: Option<MissingEnvVar> = None;
    let replaced = VAR_RE.replace_all(&masked, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(v) => v.clone(),
            None => {
                if missing.is_none() {
                    missing = Some(MissingEnvVar {
                        var: name.to_string(),
                        path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });
    if let Some(err) = missing {
        return Err(err.into());
    }

    Ok(replaced.replace(MARKER, "$"))
}
