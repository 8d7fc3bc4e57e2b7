use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Values for `${name}` placeholders in a scenario file, such as the
/// storefront base URL or the customer on the order form.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
    use_env: bool,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let placeholders fall back to process environment variables, so
    /// `BASE_URL=http://staging.local` retargets every scenario.
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Build from repeated `-P customer=Jane` flags.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter().try_fold(Self::new(), |params, arg| {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("param '{}' is not of the form name=value", arg))
            })?;
            Ok(params.set(key, value))
        })
    }

    /// Explicit value, then environment, then the scenario's declared
    /// default. `Ok(None)` means the name is unknown and stays verbatim.
    fn resolve(&self, name: &str, defs: &HashMap<String, ParamDef>) -> Result<Option<String>> {
        if let Some(v) = self.get(name) {
            return Ok(Some(v.to_string()));
        }
        if self.use_env {
            if let Ok(v) = std::env::var(name) {
                return Ok(Some(v));
            }
        }
        let Some(def) = defs.get(name) else {
            return Ok(None);
        };
        match (&def.default, def.required) {
            (Some(default), _) => Ok(Some(default.clone())),
            (None, true) => Err(Error::Config(format!(
                "scenario needs param '{}' (pass -P {}=...)",
                name, name
            ))),
            (None, false) => Ok(Some(String::new())),
        }
    }
}

/// A `params:` entry in the scenario header.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,

    pub default: Option<String>,

    /// Shown by `--check`.
    pub description: Option<String>,
}

/// Replace every resolvable `${name}` in `template`.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(open) = result[start..].find("${") {
        let open = start + open;
        let Some(close) = result[open..].find('}') else {
            break;
        };
        let close = open + close;

        match params.resolve(&result[open + 2..close], defs)? {
            Some(value) => {
                result.replace_range(open..=close, &value);
                start = open + value.len();
            }
            None => start = close + 1,
        }
    }

    Ok(result)
}

/// Substitute inside every string of a parsed scenario document, before it
/// is deserialized into steps.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => *s = substitute(s, params, defs)?,
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}
