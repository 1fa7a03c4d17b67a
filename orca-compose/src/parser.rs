//! Reads the parts of a project's compose file that overlays depend on.
//!
//! The YAML is decoded first, then variables are interpolated into every
//! string scalar (mapping keys included) the way `docker compose` does it,
//! using the declared env files on top of the process environment.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use orca_core::error::{OrcaError, Result};
use regex::{Captures, Regex};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_yaml_ng::{Mapping, Value};
use tracing::{debug, warn};

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?-)([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))",
    )
    .expect("Variable regex should compile - this is a static pattern")
});

/// The service names and labels of a compose file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComposeSource {
    #[serde(default)]
    pub services: BTreeMap<String, SourceService>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceService {
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub labels: BTreeMap<String, String>,
}

impl SourceService {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Labels may be written as a mapping or as a list of `KEY=VALUE` strings.
fn deserialize_labels<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LabelsVisitor;

    impl<'de> Visitor<'de> for LabelsVisitor {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of labels or a list of KEY=VALUE strings")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut labels = BTreeMap::new();
            while let Some((key, value)) = map.next_entry::<String, serde_yaml_ng::Value>()? {
                labels.insert(key, scalar_to_string(&value));
            }
            Ok(labels)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut labels = BTreeMap::new();
            while let Some(entry) = seq.next_element::<String>()? {
                let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                labels.insert(key.to_string(), value.to_string());
            }
            Ok(labels)
        }
    }

    deserializer.deserialize_any(LabelsVisitor)
}

fn scalar_to_string(value: &serde_yaml_ng::Value) -> String {
    match value {
        serde_yaml_ng::Value::Null => String::new(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::String(s) => s.clone(),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Parse `KEY=VALUE` lines of an env file.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Substitute `${VAR}`, `${VAR:-default}`, `${VAR-default}` and `$VAR`.
/// `$$` produces a literal `$`. Unset variables become empty strings.
pub fn interpolate(text: &str, vars: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(text, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }

            let name = caps.get(2).or_else(|| caps.get(5)).map_or("", |m| m.as_str());
            let value = vars.get(name);

            match (caps.get(3).map(|m| m.as_str()), caps.get(4)) {
                (Some(":-"), Some(default)) => match value {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => default.as_str().to_string(),
                },
                (Some("-"), Some(default)) => match value {
                    Some(v) => v.clone(),
                    None => default.as_str().to_string(),
                },
                _ => value.cloned().unwrap_or_else(|| {
                    warn!(variable = %name, "variable is not set, substituting an empty string");
                    String::new()
                }),
            }
        })
        .into_owned()
}

/// Interpolate every string scalar of a decoded document.
pub fn interpolate_value(value: Value, vars: &HashMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate(&s, vars)),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| interpolate_value(item, vars))
                .collect(),
        ),
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(k, v)| (interpolate_value(k, vars), interpolate_value(v, vars)))
                .collect::<Mapping>(),
        ),
        Value::Tagged(mut tagged) => {
            tagged.value = interpolate_value(tagged.value, vars);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

/// The process environment. Entries that are not valid UTF-8 cannot be
/// referenced from a compose file and are skipped.
fn process_environment() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                debug!(variable = ?key, "skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}

/// Source of [`ComposeSource`] documents.
pub trait ComposeParser {
    fn parse(&self, compose_file: &Path, env_files: &[PathBuf]) -> Result<ComposeSource>;
}

/// Reads compose files from disk.
#[derive(Debug, Clone, Default)]
pub struct FileComposeParser {
    base_env: Option<HashMap<String, String>>,
}

impl FileComposeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed base environment instead of the process environment.
    pub fn with_environment(vars: HashMap<String, String>) -> Self {
        Self {
            base_env: Some(vars),
        }
    }

    fn environment(&self, env_files: &[PathBuf]) -> Result<HashMap<String, String>> {
        let mut vars = match &self.base_env {
            Some(vars) => vars.clone(),
            None => process_environment(),
        };

        for path in env_files {
            if !path.is_file() {
                return Err(OrcaError::FileNotFound(path.clone()));
            }
            let contents = std::fs::read_to_string(path)?;
            vars.extend(parse_env_file(&contents));
        }

        Ok(vars)
    }
}

impl ComposeParser for FileComposeParser {
    fn parse(&self, compose_file: &Path, env_files: &[PathBuf]) -> Result<ComposeSource> {
        if !compose_file.is_file() {
            return Err(OrcaError::FileNotFound(compose_file.to_path_buf()));
        }

        debug!(path = %compose_file.display(), "parsing compose file");
        let raw = std::fs::read_to_string(compose_file)?;
        let invalid = |e: serde_yaml_ng::Error| OrcaError::InvalidYaml {
            path: compose_file.to_path_buf(),
            message: e.to_string(),
        };

        let document: Value = serde_yaml_ng::from_str(&raw).map_err(invalid)?;
        let document = interpolate_value(document, &self.environment(env_files)?);
        serde_yaml_ng::from_value(document).map_err(invalid)
    }
}
