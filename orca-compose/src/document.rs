//! Overlay document written next to a project's own compose file.
//!
//! Only the keys orca contributes are modelled. Maps are ordered so the
//! generated YAML is stable between runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayDocument {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, OverlayService>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, OverlayNetwork>,
}

impl OverlayDocument {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.networks.is_empty()
    }

    /// The overlay entry for `name`, created on first use.
    pub fn service_mut(&mut self, name: &str) -> &mut OverlayService {
        self.services.entry(name.to_string()).or_default()
    }

    pub fn to_yaml(&self) -> serde_yaml_ng::Result<String> {
        if self.is_empty() {
            return Ok("{}\n".to_string());
        }
        serde_yaml_ng::to_string(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayNetwork {
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayService {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, NetworkAttachment>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<BindVolume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Long-form `volumes` entry of type `bind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindVolume {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub target: String,
}

impl BindVolume {
    pub fn bind(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: "bind".to_string(),
            source: source.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_serializes_as_empty_mapping() {
        assert_eq!(OverlayDocument::default().to_yaml().unwrap(), "{}\n");
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut doc = OverlayDocument::default();
        doc.service_mut("app")
            .volumes
            .push(BindVolume::bind("/certs/", "/etc/ssl/orca/"));

        let yaml = doc.to_yaml().unwrap();
        assert!(!yaml.contains("networks"));
        assert!(!yaml.contains("labels"));
        assert!(yaml.contains("type: bind"));
    }

    #[test]
    fn test_external_flag_only_written_when_set() {
        let owned = OverlayNetwork {
            name: "orca-ws".to_string(),
            ..OverlayNetwork::default()
        };
        let joined = OverlayNetwork {
            external: true,
            ..owned.clone()
        };

        assert!(!serde_yaml_ng::to_string(&owned).unwrap().contains("external"));
        assert!(serde_yaml_ng::to_string(&joined)
            .unwrap()
            .contains("external: true"));
    }
}
