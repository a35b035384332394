//! Container settings for containerized jobs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub host_path: String,
    pub container_path: String,
    /// `RO` or `RW`.
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    pub network: String,
    #[serde(deserialize_with = "crate::job::nullable")]
    pub volumes: Vec<Volume>,
    #[serde(deserialize_with = "crate::job::nullable")]
    pub parameters: Vec<Parameter>,
    pub force_pull_image: bool,
}

impl Container {
    /// A Docker container on the bridge network.
    pub fn docker(image: impl Into<String>) -> Self {
        Self {
            kind: "DOCKER".to_string(),
            image: image.into(),
            network: "BRIDGE".to_string(),
            ..Self::default()
        }
    }

    pub fn add_volume(
        &mut self,
        host_path: impl Into<String>,
        container_path: impl Into<String>,
        mode: impl Into<String>,
    ) -> &mut Self {
        self.volumes.push(Volume {
            host_path: host_path.into(),
            container_path: container_path.into(),
            mode: mode.into(),
        });
        self
    }

    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parameters.push(Parameter {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}
