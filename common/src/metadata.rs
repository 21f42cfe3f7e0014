/*
Copyright 2020 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::manifest::ProviderFactory;
use crate::type_data::TypeData;

/// The surface of a graph compiled in another unit, as visible through its
/// published metadata: accessors and provider factories only. External graphs
/// have no creator, injectors, or extensions.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ExternalGraphMetadata {
    pub type_data: TypeData,
    pub accessors: Vec<ExternalAccessor>,
    pub provider_factories: Vec<ProviderFactory>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ExternalAccessor {
    pub name: String,
    pub return_type: TypeData,
}

impl ExternalGraphMetadata {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).with_context(|| {
            format!(
                "unable to serialize graph metadata for {}",
                self.type_data.readable()
            )
        })
    }

    pub fn from_json(json: &str) -> anyhow::Result<ExternalGraphMetadata> {
        serde_json::from_str(json).with_context(|| "unable to parse graph metadata")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips_through_json() {
        let metadata = ExternalGraphMetadata {
            type_data: TypeData::crate_rooted("dep", "DepGraph"),
            accessors: vec![ExternalAccessor {
                name: "message".to_owned(),
                return_type: TypeData::global("std::string::String"),
            }],
            provider_factories: Vec::new(),
        };
        let json = metadata.to_json().unwrap();
        assert_eq!(ExternalGraphMetadata::from_json(&json).unwrap(), metadata);
    }
}
