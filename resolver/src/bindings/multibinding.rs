/*
Copyright 2021 Google LLC

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

use ravel_common::keys::{ContextualTypeKey, TypeKey, PROVIDER_PATH};
use ravel_common::manifest::{Declaration, MultibindingMapKey, MultibindingType};
use ravel_common::type_data::TypeData;

use crate::bindings::binding::MultibindingBinding;

pub const SET_PATH: &str = "std::collections::HashSet";
pub const MAP_PATH: &str = "std::collections::HashMap";

/// The concrete multibinding a contribution feeds.
#[derive(Debug, Clone)]
pub struct MultibindingTarget {
    pub multibinding_key: TypeKey,
    pub is_map: bool,
    pub key_type: Option<TypeData>,
    pub value_type: TypeData,
}

/// Computes the multibinding type key for a contribution, or `None` for plain
/// bindings. A malformed contribution shape is the frontend's fault and is
/// reported as a compiler bug by the caller.
pub fn multibinding_target(
    return_type: &TypeData,
    multibinding_type: &MultibindingType,
    map_key: &MultibindingMapKey,
) -> Result<Option<MultibindingTarget>, String> {
    match multibinding_type {
        MultibindingType::None => Ok(None),
        MultibindingType::IntoSet => Ok(Some(MultibindingTarget {
            multibinding_key: TypeKey::new(set_type(return_type)),
            is_map: false,
            key_type: None,
            value_type: return_type.clone(),
        })),
        MultibindingType::ElementsIntoSet => {
            if return_type.path != SET_PATH || return_type.args.len() != 1 {
                return Err(format!(
                    "elements-into-set contribution must return a set, got {}",
                    return_type.readable()
                ));
            }
            Ok(Some(MultibindingTarget {
                multibinding_key: TypeKey::new(return_type.clone()),
                is_map: false,
                key_type: None,
                value_type: return_type.args[0].clone(),
            }))
        }
        MultibindingType::IntoMap => {
            let key_type = key_type(map_key).ok_or_else(|| {
                format!(
                    "into-map contribution for {} has no map key",
                    return_type.readable()
                )
            })?;
            Ok(Some(MultibindingTarget {
                multibinding_key: TypeKey::new(map_type(&key_type, return_type)),
                is_map: true,
                key_type: Some(key_type),
                value_type: return_type.clone(),
            }))
        }
    }
}

/// Maps exposing `Map<K, V>` also expose `Map<K, Provider<V>>`.
pub fn provider_map_key(key_type: &TypeData, value_type: &TypeData) -> TypeKey {
    let provider_value = TypeData::global(PROVIDER_PATH).with_args(vec![value_type.clone()]);
    TypeKey::new(map_type(key_type, &provider_value))
}

/// The unique key a single contribution occupies in the graph. Contributions
/// to the same multibinding must not collide with each other, so the element
/// key is disambiguated with a synthetic qualifier derived from the
/// declaration.
pub fn contribution_element_key(return_type: &TypeData, declaration: &Declaration) -> TypeKey {
    let mut element = return_type.clone();
    element.qualifier = Some(Box::new(
        TypeData::global("ravel::internal::Element").with_args(vec![
            declaration.owner.clone(),
            TypeData::primitive(&declaration.name),
        ]),
    ));
    TypeKey::new(element)
}

/// A set- or map-shaped request with no binding resolves to an empty
/// multibinding; whether empty is acceptable is decided at validation.
pub fn implicit_multibinding(key: &TypeKey) -> Option<MultibindingBinding> {
    let type_data = key.type_data();
    let mut binding = MultibindingBinding {
        contextual_type_key: ContextualTypeKey::direct(key.clone()),
        type_key: key.clone(),
        is_map: false,
        is_set: false,
        allow_empty: false,
        source_bindings: Default::default(),
        dependencies: Vec::new(),
        declaration: None,
        provider_values: false,
        key_type: None,
        value_type: None,
        element_type: None,
    };
    if type_data.path == SET_PATH && type_data.args.len() == 1 {
        binding.is_set = true;
        binding.element_type = Some(type_data.args[0].clone());
        return Some(binding);
    }
    if type_data.path == MAP_PATH && type_data.args.len() == 2 {
        binding.is_map = true;
        binding.key_type = Some(type_data.args[0].clone());
        let value = &type_data.args[1];
        if value.path == PROVIDER_PATH && value.args.len() == 1 {
            binding.provider_values = true;
            binding.value_type = Some(value.args[0].clone());
        } else {
            binding.value_type = Some(value.clone());
        }
        return Some(binding);
    }
    None
}

fn key_type(map_key: &MultibindingMapKey) -> Option<TypeData> {
    match map_key {
        MultibindingMapKey::String(_) => Some(TypeData::global("std::string::String")),
        MultibindingMapKey::I32(_) => Some(TypeData::primitive("i32")),
        MultibindingMapKey::Enum(ref enum_type, _) => Some(enum_type.clone()),
        MultibindingMapKey::None => None,
    }
}

pub fn set_type(element: &TypeData) -> TypeData {
    let mut set_type = TypeData::global(SET_PATH).with_args(vec![element.clone()]);
    set_type.qualifier = element.qualifier.clone();
    set_type
}

pub fn map_type(key_type: &TypeData, value_type: &TypeData) -> TypeData {
    let mut map_type =
        TypeData::global(MAP_PATH).with_args(vec![key_type.clone(), value_type.clone()]);
    map_type.qualifier = value_type.qualifier.clone();
    map_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_set_wraps_the_element() {
        let target = multibinding_target(
            &TypeData::global("sample::Thing"),
            &MultibindingType::IntoSet,
            &MultibindingMapKey::None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            target.multibinding_key.readable(),
            "::std::collections::HashSet<::sample::Thing>"
        );
        assert!(!target.is_map);
    }

    #[test]
    fn elements_into_set_uses_the_declared_set() {
        let declared = set_type(&TypeData::global("sample::Thing"));
        let target = multibinding_target(
            &declared,
            &MultibindingType::ElementsIntoSet,
            &MultibindingMapKey::None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(target.multibinding_key, TypeKey::new(declared));
        assert_eq!(target.value_type, TypeData::global("sample::Thing"));
    }

    #[test]
    fn into_map_combines_key_and_value() {
        let target = multibinding_target(
            &TypeData::global("sample::Thing"),
            &MultibindingType::IntoMap,
            &MultibindingMapKey::String("a".to_owned()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            target.multibinding_key.readable(),
            "::std::collections::HashMap<::std::string::String,::sample::Thing>"
        );
        assert!(target.is_map);
    }

    #[test]
    fn into_map_without_key_is_rejected() {
        let result = multibinding_target(
            &TypeData::global("sample::Thing"),
            &MultibindingType::IntoMap,
            &MultibindingMapKey::None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn provider_map_sibling_wraps_values() {
        let key = provider_map_key(
            &TypeData::global("std::string::String"),
            &TypeData::global("sample::Thing"),
        );
        assert_eq!(
            key.readable(),
            "::std::collections::HashMap<::std::string::String,::ravel::Provider<::sample::Thing>>"
        );
    }

    #[test]
    fn contribution_element_keys_are_unique_per_declaration() {
        let return_type = TypeData::global("sample::Thing");
        let first = contribution_element_key(
            &return_type,
            &Declaration::new(TypeData::global("sample::Mod"), "provide_a"),
        );
        let second = contribution_element_key(
            &return_type,
            &Declaration::new(TypeData::global("sample::Mod"), "provide_b"),
        );
        assert_ne!(first, second);
    }
}
