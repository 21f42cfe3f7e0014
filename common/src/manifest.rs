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

use serde::{Deserialize, Serialize};

use crate::type_data::TypeData;

/// Everything the frontend projects out of one compilation unit for the
/// resolver: graph classes, binding containers, and scope contributions.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct GraphManifest {
    pub graphs: Vec<GraphSpec>,
    pub binding_containers: Vec<BindingContainer>,
    pub contributed_classes: Vec<ContributedClass>,
    pub merged_units: Vec<String>,
}

impl GraphManifest {
    pub fn new() -> GraphManifest {
        Default::default()
    }

    pub fn merge_from(&mut self, other: &GraphManifest) {
        self.graphs.extend_from_slice(other.graphs.as_slice());
        self.binding_containers
            .extend_from_slice(other.binding_containers.as_slice());
        self.contributed_classes
            .extend_from_slice(other.contributed_classes.as_slice());
        self.merged_units
            .extend_from_slice(other.merged_units.as_slice());
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Eq, Hash)]
pub enum TypeRoot {
    UNSPECIFIED = 0,
    GLOBAL = 1,
    CRATE = 2,
    PRIMITIVE = 3,
}

impl Default for TypeRoot {
    fn default() -> Self {
        TypeRoot::UNSPECIFIED
    }
}

/// Anchor for a diagnostic: the class member a binding or request came from.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Default)]
pub struct Declaration {
    pub owner: TypeData,
    pub name: String,
}

impl Declaration {
    pub fn new(owner: TypeData, name: &str) -> Self {
        Declaration {
            owner,
            name: name.to_owned(),
        }
    }

    pub fn readable(&self) -> String {
        format!("{}.{}", self.owner.canonical_string_path_without_args(), self.name)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct Parameter {
    pub name: String,
    pub type_data: TypeData,
    pub has_default: bool,
    /// Assisted identifier when the parameter is caller-supplied through a
    /// generated factory.
    pub assisted: Option<String>,
}

impl Parameter {
    pub fn new(name: &str, type_data: TypeData) -> Self {
        Parameter {
            name: name.to_owned(),
            type_data,
            ..Default::default()
        }
    }
}

/// The declarative surface of one graph class.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct GraphSpec {
    pub type_data: TypeData,
    pub supertypes: Vec<TypeData>,
    pub annotation: GraphAnnotation,
    /// Abstract members in declaration order; the node builder classifies
    /// them as accessors, injectors, binds, or graph extensions.
    pub declarations: Vec<DeclaredFunction>,
    /// Provider functions declared on the graph class itself or its
    /// companion.
    pub provider_factories: Vec<ProviderFactory>,
    pub creator: Option<CreatorSpec>,
    /// Extended parent graph, when this class is a graph extension.
    pub parent: Option<TypeData>,
    pub contributes_extension: Option<ContributesGraphExtension>,
}

impl GraphSpec {
    pub fn new() -> Self {
        Default::default()
    }

    /// A generated extension is constructed through its primary constructor
    /// and resolves against its parent's bindings.
    pub fn is_generated_extension(&self) -> bool {
        self.annotation.is_extension && self.parent.is_some()
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct GraphAnnotation {
    pub is_extension: bool,
    pub scope: Option<TypeData>,
    pub additional_scopes: Vec<TypeData>,
    pub aggregation_scopes: Vec<TypeData>,
    pub is_extendable: bool,
    /// Binding containers installed directly on the graph annotation.
    pub binding_containers: Vec<TypeData>,
    pub excludes: Vec<TypeData>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct DeclaredFunction {
    pub name: String,
    pub declaring_class: TypeData,
    /// None for unit-returning members (injector shape).
    pub return_type: Option<TypeData>,
    pub parameters: Vec<Parameter>,
    pub is_binds: bool,
    pub is_multibinds: bool,
    pub allow_empty: bool,
    pub scope: Option<TypeData>,
    pub multibinding_type: MultibindingType,
    pub map_key: MultibindingMapKey,
    /// True when an ancestor supplies a default body; such members are not
    /// part of the graph surface.
    pub has_body_in_ancestor: bool,
}

impl DeclaredFunction {
    pub fn declaration(&self) -> Declaration {
        Declaration::new(self.declaring_class.clone(), &self.name)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub enum CreatorKind {
    PrimaryConstructor,
    FactoryMethod(String),
}

impl Default for CreatorKind {
    fn default() -> Self {
        CreatorKind::PrimaryConstructor
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct CreatorSpec {
    pub type_data: TypeData,
    pub kind: CreatorKind,
    pub parameters: Vec<CreatorParameter>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct CreatorParameter {
    pub name: String,
    pub type_data: TypeData,
    pub binds_instance: bool,
    pub includes: bool,
    /// Set when the declared raw type is a binding container; mirrors the
    /// creator bitfield of the graph annotation.
    pub is_binding_container: bool,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ProviderFactory {
    pub container: TypeData,
    pub name: String,
    pub return_type: TypeData,
    pub parameters: Vec<Parameter>,
    pub scope: Option<TypeData>,
    pub multibinding_type: MultibindingType,
    pub map_key: MultibindingMapKey,
}

impl ProviderFactory {
    pub fn declaration(&self) -> Declaration {
        Declaration::new(self.container.clone(), &self.name)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct BindsCallable {
    pub container: TypeData,
    pub name: String,
    /// The aliased source; a binds function without a receiver is malformed
    /// input from the frontend.
    pub receiver: Option<Parameter>,
    pub return_type: TypeData,
    pub scope: Option<TypeData>,
    pub multibinding_type: MultibindingType,
    pub map_key: MultibindingMapKey,
}

impl BindsCallable {
    pub fn declaration(&self) -> Declaration {
        Declaration::new(self.container.clone(), &self.name)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct MultibindsCallable {
    pub container: TypeData,
    pub name: String,
    pub return_type: TypeData,
    pub allow_empty: bool,
}

impl MultibindsCallable {
    pub fn declaration(&self) -> Declaration {
        Declaration::new(self.container.clone(), &self.name)
    }
}

/// A class aggregating provider/binds/multibinds declarations for graphs that
/// opt in.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct BindingContainer {
    pub type_data: TypeData,
    /// Aggregation scopes this container is contributed to.
    pub contributes_to: Vec<TypeData>,
    pub includes: Vec<TypeData>,
    pub provider_factories: Vec<ProviderFactory>,
    pub binds_callables: Vec<BindsCallable>,
    pub multibinds_callables: Vec<MultibindsCallable>,
    pub replaces: Vec<TypeData>,
}

impl BindingContainer {
    pub fn new() -> Self {
        Default::default()
    }
}

/// A class contributed to an aggregation scope; becomes a supertype of the
/// graphs that aggregate the scope.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ContributedClass {
    pub type_data: TypeData,
    pub scopes: Vec<TypeData>,
    /// The key the contribution binds, when it carries one; used by
    /// rank-based replacement.
    pub bound_type: Option<TypeData>,
    pub rank: i64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ContributesGraphExtension {
    pub scope: TypeData,
    pub additional_scopes: Vec<TypeData>,
    pub excludes: Vec<TypeData>,
    pub is_extendable: bool,
    pub binding_containers: Vec<TypeData>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub enum MultibindingType {
    None,
    IntoSet,
    ElementsIntoSet,
    IntoMap,
}

impl Default for MultibindingType {
    fn default() -> Self {
        MultibindingType::None
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Hash, Eq)]
pub enum MultibindingMapKey {
    None,
    String(String),
    I32(i32),
    Enum(TypeData, TypeData),
}

impl Default for MultibindingMapKey {
    fn default() -> Self {
        MultibindingMapKey::None
    }
}
