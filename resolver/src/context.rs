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

use ravel_common::keys::TypeKey;
use ravel_common::manifest::{
    BindingContainer, ContributedClass, Declaration, GraphManifest, GraphSpec, Parameter,
};
use ravel_common::metadata::ExternalGraphMetadata;
use ravel_common::type_data::TypeData;

use crate::diagnostics::Diagnostics;

/// Constructor-factory descriptor for an injectable class, produced by an
/// external finder and cached there, not here.
#[derive(Debug, Clone, Default)]
pub struct ClassFactory {
    pub class: TypeData,
    pub parameters: Vec<Parameter>,
    pub scope: Option<TypeData>,
    /// The class is a singleton object with no constructor parameters.
    pub is_object: bool,
    /// Set when `class` is the generated factory for an assisted-injected
    /// target.
    pub assisted_factory_for: Option<TypeData>,
    pub declaration: Option<Declaration>,
    pub supertypes: Vec<TypeData>,
}

pub trait ClassFactoryFinder {
    /// `None` is only acceptable when `may_be_missing` is set; that mode is
    /// used for speculative lookups of assisted targets.
    fn find_or_generate(&self, class: &TypeData, may_be_missing: bool) -> Option<ClassFactory>;
}

#[derive(Debug, Clone, Default)]
pub struct MemberInjector {
    pub class: TypeData,
    pub declaration: Option<Declaration>,
    pub parameters: Vec<Parameter>,
}

pub trait MembersInjectorFinder {
    /// Member injectors for `class` and all ancestors, in declaration order.
    fn find_or_generate_all_for(&self, class: &TypeData) -> Vec<MemberInjector>;
}

/// Opaque handle to a field the parent graph reserved for a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess {
    pub owner: TypeData,
    pub name: String,
}

/// The parent graph of an extension, as seen while resolving the child.
pub trait ParentContext {
    fn available_keys(&self) -> Vec<TypeKey>;

    /// Reserves a field on the parent for `key`. Mutating; the resolver calls
    /// it at most once per key and only when the key is consumed. `None`
    /// means the parent exposes the key through a getter instead.
    fn mark(&mut self, key: &TypeKey) -> Option<FieldAccess>;
}

/// Incremental-compilation fingerprinting hook. Called for every
/// provider class, binds target, included-graph getter, and accessor the
/// resolver consumes, reachable or not.
pub trait IcObserver {
    fn track_class_lookup(&self, source: &TypeData, class: &TypeData);
    fn track_function_call(&self, source: &TypeData, function: &Declaration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIcObserver;

impl IcObserver for NoopIcObserver {
    fn track_class_lookup(&self, _source: &TypeData, _class: &TypeData) {}
    fn track_function_call(&self, _source: &TypeData, _function: &Declaration) {}
}

/// Finder for units with no injectable classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassFactories;

impl ClassFactoryFinder for NoClassFactories {
    fn find_or_generate(&self, _class: &TypeData, _may_be_missing: bool) -> Option<ClassFactory> {
        None
    }
}

/// Finder for units with no member-injectable classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMembersInjectors;

impl MembersInjectorFinder for NoMembersInjectors {
    fn find_or_generate_all_for(&self, _class: &TypeData) -> Vec<MemberInjector> {
        Vec::new()
    }
}

/// Source of graph specs within the current unit, plus metadata for graphs
/// compiled elsewhere.
pub trait GraphSpecSource {
    fn spec_for(&self, class: &TypeData) -> Option<GraphSpec>;

    fn external_metadata(&self, class: &TypeData) -> Option<ExternalGraphMetadata> {
        let _ = class;
        None
    }

    /// The extension graph whose creator factory class is `class`.
    fn factory_owner(&self, class: &TypeData) -> Option<TypeData> {
        let _ = class;
        None
    }
}

/// Deterministic, idempotent lookup of scope contributions.
pub trait ContributionIndex {
    fn contributed_classes(&self, scope: &TypeData) -> Vec<ContributedClass>;
    fn contributed_containers(&self, scope: &TypeData) -> Vec<BindingContainer>;
    fn container_for(&self, class: &TypeData) -> Option<BindingContainer>;
}

impl GraphSpecSource for GraphManifest {
    fn spec_for(&self, class: &TypeData) -> Option<GraphSpec> {
        self.graphs
            .iter()
            .find(|graph| graph.type_data.eq(class))
            .cloned()
    }

    fn factory_owner(&self, class: &TypeData) -> Option<TypeData> {
        for graph in &self.graphs {
            if let Some(ref creator) = graph.creator {
                if creator.type_data.eq(class) && !graph.type_data.eq(class) {
                    return Some(graph.type_data.clone());
                }
            }
        }
        None
    }
}

impl ContributionIndex for GraphManifest {
    fn contributed_classes(&self, scope: &TypeData) -> Vec<ContributedClass> {
        self.contributed_classes
            .iter()
            .filter(|contribution| contribution.scopes.contains(scope))
            .cloned()
            .collect()
    }

    fn contributed_containers(&self, scope: &TypeData) -> Vec<BindingContainer> {
        self.binding_containers
            .iter()
            .filter(|container| container.contributes_to.contains(scope))
            .cloned()
            .collect()
    }

    fn container_for(&self, class: &TypeData) -> Option<BindingContainer> {
        self.binding_containers
            .iter()
            .find(|container| container.type_data.eq(class))
            .cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Drop unused bindings from the sealed result instead of only excluding
    /// them from the topological order.
    pub shrink_unused: bool,
    /// Enables rank-based contribution replacement during aggregation.
    pub rank_interop: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            shrink_unused: false,
            rank_interop: false,
        }
    }
}

/// Per-compilation-unit registries, passed explicitly to every top-level
/// operation. Never shared across units.
pub struct ResolverContext<'a> {
    pub specs: &'a dyn GraphSpecSource,
    pub contributions: &'a dyn ContributionIndex,
    pub class_factories: &'a dyn ClassFactoryFinder,
    pub members_injectors: &'a dyn MembersInjectorFinder,
    pub ic_observer: &'a dyn IcObserver,
    pub diagnostics: &'a Diagnostics,
    pub options: ResolverOptions,
}
