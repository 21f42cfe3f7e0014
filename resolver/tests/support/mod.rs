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

#![allow(dead_code)]

use ravel_common::keys::TypeKey;
use ravel_common::manifest::{
    BindingContainer, DeclaredFunction, GraphManifest, GraphSpec, Parameter, ProviderFactory,
};
use ravel_common::type_data::TypeData;
use ravel_resolver::context::{
    ClassFactory, ClassFactoryFinder, MemberInjector, MembersInjectorFinder, NoopIcObserver,
};
use ravel_resolver::diagnostics::{Diagnostic, Diagnostics, Result};
use ravel_resolver::{
    resolve_graph, resolve_unit, GraphNodeCache, ResolverContext, ResolverOptions, SealedGraph,
};

pub fn t(path: &str) -> TypeData {
    TypeData::global(path)
}

pub fn key(path: &str) -> TypeKey {
    TypeKey::new(t(path))
}

pub fn string_type() -> TypeData {
    TypeData::global("std::string::String")
}

pub fn provider_of(inner: TypeData) -> TypeData {
    TypeData::global("ravel::Provider").with_args(vec![inner])
}

pub fn lazy_of(inner: TypeData) -> TypeData {
    TypeData::global("ravel::Lazy").with_args(vec![inner])
}

pub fn set_of(inner: TypeData) -> TypeData {
    TypeData::global("std::collections::HashSet").with_args(vec![inner])
}

pub fn map_of(key: TypeData, value: TypeData) -> TypeData {
    TypeData::global("std::collections::HashMap").with_args(vec![key, value])
}

pub fn graph(path: &str) -> GraphSpec {
    GraphSpec {
        type_data: t(path),
        ..Default::default()
    }
}

pub fn accessor(graph: &mut GraphSpec, name: &str, return_type: TypeData) {
    graph.declarations.push(DeclaredFunction {
        name: name.to_owned(),
        declaring_class: graph.type_data.clone(),
        return_type: Some(return_type),
        ..Default::default()
    });
}

pub fn injector(graph: &mut GraphSpec, name: &str, target: TypeData) {
    graph.declarations.push(DeclaredFunction {
        name: name.to_owned(),
        declaring_class: graph.type_data.clone(),
        return_type: None,
        parameters: vec![Parameter::new("target", target)],
        ..Default::default()
    });
}

pub fn binds(graph: &mut GraphSpec, name: &str, source: TypeData, target: TypeData) {
    graph.declarations.push(DeclaredFunction {
        name: name.to_owned(),
        declaring_class: graph.type_data.clone(),
        return_type: Some(target),
        parameters: vec![Parameter::new("source", source)],
        is_binds: true,
        ..Default::default()
    });
}

pub fn provides(
    container: &str,
    name: &str,
    return_type: TypeData,
    parameters: Vec<TypeData>,
) -> ProviderFactory {
    ProviderFactory {
        container: t(container),
        name: name.to_owned(),
        return_type,
        parameters: parameters
            .into_iter()
            .enumerate()
            .map(|(i, type_data)| Parameter::new(&format!("p{}", i), type_data))
            .collect(),
        ..Default::default()
    }
}

pub fn container(path: &str, provider_factories: Vec<ProviderFactory>) -> BindingContainer {
    BindingContainer {
        type_data: t(path),
        provider_factories,
        ..Default::default()
    }
}

pub fn install(graph: &mut GraphSpec, container_path: &str) {
    graph.annotation.binding_containers.push(t(container_path));
}

pub fn injectable(class: TypeData, parameters: Vec<TypeData>) -> ClassFactory {
    ClassFactory {
        class,
        parameters: parameters
            .into_iter()
            .enumerate()
            .map(|(i, type_data)| Parameter::new(&format!("p{}", i), type_data))
            .collect(),
        ..Default::default()
    }
}

pub fn renders(keys: &[TypeKey]) -> Vec<String> {
    keys.iter().map(|key| key.readable().to_owned()).collect()
}

#[derive(Default)]
pub struct FakeClassFactories {
    factories: Vec<ClassFactory>,
}

impl ClassFactoryFinder for FakeClassFactories {
    fn find_or_generate(&self, class: &TypeData, _may_be_missing: bool) -> Option<ClassFactory> {
        self.factories
            .iter()
            .find(|factory| factory.class.eq(class))
            .cloned()
    }
}

#[derive(Default)]
pub struct FakeMembersInjectors {
    chains: Vec<(TypeData, Vec<MemberInjector>)>,
}

impl MembersInjectorFinder for FakeMembersInjectors {
    fn find_or_generate_all_for(&self, class: &TypeData) -> Vec<MemberInjector> {
        self.chains
            .iter()
            .find(|(target, _)| target.eq(class))
            .map(|(_, chain)| chain.clone())
            .unwrap_or_default()
    }
}

/// One compilation unit under test: a manifest plus fake finders.
pub struct Fixture {
    pub manifest: GraphManifest,
    pub factories: FakeClassFactories,
    pub members: FakeMembersInjectors,
    pub diagnostics: Diagnostics,
    pub options: ResolverOptions,
}

impl Fixture {
    pub fn new(manifest: GraphManifest) -> Self {
        Fixture {
            manifest,
            factories: FakeClassFactories::default(),
            members: FakeMembersInjectors::default(),
            diagnostics: Diagnostics::new(),
            options: ResolverOptions::default(),
        }
    }

    pub fn with_factory(mut self, factory: ClassFactory) -> Self {
        self.factories.factories.push(factory);
        self
    }

    pub fn with_injector_chain(mut self, class: TypeData, chain: Vec<MemberInjector>) -> Self {
        self.members.chains.push((class, chain));
        self
    }

    pub fn resolve(&self, class: &TypeData) -> Result<SealedGraph> {
        let ic_observer = NoopIcObserver;
        let ctx = ResolverContext {
            specs: &self.manifest,
            contributions: &self.manifest,
            class_factories: &self.factories,
            members_injectors: &self.members,
            ic_observer: &ic_observer,
            diagnostics: &self.diagnostics,
            options: self.options,
        };
        let cache = GraphNodeCache::new();
        resolve_graph(&ctx, &cache, class, None)
    }

    /// Resolves every graph in the manifest, in declaration order.
    pub fn resolve_all(&self) -> Result<Vec<SealedGraph>> {
        let ic_observer = NoopIcObserver;
        let ctx = ResolverContext {
            specs: &self.manifest,
            contributions: &self.manifest,
            class_factories: &self.factories,
            members_injectors: &self.members,
            ic_observer: &ic_observer,
            diagnostics: &self.diagnostics,
            options: self.options,
        };
        let cache = GraphNodeCache::new();
        let graphs: Vec<TypeData> = self
            .manifest
            .graphs
            .iter()
            .map(|graph| graph.type_data.clone())
            .collect();
        resolve_unit(&ctx, &cache, &graphs)
    }

    pub fn reports(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }
}
