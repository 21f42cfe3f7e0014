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

use indexmap::IndexMap;
use std::rc::Rc;
use tracing::debug;

use ravel_common::keys::{ContextualTypeKey, TypeKey};
use ravel_common::manifest::{BindsCallable, Declaration, ProviderFactory};
use ravel_common::type_data::TypeData;

use crate::bindings::binding::{
    AliasBinding, Binding, BoundInstanceBinding, GraphDependencyAccess, GraphDependencyBinding,
    GraphExtensionBinding, MultibindingBinding, ProvidedBinding,
};
use crate::bindings::multibinding::{
    contribution_element_key, multibinding_target, provider_map_key, MultibindingTarget, MAP_PATH,
    SET_PATH,
};
use crate::context::ResolverContext;
use crate::diagnostics::{DiagnosticKind, Result};
use crate::graph::MutableBindingGraph;
use crate::lookup::BindingLookup;
use crate::node::DependencyGraphNode;

/// Facts about a seeded binding, captured before the precedence decision
/// mutates the graph.
struct ExistingBinding {
    name: String,
    inherited: bool,
    /// Only provider and alias bindings participate in level precedence.
    replaceable: bool,
}

impl ExistingBinding {
    fn of(binding: Option<&Binding>) -> Self {
        let binding = binding.expect("precedence conflict without an existing binding");
        ExistingBinding {
            name: binding.readable_name(),
            inherited: binding.inherited(),
            replaceable: matches!(binding, Binding::Provided(_) | Binding::Alias(_)),
        }
    }
}

/// Seeds a fresh mutable graph from a node. The step order is mandatory:
/// provider factories before binds callables, multibinds declarations before
/// accessors, included-graph accessors before lazy parent keys.
pub struct BindingGraphBuilder<'s, 'l, 'b>
where
    'l: 's,
{
    ctx: &'s ResolverContext<'b>,
    lookup: &'s BindingLookup<'l, 'b>,
    node: Rc<DependencyGraphNode>,
    pending_aliases: IndexMap<TypeKey, TypeKey>,
}

impl<'s, 'l, 'b> BindingGraphBuilder<'s, 'l, 'b>
where
    'l: 's,
{
    pub fn seed(
        ctx: &'s ResolverContext<'b>,
        lookup: &'s BindingLookup<'l, 'b>,
        node: Rc<DependencyGraphNode>,
    ) -> Result<MutableBindingGraph> {
        let mut builder = BindingGraphBuilder {
            ctx,
            lookup,
            node: node.clone(),
            pending_aliases: IndexMap::new(),
        };
        let mut graph = MutableBindingGraph::new(node);
        builder.seed_graph_instance(&mut graph);
        builder.collect_supertype_aliases();
        builder.seed_provider_factories(&mut graph)?;
        builder.seed_binds_callables(&mut graph)?;
        builder.seed_creator_parameters(&mut graph);
        builder.seed_managed_containers(&mut graph);
        builder.seed_multibinds_declarations(&mut graph)?;
        builder.commit_aliases(&mut graph);
        builder.seed_accessors(&mut graph)?;
        builder.seed_graph_extensions(&mut graph);
        builder.seed_included_graphs(&mut graph);
        builder.register_parent_keys(&mut graph)?;
        builder.seed_member_injectors(&mut graph);
        // Duplicate bindings accumulate per site; any of them rejects the
        // unit before sealing starts.
        ctx.diagnostics.bail_if_errors()?;
        debug!(
            graph = %builder.node.readable_name(),
            bindings = graph.bindings().len(),
            "graph seeded"
        );
        Ok(graph)
    }

    fn seed_graph_instance(&self, graph: &mut MutableBindingGraph) {
        let type_key = self.node.type_key.clone();
        graph.put_binding(Binding::BoundInstance(BoundInstanceBinding {
            contextual_type_key: ContextualTypeKey::direct(type_key.clone()),
            type_key,
            name_hint: format!("{}Provider", self.node.graph_name()),
            receiver: None,
            creator_parameter: None,
            declaration: None,
            dependencies: Vec::new(),
        }));
    }

    /// Supertypes of the concrete implementation alias to the graph itself.
    /// First entry wins throughout the pending map.
    fn collect_supertype_aliases(&mut self) {
        let graph_key = self.node.type_key.clone();
        for supertype in &self.node.supertypes {
            let alias_key = TypeKey::new(supertype.clone());
            if alias_key.eq(&graph_key) {
                continue;
            }
            self.pending_aliases
                .entry(alias_key)
                .or_insert(graph_key.clone());
        }
    }

    /// Inherited factories come from every transitively extended node;
    /// scoped providers stay with the graph that owns the scope.
    fn inherited_provider_factories(&self) -> Vec<ProviderFactory> {
        let mut inherited: Vec<ProviderFactory> = Vec::new();
        for ancestor in self.node.extended_graph_nodes.values() {
            for factory in &ancestor.provider_factories {
                if factory.scope.is_some() {
                    continue;
                }
                inherited.push(factory.clone());
            }
        }
        inherited.sort_by_key(|factory| (factory.container.class_id(), factory.name.clone()));
        inherited
    }

    fn inherited_binds_callables(&self) -> Vec<BindsCallable> {
        let mut inherited: Vec<BindsCallable> = Vec::new();
        for ancestor in self.node.extended_graph_nodes.values() {
            for callable in &ancestor.binds_callables {
                if callable.scope.is_some() {
                    continue;
                }
                inherited.push(callable.clone());
            }
        }
        inherited.sort_by_key(|callable| (callable.container.class_id(), callable.name.clone()));
        inherited
    }

    fn seed_provider_factories(&mut self, graph: &mut MutableBindingGraph) -> Result<()> {
        let mut factories: Vec<(ProviderFactory, bool)> = Vec::new();
        factories.extend(
            self.node
                .provider_factories
                .iter()
                .cloned()
                .map(|factory| (factory, false)),
        );
        factories.extend(
            self.inherited_provider_factories()
                .into_iter()
                .map(|factory| (factory, true)),
        );
        for (factory, inherited) in factories {
            let declaration = factory.declaration();
            self.ctx
                .ic_observer
                .track_class_lookup(&self.node.class, &factory.container);
            self.ctx
                .ic_observer
                .track_function_call(&self.node.class, &declaration);
            let target = match multibinding_target(
                &factory.return_type,
                &factory.multibinding_type,
                &factory.map_key,
            ) {
                Ok(target) => target,
                Err(message) => {
                    return self.ctx.diagnostics.compiler_bug(Some(&declaration), message)
                }
            };
            let binding_key = match target {
                Some(_) => contribution_element_key(&factory.return_type, &declaration),
                None => TypeKey::new(factory.return_type.clone()),
            };
            if graph.contains_key(&binding_key) && inherited {
                continue;
            }
            let dependencies = factory
                .parameters
                .iter()
                .map(|parameter| {
                    ContextualTypeKey::from_declared(&parameter.type_data)
                        .with_default(parameter.has_default)
                })
                .collect();
            let provided = ProvidedBinding {
                contextual_type_key: ContextualTypeKey::direct(binding_key.clone()),
                type_key: binding_key.clone(),
                dependencies,
                scope: factory.scope.clone(),
                declaration: Some(declaration.clone()),
                container: factory.container.clone(),
                function_name: factory.name.clone(),
                name_hint: format!(
                    "{}_{}",
                    factory
                        .container
                        .path
                        .rsplit("::")
                        .next()
                        .unwrap_or(factory.container.path.as_str()),
                    factory.name
                ),
                inherited,
                into_multibinding: target.is_some(),
            };
            if self.apply_provided_precedence(graph, provided)? {
                if let Some(target) = target {
                    self.add_multibinding_contribution(graph, &target, binding_key, &declaration)?;
                }
            }
        }
        Ok(())
    }

    /// The provider-vs-alias inheritance precedence of the seeding procedure:
    /// equal factories are ignored, the non-inherited side wins, and a
    /// same-level collision is a duplicate binding.
    fn apply_provided_precedence(
        &self,
        graph: &mut MutableBindingGraph,
        provided: ProvidedBinding,
    ) -> Result<bool> {
        let key = provided.type_key.clone();
        let declaration = provided.declaration.clone();
        let existing = match graph.get_static_binding(&key) {
            None => {
                graph.put_binding(Binding::Provided(provided));
                return Ok(true);
            }
            Some(Binding::Provided(existing)) => {
                if existing.same_factory(&provided) {
                    return Ok(false);
                }
                ExistingBinding::of(graph.get_static_binding(&key))
            }
            Some(_) => ExistingBinding::of(graph.get_static_binding(&key)),
        };
        self.resolve_conflict(graph, key, Binding::Provided(provided), existing, declaration)
    }

    fn apply_alias_precedence(
        &self,
        graph: &mut MutableBindingGraph,
        alias: AliasBinding,
    ) -> Result<bool> {
        let key = alias.type_key.clone();
        let declaration = alias.binds_callable.clone();
        if !graph.contains_key(&key) {
            graph.put_binding(Binding::Alias(alias));
            return Ok(true);
        }
        let existing = ExistingBinding::of(graph.get_static_binding(&key));
        self.resolve_conflict(graph, key, Binding::Alias(alias), existing, declaration)
    }

    fn resolve_conflict(
        &self,
        graph: &mut MutableBindingGraph,
        key: TypeKey,
        new_binding: Binding,
        existing: ExistingBinding,
        declaration: Option<Declaration>,
    ) -> Result<bool> {
        if !existing.replaceable {
            self.report_duplicate(&key, existing.name, &new_binding, declaration);
            return Ok(false);
        }
        match (existing.inherited, new_binding.inherited()) {
            (true, false) => {
                // Current wins: displace the inherited binding first.
                graph.remove_provided_binding(&key);
                graph.remove_alias_binding(&key);
                graph.put_binding(new_binding);
                Ok(true)
            }
            (false, true) => Ok(false),
            _ => {
                self.report_duplicate(&key, existing.name, &new_binding, declaration);
                Ok(false)
            }
        }
    }

    fn report_duplicate(
        &self,
        key: &TypeKey,
        existing_name: impl Into<String>,
        new_binding: &Binding,
        declaration: Option<Declaration>,
    ) {
        let existing_name = existing_name.into();
        self.ctx.diagnostics.report(
            declaration.as_ref(),
            DiagnosticKind::DuplicateBinding,
            format!(
                "found duplicated bindings for {}, provided by:\n\t{}\n\t{}",
                key.readable(),
                existing_name,
                new_binding.readable_name()
            ),
        );
    }

    fn seed_binds_callables(&mut self, graph: &mut MutableBindingGraph) -> Result<()> {
        let mut callables: Vec<(BindsCallable, bool)> = Vec::new();
        callables.extend(
            self.node
                .binds_callables
                .iter()
                .cloned()
                .map(|callable| (callable, false)),
        );
        callables.extend(
            self.inherited_binds_callables()
                .into_iter()
                .map(|callable| (callable, true)),
        );
        for (callable, inherited) in callables {
            let declaration = callable.declaration();
            let receiver = match callable.receiver {
                Some(ref receiver) => receiver.clone(),
                None => {
                    return self.ctx.diagnostics.compiler_bug(
                        Some(&declaration),
                        "binds function is missing its receiver parameter",
                    )
                }
            };
            self.ctx
                .ic_observer
                .track_function_call(&self.node.class, &declaration);
            self.ctx
                .ic_observer
                .track_class_lookup(&self.node.class, &receiver.type_data);
            let target = match multibinding_target(
                &callable.return_type,
                &callable.multibinding_type,
                &callable.map_key,
            ) {
                Ok(target) => target,
                Err(message) => {
                    return self.ctx.diagnostics.compiler_bug(Some(&declaration), message)
                }
            };
            let binding_key = match target {
                Some(_) => contribution_element_key(&callable.return_type, &declaration),
                None => TypeKey::new(callable.return_type.clone()),
            };
            if graph.contains_key(&binding_key) && inherited {
                continue;
            }
            let mut alias = AliasBinding::new(
                binding_key.clone(),
                ContextualTypeKey::from_declared(&receiver.type_data),
                Some(declaration.clone()),
                inherited,
            );
            alias.parameters = vec![receiver];
            alias.scope = callable.scope.clone();
            if self.apply_alias_precedence(graph, alias)? {
                if let Some(target) = target {
                    self.add_multibinding_contribution(graph, &target, binding_key, &declaration)?;
                }
            }
        }
        Ok(())
    }

    fn seed_creator_parameters(&mut self, graph: &mut MutableBindingGraph) {
        let creator = match self.node.creator {
            Some(ref creator) => creator.clone(),
            None => return,
        };
        for parameter in &creator.parameters {
            let parameter_key = TypeKey::new(parameter.type_data.clone());
            if parameter.binds_instance || parameter.is_binding_container {
                let declaration = Declaration::new(creator.type_data.clone(), &parameter.name);
                self.put_unique(
                    graph,
                    Binding::BoundInstance(BoundInstanceBinding {
                        contextual_type_key: ContextualTypeKey::direct(parameter_key.clone()),
                        type_key: parameter_key.clone(),
                        name_hint: parameter.name.clone(),
                        receiver: None,
                        creator_parameter: Some(parameter.name.clone()),
                        declaration: Some(declaration),
                        dependencies: Vec::new(),
                    }),
                );
            }
            if parameter.includes {
                // The source-graph form of a graph-like parameter aliases to
                // the parameter's key.
                if let Some(included) = self.node.included_graph_nodes.get(&parameter_key) {
                    for supertype in &included.supertypes {
                        let source_key = TypeKey::new(supertype.clone());
                        if source_key.eq(&parameter_key) {
                            continue;
                        }
                        self.pending_aliases
                            .entry(source_key)
                            .or_insert(parameter_key.clone());
                    }
                }
            }
        }
    }

    fn put_unique(&self, graph: &mut MutableBindingGraph, binding: Binding) {
        match graph.get_static_binding(binding.type_key()) {
            Some(existing) => {
                let existing_name = existing.readable_name();
                self.report_duplicate(
                    binding.type_key(),
                    existing_name,
                    &binding,
                    binding.declaration().cloned(),
                );
            }
            None => graph.put_binding(binding),
        }
    }

    fn seed_managed_containers(&mut self, graph: &mut MutableBindingGraph) {
        let mut containers: Vec<TypeData> = self
            .node
            .binding_containers
            .iter()
            .map(|container| container.type_data.clone())
            .collect();
        for ancestor in self.node.extended_graph_nodes.values() {
            for container in &ancestor.binding_containers {
                if !containers.contains(&container.type_data) {
                    containers.push(container.type_data.clone());
                }
            }
        }
        for container in containers {
            let container_key = TypeKey::new(container.clone());
            if !graph.contains_key(&container_key) {
                graph.put_binding(Binding::BoundInstance(BoundInstanceBinding {
                    contextual_type_key: ContextualTypeKey::direct(container_key.clone()),
                    type_key: container_key,
                    name_hint: container
                        .path
                        .rsplit("::")
                        .next()
                        .unwrap_or(container.path.as_str())
                        .to_owned(),
                    receiver: None,
                    creator_parameter: None,
                    declaration: None,
                    dependencies: Vec::new(),
                }));
            }
            graph.add_managed_container(container);
        }
    }

    fn seed_multibinds_declarations(&mut self, graph: &mut MutableBindingGraph) -> Result<()> {
        let mut callables = self.node.multibinds_callables.clone();
        for ancestor in self.node.extended_graph_nodes.values() {
            callables.extend(ancestor.multibinds_callables.iter().cloned());
        }
        for callable in callables {
            let declaration = callable.declaration();
            self.ensure_multibinding_for_type(
                graph,
                &callable.return_type,
                callable.allow_empty,
                &declaration,
            )?;
        }
        Ok(())
    }

    /// Creates or updates the multibinding declared by a `Set`/`Map` return
    /// type; map declarations also get their `Map<K, Provider<V>>` sibling.
    fn ensure_multibinding_for_type(
        &self,
        graph: &mut MutableBindingGraph,
        declared: &TypeData,
        allow_empty: bool,
        declaration: &Declaration,
    ) -> Result<()> {
        let canonical = declared.canonicalize();
        if canonical.path == SET_PATH && canonical.args.len() == 1 {
            let key = TypeKey::new(canonical.clone());
            self.create_or_update_multibinding(
                graph,
                key,
                false,
                None,
                None,
                Some(canonical.args[0].clone()),
                allow_empty,
                declaration,
                false,
            );
            return Ok(());
        }
        if canonical.path == MAP_PATH && canonical.args.len() == 2 {
            let key_type = canonical.args[0].clone();
            let value_type = canonical.args[1].clone();
            let key = TypeKey::new(canonical.clone());
            self.create_or_update_multibinding(
                graph,
                key,
                true,
                Some(key_type.clone()),
                Some(value_type.clone()),
                None,
                allow_empty,
                declaration,
                false,
            );
            let sibling = provider_map_key(&key_type, &value_type);
            self.create_or_update_multibinding(
                graph,
                sibling,
                true,
                Some(key_type),
                Some(value_type),
                None,
                allow_empty,
                declaration,
                true,
            );
            return Ok(());
        }
        self.ctx.diagnostics.compiler_bug(
            Some(declaration),
            format!(
                "multibinds declaration must return a set or a map, got {}",
                declared.readable()
            ),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create_or_update_multibinding(
        &self,
        graph: &mut MutableBindingGraph,
        key: TypeKey,
        is_map: bool,
        key_type: Option<TypeData>,
        value_type: Option<TypeData>,
        element_type: Option<TypeData>,
        allow_empty: bool,
        declaration: &Declaration,
        provider_values: bool,
    ) {
        if let Some(multibinding) = graph
            .get_static_binding_mut(&key)
            .and_then(Binding::as_multibinding_mut)
        {
            multibinding.allow_empty |= allow_empty;
            multibinding.declaration = Some(declaration.clone());
            return;
        }
        if graph.contains_key(&key) {
            let existing_name = graph
                .get_static_binding(&key)
                .map(Binding::readable_name)
                .unwrap_or_default();
            self.ctx.diagnostics.report(
                Some(declaration),
                DiagnosticKind::DuplicateBinding,
                format!(
                    "found duplicated bindings for {}, provided by:\n\t{}\n\tmultibinding declaration",
                    key.readable(),
                    existing_name
                ),
            );
            return;
        }
        graph.put_binding(Binding::Multibinding(MultibindingBinding {
            contextual_type_key: ContextualTypeKey::direct(key.clone()),
            type_key: key,
            is_map,
            is_set: !is_map,
            allow_empty,
            source_bindings: Default::default(),
            dependencies: Vec::new(),
            declaration: Some(declaration.clone()),
            provider_values,
            key_type,
            value_type,
            element_type,
        }));
    }

    fn add_multibinding_contribution(
        &self,
        graph: &mut MutableBindingGraph,
        target: &MultibindingTarget,
        element_key: TypeKey,
        declaration: &Declaration,
    ) -> Result<()> {
        self.create_or_update_multibinding(
            graph,
            target.multibinding_key.clone(),
            target.is_map,
            target.key_type.clone(),
            target.is_map.then(|| target.value_type.clone()),
            (!target.is_map).then(|| target.value_type.clone()),
            false,
            declaration,
            false,
        );
        match graph
            .get_static_binding_mut(&target.multibinding_key)
            .and_then(Binding::as_multibinding_mut)
        {
            Some(multibinding) => multibinding.add_source(element_key.clone()),
            None => {
                return self.ctx.diagnostics.compiler_bug(
                    Some(declaration),
                    format!(
                        "contribution target {} is not a multibinding",
                        target.multibinding_key.readable()
                    ),
                )
            }
        }
        if target.is_map {
            if let Some(ref key_type) = target.key_type {
                let sibling = provider_map_key(key_type, &target.value_type);
                self.create_or_update_multibinding(
                    graph,
                    sibling.clone(),
                    true,
                    target.key_type.clone(),
                    Some(target.value_type.clone()),
                    None,
                    false,
                    declaration,
                    true,
                );
                if let Some(multibinding) = graph
                    .get_static_binding_mut(&sibling)
                    .and_then(Binding::as_multibinding_mut)
                {
                    multibinding.add_source(element_key);
                }
            }
        }
        Ok(())
    }

    /// Parent graphs contribute aliases from their supertypes, then the
    /// pending alias map commits, first entry winning and never overwriting
    /// seeded bindings.
    fn commit_aliases(&mut self, graph: &mut MutableBindingGraph) {
        for ancestor in self.node.extended_graph_nodes.values() {
            for supertype in &ancestor.supertypes {
                let alias_key = TypeKey::new(supertype.clone());
                if alias_key.eq(&ancestor.type_key) {
                    continue;
                }
                self.pending_aliases
                    .entry(alias_key)
                    .or_insert(ancestor.type_key.clone());
            }
        }
        for (alias_key, target) in &self.pending_aliases {
            if graph.contains_key(alias_key) || alias_key.eq(target) {
                continue;
            }
            graph.put_binding(Binding::Alias(AliasBinding::new(
                alias_key.clone(),
                ContextualTypeKey::direct(target.clone()),
                None,
                false,
            )));
        }
    }

    fn seed_accessors(&mut self, graph: &mut MutableBindingGraph) -> Result<()> {
        let mut accessors = self.node.accessors.clone();
        for ancestor in self.node.extended_graph_nodes.values() {
            for accessor in &ancestor.accessors {
                if accessor.is_multibinds {
                    accessors.push(accessor.clone());
                }
            }
        }
        for accessor in accessors {
            self.ctx
                .ic_observer
                .track_function_call(&self.node.class, &accessor.function);
            if accessor.is_multibinds {
                self.ensure_multibinding_for_type(
                    graph,
                    accessor.key.type_key.type_data(),
                    accessor.allow_empty,
                    &accessor.function,
                )?;
            }
            graph.add_accessor(accessor.key.clone(), Some(accessor.function.clone()));
        }
        Ok(())
    }

    /// One extension binding per extension accessor. Extensions whose class
    /// is already a supertype of this graph resolve through the supertype
    /// alias instead.
    fn seed_graph_extensions(&mut self, graph: &mut MutableBindingGraph) {
        for (extension_key, accessors) in &self.node.graph_extensions {
            if self
                .node
                .supertypes
                .iter()
                .any(|supertype| TypeKey::new(supertype.clone()).eq(extension_key))
            {
                continue;
            }
            let scopes = self
                .ctx
                .specs
                .spec_for(extension_key.type_data())
                .map(|spec| {
                    let mut scopes: Vec<TypeData> =
                        spec.annotation.scope.iter().cloned().collect();
                    scopes.extend(spec.annotation.additional_scopes.iter().cloned());
                    scopes
                })
                .unwrap_or_default();
            for accessor in accessors {
                let binding_key = accessor.key.type_key.clone();
                if graph.contains_key(&binding_key) {
                    continue;
                }
                graph.put_binding(Binding::GraphExtension(GraphExtensionBinding {
                    contextual_type_key: ContextualTypeKey::direct(binding_key.clone()),
                    type_key: binding_key.clone(),
                    accessor: accessor.function.clone(),
                    scopes: scopes.clone(),
                    dependencies: vec![ContextualTypeKey::direct(self.node.type_key.clone())],
                }));
                if !accessor.is_factory {
                    // Non-factory extension accessors are not requestable
                    // roots; keep their bindings alive explicitly.
                    graph.add_keep(binding_key);
                }
            }
        }
    }

    fn seed_included_graphs(&mut self, graph: &mut MutableBindingGraph) {
        let creator = self.node.creator.clone();
        for (included_key, included) in &self.node.included_graph_nodes {
            if !graph.contains_key(included_key) {
                let creator_parameter = creator.as_ref().and_then(|creator| {
                    creator
                        .parameters
                        .iter()
                        .find(|parameter| {
                            TypeKey::new(parameter.type_data.clone()).eq(included_key)
                        })
                        .map(|parameter| parameter.name.clone())
                });
                graph.put_binding(Binding::BoundInstance(BoundInstanceBinding {
                    contextual_type_key: ContextualTypeKey::direct(included_key.clone()),
                    type_key: included_key.clone(),
                    name_hint: format!("{}Provider", included.graph_name()),
                    receiver: None,
                    creator_parameter,
                    declaration: None,
                    dependencies: Vec::new(),
                }));
            }
            for accessor in &included.accessors {
                if graph.contains_key(&accessor.key.type_key) {
                    continue;
                }
                self.ctx
                    .ic_observer
                    .track_function_call(&self.node.class, &accessor.function);
                graph.put_binding(Binding::GraphDependency(GraphDependencyBinding {
                    contextual_type_key: ContextualTypeKey::direct(accessor.key.type_key.clone()),
                    type_key: accessor.key.type_key.clone(),
                    owner_key: included_key.clone(),
                    // Invocation points at the original declaration, not a
                    // generated implementation class.
                    access: GraphDependencyAccess::Getter(accessor.function.clone()),
                    dependencies: vec![ContextualTypeKey::direct(included_key.clone())],
                }));
            }
        }
    }

    /// Parent keys materialize to graph dependencies only on use; the child
    /// seeds only the registry.
    fn register_parent_keys(&mut self, graph: &mut MutableBindingGraph) -> Result<()> {
        if !self.node.is_generated_extension {
            return Ok(());
        }
        if !self.lookup.has_parent_context() {
            return self
                .ctx
                .diagnostics
                .compiler_bug(None, "generated extension resolved without a parent context");
        }
        let (parent_key, parent_name) = match self.node.extended_graph_nodes.values().next() {
            Some(parent) => (parent.type_key.clone(), parent.graph_name()),
            None => {
                return self
                    .ctx
                    .diagnostics
                    .compiler_bug(None, "generated extension has no extended parent node")
            }
        };
        // The extension's constructor receives the parent instance.
        if !graph.contains_key(&parent_key) {
            graph.put_binding(Binding::BoundInstance(BoundInstanceBinding {
                contextual_type_key: ContextualTypeKey::direct(parent_key.clone()),
                type_key: parent_key.clone(),
                name_hint: format!("{}Provider", parent_name),
                receiver: None,
                creator_parameter: Some("parent".to_owned()),
                declaration: None,
                dependencies: Vec::new(),
            }));
        }
        for key in self.lookup.parent_available_keys() {
            if graph.contains_key(&key) {
                continue;
            }
            self.lookup.register_parent_key(key, parent_key.clone());
        }
        Ok(())
    }

    fn seed_member_injectors(&mut self, graph: &mut MutableBindingGraph) {
        for injector in &self.node.injectors {
            self.ctx
                .ic_observer
                .track_function_call(&self.node.class, &injector.function);
            if !graph.contains_key(&injector.key.type_key) {
                let mut binding = self.lookup.members_injected_binding(&injector.target);
                binding.declaration = Some(injector.function.clone());
                graph.put_binding(Binding::MembersInjected(binding));
            }
            graph.add_injector(injector.key.clone(), Some(injector.function.clone()));
        }
    }
}
