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
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use ravel_common::keys::{members_injector_key, ContextualTypeKey, TypeKey};
use ravel_common::manifest::{
    BindingContainer, BindsCallable, CreatorSpec, Declaration, GraphSpec, MultibindsCallable,
    Parameter, ProviderFactory,
};
use ravel_common::type_data::{ClassId, TypeData};

use crate::aggregation::ContributedGraphGenerator;
use crate::context::ResolverContext;
use crate::diagnostics::{DiagnosticKind, Result};

#[derive(Debug, Clone)]
pub struct GraphAccessor {
    pub function: Declaration,
    pub key: ContextualTypeKey,
    pub is_multibinds: bool,
    pub allow_empty: bool,
}

#[derive(Debug, Clone)]
pub struct GraphInjector {
    pub function: Declaration,
    /// The `MembersInjector<T>` form of the injected type.
    pub key: ContextualTypeKey,
    pub target: TypeData,
    pub parameter: Parameter,
}

#[derive(Debug, Clone)]
pub struct GraphExtensionAccessor {
    pub function: Declaration,
    pub key: ContextualTypeKey,
    pub extension: TypeData,
    pub is_factory: bool,
    pub is_factory_sam: bool,
}

/// The memoized declarative surface of one graph class.
#[derive(Debug)]
pub struct DependencyGraphNode {
    pub class: TypeData,
    pub type_key: TypeKey,
    pub supertypes: Vec<TypeData>,
    pub scopes: Vec<TypeData>,
    pub aggregation_scopes: Vec<TypeData>,
    pub accessors: Vec<GraphAccessor>,
    pub injectors: Vec<GraphInjector>,
    /// Binds functions declared on the graph class itself.
    pub binds_functions: Vec<Declaration>,
    pub binds_callables: Vec<BindsCallable>,
    pub multibinds_callables: Vec<MultibindsCallable>,
    pub provider_factories: Vec<ProviderFactory>,
    /// Managed containers whose instances the graph owns.
    pub binding_containers: Vec<BindingContainer>,
    pub included_graph_nodes: IndexMap<TypeKey, Rc<DependencyGraphNode>>,
    /// Every transitively extended ancestor, nearest first.
    pub extended_graph_nodes: IndexMap<TypeKey, Rc<DependencyGraphNode>>,
    pub graph_extensions: IndexMap<TypeKey, Vec<GraphExtensionAccessor>>,
    pub creator: Option<CreatorSpec>,
    pub is_extendable: bool,
    pub is_generated_extension: bool,
    pub is_external: bool,
}

impl DependencyGraphNode {
    pub fn graph_name(&self) -> String {
        self.class
            .path
            .rsplit("::")
            .next()
            .unwrap_or(self.class.path.as_str())
            .to_owned()
    }

    pub fn readable_name(&self) -> String {
        self.class.canonical_string_path()
    }

    fn external(class: &TypeData) -> DependencyGraphNode {
        DependencyGraphNode {
            class: class.clone(),
            type_key: TypeKey::new(class.clone()),
            supertypes: Vec::new(),
            scopes: Vec::new(),
            aggregation_scopes: Vec::new(),
            accessors: Vec::new(),
            injectors: Vec::new(),
            binds_functions: Vec::new(),
            binds_callables: Vec::new(),
            multibinds_callables: Vec::new(),
            provider_factories: Vec::new(),
            binding_containers: Vec::new(),
            included_graph_nodes: IndexMap::new(),
            extended_graph_nodes: IndexMap::new(),
            graph_extensions: IndexMap::new(),
            creator: None,
            is_extendable: false,
            is_generated_extension: false,
            is_external: true,
        }
    }
}

/// Memoizes `ClassId -> node` for one compilation unit. Re-entrancy is only
/// legal through the self-cycle guard.
#[derive(Default)]
pub struct GraphNodeCache {
    nodes: RefCell<IndexMap<ClassId, Rc<DependencyGraphNode>>>,
    building: RefCell<Vec<ClassId>>,
}

impl GraphNodeCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn node_for(
        &self,
        class: &TypeData,
        ctx: &ResolverContext,
    ) -> Result<Rc<DependencyGraphNode>> {
        let id = class.class_id();
        if let Some(node) = self.nodes.borrow().get(&id) {
            return Ok(node.clone());
        }
        if self.building.borrow().contains(&id) {
            return ctx.diagnostics.fatal(
                None,
                DiagnosticKind::GraphSelfCycle,
                format!(
                    "graph {} reaches itself through its own creator",
                    class.readable()
                ),
            );
        }
        self.building.borrow_mut().push(id.clone());
        let built = self.build_node(class, ctx);
        self.building.borrow_mut().pop();
        let node = Rc::new(built?);
        debug!(graph = %node.readable_name(), external = node.is_external, "graph node built");
        self.nodes.borrow_mut().insert(id, node.clone());
        Ok(node)
    }

    fn build_node(&self, class: &TypeData, ctx: &ResolverContext) -> Result<DependencyGraphNode> {
        let spec = match ctx.specs.spec_for(class) {
            Some(spec) => spec,
            None => {
                // Not compiled in this unit: only the metadata surface is
                // visible.
                let mut node = DependencyGraphNode::external(class);
                if let Some(metadata) = ctx.specs.external_metadata(class) {
                    for accessor in &metadata.accessors {
                        node.accessors.push(GraphAccessor {
                            function: Declaration::new(class.clone(), &accessor.name),
                            key: ContextualTypeKey::from_declared(&accessor.return_type),
                            is_multibinds: false,
                            allow_empty: false,
                        });
                    }
                    node.provider_factories = metadata.provider_factories.clone();
                }
                return Ok(node);
            }
        };
        NodeBuilder { ctx, cache: self }.build(spec)
    }
}

struct NodeBuilder<'a, 'b> {
    ctx: &'a ResolverContext<'b>,
    cache: &'a GraphNodeCache,
}

impl<'a, 'b> NodeBuilder<'a, 'b> {
    fn build(&self, spec: GraphSpec) -> Result<DependencyGraphNode> {
        let class = spec.type_data.clone();
        let mut node = DependencyGraphNode::external(&class);
        node.is_external = false;
        node.supertypes = spec.supertypes.clone();
        node.aggregation_scopes = spec.annotation.aggregation_scopes.clone();
        node.creator = spec.creator.clone();
        node.is_generated_extension = spec.is_generated_extension();
        node.provider_factories = spec.provider_factories.clone();

        self.collect_scopes(&spec, &mut node);
        self.aggregate_contributions(&spec, &mut node)?;
        self.collect_containers(&spec, &mut node)?;
        self.classify_declarations(&spec, &mut node)?;
        self.resolve_included(&mut node)?;
        self.resolve_extended(&spec, &mut node)?;
        self.check_ancestor_scopes(&node)?;

        node.is_extendable = !node.graph_extensions.is_empty()
            || spec.annotation.is_extendable
            || spec
                .contributes_extension
                .as_ref()
                .map(|contributes| contributes.is_extendable)
                .unwrap_or(false);
        Ok(node)
    }

    /// Declared scopes: the graph annotation plus scope annotations on every
    /// supertype that is itself spec'd.
    fn collect_scopes(&self, spec: &GraphSpec, node: &mut DependencyGraphNode) {
        let mut scopes: Vec<TypeData> = Vec::new();
        let push = |scope: &TypeData, scopes: &mut Vec<TypeData>| {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        };
        if let Some(ref scope) = spec.annotation.scope {
            push(scope, &mut scopes);
        }
        for scope in &spec.annotation.additional_scopes {
            push(scope, &mut scopes);
        }
        for supertype in &spec.supertypes {
            if let Some(super_spec) = self.ctx.specs.spec_for(supertype) {
                if let Some(ref scope) = super_spec.annotation.scope {
                    push(scope, &mut scopes);
                }
                for scope in &super_spec.annotation.additional_scopes {
                    push(scope, &mut scopes);
                }
            }
        }
        node.scopes = scopes;
    }

    fn aggregate_contributions(
        &self,
        spec: &GraphSpec,
        node: &mut DependencyGraphNode,
    ) -> Result<()> {
        let generator = ContributedGraphGenerator::new(self.ctx);
        if let Some(ref contributes) = spec.contributes_extension {
            let mut scopes = vec![contributes.scope.clone()];
            scopes.extend(contributes.additional_scopes.iter().cloned());
            let aggregated = generator.aggregate(
                &scopes,
                &contributes.excludes,
                self.ctx.options.rank_interop,
            )?;
            for contribution in &aggregated.classes {
                if !node.supertypes.contains(&contribution.type_data) {
                    node.supertypes.push(contribution.type_data.clone());
                }
            }
            for container in aggregated.containers {
                node.binding_containers.push(container);
            }
            for extra in &contributes.binding_containers {
                self.push_container(extra, node)?;
            }
        }
        if !spec.annotation.aggregation_scopes.is_empty() {
            let aggregated = generator.aggregate(
                &spec.annotation.aggregation_scopes,
                &spec.annotation.excludes,
                self.ctx.options.rank_interop,
            )?;
            for contribution in &aggregated.classes {
                if !node.supertypes.contains(&contribution.type_data) {
                    node.supertypes.push(contribution.type_data.clone());
                }
            }
            for container in aggregated.containers {
                node.binding_containers.push(container);
            }
        }
        Ok(())
    }

    fn push_container(&self, class: &TypeData, node: &mut DependencyGraphNode) -> Result<()> {
        match self.ctx.contributions.container_for(class) {
            Some(container) => {
                if !node
                    .binding_containers
                    .iter()
                    .any(|existing| existing.type_data.eq(&container.type_data))
                {
                    node.binding_containers.push(container);
                }
                Ok(())
            }
            None => self.ctx.diagnostics.compiler_bug(
                None,
                format!("unknown binding container {}", class.readable()),
            ),
        }
    }

    fn collect_containers(&self, spec: &GraphSpec, node: &mut DependencyGraphNode) -> Result<()> {
        for class in &spec.annotation.binding_containers {
            self.push_container(class, node)?;
        }
        if let Some(ref creator) = spec.creator {
            for parameter in &creator.parameters {
                if parameter.is_binding_container {
                    self.push_container(&parameter.type_data, node)?;
                }
            }
        }
        let generator = ContributedGraphGenerator::new(self.ctx);
        node.binding_containers =
            generator.resolve_transitive_includes(&node.binding_containers)?;
        let containers = node.binding_containers.clone();
        for container in &containers {
            node.provider_factories
                .extend(container.provider_factories.iter().cloned());
            node.binds_callables
                .extend(container.binds_callables.iter().cloned());
            node.multibinds_callables
                .extend(container.multibinds_callables.iter().cloned());
        }
        Ok(())
    }

    fn classify_declarations(&self, spec: &GraphSpec, node: &mut DependencyGraphNode) -> Result<()> {
        for declared in &spec.declarations {
            if declared.has_body_in_ancestor {
                continue;
            }
            let declaration = declared.declaration();
            let return_type = match declared.return_type {
                Some(ref return_type) => return_type,
                None => {
                    // Unit return with a single regular parameter is the
                    // injector shape.
                    if declared.parameters.len() == 1 && !declared.is_binds {
                        let parameter = declared.parameters[0].clone();
                        let key = ContextualTypeKey::direct(members_injector_key(
                            &parameter.type_data,
                        ));
                        node.injectors.push(GraphInjector {
                            function: declaration,
                            key,
                            target: parameter.type_data.clone(),
                            parameter,
                        });
                        continue;
                    }
                    return self.ctx.diagnostics.compiler_bug(
                        Some(&declaration),
                        "unrecognized abstract member shape on graph",
                    );
                }
            };
            if let Some(extension_spec) = self.ctx.specs.spec_for(return_type) {
                if extension_spec.annotation.is_extension
                    && !extension_spec.type_data.eq(&spec.type_data)
                {
                    let key = TypeKey::new(return_type.clone());
                    node.graph_extensions
                        .entry(key.clone())
                        .or_default()
                        .push(GraphExtensionAccessor {
                            function: declaration,
                            key: ContextualTypeKey::direct(key),
                            extension: return_type.clone(),
                            is_factory: false,
                            is_factory_sam: false,
                        });
                    continue;
                }
            }
            if let Some(owner) = self.ctx.specs.factory_owner(return_type) {
                if !owner.eq(&spec.type_data) {
                    let owner_key = TypeKey::new(owner.clone());
                    let key = ContextualTypeKey::from_declared(return_type);
                    node.graph_extensions
                        .entry(owner_key)
                        .or_default()
                        .push(GraphExtensionAccessor {
                            function: declaration.clone(),
                            key: key.clone(),
                            extension: owner,
                            is_factory: true,
                            is_factory_sam: true,
                        });
                    // Factory SAM accessors stay requestable like any other
                    // accessor.
                    node.accessors.push(GraphAccessor {
                        function: declaration,
                        key,
                        is_multibinds: false,
                        allow_empty: false,
                    });
                    continue;
                }
            }
            if declared.is_binds {
                node.binds_functions.push(declaration.clone());
                node.binds_callables.push(BindsCallable {
                    container: declared.declaring_class.clone(),
                    name: declared.name.clone(),
                    receiver: declared.parameters.first().cloned(),
                    return_type: return_type.clone(),
                    scope: declared.scope.clone(),
                    multibinding_type: declared.multibinding_type.clone(),
                    map_key: declared.map_key.clone(),
                });
                continue;
            }
            node.accessors.push(GraphAccessor {
                function: declaration,
                key: ContextualTypeKey::from_declared(return_type),
                is_multibinds: declared.is_multibinds,
                allow_empty: declared.allow_empty,
            });
        }
        Ok(())
    }

    fn resolve_included(&self, node: &mut DependencyGraphNode) -> Result<()> {
        let creator = match node.creator {
            Some(ref creator) => creator.clone(),
            None => return Ok(()),
        };
        for parameter in &creator.parameters {
            if !parameter.includes {
                continue;
            }
            let included = self.cache.node_for(&parameter.type_data, self.ctx)?;
            node.included_graph_nodes
                .insert(TypeKey::new(parameter.type_data.clone()), included);
        }
        Ok(())
    }

    fn resolve_extended(&self, spec: &GraphSpec, node: &mut DependencyGraphNode) -> Result<()> {
        let parent = match spec.parent {
            Some(ref parent) => parent,
            None => return Ok(()),
        };
        let parent_node = self.cache.node_for(parent, self.ctx)?;
        if spec.annotation.is_extension && !parent_node.is_extendable {
            return self.ctx.diagnostics.fatal(
                None,
                DiagnosticKind::NonExtendableParent,
                format!(
                    "{} extends {}, which is not extendable",
                    node.readable_name(),
                    parent_node.readable_name()
                ),
            );
        }
        let ancestors: Vec<Rc<DependencyGraphNode>> = parent_node
            .extended_graph_nodes
            .values()
            .cloned()
            .collect();
        node.extended_graph_nodes
            .insert(parent_node.type_key.clone(), parent_node);
        for ancestor in ancestors {
            node.extended_graph_nodes
                .insert(ancestor.type_key.clone(), ancestor);
        }
        Ok(())
    }

    /// No two ancestors may declare the same scope, and this node's scopes
    /// must not overlap any ancestor's.
    fn check_ancestor_scopes(&self, node: &DependencyGraphNode) -> Result<()> {
        let ancestors: Vec<&Rc<DependencyGraphNode>> =
            node.extended_graph_nodes.values().collect();
        for (i, first) in ancestors.iter().enumerate() {
            for second in ancestors.iter().skip(i + 1) {
                if let Some(scope) = first.scopes.iter().find(|scope| second.scopes.contains(scope))
                {
                    return self.ctx.diagnostics.fatal(
                        None,
                        DiagnosticKind::OverlappingAncestorScope,
                        format!(
                            "ancestors {} and {} of {} both declare scope {}",
                            first.readable_name(),
                            second.readable_name(),
                            node.readable_name(),
                            scope.readable()
                        ),
                    );
                }
            }
        }
        for ancestor in ancestors {
            if let Some(scope) = node
                .scopes
                .iter()
                .find(|scope| ancestor.scopes.contains(scope))
            {
                return self.ctx.diagnostics.fatal(
                    None,
                    DiagnosticKind::OverlappingAncestorScope,
                    format!(
                        "{} declares scope {} already declared by ancestor {}",
                        node.readable_name(),
                        scope.readable(),
                        ancestor.readable_name()
                    ),
                );
            }
        }
        Ok(())
    }
}
