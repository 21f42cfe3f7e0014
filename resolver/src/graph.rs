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

use indexmap::{IndexMap, IndexSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

use ravel_common::keys::{ContextualTypeKey, TypeKey, WrappingKind};
use ravel_common::manifest::Declaration;
use ravel_common::type_data::TypeData;

use crate::bindings::binding::{AbsentBinding, Binding};
use crate::context::{FieldAccess, ParentContext, ResolverContext};
use crate::diagnostics::{DiagnosticKind, FatalError, Result};
use crate::lookup::BindingLookup;
use crate::node::DependencyGraphNode;
use crate::stack::{BindingStack, EntryKind, StackEntry};

/// A request rooted at the graph surface: an accessor, injector, or keep.
#[derive(Debug, Clone)]
pub struct RootEntry {
    pub context_key: ContextualTypeKey,
    pub declaration: Option<Declaration>,
    pub kind: EntryKind,
}

/// The deterministic outcome of sealing a graph.
#[derive(Debug, Clone)]
pub struct BindingGraphResult {
    /// Topological order over the reachable keys, dependencies first;
    /// ties broken by render.
    pub sorted_keys: Vec<TypeKey>,
    /// Keys whose requests get provider-deferred to break cycles.
    pub deferred_types: Vec<TypeKey>,
    pub reachable_keys: IndexSet<TypeKey>,
}

/// Frozen per-graph output consumed by the downstream code generator.
#[derive(Debug, Clone)]
pub struct SealedGraph {
    pub graph_key: TypeKey,
    pub result: BindingGraphResult,
    pub bindings: IndexMap<TypeKey, Binding>,
    pub extra_keeps: Vec<TypeKey>,
    pub reserved_fields: IndexMap<TypeKey, FieldAccess>,
    pub managed_binding_containers: Vec<TypeData>,
    /// Seeded but unreachable keys; surfaced for host-side lints only.
    pub unused_keys: Vec<TypeKey>,
}

/// The resolver proper. Lifecycle: build -> seal -> frozen; after seal the
/// bindings and derived result are read-only.
pub struct MutableBindingGraph {
    pub node: Rc<DependencyGraphNode>,
    bindings: IndexMap<TypeKey, Binding>,
    /// Bindings displaced by the seeding precedence rule; they stay in the
    /// similar-binding pool.
    replaced: Vec<Binding>,
    accessors: IndexMap<ContextualTypeKey, RootEntry>,
    injectors: IndexMap<ContextualTypeKey, RootEntry>,
    extra_keeps: Vec<TypeKey>,
    managed_binding_containers: Vec<TypeData>,
    sealed: Option<SealedGraph>,
}

impl MutableBindingGraph {
    pub fn new(node: Rc<DependencyGraphNode>) -> Self {
        MutableBindingGraph {
            node,
            bindings: IndexMap::new(),
            replaced: Vec::new(),
            accessors: IndexMap::new(),
            injectors: IndexMap::new(),
            extra_keeps: Vec::new(),
            managed_binding_containers: Vec::new(),
            sealed: None,
        }
    }

    pub fn bindings(&self) -> &IndexMap<TypeKey, Binding> {
        &self.bindings
    }

    pub fn contains_key(&self, key: &TypeKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn get_static_binding(&self, key: &TypeKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn get_static_binding_mut(&mut self, key: &TypeKey) -> Option<&mut Binding> {
        self.bindings.get_mut(key)
    }

    /// Inserts, displacing any existing binding of the same key.
    pub fn put_binding(&mut self, binding: Binding) {
        let key = binding.type_key().clone();
        if let Some(old) = self.bindings.insert(key, binding) {
            self.replaced.push(old);
        }
    }

    pub fn remove_provided_binding(&mut self, key: &TypeKey) {
        if matches!(self.bindings.get(key), Some(Binding::Provided(_))) {
            if let Some(old) = self.bindings.shift_remove(key) {
                self.replaced.push(old);
            }
        }
    }

    pub fn remove_alias_binding(&mut self, key: &TypeKey) {
        if matches!(self.bindings.get(key), Some(Binding::Alias(_))) {
            if let Some(old) = self.bindings.shift_remove(key) {
                self.replaced.push(old);
            }
        }
    }

    pub fn add_accessor(&mut self, context_key: ContextualTypeKey, declaration: Option<Declaration>) {
        self.accessors.entry(context_key.clone()).or_insert(RootEntry {
            context_key,
            declaration,
            kind: EntryKind::RequestedAt,
        });
    }

    pub fn add_injector(&mut self, context_key: ContextualTypeKey, declaration: Option<Declaration>) {
        self.injectors.entry(context_key.clone()).or_insert(RootEntry {
            context_key,
            declaration,
            kind: EntryKind::InjectedAt,
        });
    }

    pub fn add_keep(&mut self, key: TypeKey) {
        if !self.extra_keeps.contains(&key) {
            self.extra_keeps.push(key);
        }
    }

    pub fn add_managed_container(&mut self, container: TypeData) {
        if !self.managed_binding_containers.contains(&container) {
            self.managed_binding_containers.push(container);
        }
    }

    fn roots(&self) -> Vec<RootEntry> {
        let mut roots: Vec<RootEntry> = Vec::new();
        roots.extend(self.accessors.values().cloned());
        roots.extend(self.injectors.values().cloned());
        for keep in &self.extra_keeps {
            let kind = match self.bindings.get(keep) {
                Some(Binding::GraphExtension(_)) => EntryKind::GeneratedExtensionAt,
                _ => EntryKind::SimpleTypeRef,
            };
            roots.push(RootEntry {
                context_key: ContextualTypeKey::direct(keep.clone()),
                declaration: None,
                kind,
            });
        }
        roots
    }

    /// Transitive resolution from the roots, cycle breaking, validation, and
    /// the deterministic topological order. Re-sealing a frozen graph yields
    /// the identical result.
    pub fn seal(
        &mut self,
        ctx: &ResolverContext,
        lookup: &BindingLookup,
    ) -> Result<SealedGraph> {
        if let Some(ref sealed) = self.sealed {
            return Ok(sealed.clone());
        }
        let roots = self.roots();
        self.populate(ctx, lookup, &roots)?;

        let (graph, indices) = self.adjacency(ctx)?;
        let reachable = self.reachability(&graph, &indices, &roots);
        self.check_provider_of_lazy(ctx, &graph, &roots, &reachable)?;
        let (sorted_keys, deferred_types) =
            self.toposort(ctx, &graph, &indices, &reachable)?;
        self.validate(ctx, &graph, &indices, &roots, &reachable)?;

        let unused_keys: Vec<TypeKey> = self
            .bindings
            .keys()
            .filter(|key| !reachable.contains(*key))
            .cloned()
            .collect();
        let bindings = if ctx.options.shrink_unused {
            self.bindings
                .iter()
                .filter(|(key, _)| reachable.contains(*key))
                .map(|(key, binding)| (key.clone(), binding.clone()))
                .collect()
        } else {
            self.bindings.clone()
        };
        debug!(
            graph = %self.node.readable_name(),
            bindings = bindings.len(),
            reachable = reachable.len(),
            deferred = deferred_types.len(),
            "graph sealed"
        );
        let sealed = SealedGraph {
            graph_key: self.node.type_key.clone(),
            result: BindingGraphResult {
                sorted_keys,
                deferred_types,
                reachable_keys: reachable,
            },
            bindings,
            extra_keeps: self.extra_keeps.clone(),
            reserved_fields: lookup.reserved_fields(),
            managed_binding_containers: self.managed_binding_containers.clone(),
            unused_keys,
        };
        self.sealed = Some(sealed.clone());
        Ok(sealed)
    }

    fn populate(
        &mut self,
        ctx: &ResolverContext,
        lookup: &BindingLookup,
        roots: &[RootEntry],
    ) -> Result<()> {
        let mut stack = BindingStack::new(&self.node.readable_name());
        let mut resolved: IndexSet<TypeKey> = IndexSet::new();
        for root in roots {
            self.populate_request(
                ctx,
                lookup,
                &mut stack,
                &mut resolved,
                &root.context_key,
                root.declaration.clone(),
                root.kind,
            )?;
        }
        Ok(())
    }

    fn populate_request(
        &mut self,
        ctx: &ResolverContext,
        lookup: &BindingLookup,
        stack: &mut BindingStack,
        resolved: &mut IndexSet<TypeKey>,
        context_key: &ContextualTypeKey,
        declaration: Option<Declaration>,
        kind: EntryKind,
    ) -> Result<()> {
        let key = context_key.type_key.clone();
        if resolved.contains(&key) {
            return Ok(());
        }
        // A request already in flight closes a cycle; the topological sort
        // decides whether it is breakable.
        if stack.entry_for(&key).is_some() {
            return Ok(());
        }
        if !self.bindings.contains_key(&key) {
            let found = lookup.lookup(context_key, &self.bindings)?;
            for binding in found {
                self.put_binding(binding);
            }
        }
        if !self.bindings.contains_key(&key) {
            // Set- and map-shaped requests fall back to an empty
            // multibinding; validation decides whether empty is legal.
            if let Some(multibinding) = crate::bindings::multibinding::implicit_multibinding(&key)
            {
                self.put_binding(Binding::Multibinding(multibinding));
            }
        }
        if !self.bindings.contains_key(&key) {
            if context_key.has_default {
                self.put_binding(Binding::Absent(AbsentBinding {
                    type_key: key.clone(),
                    contextual_type_key: context_key.clone(),
                }));
                resolved.insert(key);
                return Ok(());
            }
            stack.push(StackEntry {
                context_key: context_key.clone(),
                declaration: declaration.clone(),
                kind,
            });
            let mut message = format!(
                "missing binding for {}\nrequested by: {}",
                key.readable(),
                stack.render()
            );
            let similar = self.find_similar_bindings(ctx, lookup, &key);
            if !similar.is_empty() {
                message.push_str("\nsimilar bindings exist:");
                for suggestion in similar {
                    message.push_str(&format!("\n\t{}", suggestion));
                }
            }
            return ctx
                .diagnostics
                .fatal(declaration.as_ref(), DiagnosticKind::MissingBinding, message);
        }
        stack.push(StackEntry {
            context_key: context_key.clone(),
            declaration: declaration.clone(),
            kind,
        });
        let binding = self
            .bindings
            .get(&key)
            .expect("binding vanished during populate");
        let dependencies: Vec<ContextualTypeKey> = binding.dependencies().to_vec();
        let dependent_declaration = binding.declaration().cloned();
        for dependency in dependencies {
            self.populate_request(
                ctx,
                lookup,
                stack,
                resolved,
                &dependency,
                dependent_declaration.clone(),
                EntryKind::RequestedAt,
            )?;
        }
        stack.pop();
        resolved.insert(key);
        Ok(())
    }

    /// Edges run requester -> dependency; edges into absent sentinels are
    /// omitted because the requester falls back to its default.
    fn adjacency(
        &self,
        ctx: &ResolverContext,
    ) -> Result<(DiGraph<TypeKey, ContextualTypeKey>, IndexMap<TypeKey, NodeIndex>)> {
        let mut graph: DiGraph<TypeKey, ContextualTypeKey> = DiGraph::new();
        let mut indices: IndexMap<TypeKey, NodeIndex> = IndexMap::new();
        for key in self.bindings.keys() {
            let ix = graph.add_node(key.clone());
            indices.insert(key.clone(), ix);
        }
        for (key, binding) in &self.bindings {
            let from = indices[key];
            for dependency in binding.dependencies() {
                match self.bindings.get(&dependency.type_key) {
                    Some(Binding::Absent(absent)) => {
                        if !dependency.has_default {
                            return ctx.diagnostics.compiler_bug(
                                binding.declaration(),
                                format!(
                                    "absent sentinel for non-defaulted dependency {}",
                                    absent.type_key.readable()
                                ),
                            );
                        }
                    }
                    Some(_) => {
                        let to = indices[&dependency.type_key];
                        graph.add_edge(from, to, dependency.clone());
                    }
                    None => {
                        return ctx.diagnostics.compiler_bug(
                            binding.declaration(),
                            format!(
                                "dependency {} of {} escaped population",
                                dependency.type_key.readable(),
                                key.readable()
                            ),
                        )
                    }
                }
            }
        }
        Ok((graph, indices))
    }

    fn reachability(
        &self,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        indices: &IndexMap<TypeKey, NodeIndex>,
        roots: &[RootEntry],
    ) -> IndexSet<TypeKey> {
        let mut reachable: IndexSet<TypeKey> = IndexSet::new();
        let mut worklist: Vec<NodeIndex> = Vec::new();
        for root in roots {
            if let Some(ix) = indices.get(&root.context_key.type_key) {
                if reachable.insert(graph[*ix].clone()) {
                    worklist.push(*ix);
                }
            }
        }
        while let Some(ix) = worklist.pop() {
            for neighbor in graph.neighbors_directed(ix, Direction::Outgoing) {
                if reachable.insert(graph[neighbor].clone()) {
                    worklist.push(neighbor);
                }
            }
        }
        reachable
    }

    /// `Provider<Lazy<T>>` cannot be satisfied across a graph boundary; only
    /// reachable uses reject the graph.
    fn check_provider_of_lazy(
        &self,
        ctx: &ResolverContext,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        roots: &[RootEntry],
        reachable: &IndexSet<TypeKey>,
    ) -> Result<()> {
        let mut offending: Option<(ContextualTypeKey, Option<Declaration>)> = None;
        for root in roots {
            if root.context_key.wrapping == WrappingKind::ProviderOfLazy
                && matches!(
                    self.bindings.get(&root.context_key.type_key),
                    Some(Binding::GraphDependency(_))
                )
            {
                offending = Some((root.context_key.clone(), root.declaration.clone()));
                break;
            }
        }
        if offending.is_none() {
            for edge in graph.edge_references() {
                let context_key = edge.weight();
                if context_key.wrapping == WrappingKind::ProviderOfLazy
                    && reachable.contains(&graph[edge.source()])
                    && matches!(
                        self.bindings.get(&context_key.type_key),
                        Some(Binding::GraphDependency(_))
                    )
                {
                    offending = Some((context_key.clone(), None));
                    break;
                }
            }
        }
        if let Some((context_key, declaration)) = offending {
            return ctx.diagnostics.fatal(
                declaration.as_ref(),
                DiagnosticKind::DependencyCycle,
                format!(
                    "{} requests a graph dependency as Provider<Lazy<..>>, which cannot be satisfied",
                    context_key.readable()
                ),
            );
        }
        Ok(())
    }

    /// Tarjan condensation with per-SCC cycle breaking: a cyclic SCC is legal
    /// iff dropping the deferrable-requester edges leaves it acyclic. Dropped
    /// edges defer their requested key.
    fn toposort(
        &self,
        ctx: &ResolverContext,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        _indices: &IndexMap<TypeKey, NodeIndex>,
        reachable: &IndexSet<TypeKey>,
    ) -> Result<(Vec<TypeKey>, Vec<TypeKey>)> {
        let mut sorted_keys: Vec<TypeKey> = Vec::new();
        let mut deferred: IndexSet<TypeKey> = IndexSet::new();
        for scc in tarjan_scc(graph) {
            // Reachability is closed over an SCC: one member decides for all.
            if !reachable.contains(&graph[scc[0]]) {
                continue;
            }
            let self_edge = scc.len() == 1 && graph.find_edge(scc[0], scc[0]).is_some();
            if scc.len() == 1 && !self_edge {
                sorted_keys.push(graph[scc[0]].clone());
                continue;
            }
            let members: HashSet<NodeIndex> = scc.iter().copied().collect();
            // Kept edges are the non-deferrable internal ones.
            let mut dependency_count: HashMap<NodeIndex, usize> =
                scc.iter().map(|ix| (*ix, 0)).collect();
            let mut dependents: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
            for &member in &scc {
                for edge in graph.edges(member) {
                    let target = edge.target();
                    if !members.contains(&target) {
                        continue;
                    }
                    if edge.weight().is_deferrable() {
                        deferred.insert(graph[target].clone());
                    } else {
                        *dependency_count.get_mut(&member).expect("scc member") += 1;
                        dependents.entry(target).or_default().push(member);
                    }
                }
            }
            let mut emitted: Vec<NodeIndex> = Vec::new();
            let mut emitted_set: HashSet<NodeIndex> = HashSet::new();
            while emitted.len() < scc.len() {
                let mut ready: Vec<NodeIndex> = scc
                    .iter()
                    .copied()
                    .filter(|ix| !emitted_set.contains(ix) && dependency_count[ix] == 0)
                    .collect();
                if ready.is_empty() {
                    let cycle = self.find_cycle(graph, &members, &emitted_set);
                    return ctx.diagnostics.fatal(
                        None,
                        DiagnosticKind::DependencyCycle,
                        format!("dependency cycle detected:\n{}", cycle),
                    );
                }
                ready.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
                let next = ready[0];
                emitted.push(next);
                emitted_set.insert(next);
                if let Some(waiting) = dependents.get(&next) {
                    for &dependent in waiting {
                        *dependency_count.get_mut(&dependent).expect("scc member") -= 1;
                    }
                }
            }
            sorted_keys.extend(emitted.into_iter().map(|ix| graph[ix].clone()));
        }
        let mut deferred_types: Vec<TypeKey> = deferred.into_iter().collect();
        deferred_types.sort();
        Ok((sorted_keys, deferred_types))
    }

    /// Walks the non-deferrable edges inside an SCC until a key repeats, then
    /// draws the loop.
    fn find_cycle(
        &self,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        members: &HashSet<NodeIndex>,
        emitted: &HashSet<NodeIndex>,
    ) -> String {
        let mut start = None;
        let mut candidates: Vec<NodeIndex> = members
            .iter()
            .copied()
            .filter(|ix| !emitted.contains(ix))
            .collect();
        candidates.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
        if let Some(first) = candidates.first() {
            start = Some(*first);
        }
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut current = match start {
            Some(start) => start,
            None => return String::new(),
        };
        loop {
            if let Some(position) = path.iter().position(|ix| *ix == current) {
                let mut art = String::new();
                for (i, ix) in path.iter().enumerate().skip(position) {
                    if i == position {
                        art.push_str(&format!("*-> {}\n", graph[*ix].readable()));
                    } else {
                        art.push_str(&format!("|   {}\n", graph[*ix].readable()));
                    }
                }
                art.push_str(&format!("*-- {}\n", graph[current].readable()));
                return art;
            }
            path.push(current);
            let mut nexts: Vec<NodeIndex> = graph
                .edges(current)
                .filter(|edge| {
                    members.contains(&edge.target())
                        && !emitted.contains(&edge.target())
                        && !edge.weight().is_deferrable()
                })
                .map(|edge| edge.target())
                .collect();
            nexts.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
            current = match nexts.first() {
                Some(next) => *next,
                None => return String::new(),
            };
        }
    }

    fn validate(
        &self,
        ctx: &ResolverContext,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        indices: &IndexMap<TypeKey, NodeIndex>,
        roots: &[RootEntry],
        reachable: &IndexSet<TypeKey>,
    ) -> Result<()> {
        let mut failed = false;
        let root_keys: IndexSet<TypeKey> = roots
            .iter()
            .map(|root| root.context_key.type_key.clone())
            .collect();
        for key in reachable {
            let binding = match self.bindings.get(key) {
                Some(binding) => binding,
                None => continue,
            };
            if let Binding::Absent(_) = binding {
                return ctx.diagnostics.compiler_bug(
                    None,
                    format!("absent sentinel {} survived sealing", key.readable()),
                );
            }
            if let Some(scope) = binding.scope() {
                if !self.node.scopes.contains(scope) {
                    failed = true;
                    let chain = self.reverse_chain(graph, indices, key, &root_keys);
                    let hint = self
                        .node
                        .extended_graph_nodes
                        .values()
                        .find(|ancestor| ancestor.scopes.contains(scope))
                        .map(|ancestor| {
                            format!(
                                "\nancestor graph {} declares {}",
                                ancestor.readable_name(),
                                scope.readable()
                            )
                        })
                        .unwrap_or_default();
                    ctx.diagnostics.report(
                        binding.declaration(),
                        DiagnosticKind::IncompatiblyScopedBinding,
                        format!(
                            "{} is scoped to {} but {} declares only [{}]\nrequested by: {}{}",
                            binding.readable_name(),
                            scope.readable(),
                            self.node.readable_name(),
                            self.node
                                .scopes
                                .iter()
                                .map(TypeData::readable)
                                .collect::<Vec<String>>()
                                .join(", "),
                            chain,
                            hint
                        ),
                    );
                }
            }
            if let Binding::ConstructorInjected(constructor) = binding {
                if constructor.is_assisted {
                    let mut misuse = root_keys.contains(key);
                    if !misuse {
                        if let Some(ix) = indices.get(key) {
                            for edge in graph.edges_directed(*ix, Direction::Incoming) {
                                let source = edge.source();
                                let source_binding = self.bindings.get(&graph[source]);
                                if !matches!(source_binding, Some(Binding::Assisted(_))) {
                                    misuse = true;
                                    break;
                                }
                            }
                        }
                    }
                    if misuse {
                        failed = true;
                        let factory_hint = self
                            .bindings
                            .values()
                            .find_map(|candidate| match candidate {
                                Binding::Assisted(assisted) if assisted.target_key.eq(key) => {
                                    Some(assisted.type_key.readable().to_owned())
                                }
                                _ => None,
                            })
                            .unwrap_or_else(|| {
                                format!("the generated factory for {}", key.readable())
                            });
                        ctx.diagnostics.report(
                            binding.declaration(),
                            DiagnosticKind::AssistedInjectMisuse,
                            format!(
                                "{} is assisted-injected and can only be created through its factory; request {} instead",
                                key.readable(),
                                factory_hint
                            ),
                        );
                    }
                }
            }
            if let Binding::Multibinding(multibinding) = binding {
                if !multibinding.allow_empty && multibinding.source_bindings.is_empty() {
                    failed = true;
                    let similar = self.similar_multibindings(key);
                    let mut message = format!(
                        "multibinding {} has no contributions and does not allow empty",
                        key.readable()
                    );
                    if !similar.is_empty() {
                        message.push_str("\nsimilar multibindings exist:");
                        for suggestion in similar {
                            message.push_str(&format!("\n\t{}", suggestion));
                        }
                    }
                    ctx.diagnostics.report(
                        multibinding.declaration.as_ref(),
                        DiagnosticKind::EmptyMultibinding,
                        message,
                    );
                }
            }
        }
        if failed {
            return Err(FatalError);
        }
        Ok(())
    }

    /// Reverse-adjacency walk from `key` back to a root, for scope
    /// diagnostics.
    fn reverse_chain(
        &self,
        graph: &DiGraph<TypeKey, ContextualTypeKey>,
        indices: &IndexMap<TypeKey, NodeIndex>,
        key: &TypeKey,
        root_keys: &IndexSet<TypeKey>,
    ) -> String {
        let mut chain: Vec<String> = vec![key.readable().to_owned()];
        let mut visited: HashSet<TypeKey> = HashSet::new();
        let mut current = key.clone();
        while !root_keys.contains(&current) && visited.insert(current.clone()) {
            let ix = match indices.get(&current) {
                Some(ix) => *ix,
                None => break,
            };
            let mut predecessor = None;
            for edge in graph.edges_directed(ix, Direction::Incoming) {
                predecessor = Some(graph[edge.source()].clone());
                break;
            }
            match predecessor {
                Some(previous) => {
                    chain.push(previous.readable().to_owned());
                    current = previous;
                }
                None => break,
            }
        }
        chain.push(self.node.readable_name());
        chain.join("\nrequested by: ")
    }

    /// Candidate suggestions for a missing key: qualifier flips, option
    /// flips, argument mismatches, declared super/subtypes, and multibindings
    /// carrying the requested value. Multibindings and sentinels never enter
    /// as candidates themselves.
    fn find_similar_bindings(
        &self,
        ctx: &ResolverContext,
        lookup: &BindingLookup,
        key: &TypeKey,
    ) -> Vec<String> {
        let mut suggestions: IndexSet<String> = IndexSet::new();
        let target_data = key.type_data().clone();
        let target_unqualified = key.without_qualifier().unwrap_or_else(|| key.clone());

        let mut candidates: Vec<(TypeKey, Option<String>)> = Vec::new();
        for (candidate_key, binding) in &self.bindings {
            if binding.eligible_for_similarity() {
                candidates.push((candidate_key.clone(), Some(binding.readable_name())));
            }
        }
        for binding in &self.replaced {
            if binding.eligible_for_similarity() {
                candidates.push((binding.type_key().clone(), Some(binding.readable_name())));
            }
        }
        for consulted in lookup.consulted_keys() {
            if !consulted.eq(key) && !self.bindings.contains_key(&consulted) {
                candidates.push((consulted, None));
            }
        }

        for (candidate, description) in &candidates {
            if candidate.eq(key) {
                continue;
            }
            let describe = |reason: &str| match description {
                Some(name) => format!("{} ({})", name, reason),
                None => format!("{} ({})", candidate.readable(), reason),
            };
            let candidate_unqualified = candidate
                .without_qualifier()
                .unwrap_or_else(|| candidate.clone());
            if candidate_unqualified.eq(&target_unqualified) {
                suggestions.insert(describe("same type with a different qualifier"));
                continue;
            }
            let candidate_data = candidate.type_data();
            if is_option_of(candidate_data, &target_data) || is_option_of(&target_data, candidate_data)
            {
                suggestions.insert(describe("nullability differs"));
                continue;
            }
            if candidate_data.class_id() == target_data.class_id() {
                suggestions.insert(describe("different type arguments"));
                continue;
            }
            if let Some(spec) = ctx.specs.spec_for(candidate_data) {
                if spec.supertypes.contains(&target_data) {
                    suggestions.insert(describe("subtype of the requested type"));
                    continue;
                }
            }
            if let Some(spec) = ctx.specs.spec_for(&target_data) {
                if spec.supertypes.contains(candidate_data) {
                    suggestions.insert(describe("supertype of the requested type"));
                }
            }
        }

        for binding in self.bindings.values() {
            if let Binding::Multibinding(multibinding) = binding {
                let matches_value = multibinding
                    .value_type
                    .as_ref()
                    .map(|value| value.eq(&target_data))
                    .unwrap_or(false)
                    || multibinding
                        .element_type
                        .as_ref()
                        .map(|element| element.eq(&target_data))
                        .unwrap_or(false);
                if matches_value {
                    suggestions.insert(format!(
                        "{} (multibinding collecting the requested type)",
                        multibinding.type_key.readable()
                    ));
                }
            }
        }

        let mut sorted: Vec<String> = suggestions.into_iter().collect();
        sorted.sort();
        sorted
    }

    /// Multibindings over the same map key type, a compatible value type, or
    /// the same set element type.
    fn similar_multibindings(&self, key: &TypeKey) -> Vec<String> {
        let empty = match self.bindings.get(key).and_then(Binding::as_multibinding) {
            Some(multibinding) => multibinding.clone(),
            None => return Vec::new(),
        };
        let mut similar: Vec<String> = Vec::new();
        for binding in self.bindings.values() {
            if let Binding::Multibinding(other) = binding {
                if other.type_key.eq(key) || other.source_bindings.is_empty() {
                    continue;
                }
                let related = (empty.is_map
                    && other.is_map
                    && (empty.key_type.eq(&other.key_type)
                        || empty.value_type.eq(&other.value_type)))
                    || (empty.is_set && other.is_set && empty.element_type.eq(&other.element_type));
                if related {
                    similar.push(other.type_key.readable().to_owned());
                }
            }
        }
        similar.sort();
        similar
    }
}

fn is_option_of(outer: &TypeData, inner: &TypeData) -> bool {
    outer.path == "std::option::Option" && outer.args.len() == 1 && outer.args[0].eq(inner)
}

/// Adapter exposing a sealed graph as the parent context of its extensions.
/// Fields are reserved on first mark and keep the stable provider name.
#[derive(Debug)]
pub struct ParentGraphHandle {
    owner: TypeData,
    available: Vec<TypeKey>,
    reserved: IndexMap<TypeKey, FieldAccess>,
}

impl ParentGraphHandle {
    pub fn new(sealed: &SealedGraph) -> Self {
        ParentGraphHandle {
            owner: sealed.graph_key.type_data().clone(),
            available: sealed.bindings.keys().cloned().collect(),
            reserved: IndexMap::new(),
        }
    }

    pub fn reserved(&self) -> &IndexMap<TypeKey, FieldAccess> {
        &self.reserved
    }
}

impl ParentContext for ParentGraphHandle {
    fn available_keys(&self) -> Vec<TypeKey> {
        self.available.clone()
    }

    fn mark(&mut self, key: &TypeKey) -> Option<FieldAccess> {
        if !self.available.contains(key) {
            return None;
        }
        let owner = self.owner.clone();
        Some(
            self.reserved
                .entry(key.clone())
                .or_insert_with(|| FieldAccess {
                    owner,
                    name: key.provider_accessor_name(),
                })
                .clone(),
        )
    }
}
