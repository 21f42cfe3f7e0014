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

//! The ravel binding-graph resolver.
//!
//! Graph classes declare accessors, injectors, binds/provider callables,
//! multibinding contributions, and graph extensions. The resolver turns those
//! declarations into a validated binding graph: a node is built per graph
//! class, seeded into a mutable graph, and sealed into a deterministic
//! topological order the downstream code generator consumes.

use indexmap::IndexMap;
use std::cell::RefCell;
use tracing::debug_span;

use ravel_common::type_data::{ClassId, TypeData};

pub mod aggregation;
pub mod bindings;
pub mod builder;
pub mod context;
pub mod diagnostics;
pub mod graph;
pub mod lookup;
pub mod node;
pub mod stack;

pub use crate::builder::BindingGraphBuilder;
pub use crate::context::{ParentContext, ResolverContext, ResolverOptions};
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, FatalError, Result};
pub use crate::graph::{
    BindingGraphResult, MutableBindingGraph, ParentGraphHandle, SealedGraph,
};
pub use crate::lookup::BindingLookup;
pub use crate::node::GraphNodeCache;

/// Resolves one graph class: node build, seed, seal.
pub fn resolve_graph<'a>(
    ctx: &'a ResolverContext,
    cache: &GraphNodeCache,
    class: &TypeData,
    parent_context: Option<&'a RefCell<dyn ParentContext + 'a>>,
) -> Result<SealedGraph> {
    let span = debug_span!("resolve_graph", graph = %class.readable());
    let _entered = span.enter();
    let node = cache.node_for(class, ctx)?;
    let lookup = BindingLookup::new(ctx, class.clone(), parent_context);
    let mut graph = BindingGraphBuilder::seed(ctx, &lookup, node)?;
    graph.seal(ctx, &lookup)
}

/// Resolves a compilation unit's graphs in declaration order. Extension
/// parents resolve before their children so parent contexts are available.
/// The first fatal diagnostic rejects the whole unit; no partial results are
/// returned.
pub fn resolve_unit(
    ctx: &ResolverContext,
    cache: &GraphNodeCache,
    graphs: &[TypeData],
) -> Result<Vec<SealedGraph>> {
    let mut sealed: IndexMap<ClassId, SealedGraph> = IndexMap::new();
    let mut visiting: Vec<ClassId> = Vec::new();
    for class in graphs {
        resolve_with_parents(ctx, cache, class, &mut sealed, &mut visiting)?;
    }
    Ok(sealed.into_values().collect())
}

fn resolve_with_parents(
    ctx: &ResolverContext,
    cache: &GraphNodeCache,
    class: &TypeData,
    sealed: &mut IndexMap<ClassId, SealedGraph>,
    visiting: &mut Vec<ClassId>,
) -> Result<()> {
    let id = class.class_id();
    if sealed.contains_key(&id) {
        return Ok(());
    }
    if visiting.contains(&id) {
        return ctx.diagnostics.fatal(
            None,
            DiagnosticKind::GraphSelfCycle,
            format!("graph {} extends itself", class.readable()),
        );
    }
    visiting.push(id.clone());
    let spec = ctx.specs.spec_for(class);
    let parent = spec.as_ref().and_then(|spec| spec.parent.clone());
    if let Some(ref parent) = parent {
        resolve_with_parents(ctx, cache, parent, sealed, visiting)?;
    }
    let result = match parent
        .as_ref()
        .and_then(|parent| sealed.get(&parent.class_id()))
    {
        Some(parent_sealed) => {
            let handle: RefCell<ParentGraphHandle> =
                RefCell::new(ParentGraphHandle::new(parent_sealed));
            resolve_graph(ctx, cache, class, Some(&handle))
        }
        None => resolve_graph(ctx, cache, class, None),
    }?;
    visiting.pop();
    sealed.insert(id, result);
    Ok(())
}
