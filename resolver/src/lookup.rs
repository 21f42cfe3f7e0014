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

use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use tracing::trace;

use ravel_common::keys::{
    members_injector_key, ContextualTypeKey, TypeKey, MEMBERS_INJECTOR_PATH,
};
use ravel_common::manifest::Declaration;
use ravel_common::type_data::TypeData;

use crate::bindings::binding::{
    AssistedBinding, Binding, ConstructorInjectedBinding, GraphDependencyAccess,
    GraphDependencyBinding, MembersInjectedBinding, ObjectClassBinding,
};
use crate::context::{ClassFactory, FieldAccess, ParentContext, ResolverContext};
use crate::diagnostics::Result;

#[derive(Debug, Clone)]
struct LazyParentKey {
    owner_key: TypeKey,
    consumed: bool,
}

/// On-demand resolution of bindings that are not pre-seeded: class factories,
/// member injectors, and keys available on the parent graph.
///
/// `lookup` is pure with respect to the snapshot it is given; it never
/// mutates the graph.
pub struct BindingLookup<'a, 'b> {
    ctx: &'a ResolverContext<'b>,
    graph_class: TypeData,
    parent_context: Option<&'a RefCell<dyn ParentContext + 'a>>,
    lazy_parent_keys: RefCell<IndexMap<TypeKey, LazyParentKey>>,
    consulted: RefCell<IndexSet<TypeKey>>,
    reserved_fields: RefCell<IndexMap<TypeKey, FieldAccess>>,
}

impl<'a, 'b> BindingLookup<'a, 'b> {
    pub fn new(
        ctx: &'a ResolverContext<'b>,
        graph_class: TypeData,
        parent_context: Option<&'a RefCell<dyn ParentContext + 'a>>,
    ) -> Self {
        BindingLookup {
            ctx,
            graph_class,
            parent_context,
            lazy_parent_keys: RefCell::new(IndexMap::new()),
            consulted: RefCell::new(IndexSet::new()),
            reserved_fields: RefCell::new(IndexMap::new()),
        }
    }

    /// Registers a parent key that materializes to a graph dependency only on
    /// first use.
    pub fn register_parent_key(&self, key: TypeKey, owner_key: TypeKey) {
        self.lazy_parent_keys.borrow_mut().entry(key).or_insert(LazyParentKey {
            owner_key,
            consumed: false,
        });
    }

    pub fn has_parent_key(&self, key: &TypeKey) -> bool {
        self.lazy_parent_keys.borrow().contains_key(key)
    }

    pub fn has_parent_context(&self) -> bool {
        self.parent_context.is_some()
    }

    /// The parent's advertised keys, when resolving an extension.
    pub fn parent_available_keys(&self) -> Vec<TypeKey> {
        match self.parent_context {
            Some(parent_context) => parent_context.borrow().available_keys(),
            None => Vec::new(),
        }
    }

    /// Keys consulted through lookup; they join the similar-binding pool even
    /// when nothing materialized.
    pub fn consulted_keys(&self) -> Vec<TypeKey> {
        self.consulted.borrow().iter().cloned().collect()
    }

    /// Parent fields reserved while materializing lazy parent keys.
    pub fn reserved_fields(&self) -> IndexMap<TypeKey, FieldAccess> {
        self.reserved_fields.borrow().clone()
    }

    /// Returns the new bindings satisfying `context_key`, in insertion order.
    /// An empty result means the caller treats the key as missing.
    pub fn lookup(
        &self,
        context_key: &ContextualTypeKey,
        snapshot: &IndexMap<TypeKey, Binding>,
    ) -> Result<Vec<Binding>> {
        let key = &context_key.type_key;
        if snapshot.contains_key(key) {
            return Ok(Vec::new());
        }
        self.consulted.borrow_mut().insert(key.clone());

        let type_data = key.type_data().clone();
        if type_data.path == MEMBERS_INJECTOR_PATH && type_data.args.len() == 1 {
            let binding = self.members_injected_binding(&type_data.args[0]);
            return Ok(vec![Binding::MembersInjected(binding)]);
        }

        if let Some(factory) = self.ctx.class_factories.find_or_generate(&type_data, false) {
            self.ctx
                .ic_observer
                .track_class_lookup(&self.graph_class, &type_data);
            if factory.is_object {
                return Ok(vec![Binding::ObjectClass(ObjectClassBinding {
                    type_key: key.clone(),
                    contextual_type_key: ContextualTypeKey::direct(key.clone()),
                    class: type_data,
                })]);
            }
            if let Some(target) = factory.assisted_factory_for.clone() {
                // Speculative: the assisted target may not be injectable yet.
                let target_factory =
                    match self.ctx.class_factories.find_or_generate(&target, true) {
                        Some(target_factory) => target_factory,
                        None => return Ok(Vec::new()),
                    };
                let target_binding = self.constructor_injected(&target_factory, true);
                let target_key = target_binding.type_key.clone();
                let assisted = AssistedBinding {
                    type_key: key.clone(),
                    contextual_type_key: ContextualTypeKey::direct(key.clone()),
                    dependencies: vec![ContextualTypeKey::direct(target_key.clone())],
                    target_key,
                    declaration: factory.declaration.clone(),
                };
                return Ok(vec![
                    Binding::ConstructorInjected(target_binding),
                    Binding::Assisted(assisted),
                ]);
            }
            return Ok(vec![Binding::ConstructorInjected(
                self.constructor_injected(&factory, false),
            )]);
        }

        let parent_task = self
            .lazy_parent_keys
            .borrow()
            .get(key)
            .map(|task| (task.owner_key.clone(), task.consumed));
        if let Some((owner_key, consumed)) = parent_task {
            if consumed {
                return Ok(Vec::new());
            }
            self.lazy_parent_keys
                .borrow_mut()
                .get_mut(key)
                .expect("registered parent key vanished")
                .consumed = true;
            let parent_context = self
                .parent_context
                .expect("lazy parent key registered without a parent context");
            let access = match parent_context.borrow_mut().mark(key) {
                Some(field) => {
                    self.reserved_fields
                        .borrow_mut()
                        .insert(key.clone(), field.clone());
                    GraphDependencyAccess::Field(field)
                }
                // The parent exposes the key through a getter; the stable
                // accessor name keeps both sides in agreement.
                None => GraphDependencyAccess::Getter(Declaration::new(
                    owner_key.type_data().clone(),
                    &key.accessor_name(),
                )),
            };
            trace!(key = %key.readable(), parent = %owner_key.readable(), "parent key materialized");
            return Ok(vec![Binding::GraphDependency(GraphDependencyBinding {
                type_key: key.clone(),
                contextual_type_key: ContextualTypeKey::direct(key.clone()),
                dependencies: vec![ContextualTypeKey::direct(owner_key.clone())],
                owner_key,
                access,
            })]);
        }

        Ok(Vec::new())
    }

    /// Constructor dependencies plus the merged member-injection chain;
    /// assisted parameters stay out of the graph.
    pub fn constructor_injected(
        &self,
        factory: &ClassFactory,
        force_assisted: bool,
    ) -> ConstructorInjectedBinding {
        let type_key = TypeKey::new(factory.class.clone());
        let mut dependencies = Vec::new();
        let mut assisted_parameters = Vec::new();
        for parameter in &factory.parameters {
            if parameter.assisted.is_some() {
                assisted_parameters.push(parameter.clone());
                continue;
            }
            dependencies.push(
                ContextualTypeKey::from_declared(&parameter.type_data)
                    .with_default(parameter.has_default),
            );
        }
        for injector in self
            .ctx
            .members_injectors
            .find_or_generate_all_for(&factory.class)
        {
            for parameter in &injector.parameters {
                dependencies.push(
                    ContextualTypeKey::from_declared(&parameter.type_data)
                        .with_default(parameter.has_default),
                );
            }
        }
        ConstructorInjectedBinding {
            contextual_type_key: ContextualTypeKey::direct(type_key.clone()),
            type_key,
            class: factory.class.clone(),
            dependencies,
            is_assisted: force_assisted || !assisted_parameters.is_empty(),
            assisted_parameters,
            scope: factory.scope.clone(),
            declaration: factory.declaration.clone(),
        }
    }

    /// The merged injector chain for `class` and its ancestors.
    pub fn members_injected_binding(&self, class: &TypeData) -> MembersInjectedBinding {
        let injectors = self.ctx.members_injectors.find_or_generate_all_for(class);
        let mut parameters = Vec::new();
        let mut declaration = None;
        for injector in injectors {
            if declaration.is_none() {
                declaration = injector.declaration.clone();
            }
            parameters.extend(injector.parameters);
        }
        let dependencies = parameters
            .iter()
            .map(|parameter| {
                ContextualTypeKey::from_declared(&parameter.type_data)
                    .with_default(parameter.has_default)
            })
            .collect();
        let type_key = members_injector_key(class);
        MembersInjectedBinding {
            contextual_type_key: ContextualTypeKey::direct(type_key.clone()),
            type_key,
            target_class: class.clone(),
            target_class_id: class.class_id(),
            parameters,
            dependencies,
            declaration,
        }
    }
}
