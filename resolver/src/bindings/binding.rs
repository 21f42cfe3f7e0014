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

use indexmap::IndexSet;

use ravel_common::keys::{ContextualTypeKey, TypeKey};
use ravel_common::manifest::{Declaration, Parameter};
use ravel_common::type_data::{ClassId, TypeData};

use crate::context::FieldAccess;

/// A binding satisfying one [`TypeKey`] in a graph.
///
/// Every variant carries its key, the contextual form it was created for, its
/// dependency requests, an optional scope, and an optional declaration for
/// diagnostics.
#[derive(Debug, Clone)]
pub enum Binding {
    Provided(ProvidedBinding),
    Alias(AliasBinding),
    ConstructorInjected(ConstructorInjectedBinding),
    Assisted(AssistedBinding),
    Multibinding(MultibindingBinding),
    BoundInstance(BoundInstanceBinding),
    GraphDependency(GraphDependencyBinding),
    GraphExtension(GraphExtensionBinding),
    MembersInjected(MembersInjectedBinding),
    ObjectClass(ObjectClassBinding),
    Absent(AbsentBinding),
}

/// A module/companion provider function.
#[derive(Debug, Clone)]
pub struct ProvidedBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub dependencies: Vec<ContextualTypeKey>,
    pub scope: Option<TypeData>,
    pub declaration: Option<Declaration>,
    pub container: TypeData,
    pub function_name: String,
    pub name_hint: String,
    /// Discovered on a transitively extended ancestor rather than this graph.
    pub inherited: bool,
    pub into_multibinding: bool,
}

impl ProvidedBinding {
    /// Same provider function, regardless of which graph surfaced it.
    pub fn same_factory(&self, other: &ProvidedBinding) -> bool {
        self.container == other.container && self.function_name == other.function_name
    }
}

/// `A -> B` redirection declared by a binds function.
#[derive(Debug, Clone)]
pub struct AliasBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub aliased: ContextualTypeKey,
    pub binds_callable: Option<Declaration>,
    pub parameters: Vec<Parameter>,
    pub scope: Option<TypeData>,
    pub dependencies: Vec<ContextualTypeKey>,
    pub inherited: bool,
}

impl AliasBinding {
    pub fn new(
        type_key: TypeKey,
        aliased: ContextualTypeKey,
        binds_callable: Option<Declaration>,
        inherited: bool,
    ) -> Self {
        let contextual_type_key = ContextualTypeKey::direct(type_key.clone());
        AliasBinding {
            type_key,
            contextual_type_key,
            dependencies: vec![aliased.clone()],
            aliased,
            binds_callable,
            parameters: Vec::new(),
            scope: None,
            inherited,
        }
    }
}

/// A class with an injectable constructor.
#[derive(Debug, Clone)]
pub struct ConstructorInjectedBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub class: TypeData,
    pub dependencies: Vec<ContextualTypeKey>,
    /// Caller-supplied parameters; excluded from graph dependencies.
    pub assisted_parameters: Vec<Parameter>,
    pub scope: Option<TypeData>,
    pub declaration: Option<Declaration>,
    pub is_assisted: bool,
}

/// The factory exposing an assisted-injected class.
#[derive(Debug, Clone)]
pub struct AssistedBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub target_key: TypeKey,
    pub dependencies: Vec<ContextualTypeKey>,
    pub declaration: Option<Declaration>,
}

/// A synthetic `Set<T>` or `Map<K, V>` assembled from per-element
/// contributions.
#[derive(Debug, Clone)]
pub struct MultibindingBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub is_map: bool,
    pub is_set: bool,
    pub allow_empty: bool,
    pub source_bindings: IndexSet<TypeKey>,
    pub dependencies: Vec<ContextualTypeKey>,
    /// Latest declaration site; updated as new declarations are seen.
    pub declaration: Option<Declaration>,
    /// The `Map<K, Provider<V>>` sibling of a map multibinding.
    pub provider_values: bool,
    pub key_type: Option<TypeData>,
    pub value_type: Option<TypeData>,
    pub element_type: Option<TypeData>,
}

impl MultibindingBinding {
    pub fn add_source(&mut self, source: TypeKey) {
        if self.source_bindings.insert(source.clone()) {
            self.dependencies.push(ContextualTypeKey::direct(source));
        }
    }
}

/// A value supplied from outside the graph: a creator parameter, the graph
/// itself, or an included container instance.
#[derive(Debug, Clone)]
pub struct BoundInstanceBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub name_hint: String,
    /// Receiver parameter for nested receiver access, when present.
    pub receiver: Option<Parameter>,
    pub creator_parameter: Option<String>,
    pub declaration: Option<Declaration>,
    pub dependencies: Vec<ContextualTypeKey>,
}

#[derive(Debug, Clone)]
pub enum GraphDependencyAccess {
    Getter(Declaration),
    Field(FieldAccess),
}

/// An accessor call on an included or parent graph.
#[derive(Debug, Clone)]
pub struct GraphDependencyBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    /// The binding of the graph this dependency is read from.
    pub owner_key: TypeKey,
    pub access: GraphDependencyAccess,
    pub dependencies: Vec<ContextualTypeKey>,
}

/// The child-graph constructor call site.
#[derive(Debug, Clone)]
pub struct GraphExtensionBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub accessor: Declaration,
    pub scopes: Vec<TypeData>,
    pub dependencies: Vec<ContextualTypeKey>,
}

/// Injector function for a type, with the merged ancestor parameter chain.
#[derive(Debug, Clone)]
pub struct MembersInjectedBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub target_class: TypeData,
    pub target_class_id: ClassId,
    pub parameters: Vec<Parameter>,
    pub dependencies: Vec<ContextualTypeKey>,
    pub declaration: Option<Declaration>,
}

/// A singleton-object value.
#[derive(Debug, Clone)]
pub struct ObjectClassBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
    pub class: TypeData,
}

/// Sentinel standing in for a defaulted dependency that has no binding. Never
/// reachable in a sealed graph.
#[derive(Debug, Clone)]
pub struct AbsentBinding {
    pub type_key: TypeKey,
    pub contextual_type_key: ContextualTypeKey,
}

impl Binding {
    pub fn type_key(&self) -> &TypeKey {
        match self {
            Binding::Provided(b) => &b.type_key,
            Binding::Alias(b) => &b.type_key,
            Binding::ConstructorInjected(b) => &b.type_key,
            Binding::Assisted(b) => &b.type_key,
            Binding::Multibinding(b) => &b.type_key,
            Binding::BoundInstance(b) => &b.type_key,
            Binding::GraphDependency(b) => &b.type_key,
            Binding::GraphExtension(b) => &b.type_key,
            Binding::MembersInjected(b) => &b.type_key,
            Binding::ObjectClass(b) => &b.type_key,
            Binding::Absent(b) => &b.type_key,
        }
    }

    pub fn contextual_type_key(&self) -> &ContextualTypeKey {
        match self {
            Binding::Provided(b) => &b.contextual_type_key,
            Binding::Alias(b) => &b.contextual_type_key,
            Binding::ConstructorInjected(b) => &b.contextual_type_key,
            Binding::Assisted(b) => &b.contextual_type_key,
            Binding::Multibinding(b) => &b.contextual_type_key,
            Binding::BoundInstance(b) => &b.contextual_type_key,
            Binding::GraphDependency(b) => &b.contextual_type_key,
            Binding::GraphExtension(b) => &b.contextual_type_key,
            Binding::MembersInjected(b) => &b.contextual_type_key,
            Binding::ObjectClass(b) => &b.contextual_type_key,
            Binding::Absent(b) => &b.contextual_type_key,
        }
    }

    pub fn dependencies(&self) -> &[ContextualTypeKey] {
        match self {
            Binding::Provided(b) => &b.dependencies,
            Binding::Alias(b) => &b.dependencies,
            Binding::ConstructorInjected(b) => &b.dependencies,
            Binding::Assisted(b) => &b.dependencies,
            Binding::Multibinding(b) => &b.dependencies,
            Binding::BoundInstance(b) => &b.dependencies,
            Binding::GraphDependency(b) => &b.dependencies,
            Binding::GraphExtension(b) => &b.dependencies,
            Binding::MembersInjected(b) => &b.dependencies,
            Binding::ObjectClass(_) => &[],
            Binding::Absent(_) => &[],
        }
    }

    pub fn scope(&self) -> Option<&TypeData> {
        match self {
            Binding::Provided(b) => b.scope.as_ref(),
            Binding::Alias(b) => b.scope.as_ref(),
            Binding::ConstructorInjected(b) => b.scope.as_ref(),
            _ => None,
        }
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            Binding::Provided(b) => b.declaration.as_ref(),
            Binding::Alias(b) => b.binds_callable.as_ref(),
            Binding::ConstructorInjected(b) => b.declaration.as_ref(),
            Binding::Assisted(b) => b.declaration.as_ref(),
            Binding::Multibinding(b) => b.declaration.as_ref(),
            Binding::BoundInstance(b) => b.declaration.as_ref(),
            Binding::GraphDependency(b) => match &b.access {
                GraphDependencyAccess::Getter(declaration) => Some(declaration),
                GraphDependencyAccess::Field(_) => None,
            },
            Binding::GraphExtension(b) => Some(&b.accessor),
            Binding::MembersInjected(b) => b.declaration.as_ref(),
            Binding::ObjectClass(_) => None,
            Binding::Absent(_) => None,
        }
    }

    /// Whether the binding came from a transitively extended ancestor; drives
    /// the seeding precedence rule.
    pub fn inherited(&self) -> bool {
        match self {
            Binding::Provided(b) => b.inherited,
            Binding::Alias(b) => b.inherited,
            _ => false,
        }
    }

    /// Human readable name for diagnostics.
    pub fn readable_name(&self) -> String {
        match self {
            Binding::Provided(b) => format!(
                "{}.{} (container provides)",
                b.container.canonical_string_path_without_args(),
                b.function_name
            ),
            Binding::Alias(b) => match &b.binds_callable {
                Some(declaration) => format!("{} (container binds)", declaration.readable()),
                None => format!(
                    "{} -> {} (supertype alias)",
                    b.type_key.readable(),
                    b.aliased.type_key.readable()
                ),
            },
            Binding::ConstructorInjected(b) => {
                format!("{} (injectable)", b.class.canonical_string_path())
            }
            Binding::Assisted(b) => format!("{} (assisted factory)", b.type_key.readable()),
            Binding::Multibinding(b) => format!("{} (multibinding)", b.type_key.readable()),
            Binding::BoundInstance(b) => {
                format!("{} (bound instance)", b.type_key.readable())
            }
            Binding::GraphDependency(b) => format!(
                "{} (graph dependency on {})",
                b.type_key.readable(),
                b.owner_key.readable()
            ),
            Binding::GraphExtension(b) => {
                format!("{} (graph extension)", b.type_key.readable())
            }
            Binding::MembersInjected(b) => format!(
                "{} (member injection)",
                b.target_class.canonical_string_path()
            ),
            Binding::ObjectClass(b) => {
                format!("{} (object)", b.class.canonical_string_path())
            }
            Binding::Absent(b) => format!("{} (absent)", b.type_key.readable()),
        }
    }

    pub fn as_multibinding(&self) -> Option<&MultibindingBinding> {
        match self {
            Binding::Multibinding(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_multibinding_mut(&mut self) -> Option<&mut MultibindingBinding> {
        match self {
            Binding::Multibinding(b) => Some(b),
            _ => None,
        }
    }

    /// Multibindings and sentinels never enter the similar-binding pool.
    pub fn eligible_for_similarity(&self) -> bool {
        !matches!(self, Binding::Multibinding(_) | Binding::Absent(_))
    }
}
