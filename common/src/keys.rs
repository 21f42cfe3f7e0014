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

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lazy_static::lazy_static;
use md5::{Digest, Md5};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::type_data::TypeData;

/// Marker path for provider-wrapped requests.
pub const PROVIDER_PATH: &str = "ravel::Provider";
/// Marker path for lazily materialized requests.
pub const LAZY_PATH: &str = "ravel::Lazy";
/// Marker path wrapping member-injector request keys.
pub const MEMBERS_INJECTOR_PATH: &str = "ravel::MembersInjector";

lazy_static! {
    /// Framework wrapper types recognized by the request decoder.
    static ref WRAPPERS: HashMap<&'static str, WrappingKind> = {
        let mut m = HashMap::new();
        m.insert(PROVIDER_PATH, WrappingKind::Provider);
        m.insert(LAZY_PATH, WrappingKind::Lazy);
        m
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrappingKind {
    Direct,
    Provider,
    Lazy,
    ProviderOfLazy,
}

impl Default for WrappingKind {
    fn default() -> Self {
        WrappingKind::Direct
    }
}

/// Canonical `(type, qualifier)` identity of a binding request.
///
/// Identity and ordering go through the canonical render string, which is
/// stable across runs.
#[derive(Debug, Clone, Eq)]
pub struct TypeKey {
    type_data: TypeData,
    rendered: String,
}

impl TypeKey {
    pub fn new(type_data: TypeData) -> Self {
        let canonical = type_data.canonicalize();
        let rendered = canonical.identity_string();
        TypeKey {
            type_data: canonical,
            rendered,
        }
    }

    pub fn type_data(&self) -> &TypeData {
        &self.type_data
    }

    pub fn qualifier(&self) -> Option<&TypeData> {
        self.type_data.qualifier.as_deref()
    }

    /// The canonical render; total-ordered and deterministic.
    pub fn readable(&self) -> &str {
        &self.rendered
    }

    pub fn render(&self, short: bool, include_qualifier: bool) -> String {
        let body = if short {
            short_render(&self.type_data)
        } else {
            self.type_data.canonical_string_path()
        };
        match (include_qualifier, self.qualifier()) {
            (true, Some(qualifier)) => format!(
                "#[qualified({})] {}",
                if short {
                    short_render(qualifier)
                } else {
                    qualifier.canonical_string_path()
                },
                body
            ),
            _ => body,
        }
    }

    /// Stable external accessor name: `accessor_` + base64(md5(render)).
    ///
    /// The digest is truncated by construction; collisions are accepted
    /// rather than defended against.
    pub fn accessor_name(&self) -> String {
        let digest = Md5::digest(self.rendered.as_bytes());
        format!(
            "accessor_{}",
            URL_SAFE_NO_PAD.encode(digest).replace('-', "_")
        )
    }

    pub fn provider_accessor_name(&self) -> String {
        format!("{}_provider", self.accessor_name())
    }

    /// The same key with the qualifier removed, when one is present.
    pub fn without_qualifier(&self) -> Option<TypeKey> {
        if self.type_data.qualifier.is_none() {
            return None;
        }
        let mut stripped = self.type_data.clone();
        stripped.qualifier = None;
        Some(TypeKey::new(stripped))
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.rendered.eq(&other.rendered)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state)
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rendered.cmp(&other.rendered)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn short_render(type_data: &TypeData) -> String {
    let name = type_data
        .path
        .rsplit("::")
        .next()
        .unwrap_or(type_data.path.as_str());
    if type_data.args.is_empty() {
        return name.to_owned();
    }
    let args = type_data
        .args
        .iter()
        .map(short_render)
        .collect::<Vec<String>>()
        .join(",");
    format!("{}<{}>", name, args)
}

/// A [`TypeKey`] together with how the request asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextualTypeKey {
    pub type_key: TypeKey,
    pub wrapping: WrappingKind,
    pub has_default: bool,
    pub assisted_identifier: Option<String>,
}

impl ContextualTypeKey {
    /// Decodes the wrapping kind from a declared request type. A qualifier on
    /// the wrapper rides along to the wrapped key.
    pub fn from_declared(declared: &TypeData) -> Self {
        let canonical = declared.canonicalize();
        let (wrapping, mut inner) = match WRAPPERS.get(canonical.path.as_str()) {
            Some(WrappingKind::Provider) if canonical.args.len() == 1 => {
                let wrapped = canonical.args[0].clone();
                if wrapped.path == LAZY_PATH && wrapped.args.len() == 1 {
                    (WrappingKind::ProviderOfLazy, wrapped.args[0].clone())
                } else {
                    (WrappingKind::Provider, wrapped)
                }
            }
            Some(WrappingKind::Lazy) if canonical.args.len() == 1 => {
                (WrappingKind::Lazy, canonical.args[0].clone())
            }
            _ => (WrappingKind::Direct, canonical.clone()),
        };
        if inner.qualifier.is_none() {
            inner.qualifier = canonical.qualifier.clone();
        }
        ContextualTypeKey {
            type_key: TypeKey::new(inner),
            wrapping,
            has_default: false,
            assisted_identifier: None,
        }
    }

    pub fn direct(type_key: TypeKey) -> Self {
        ContextualTypeKey {
            type_key,
            wrapping: WrappingKind::Direct,
            has_default: false,
            assisted_identifier: None,
        }
    }

    pub fn with_default(mut self, has_default: bool) -> Self {
        self.has_default = has_default;
        self
    }

    pub fn with_assisted(mut self, assisted_identifier: Option<String>) -> Self {
        self.assisted_identifier = assisted_identifier;
        self
    }

    /// True for requests satisfied through a provider instance rather than a
    /// direct value.
    pub fn requires_provider_instance(&self) -> bool {
        matches!(
            self.wrapping,
            WrappingKind::Provider | WrappingKind::ProviderOfLazy
        )
    }

    /// Deferrable requests may close a dependency cycle.
    pub fn is_deferrable(&self) -> bool {
        self.wrapping != WrappingKind::Direct
    }

    pub fn readable(&self) -> String {
        match self.wrapping {
            WrappingKind::Direct => self.type_key.readable().to_owned(),
            WrappingKind::Provider => format!("Provider<{}>", self.type_key.readable()),
            WrappingKind::Lazy => format!("Lazy<{}>", self.type_key.readable()),
            WrappingKind::ProviderOfLazy => {
                format!("Provider<Lazy<{}>>", self.type_key.readable())
            }
        }
    }
}

/// The key a member-injection request for `class` resolves through.
pub fn members_injector_key(class: &TypeData) -> TypeKey {
    TypeKey::new(TypeData::global(MEMBERS_INJECTOR_PATH).with_args(vec![class.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_of(inner: TypeData) -> TypeData {
        TypeData::global(PROVIDER_PATH).with_args(vec![inner])
    }

    fn lazy_of(inner: TypeData) -> TypeData {
        TypeData::global(LAZY_PATH).with_args(vec![inner])
    }

    #[test]
    fn decodes_direct_requests() {
        let key = ContextualTypeKey::from_declared(&TypeData::global("sample::Foo"));
        assert_eq!(key.wrapping, WrappingKind::Direct);
        assert!(!key.is_deferrable());
    }

    #[test]
    fn decodes_provider_requests() {
        let key = ContextualTypeKey::from_declared(&provider_of(TypeData::global("sample::Foo")));
        assert_eq!(key.wrapping, WrappingKind::Provider);
        assert!(key.requires_provider_instance());
        assert!(key.is_deferrable());
        assert_eq!(key.type_key.readable(), "::sample::Foo");
    }

    #[test]
    fn decodes_provider_of_lazy_requests() {
        let key = ContextualTypeKey::from_declared(&provider_of(lazy_of(TypeData::global(
            "sample::Foo",
        ))));
        assert_eq!(key.wrapping, WrappingKind::ProviderOfLazy);
        assert_eq!(key.type_key.readable(), "::sample::Foo");
    }

    #[test]
    fn lazy_requests_are_deferrable_but_not_provider_backed() {
        let key = ContextualTypeKey::from_declared(&lazy_of(TypeData::global("sample::Foo")));
        assert_eq!(key.wrapping, WrappingKind::Lazy);
        assert!(key.is_deferrable());
        assert!(!key.requires_provider_instance());
    }

    #[test]
    fn qualifier_on_wrapper_rides_to_wrapped_key() {
        let declared = provider_of(TypeData::global("sample::Foo"))
            .with_qualifier(TypeData::global("sample::Blue"));
        let key = ContextualTypeKey::from_declared(&declared);
        assert!(key.type_key.qualifier().is_some());
    }

    #[test]
    fn accessor_name_is_stable_and_distinct() {
        let foo = TypeKey::new(TypeData::global("sample::Foo"));
        let bar = TypeKey::new(TypeData::global("sample::Bar"));
        assert!(foo.accessor_name().starts_with("accessor_"));
        assert_eq!(foo.accessor_name(), foo.accessor_name());
        assert_ne!(foo.accessor_name(), bar.accessor_name());
        assert!(foo.provider_accessor_name().ends_with("_provider"));
    }

    #[test]
    fn ordering_follows_render() {
        let mut keys = vec![
            TypeKey::new(TypeData::global("sample::Zeta")),
            TypeKey::new(TypeData::global("sample::Alpha")),
        ];
        keys.sort();
        assert_eq!(keys[0].readable(), "::sample::Alpha");
    }

    #[test]
    fn short_render_drops_path_segments() {
        let key = TypeKey::new(
            TypeData::global("std::collections::HashMap").with_args(vec![
                TypeData::global("std::string::String"),
                TypeData::global("sample::Foo"),
            ]),
        );
        assert_eq!(key.render(true, false), "HashMap<String,Foo>");
    }
}
