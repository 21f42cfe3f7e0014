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

use crate::manifest::TypeRoot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Structural description of a type as projected by the frontend.
///
/// Equality, hashing, and ordering all go through the canonical render, so
/// attribute annotations (and their ordering) never split two otherwise
/// identical types into phantom duplicates.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Eq)]
pub struct TypeData {
    pub root: TypeRoot,
    pub path: String,
    pub field_crate: String,
    pub args: Vec<TypeData>,
    pub trait_object: bool,
    pub field_ref: bool,
    /// Attribute annotations attached to the type by the frontend. Stripped by
    /// [`TypeData::canonicalize`]; never part of the identity.
    pub annotations: Vec<TypeData>,
    pub qualifier: Option<Box<TypeData>>,
}

impl PartialEq for TypeData {
    fn eq(&self, other: &Self) -> bool {
        self.identity_string().eq(&other.identity_string())
    }
}

impl Hash for TypeData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_string().hash(state)
    }
}

impl TypeData {
    pub fn new() -> Self {
        Default::default()
    }

    /// A type rooted at the global namespace, e.g. `std::string::String`.
    pub fn global(path: &str) -> Self {
        TypeData {
            root: TypeRoot::GLOBAL,
            path: path.to_owned(),
            ..Default::default()
        }
    }

    /// A primitive with no path, e.g. `i32`.
    pub fn primitive(path: &str) -> Self {
        TypeData {
            root: TypeRoot::PRIMITIVE,
            path: path.to_owned(),
            ..Default::default()
        }
    }

    /// A type rooted at a named crate.
    pub fn crate_rooted(field_crate: &str, path: &str) -> Self {
        TypeData {
            root: TypeRoot::CRATE,
            path: path.to_owned(),
            field_crate: field_crate.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<TypeData>) -> Self {
        self.args = args;
        self
    }

    pub fn with_qualifier(mut self, qualifier: TypeData) -> Self {
        self.qualifier = Some(Box::new(qualifier));
        self
    }

    /// Full path of the type in universal form ($CRATE always resolved)
    ///
    /// Modifiers like & are omitted
    pub fn canonical_string_path(&self) -> String {
        let prefix = self.get_prefix();
        match self.root {
            TypeRoot::GLOBAL => format!("{}::{}", prefix, self.path_with_args()),
            TypeRoot::CRATE => {
                format!(
                    "{}::{}::{}",
                    prefix,
                    self.field_crate,
                    self.path_with_args()
                )
            }
            TypeRoot::PRIMITIVE => format!("{}{}", prefix, self.path),
            TypeRoot::UNSPECIFIED => panic!("canonical_string_path: root unspecified"),
        }
    }

    pub fn canonical_string_path_without_args(&self) -> String {
        let prefix = self.get_prefix();
        match self.root {
            TypeRoot::GLOBAL => format!("{}::{}", prefix, self.path),
            TypeRoot::CRATE => format!("{}::{}::{}", prefix, self.field_crate, self.path),
            TypeRoot::PRIMITIVE => format!("{}{}", prefix, self.path),
            TypeRoot::UNSPECIFIED => panic!("canonical_string_path: root unspecified"),
        }
    }

    fn get_prefix(&self) -> String {
        let mut prefix = String::new();
        if self.field_ref {
            prefix.push_str("& ");
        }
        if self.trait_object {
            prefix.push_str("dyn ");
        }
        prefix
    }

    /// Identity string used for equality and hashing. Includes the qualifier,
    /// excludes annotations.
    pub fn identity_string(&self) -> String {
        let prefix = self
            .qualifier
            .as_ref()
            .map(|qualifier| format!("[{}] ", qualifier.identity_string()))
            .unwrap_or_default();
        format!("{}{}", prefix, self.canonical_string_path())
    }

    /// Human readable form.
    pub fn readable(&self) -> String {
        let mut prefix = String::new();
        if let Some(ref qualifier) = self.qualifier {
            prefix.push_str(&format!("#[qualified({})] ", qualifier.readable()));
        }
        format!("{}{}", prefix, self.canonical_string_path())
    }

    /// Strips attribute annotations recursively, preserving the qualifier and
    /// the generic argument shape.
    pub fn canonicalize(&self) -> TypeData {
        TypeData {
            root: self.root.clone(),
            path: self.path.clone(),
            field_crate: self.field_crate.clone(),
            args: self.args.iter().map(TypeData::canonicalize).collect(),
            trait_object: self.trait_object,
            field_ref: self.field_ref,
            annotations: Vec::new(),
            qualifier: self
                .qualifier
                .as_ref()
                .map(|qualifier| Box::new(qualifier.canonicalize())),
        }
    }

    /// Identity of the declaring class, generic arguments ignored.
    pub fn class_id(&self) -> ClassId {
        ClassId(self.canonical_string_path_without_args())
    }

    fn path_with_args(&self) -> String {
        if self.args.is_empty() {
            return self.path.clone();
        }
        let args = self
            .args
            .iter()
            .map(TypeData::canonical_string_path)
            .collect::<Vec<String>>()
            .join(",");
        format!("{}<{}>", self.path, args)
    }
}

impl fmt::Display for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.readable())
    }
}

/// Canonical identity of a class, stable across compilation units.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub String);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
