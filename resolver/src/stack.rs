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

use ravel_common::keys::{ContextualTypeKey, TypeKey};
use ravel_common::manifest::Declaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RequestedAt,
    InjectedAt,
    SimpleTypeRef,
    GeneratedExtensionAt,
}

/// One request frame: what is being resolved and where the request came from.
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub context_key: ContextualTypeKey,
    pub declaration: Option<Declaration>,
    pub kind: EntryKind,
}

impl StackEntry {
    pub fn requested_at(context_key: ContextualTypeKey, declaration: Option<Declaration>) -> Self {
        StackEntry {
            context_key,
            declaration,
            kind: EntryKind::RequestedAt,
        }
    }

    pub fn injected_at(context_key: ContextualTypeKey, declaration: Option<Declaration>) -> Self {
        StackEntry {
            context_key,
            declaration,
            kind: EntryKind::InjectedAt,
        }
    }

    fn describe(&self) -> String {
        let origin = self
            .declaration
            .as_ref()
            .map(|declaration| format!(" [{}]", declaration.readable()))
            .unwrap_or_default();
        match self.kind {
            EntryKind::RequestedAt => format!("{}{}", self.context_key.readable(), origin),
            EntryKind::InjectedAt => {
                format!("{} (member injection){}", self.context_key.readable(), origin)
            }
            EntryKind::SimpleTypeRef => {
                format!("{} (type reference){}", self.context_key.readable(), origin)
            }
            EntryKind::GeneratedExtensionAt => {
                format!("{} (graph extension){}", self.context_key.readable(), origin)
            }
        }
    }
}

/// Cycle-and-context-aware stack of request frames. Lives for one resolution
/// phase; every error message renders a snapshot of it.
#[derive(Debug)]
pub struct BindingStack {
    graph: String,
    entries: Vec<StackEntry>,
}

impl BindingStack {
    pub fn new(graph: &str) -> Self {
        BindingStack {
            graph: graph.to_owned(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) {
        self.entries.pop();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The open frame for `key`, when the request is already in flight.
    pub fn entry_for(&self, key: &TypeKey) -> Option<&StackEntry> {
        self.entries
            .iter()
            .find(|entry| entry.context_key.type_key.eq(key))
    }

    /// Readable request chain, most recent request first, the graph at the
    /// root.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for entry in self.entries.iter().rev() {
            lines.push(entry.describe());
        }
        lines.push(self.graph.clone());
        lines.join("\nrequested by: ")
    }

    /// Draws the cycle closed by re-requesting `key`, in the style
    ///
    /// ```text
    /// *-> ::sample::Foo
    /// |   ::sample::Bar
    /// *-- ::sample::Foo
    /// ```
    pub fn render_cycle(&self, key: &TypeKey) -> String {
        let start = self
            .entries
            .iter()
            .position(|entry| entry.context_key.type_key.eq(key))
            .unwrap_or(0);
        let mut s = String::new();
        for (i, entry) in self.entries.iter().enumerate().skip(start) {
            if i == start {
                s.push_str(&format!("*-> {}\n", entry.describe()));
            } else {
                s.push_str(&format!("|   {}\n", entry.describe()));
            }
        }
        s.push_str(&format!("*-- {}\n", key.readable()));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_common::type_data::TypeData;

    fn entry(path: &str) -> StackEntry {
        StackEntry::requested_at(
            ContextualTypeKey::direct(TypeKey::new(TypeData::global(path))),
            None,
        )
    }

    #[test]
    fn renders_chain_with_graph_at_root() {
        let mut stack = BindingStack::new("::sample::MyGraph");
        stack.push(entry("sample::Foo"));
        stack.push(entry("sample::Bar"));
        let rendered = stack.render();
        assert_eq!(
            rendered,
            "::sample::Bar\nrequested by: ::sample::Foo\nrequested by: ::sample::MyGraph"
        );
    }

    #[test]
    fn entry_for_finds_in_flight_requests() {
        let mut stack = BindingStack::new("::sample::MyGraph");
        stack.push(entry("sample::Foo"));
        let key = TypeKey::new(TypeData::global("sample::Foo"));
        assert!(stack.entry_for(&key).is_some());
        stack.pop();
        assert!(stack.entry_for(&key).is_none());
    }

    #[test]
    fn cycle_rendering_marks_the_loop() {
        let mut stack = BindingStack::new("::sample::MyGraph");
        stack.push(entry("sample::Foo"));
        stack.push(entry("sample::Bar"));
        let key = TypeKey::new(TypeData::global("sample::Foo"));
        let art = stack.render_cycle(&key);
        assert!(art.starts_with("*-> ::sample::Foo"));
        assert!(art.contains("|   ::sample::Bar"));
        assert!(art.ends_with("*-- ::sample::Foo\n"));
    }
}
