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

mod support;

use ravel_common::manifest::{CreatorKind, CreatorParameter, CreatorSpec, GraphManifest};
use ravel_resolver::bindings::binding::{Binding, GraphDependencyAccess};
use support::*;

#[test]
fn parent_keys_materialize_as_field_backed_graph_dependencies() {
    let mut parent = graph("sample::ParentGraph");
    parent.annotation.is_extendable = true;
    parent.creator = Some(CreatorSpec {
        type_data: t("sample::ParentGraphFactory"),
        kind: CreatorKind::FactoryMethod("create".to_owned()),
        parameters: vec![CreatorParameter {
            name: "config".to_owned(),
            type_data: t("sample::Config"),
            binds_instance: true,
            ..Default::default()
        }],
    });
    accessor(&mut parent, "config", t("sample::Config"));

    let mut child = graph("sample::ChildGraph");
    child.annotation.is_extension = true;
    child.parent = Some(t("sample::ParentGraph"));
    accessor(&mut child, "config", t("sample::Config"));

    let mut manifest = GraphManifest::new();
    manifest.graphs.push(parent);
    manifest.graphs.push(child);

    let fixture = Fixture::new(manifest);
    let sealed = fixture.resolve_all().unwrap();
    let child_sealed = sealed
        .iter()
        .find(|graph| graph.graph_key.readable() == "::sample::ChildGraph")
        .unwrap();

    let config_key = key("sample::Config");
    match child_sealed.bindings.get(&config_key) {
        Some(Binding::GraphDependency(dependency)) => {
            assert_eq!(dependency.owner_key.readable(), "::sample::ParentGraph");
            match &dependency.access {
                GraphDependencyAccess::Field(field) => {
                    assert_eq!(field.owner, t("sample::ParentGraph"));
                    assert!(field.name.ends_with("_provider"));
                }
                other => panic!("expected a field access, got {:?}", other),
            }
        }
        other => panic!("expected a graph dependency, got {:?}", other),
    }
    // The consumed parent key reserved exactly one field.
    assert_eq!(child_sealed.reserved_fields.len(), 1);
    assert!(child_sealed.reserved_fields.contains_key(&config_key));
    // The parent instance itself is supplied to the extension's constructor.
    assert!(matches!(
        child_sealed.bindings.get(&key("sample::ParentGraph")),
        Some(Binding::BoundInstance(_))
    ));
    assert!(fixture.reports().is_empty());
}

#[test]
fn extending_a_non_extendable_parent_is_rejected() {
    let parent = graph("sample::ParentGraph");

    let mut child = graph("sample::ChildGraph");
    child.annotation.is_extension = true;
    child.parent = Some(t("sample::ParentGraph"));

    let mut manifest = GraphManifest::new();
    manifest.graphs.push(parent);
    manifest.graphs.push(child);

    let fixture = Fixture::new(manifest);
    assert!(fixture.resolve_all().is_err());
    let reports = fixture.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].kind,
        ravel_resolver::DiagnosticKind::NonExtendableParent
    );
}
