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

mod support;

use ravel_common::manifest::GraphManifest;
use ravel_resolver::DiagnosticKind;
use support::*;

fn scoped_manifest(graph_scope: Option<&str>) -> GraphManifest {
    let mut my_graph = graph("sample::MyGraph");
    if let Some(scope) = graph_scope {
        my_graph.annotation.scope = Some(t(scope));
    }
    accessor(&mut my_graph, "message", string_type());
    install(&mut my_graph, "sample::Mod");

    let mut scoped = provides("sample::Mod", "provide_message", string_type(), vec![]);
    scoped.scope = Some(t("sample::AppScope"));

    let mut manifest = GraphManifest::new();
    manifest
        .binding_containers
        .push(container("sample::Mod", vec![scoped]));
    manifest.graphs.push(my_graph);
    manifest
}

#[test]
fn scoped_binding_on_an_unscoped_graph_is_rejected() {
    let fixture = Fixture::new(scoped_manifest(None));
    assert!(fixture.resolve(&t("sample::MyGraph")).is_err());

    let reports = fixture.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, DiagnosticKind::IncompatiblyScopedBinding);
    assert!(reports[0].message.contains("sample::AppScope"));
    assert!(reports[0].message.contains("requested by"));
}

#[test]
fn matching_graph_scope_accepts_the_binding() {
    let fixture = Fixture::new(scoped_manifest(Some("sample::AppScope")));
    let sealed = fixture.resolve(&t("sample::MyGraph")).unwrap();
    assert_eq!(
        renders(&sealed.result.sorted_keys),
        vec!["::std::string::String"]
    );
    assert!(fixture.reports().is_empty());
}

#[test]
fn extension_sharing_an_ancestor_scope_is_rejected() {
    let mut parent = graph("sample::ParentGraph");
    parent.annotation.scope = Some(t("sample::AppScope"));
    parent.annotation.is_extendable = true;

    let mut child = graph("sample::ChildGraph");
    child.annotation.is_extension = true;
    child.annotation.scope = Some(t("sample::AppScope"));
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
        DiagnosticKind::OverlappingAncestorScope
    );
}
