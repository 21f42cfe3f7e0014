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

use ravel_common::manifest::{GraphManifest, MultibindingType};
use ravel_resolver::DiagnosticKind;
use support::*;

#[test]
fn empty_set_without_allow_empty_is_rejected() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "things", set_of(t("sample::Thing")));
    install(&mut my_graph, "sample::Contributions");

    let mut into_set = provides("sample::Contributions", "provide_other", t("sample::Other"), vec![]);
    into_set.multibinding_type = MultibindingType::IntoSet;

    let mut manifest = GraphManifest::new();
    manifest
        .binding_containers
        .push(container("sample::Contributions", vec![into_set]));
    manifest.graphs.push(my_graph);

    let fixture = Fixture::new(manifest);
    assert!(fixture.resolve(&t("sample::MyGraph")).is_err());

    let reports = fixture.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, DiagnosticKind::EmptyMultibinding);
    assert!(reports[0]
        .message
        .contains("::std::collections::HashSet<::sample::Thing>"));
    // The populated set multibinding is listed as a similar one.
    assert!(reports[0]
        .message
        .contains("::std::collections::HashSet<::sample::Other>"));
}

#[test]
fn contributions_fill_the_set() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "things", set_of(t("sample::Thing")));
    install(&mut my_graph, "sample::Contributions");

    let mut first = provides("sample::Contributions", "provide_a", t("sample::Thing"), vec![]);
    first.multibinding_type = MultibindingType::IntoSet;
    let mut second = provides("sample::Contributions", "provide_b", t("sample::Thing"), vec![]);
    second.multibinding_type = MultibindingType::IntoSet;

    let mut manifest = GraphManifest::new();
    manifest
        .binding_containers
        .push(container("sample::Contributions", vec![first, second]));
    manifest.graphs.push(my_graph);

    let fixture = Fixture::new(manifest);
    let sealed = fixture.resolve(&t("sample::MyGraph")).unwrap();
    let set_key = ravel_common::keys::TypeKey::new(set_of(t("sample::Thing")));
    let multibinding = sealed
        .bindings
        .get(&set_key)
        .and_then(|binding| binding.as_multibinding())
        .unwrap();
    assert_eq!(multibinding.source_bindings.len(), 2);
    // The set comes after its two contributions in the order.
    assert_eq!(sealed.result.sorted_keys.last().unwrap(), &set_key);
}
