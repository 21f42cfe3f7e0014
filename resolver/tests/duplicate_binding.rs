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

#[test]
fn provider_and_binds_at_the_same_level_collide() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "message", string_type());
    binds(&mut my_graph, "bind_message", t("sample::BImpl"), string_type());
    install(&mut my_graph, "sample::StringModule");

    let mut manifest = GraphManifest::new();
    manifest.binding_containers.push(container(
        "sample::StringModule",
        vec![provides(
            "sample::StringModule",
            "provide_message",
            string_type(),
            vec![],
        )],
    ));
    manifest.graphs.push(my_graph);

    let fixture =
        Fixture::new(manifest).with_factory(injectable(t("sample::BImpl"), vec![]));
    assert!(fixture.resolve(&t("sample::MyGraph")).is_err());

    let reports = fixture.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, DiagnosticKind::DuplicateBinding);
    assert!(reports[0].message.contains("::std::string::String"));
    assert!(reports[0].message.contains("provide_message"));
    assert!(reports[0].message.contains("bind_message"));
}
