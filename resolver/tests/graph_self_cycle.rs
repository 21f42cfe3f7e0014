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
use ravel_resolver::DiagnosticKind;
use support::*;

#[test]
fn creator_including_the_graph_itself_is_rejected() {
    let mut loop_graph = graph("sample::LoopGraph");
    loop_graph.creator = Some(CreatorSpec {
        type_data: t("sample::LoopGraphFactory"),
        kind: CreatorKind::FactoryMethod("create".to_owned()),
        parameters: vec![CreatorParameter {
            name: "graph".to_owned(),
            type_data: t("sample::LoopGraph"),
            includes: true,
            ..Default::default()
        }],
    });

    let mut manifest = GraphManifest::new();
    manifest.graphs.push(loop_graph);

    let fixture = Fixture::new(manifest);
    assert!(fixture.resolve(&t("sample::LoopGraph")).is_err());

    let reports = fixture.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, DiagnosticKind::GraphSelfCycle);
}
