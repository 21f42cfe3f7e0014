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

use ravel_common::manifest::GraphManifest;
use ravel_resolver::bindings::binding::Binding;
use support::*;

#[test]
fn extension_accessor_seeds_an_extension_binding() {
    let mut parent = graph("sample::ParentGraph");
    accessor(&mut parent, "child", t("sample::ChildGraph"));

    let mut child = graph("sample::ChildGraph");
    child.annotation.is_extension = true;
    child.annotation.scope = Some(t("sample::ChildScope"));
    child.parent = Some(t("sample::ParentGraph"));

    let mut manifest = GraphManifest::new();
    manifest.graphs.push(parent);
    manifest.graphs.push(child);

    let fixture = Fixture::new(manifest);
    let sealed = fixture.resolve(&t("sample::ParentGraph")).unwrap();

    match sealed.bindings.get(&key("sample::ChildGraph")) {
        Some(Binding::GraphExtension(extension)) => {
            assert_eq!(extension.accessor.name, "child");
            assert_eq!(extension.scopes, vec![t("sample::ChildScope")]);
        }
        other => panic!("expected a graph extension binding, got {:?}", other),
    }
    // Kept alive even though extension accessors are not plain requests.
    assert!(sealed
        .result
        .reachable_keys
        .contains(&key("sample::ChildGraph")));
    assert_eq!(
        renders(&sealed.result.sorted_keys),
        vec!["::sample::ParentGraph", "::sample::ChildGraph"]
    );
}
