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

use ravel_common::keys::TypeKey;
use ravel_common::manifest::GraphManifest;
use ravel_common::type_data::TypeData;
use ravel_resolver::bindings::binding::Binding;
use support::*;

#[test]
fn provider_satisfies_constructor_injection() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "foo", t("sample::Foo"));
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
        Fixture::new(manifest).with_factory(injectable(t("sample::Foo"), vec![string_type()]));
    let sealed = fixture.resolve(&t("sample::MyGraph")).unwrap();

    assert_eq!(
        renders(&sealed.result.sorted_keys),
        vec!["::std::string::String", "::sample::Foo"]
    );
    assert!(sealed.result.deferred_types.is_empty());
    assert_eq!(sealed.result.reachable_keys.len(), 2);
    assert!(matches!(
        sealed.bindings.get(&key("sample::Foo")),
        Some(Binding::ConstructorInjected(_))
    ));
    assert!(fixture.reports().is_empty());
}

#[test]
fn unused_bindings_stay_out_of_the_order() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "message", string_type());
    install(&mut my_graph, "sample::StringModule");

    let mut manifest = GraphManifest::new();
    manifest.binding_containers.push(container(
        "sample::StringModule",
        vec![
            provides("sample::StringModule", "provide_message", string_type(), vec![]),
            provides(
                "sample::StringModule",
                "provide_count",
                TypeData::primitive("i32"),
                vec![],
            ),
        ],
    ));
    manifest.graphs.push(my_graph);

    let fixture = Fixture::new(manifest);
    let sealed = fixture.resolve(&t("sample::MyGraph")).unwrap();

    assert_eq!(
        renders(&sealed.result.sorted_keys),
        vec!["::std::string::String"]
    );
    assert!(sealed
        .unused_keys
        .iter()
        .any(|unused| unused.readable() == "i32"));
    // The unused provider still has its binding unless shrinking is on.
    assert!(sealed
        .bindings
        .contains_key(&TypeKey::new(TypeData::primitive("i32"))));
}
