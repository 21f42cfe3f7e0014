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

use ravel_common::keys::TypeKey;
use ravel_common::manifest::{GraphManifest, MultibindingMapKey, MultibindingType};
use support::*;

#[test]
fn map_contributions_assemble_with_a_provider_valued_sibling() {
    let mut my_graph = graph("sample::MyGraph");
    accessor(
        &mut my_graph,
        "handlers",
        map_of(string_type(), t("sample::Handler")),
    );
    install(&mut my_graph, "sample::Handlers");

    let mut first = provides("sample::Handlers", "provide_get", t("sample::Handler"), vec![]);
    first.multibinding_type = MultibindingType::IntoMap;
    first.map_key = MultibindingMapKey::String("get".to_owned());
    let mut second = provides("sample::Handlers", "provide_post", t("sample::Handler"), vec![]);
    second.multibinding_type = MultibindingType::IntoMap;
    second.map_key = MultibindingMapKey::String("post".to_owned());

    let mut manifest = GraphManifest::new();
    manifest
        .binding_containers
        .push(container("sample::Handlers", vec![first, second]));
    manifest.graphs.push(my_graph);

    let fixture = Fixture::new(manifest);
    let sealed = fixture.resolve(&t("sample::MyGraph")).unwrap();

    let map_key = TypeKey::new(map_of(string_type(), t("sample::Handler")));
    let multibinding = sealed
        .bindings
        .get(&map_key)
        .and_then(|binding| binding.as_multibinding())
        .unwrap();
    assert!(multibinding.is_map);
    assert_eq!(multibinding.source_bindings.len(), 2);

    let sibling_key = TypeKey::new(map_of(string_type(), provider_of(t("sample::Handler"))));
    let sibling = sealed
        .bindings
        .get(&sibling_key)
        .and_then(|binding| binding.as_multibinding())
        .unwrap();
    assert!(sibling.provider_values);
    assert_eq!(sibling.source_bindings.len(), 2);

    // Contributions come before the assembled map.
    assert_eq!(sealed.result.sorted_keys.last().unwrap(), &map_key);
}
