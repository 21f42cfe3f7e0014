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
use ravel_resolver::context::NoopIcObserver;
use ravel_resolver::{
    BindingGraphBuilder, BindingLookup, Diagnostics, GraphNodeCache, ResolverContext,
    ResolverOptions,
};
use support::*;

fn fixture() -> Fixture {
    let mut my_graph = graph("sample::MyGraph");
    accessor(&mut my_graph, "zeta", t("sample::Zeta"));
    accessor(&mut my_graph, "alpha", t("sample::Alpha"));
    accessor(&mut my_graph, "mid", t("sample::Mid"));
    install(&mut my_graph, "sample::Mod");

    let mut manifest = GraphManifest::new();
    manifest.binding_containers.push(container(
        "sample::Mod",
        vec![
            provides("sample::Mod", "provide_zeta", t("sample::Zeta"), vec![t("sample::Mid")]),
            provides("sample::Mod", "provide_alpha", t("sample::Alpha"), vec![t("sample::Mid")]),
            provides("sample::Mod", "provide_mid", t("sample::Mid"), vec![string_type()]),
            provides("sample::Mod", "provide_message", string_type(), vec![]),
        ],
    ));
    manifest.graphs.push(my_graph);
    Fixture::new(manifest)
}

#[test]
fn identical_inputs_produce_identical_orders() {
    let first = fixture();
    let second = fixture();
    let first_sealed = first.resolve(&t("sample::MyGraph")).unwrap();
    let second_sealed = second.resolve(&t("sample::MyGraph")).unwrap();

    assert_eq!(
        renders(&first_sealed.result.sorted_keys),
        renders(&second_sealed.result.sorted_keys)
    );
    assert_eq!(
        renders(&first_sealed.result.deferred_types),
        renders(&second_sealed.result.deferred_types)
    );
    assert!(first.reports().is_empty());
    assert!(second.reports().is_empty());
}

#[test]
fn resealing_a_frozen_graph_is_idempotent() {
    let fixture = fixture();
    let ic_observer = NoopIcObserver;
    let diagnostics = Diagnostics::new();
    let ctx = ResolverContext {
        specs: &fixture.manifest,
        contributions: &fixture.manifest,
        class_factories: &fixture.factories,
        members_injectors: &fixture.members,
        ic_observer: &ic_observer,
        diagnostics: &diagnostics,
        options: ResolverOptions::default(),
    };
    let cache = GraphNodeCache::new();
    let node = cache.node_for(&t("sample::MyGraph"), &ctx).unwrap();
    let lookup = BindingLookup::new(&ctx, t("sample::MyGraph"), None);
    let mut graph = BindingGraphBuilder::seed(&ctx, &lookup, node).unwrap();

    let first = graph.seal(&ctx, &lookup).unwrap();
    let second = graph.seal(&ctx, &lookup).unwrap();
    assert_eq!(
        renders(&first.result.sorted_keys),
        renders(&second.result.sorted_keys)
    );
    assert_eq!(first.result.reachable_keys, second.result.reachable_keys);
    assert_eq!(
        renders(&first.result.deferred_types),
        renders(&second.result.deferred_types)
    );
}
