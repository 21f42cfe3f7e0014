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

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;

use ravel_common::manifest::{BindingContainer, ContributedClass};
use ravel_common::type_data::{ClassId, TypeData};

use crate::context::ResolverContext;
use crate::diagnostics::Result;

/// Contributions merged for a scope set: classes become declared supertypes
/// of the aggregating graph, containers feed its callables.
#[derive(Debug, Default)]
pub struct AggregatedContributions {
    pub classes: Vec<ContributedClass>,
    pub containers: Vec<BindingContainer>,
}

/// Computes the contributed surface of an aggregating graph.
pub struct ContributedGraphGenerator<'a, 'b> {
    ctx: &'a ResolverContext<'b>,
    transitive_cache: RefCell<IndexMap<ClassId, Vec<BindingContainer>>>,
}

impl<'a, 'b> ContributedGraphGenerator<'a, 'b> {
    pub fn new(ctx: &'a ResolverContext<'b>) -> Self {
        ContributedGraphGenerator {
            ctx,
            transitive_cache: RefCell::new(IndexMap::new()),
        }
    }

    pub fn aggregate(
        &self,
        scopes: &[TypeData],
        excludes: &[TypeData],
        rank_interop: bool,
    ) -> Result<AggregatedContributions> {
        let mut classes: IndexMap<ClassId, ContributedClass> = IndexMap::new();
        let mut containers: IndexMap<ClassId, BindingContainer> = IndexMap::new();
        for scope in scopes {
            for contribution in self.ctx.contributions.contributed_classes(scope) {
                classes
                    .entry(contribution.type_data.class_id())
                    .or_insert(contribution);
            }
            for container in self.ctx.contributions.contributed_containers(scope) {
                containers
                    .entry(container.type_data.class_id())
                    .or_insert(container);
            }
        }

        // Merged across scopes: order by class id so two runs agree.
        let mut classes: Vec<ContributedClass> = classes.into_values().collect();
        classes.sort_by_key(|contribution| contribution.type_data.class_id());
        let mut containers: Vec<BindingContainer> = containers.into_values().collect();
        containers.sort_by_key(|container| container.type_data.class_id());

        let excluded: Vec<ClassId> = excludes.iter().map(TypeData::class_id).collect();
        classes.retain(|contribution| !excluded.contains(&contribution.type_data.class_id()));
        containers.retain(|container| !excluded.contains(&container.type_data.class_id()));

        let replaced: Vec<ClassId> = containers
            .iter()
            .flat_map(|container| container.replaces.iter().map(TypeData::class_id))
            .collect();
        classes.retain(|contribution| !replaced.contains(&contribution.type_data.class_id()));

        if rank_interop {
            classes = keep_max_rank(classes);
        }

        Ok(AggregatedContributions {
            classes,
            containers,
        })
    }

    /// The transitive closure of the containers' `includes`, cycle-safe.
    pub fn resolve_transitive_includes(
        &self,
        roots: &[BindingContainer],
    ) -> Result<Vec<BindingContainer>> {
        let mut result: IndexMap<ClassId, BindingContainer> = IndexMap::new();
        for root in roots {
            for container in self.closure_of(root)? {
                result
                    .entry(container.type_data.class_id())
                    .or_insert(container);
            }
        }
        Ok(result.into_values().collect())
    }

    fn closure_of(&self, root: &BindingContainer) -> Result<Vec<BindingContainer>> {
        let id = root.type_data.class_id();
        if let Some(cached) = self.transitive_cache.borrow().get(&id) {
            return Ok(cached.clone());
        }
        let mut visited: IndexMap<ClassId, BindingContainer> = IndexMap::new();
        visited.insert(id.clone(), root.clone());
        let mut work: Vec<TypeData> = root.includes.clone();
        let mut i = 0;
        while i < work.len() {
            let class = work[i].clone();
            i += 1;
            if visited.contains_key(&class.class_id()) {
                continue;
            }
            let container = match self.ctx.contributions.container_for(&class) {
                Some(container) => container,
                None => {
                    return self.ctx.diagnostics.compiler_bug(
                        None,
                        format!("unknown included binding container {}", class.readable()),
                    )
                }
            };
            work.extend(container.includes.iter().cloned());
            visited.insert(class.class_id(), container);
        }
        let closure: Vec<BindingContainer> = visited.into_values().collect();
        self.transitive_cache
            .borrow_mut()
            .insert(id, closure.clone());
        Ok(closure)
    }
}

/// Rank-based interop: per bound key, only the highest-ranked contributions
/// survive.
fn keep_max_rank(classes: Vec<ContributedClass>) -> Vec<ContributedClass> {
    let mut max_by_key: HashMap<String, i64> = HashMap::new();
    for contribution in &classes {
        let key = rank_group_key(contribution);
        let entry = max_by_key.entry(key).or_insert(contribution.rank);
        if contribution.rank > *entry {
            *entry = contribution.rank;
        }
    }
    classes
        .into_iter()
        .filter(|contribution| {
            max_by_key
                .get(&rank_group_key(contribution))
                .map(|max| contribution.rank == *max)
                .unwrap_or(true)
        })
        .collect()
}

fn rank_group_key(contribution: &ContributedClass) -> String {
    contribution
        .bound_type
        .as_ref()
        .unwrap_or(&contribution.type_data)
        .identity_string()
}
