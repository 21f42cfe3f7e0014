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

//! Shared data model for the ravel binding-graph resolver: the frontend's
//! projection of graph classes, canonical type identities, and cross-unit
//! graph metadata.

pub mod keys;
pub mod manifest;
pub mod metadata;
pub mod type_data;
