// SPDX-License-Identifier: Apache-2.0

//! Metadata persistence
//!
//! The Hasura project checkout is the store: table records and the actions
//! list are read and written in place.

mod yaml;

pub use yaml::YamlMetadataStore;
