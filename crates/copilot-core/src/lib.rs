// SPDX-License-Identifier: Apache-2.0

//! Core types, collaborator traits and the pure parts of permission
//! propagation: relationship lookup and permission merging.

pub mod error;
pub mod permission;
pub mod relation;
pub mod traits;
pub mod types;

pub use error::{CopilotError, CopilotResult};
pub use permission::{merge_action_permission, merge_permission, merge_permission_with};
pub use relation::resolve_relation_target;
pub use traits::{DocumentLoader, MetadataStore, RecordHandle, SchemaService};
pub use types::*;
