// SPDX-License-Identifier: Apache-2.0

// Propagation Engine
// Walks a query's relation tree and grants the role on every table it reaches

pub mod context;
pub mod walker;

pub use context::ContextResolver;
pub use walker::{WalkOptions, Walker};
