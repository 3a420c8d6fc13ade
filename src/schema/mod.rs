// SPDX-License-Identifier: Apache-2.0

//! Hasura GraphQL endpoint access: type introspection and the role table.

mod client;

pub use client::{HasuraSchemaClient, RemoteRole};
