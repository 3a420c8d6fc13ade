// SPDX-License-Identifier: Apache-2.0

//! GraphQL side of permission propagation: recovering document text from
//! query modules and reducing documents to relation trees.

pub mod extract;
pub mod source;

pub use extract::{extract, extract_with, FragmentPolicy, BY_PK_SUFFIX};
pub use source::{graphql_source, SourceKind};
