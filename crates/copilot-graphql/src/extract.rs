// SPDX-License-Identifier: Apache-2.0

//! Relation tree extraction.
//!
//! Reduces an executable document to the fields that carry sub-selections,
//! starting from the first field of the first operation. Fragment spreads are
//! inlined; scalar fields disappear.

use std::collections::HashMap;

use graphql_parser::query::{
    Definition, Document, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
};
use tracing::warn;

use copilot_core::{CopilotError, CopilotResult, RelationNode};

/// Suffix Hasura appends to primary-key lookup root fields
pub const BY_PK_SUFFIX: &str = "_by_pk";

/// How a fragment spread combines with the selections already collected at
/// the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentPolicy {
    /// The spread's relations replace everything collected so far at that
    /// level; fields listed after the spread are still appended. This is the
    /// long-standing behavior of the tool.
    #[default]
    LastWins,
    /// The spread's relations are appended like any other selection.
    Merge,
}

/// Extracts the relation tree with the default fragment policy.
pub fn extract(document: &Document<'_, String>) -> CopilotResult<RelationNode> {
    extract_with(document, FragmentPolicy::default())
}

/// Extracts the relation tree rooted at the operation's first field.
pub fn extract_with(
    document: &Document<'_, String>,
    policy: FragmentPolicy,
) -> CopilotResult<RelationNode> {
    let operation = document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .ok_or_else(|| CopilotError::invalid_document("no operation definition found"))?;

    let root = operation_selections(operation)
        .items
        .first()
        .ok_or_else(|| CopilotError::invalid_document("operation has an empty selection set"))?;

    let Selection::Field(root) = root else {
        return Err(CopilotError::invalid_document(
            "the first selection of the operation must be a field",
        ));
    };

    let builder = TreeBuilder {
        fragments: document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect(),
        policy,
    };

    let mut active = Vec::new();
    let relations = builder.relations(&root.selection_set.items, &mut active);
    let name = root
        .name
        .strip_suffix(BY_PK_SUFFIX)
        .unwrap_or(root.name.as_str());

    Ok(RelationNode::new(name, relations))
}

fn operation_selections<'d, 'a>(
    operation: &'d OperationDefinition<'a, String>,
) -> &'d SelectionSet<'a, String> {
    match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(query) => &query.selection_set,
        OperationDefinition::Mutation(mutation) => &mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &subscription.selection_set,
    }
}

struct TreeBuilder<'d, 'a> {
    fragments: HashMap<&'d str, &'d FragmentDefinition<'a, String>>,
    policy: FragmentPolicy,
}

impl<'d, 'a> TreeBuilder<'d, 'a> {
    /// `active` holds the fragments being expanded, so a self-referencing
    /// spread terminates instead of recursing forever.
    fn relations(
        &self,
        items: &'d [Selection<'a, String>],
        active: &mut Vec<&'d str>,
    ) -> Vec<RelationNode> {
        let mut result = Vec::new();

        for selection in items {
            match selection {
                Selection::Field(field) => {
                    if field.selection_set.items.is_empty() {
                        continue;
                    }
                    let relations = self.relations(&field.selection_set.items, active);
                    result.push(RelationNode::new(field.name.clone(), relations));
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    let Some(&fragment) = self.fragments.get(name) else {
                        warn!(fragment = name, "Skipping spread of undefined fragment");
                        continue;
                    };
                    if active.contains(&name) {
                        warn!(fragment = name, "Skipping recursive fragment spread");
                        continue;
                    }

                    active.push(name);
                    let inlined = self.relations(&fragment.selection_set.items, active);
                    active.pop();

                    match self.policy {
                        FragmentPolicy::LastWins => result = inlined,
                        FragmentPolicy::Merge => result.extend(inlined),
                    }
                }
                Selection::InlineFragment(inline) => {
                    result.extend(self.relations(&inline.selection_set.items, active));
                }
            }
        }

        result
    }
}
