// SPDX-License-Identifier: Apache-2.0

//! Role permission merging
//!
//! Every update follows the same rule: drop whatever the role had, append the
//! new entry, then sort by role name so the written YAML diffs cleanly.

use crate::types::{ActionPermission, Context, PermissionRule, SelectPermission};

/// Upserts the propagated rule for `role`: all columns, aggregations allowed,
/// row filter derived from `context`.
pub fn merge_permission(
    existing: Vec<SelectPermission>,
    role: &str,
    context: Option<Context>,
) -> Vec<SelectPermission> {
    merge_permission_with(existing, role, PermissionRule::scoped(context, true))
}

/// Replaces any rule `role` holds with `rule`.
pub fn merge_permission_with(
    existing: Vec<SelectPermission>,
    role: &str,
    rule: PermissionRule,
) -> Vec<SelectPermission> {
    let mut merged: Vec<SelectPermission> =
        existing.into_iter().filter(|p| p.role != role).collect();
    merged.push(SelectPermission {
        role: role.to_string(),
        permission: rule,
    });
    // Stable: entries sharing a role name keep their relative order.
    merged.sort_by(|a, b| a.role.cmp(&b.role));
    merged
}

/// Same replace, insert and sort rule applied to an action's permission list.
pub fn merge_action_permission(
    existing: Vec<ActionPermission>,
    role: &str,
) -> Vec<ActionPermission> {
    let mut merged: Vec<ActionPermission> =
        existing.into_iter().filter(|p| p.role != role).collect();
    merged.push(ActionPermission {
        role: role.to_string(),
    });
    merged.sort_by(|a, b| a.role.cmp(&b.role));
    merged
}
