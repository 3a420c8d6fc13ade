// SPDX-License-Identifier: Apache-2.0

//! Relationship target lookup

use crate::types::{Relationship, TableRef};

/// Resolves the table a relation field points to.
///
/// Object relationships are searched before array relationships. A matching
/// relationship that names no remote table (a foreign key on a local column)
/// resolves to `None`, the same as no match at all.
pub fn resolve_relation_target<'a>(
    name: &str,
    object_relationships: &'a [Relationship],
    array_relationships: &'a [Relationship],
) -> Option<&'a TableRef> {
    find_target(name, object_relationships).or_else(|| find_target(name, array_relationships))
}

fn find_target<'a>(name: &str, relationships: &'a [Relationship]) -> Option<&'a TableRef> {
    let found = relationships.iter().find(|r| r.name == name)?;
    let using = &found.using;
    using
        .manual_configuration
        .as_ref()
        .map(|manual| &manual.remote_table)
        .or_else(|| {
            using
                .foreign_key_constraint_on
                .as_ref()
                .and_then(|fk| fk.table())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForeignKeyOn, RelationshipUsing};
    use serde_yaml::Mapping;

    fn local_fk(name: &str) -> Relationship {
        Relationship {
            name: name.to_string(),
            using: RelationshipUsing {
                foreign_key_constraint_on: Some(ForeignKeyOn::Column(format!("{name}_id"))),
                manual_configuration: None,
            },
            extra: Mapping::new(),
        }
    }

    #[test]
    fn test_object_relationship_wins_over_array() {
        let objects = vec![Relationship::manual("owner", TableRef::new("company", "tenant"))];
        let arrays = vec![Relationship::foreign_key("owner", TableRef::new("company", "user"), "owner_id")];

        let target = resolve_relation_target("owner", &objects, &arrays).unwrap();
        assert_eq!(target.key(), "company_tenant");
    }

    #[test]
    fn test_falls_back_to_array_relationships() {
        let arrays = vec![Relationship::foreign_key("lines", TableRef::new("inbound", "line"), "inbound_id")];
        let target = resolve_relation_target("lines", &[], &arrays).unwrap();
        assert_eq!(target.key(), "inbound_line");
    }

    #[test]
    fn test_manual_configuration_wins_over_foreign_key() {
        let mut rel = Relationship::manual("product", TableRef::new("product", "product"));
        rel.using.foreign_key_constraint_on = Some(ForeignKeyOn::Remote {
            table: TableRef::new("legacy", "product"),
            column: Some("product_id".to_string()),
            columns: None,
        });
        let objects = [rel];
        let target = resolve_relation_target("product", &objects, &[]).unwrap();
        assert_eq!(target.schema, "product");
    }

    #[test]
    fn test_local_foreign_key_is_unresolved() {
        let objects = vec![local_fk("creator")];
        assert_eq!(resolve_relation_target("creator", &objects, &[]), None);
    }

    #[test]
    fn test_unknown_name_is_unresolved() {
        let objects = vec![Relationship::manual("tenant", TableRef::new("company", "tenant"))];
        assert_eq!(resolve_relation_target("warehouse", &objects, &[]), None);
    }
}
