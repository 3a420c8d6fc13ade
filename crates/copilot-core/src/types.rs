// SPDX-License-Identifier: Apache-2.0

//! Data types for Hasura metadata records and the relation walk
//!
//! Metadata records are typed on the keys this tool reads or writes. Every
//! other key is kept in a flattened `extra` mapping so a read/write cycle
//! leaves unrelated metadata untouched.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// A parsed GraphQL executable document with owned strings
pub type QueryDocument = graphql_parser::query::Document<'static, String>;

const DEFAULT_SCHEMA: &str = "public";
const WAREHOUSE_COLUMN: &str = "warehouse_id";
const COMPANY_COLUMN: &str = "company_id";
const WAREHOUSE_SESSION_VAR: &str = "x-hasura-warehouse-id";
const COMPANY_SESSION_VAR: &str = "x-hasura-company-id";

// ─── Relation tree ───────────────────────────────────────────

/// A relation-bearing field of a GraphQL selection.
///
/// Scalar leaves never become nodes, so every node names either the root
/// entity or a relationship to follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationNode {
    pub name: String,
    pub relations: Vec<RelationNode>,
}

impl RelationNode {
    pub fn new(name: impl Into<String>, relations: Vec<RelationNode>) -> Self {
        Self {
            name: name.into(),
            relations,
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

// ─── Tables & relationships ──────────────────────────────────

/// Qualified table reference (`schema` + `name`).
///
/// Hasura also accepts a bare table name, meaning a table in `public`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TableRefRepr")]
pub struct TableRef {
    pub name: String,
    pub schema: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableRefRepr {
    Qualified {
        name: String,
        #[serde(default = "default_schema")]
        schema: String,
    },
    Bare(String),
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl From<TableRefRepr> for TableRef {
    fn from(repr: TableRefRepr) -> Self {
        match repr {
            TableRefRepr::Qualified { name, schema } => Self { name, schema },
            TableRefRepr::Bare(name) => Self {
                name,
                schema: default_schema(),
            },
        }
    }
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }

    /// Combined key used for metadata file names and GraphQL type names.
    pub fn key(&self) -> String {
        format!("{}_{}", self.schema, self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A named object or array relationship declared on a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    #[serde(default)]
    pub using: RelationshipUsing,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Relationship {
    /// Relationship backed by a manual column mapping to `remote_table`.
    pub fn manual(name: impl Into<String>, remote_table: TableRef) -> Self {
        Self {
            name: name.into(),
            using: RelationshipUsing {
                foreign_key_constraint_on: None,
                manual_configuration: Some(ManualConfiguration {
                    remote_table,
                    column_mapping: Mapping::new(),
                    extra: Mapping::new(),
                }),
            },
            extra: Mapping::new(),
        }
    }

    /// Relationship backed by a foreign key living on `table.column`.
    pub fn foreign_key(
        name: impl Into<String>,
        table: TableRef,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            using: RelationshipUsing {
                foreign_key_constraint_on: Some(ForeignKeyOn::Remote {
                    table,
                    column: Some(column.into()),
                    columns: None,
                }),
                manual_configuration: None,
            },
            extra: Mapping::new(),
        }
    }
}

/// How a relationship is resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipUsing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_constraint_on: Option<ForeignKeyOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_configuration: Option<ManualConfiguration>,
}

/// `foreign_key_constraint_on` comes in three shapes.
///
/// Only the remote form names the target table. The column forms are object
/// relationships whose foreign key lives on the current table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignKeyOn {
    Remote {
        table: TableRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        columns: Option<Vec<String>>,
    },
    Column(String),
    Columns(Vec<String>),
}

impl ForeignKeyOn {
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Self::Remote { table, .. } => Some(table),
            Self::Column(_) | Self::Columns(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualConfiguration {
    pub remote_table: TableRef,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub column_mapping: Mapping,
    #[serde(flatten)]
    pub extra: Mapping,
}

// ─── Permissions ─────────────────────────────────────────────

/// Row scope inferred for a table from its GraphQL type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    Warehouse,
    Company,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Context {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warehouse" => Ok(Self::Warehouse),
            "company" => Ok(Self::Company),
            other => Err(format!("unknown context '{other}', expected warehouse or company")),
        }
    }
}

/// Column access of a permission rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// Serialized as `"*"`
    All,
    List(Vec<String>),
}

impl Serialize for Columns {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::All => serializer.serialize_str("*"),
            Self::List(columns) => columns.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wildcard(String),
            List(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Wildcard(s) if s == "*" => Ok(Self::All),
            Repr::Wildcard(s) => Err(de::Error::custom(format!(
                "expected \"*\" or a column list, found \"{s}\""
            ))),
            Repr::List(columns) => Ok(Self::List(columns)),
        }
    }
}

/// Row filter of a select permission.
///
/// The tool only ever writes the first three shapes. `Custom` keeps
/// hand-written filters of other roles intact across a rewrite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RowFilter {
    #[default]
    Unrestricted,
    Warehouse,
    Company,
    Custom(Value),
}

impl RowFilter {
    pub fn for_context(context: Option<Context>) -> Self {
        match context {
            Some(Context::Warehouse) => Self::Warehouse,
            Some(Context::Company) => Self::Company,
            None => Self::Unrestricted,
        }
    }

    /// Scope implied by the columns a filter tests.
    ///
    /// Company is checked first, matching how role merges have always
    /// classified existing rules.
    pub fn inferred_context(&self) -> Option<Context> {
        match self {
            Self::Unrestricted => None,
            Self::Warehouse => Some(Context::Warehouse),
            Self::Company => Some(Context::Company),
            Self::Custom(Value::Mapping(map)) => {
                if map.contains_key(COMPANY_COLUMN) {
                    Some(Context::Company)
                } else if map.contains_key(WAREHOUSE_COLUMN) {
                    Some(Context::Warehouse)
                } else {
                    None
                }
            }
            Self::Custom(_) => None,
        }
    }
}

fn session_equality(column: &str, session_var: &str) -> Value {
    let mut eq = Mapping::new();
    eq.insert(Value::from("_eq"), Value::from(session_var));
    let mut filter = Mapping::new();
    filter.insert(Value::from(column), Value::Mapping(eq));
    Value::Mapping(filter)
}

impl From<Value> for RowFilter {
    fn from(value: Value) -> Self {
        match &value {
            Value::Null => Self::Unrestricted,
            Value::Mapping(map) if map.is_empty() => Self::Unrestricted,
            _ if value == session_equality(WAREHOUSE_COLUMN, WAREHOUSE_SESSION_VAR) => {
                Self::Warehouse
            }
            _ if value == session_equality(COMPANY_COLUMN, COMPANY_SESSION_VAR) => Self::Company,
            _ => Self::Custom(value),
        }
    }
}

impl From<RowFilter> for Value {
    fn from(filter: RowFilter) -> Self {
        match filter {
            RowFilter::Unrestricted => Value::Mapping(Mapping::new()),
            RowFilter::Warehouse => session_equality(WAREHOUSE_COLUMN, WAREHOUSE_SESSION_VAR),
            RowFilter::Company => session_equality(COMPANY_COLUMN, COMPANY_SESSION_VAR),
            RowFilter::Custom(value) => value,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Permission body of a select permission entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRule {
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_aggregations: bool,
    pub columns: Columns,
    #[serde(default)]
    pub filter: RowFilter,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PermissionRule {
    /// Rule granting every column, scoped by `context`.
    pub fn scoped(context: Option<Context>, allow_aggregations: bool) -> Self {
        Self {
            allow_aggregations,
            columns: Columns::All,
            filter: RowFilter::for_context(context),
            extra: Mapping::new(),
        }
    }
}

/// One entry of a table's `select_permissions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectPermission {
    pub role: String,
    pub permission: PermissionRule,
}

/// Metadata record of one tracked table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub table: TableRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select_permissions: Vec<SelectPermission>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl TableRecord {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            object_relationships: Vec::new(),
            array_relationships: Vec::new(),
            select_permissions: Vec::new(),
            extra: Mapping::new(),
        }
    }

    pub fn key(&self) -> String {
        self.table.key()
    }

    pub fn permission_for(&self, role: &str) -> Option<&PermissionRule> {
        self.select_permissions
            .iter()
            .find(|p| p.role == role)
            .map(|p| &p.permission)
    }
}

// ─── Actions ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPermission {
    pub role: String,
}

/// One declared action; everything but name and permissions is opaque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub name: String,
    #[serde(flatten)]
    pub extra: Mapping,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<ActionPermission>,
}

/// The `actions.yaml` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsFile {
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ActionsFile {
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ActionEntry> {
        self.actions.iter_mut().find(|a| a.name == name)
    }
}

// ─── Schema introspection ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
}

/// One named type of the introspected schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaType {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<SchemaField>>,
}

impl SchemaType {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields
            .as_deref()
            .is_some_and(|fields| fields.iter().any(|f| f.name == name))
    }
}

/// Type directory returned by schema introspection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDirectory {
    pub types: Vec<SchemaType>,
}

impl SchemaDirectory {
    pub fn find_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Scope of the type named `type_name`; warehouse wins over company.
    pub fn context_of(&self, type_name: &str) -> Option<Context> {
        let schema_type = self.find_type(type_name)?;
        if schema_type.has_field(WAREHOUSE_COLUMN) {
            Some(Context::Warehouse)
        } else if schema_type.has_field(COMPANY_COLUMN) {
            Some(Context::Company)
        } else {
            None
        }
    }
}

// ─── Walk output ─────────────────────────────────────────────

/// One table (or action) touched by a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub schema: String,
    pub context: Option<Context>,
}

impl TableDef {
    pub fn table(table: &TableRef, context: Option<Context>) -> Self {
        Self {
            name: table.name.clone(),
            schema: table.schema.clone(),
            context,
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: String::new(),
            context: None,
        }
    }
}
