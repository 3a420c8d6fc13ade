// SPDX-License-Identifier: Apache-2.0

//! GraphQL text from query source files.
//!
//! Query modules in the front-end repository are TypeScript files exporting
//! `gql` tagged templates. The document text is recovered from the template
//! bodies; `${...}` interpolations (usually imported fragments) are dropped.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Kind of file a document is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain `.graphql` / `.gql` document
    Graphql,
    /// JavaScript or TypeScript module containing `gql` templates
    Script,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs") => Self::Script,
            _ => Self::Graphql,
        }
    }
}

fn gql_template() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"gql\s*`((?:[^`\\]|\\.)*)`").expect("gql template pattern"))
}

fn interpolation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{[^}]*\}").expect("interpolation pattern"))
}

/// Returns the GraphQL text held by a source file.
///
/// Script modules yield the concatenation of all their `gql` templates, so
/// fragments declared next to the query are part of the same document.
/// `None` means a script module without any `gql` template.
pub fn graphql_source(text: &str, kind: SourceKind) -> Option<String> {
    match kind {
        SourceKind::Graphql => Some(text.to_string()),
        SourceKind::Script => {
            let bodies: Vec<String> = gql_template()
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|body| interpolation().replace_all(body.as_str(), "").into_owned())
                .collect();

            if bodies.is_empty() {
                None
            } else {
                Some(bodies.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_MODULE: &str = r#"
import { gql } from '@apollo/client'
import { TENANT_FIELDS } from '../fragments'

export const LINE_FIELDS = gql`
  fragment LineFields on inbound_line {
    qty
    product { sku }
  }
`

export default gql`
  query Inbound($id: uuid!) {
    inbound_by_pk(id: $id) {
      id
      lines { ...LineFields }
    }
  }
  ${LINE_FIELDS}
  ${TENANT_FIELDS}
`
"#;

    #[test]
    fn test_script_templates_are_concatenated() {
        let text = graphql_source(QUERY_MODULE, SourceKind::Script).unwrap();
        assert!(text.contains("fragment LineFields"));
        assert!(text.contains("inbound_by_pk"));
        assert!(!text.contains("${"));
        assert!(graphql_parser::parse_query::<String>(&text).is_ok());
    }

    #[test]
    fn test_script_without_template() {
        assert_eq!(graphql_source("export const x = 1", SourceKind::Script), None);
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("inbound.query.ts")), SourceKind::Script);
        assert_eq!(SourceKind::from_path(Path::new("inbound.graphql")), SourceKind::Graphql);
        assert_eq!(SourceKind::from_path(Path::new("inbound")), SourceKind::Graphql);
    }
}
