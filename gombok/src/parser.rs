//! Go source adapter built on tree-sitter.
//!
//! Only top-level declarations are considered: `type_declaration` nodes whose
//! spec is a (non-generic) `struct_type`, and `method_declaration` nodes.
//!
//! Relevant tree-sitter-go shapes:
//! ```text
//! type_declaration  -> type_spec { name, type_parameters?, type: struct_type }
//! struct_type       -> field_declaration_list -> field_declaration { name*, type, tag? }
//! method_declaration { receiver: parameter_list, name, parameters, result?, body? }
//! ```
//! A `field_declaration` with no `name` child is an embedded field.

use tree_sitter::{Node, Parser, Tree};
use tracing::{debug, warn};

use crate::error::GenError;
use crate::model::{Field, GeneratedMethodSpan, StructDescriptor, StructModel, TextSpan};

/// What the generator needs to know about a Go file
pub trait GoSyntax {
    /// Struct declarations with their named fields, in document order
    fn list_structs(&self) -> StructModel;

    /// Every top-level method declaration, in document order
    fn list_method_spans(&self) -> Vec<GeneratedMethodSpan>;
}

pub struct GoSource<'a> {
    source: &'a str,
    tree: Tree,
}

impl<'a> GoSource<'a> {
    pub fn parse(source: &'a str) -> Result<Self, GenError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GenError::Parse(format!("failed to load Go grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| GenError::Parse("parser produced no tree".to_string()))?;

        if tree.root_node().has_error() {
            warn!("Go source contains syntax errors; using recovered tree");
        }

        Ok(Self { source, tree })
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn struct_from_spec(&self, spec: Node<'_>) -> Option<StructDescriptor> {
        let name = self.text(spec.child_by_field_name("name")?);
        let ty = spec.child_by_field_name("type")?;

        if ty.kind() != "struct_type" {
            return None;
        }
        if spec.child_by_field_name("type_parameters").is_some() {
            debug!("Skipping generic struct {}", name);
            return None;
        }

        let mut fields = Vec::new();
        let mut cursor = ty.walk();
        for list in ty.children(&mut cursor) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            let mut list_cursor = list.walk();
            for decl in list.children(&mut list_cursor) {
                if decl.kind() == "field_declaration" {
                    self.collect_fields(decl, &mut fields);
                }
            }
        }

        Some(StructDescriptor::new(name, fields))
    }

    /// Push one `Field` per declared name; embedded declarations push nothing.
    fn collect_fields(&self, decl: Node<'_>, fields: &mut Vec<Field>) {
        let ty = decl
            .child_by_field_name("type")
            .map(|t| self.text(t))
            .unwrap_or("");

        let mut cursor = decl.walk();
        let names: Vec<&str> = decl
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.text(n))
            .collect();

        if names.is_empty() {
            debug!("Skipping embedded field {}", self.text(decl).trim());
            return;
        }

        fields.extend(names.into_iter().map(|name| Field::new(name, ty)));
    }

    fn method_span(&self, method: Node<'_>) -> Option<GeneratedMethodSpan> {
        let name = self.text(method.child_by_field_name("name")?);
        let receiver = method.child_by_field_name("receiver")?;

        let mut cursor = receiver.walk();
        let receiver_type = receiver
            .children(&mut cursor)
            .find(|c| c.kind() == "parameter_declaration")
            .and_then(|param| param.child_by_field_name("type"))
            .map(|t| strip_whitespace(self.text(t)))?;

        Some(
            GeneratedMethodSpan::new(
                TextSpan::new(method.start_byte(), method.end_byte()),
                receiver_type,
                name,
            )
            .with_line(method.start_position().row + 1),
        )
    }
}

impl GoSyntax for GoSource<'_> {
    fn list_structs(&self) -> StructModel {
        let root = self.tree.root_node();
        let mut structs = Vec::new();
        let mut cursor = root.walk();

        for decl in root.children(&mut cursor) {
            if decl.kind() != "type_declaration" {
                continue;
            }
            let mut spec_cursor = decl.walk();
            for spec in decl.children(&mut spec_cursor) {
                if spec.kind() == "type_spec" {
                    if let Some(descriptor) = self.struct_from_spec(spec) {
                        structs.push(descriptor);
                    }
                }
            }
        }

        StructModel::new(structs)
    }

    fn list_method_spans(&self) -> Vec<GeneratedMethodSpan> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();

        root.children(&mut cursor)
            .filter(|node| node.kind() == "method_declaration")
            .filter_map(|node| self.method_span(node))
            .collect()
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
