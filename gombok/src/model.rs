use serde::{Deserialize, Serialize};

use crate::error::GenError;

/// Pointer marker prefixed to a Go type
pub const POINTER: &str = "*";

/// A named struct field, as declared in source.
///
/// `type` is kept verbatim (`int32`, `*string`, `[]byte`, `map[string]*T`).
/// The only structural property ever inspected is the leading pointer marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn is_pointer_type(&self) -> bool {
        self.ty.starts_with(POINTER)
    }

    /// The pointed-to type for pointer fields, or the type itself otherwise
    pub fn pointee_type(&self) -> &str {
        self.ty.strip_prefix(POINTER).unwrap_or(&self.ty)
    }
}

/// A struct type declaration with its non-embedded fields in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDescriptor {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Receiver type text of methods declared on this struct (`*Name`)
    pub fn pointer_receiver(&self) -> String {
        pointer_receiver(&self.name)
    }
}

pub fn pointer_receiver(struct_name: &str) -> String {
    format!("{}{}", POINTER, struct_name)
}

/// Half-open byte range into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An existing method declaration that may be a previously generated accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMethodSpan {
    pub span: TextSpan,
    /// Receiver type with whitespace removed, e.g. `*Foo`
    pub receiver_type: String,
    pub method_name: String,
    /// 1-based line of the declaration start (display only)
    #[serde(default)]
    pub line: usize,
}

impl GeneratedMethodSpan {
    pub fn new(
        span: TextSpan,
        receiver_type: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            span,
            receiver_type: receiver_type.into(),
            method_name: method_name.into(),
            line: 0,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// All struct declarations of one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructModel {
    pub structs: Vec<StructDescriptor>,
}

impl StructModel {
    pub fn new(structs: Vec<StructDescriptor>) -> Self {
        Self { structs }
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn get(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.structs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Pick the requested structs, keeping document order.
    ///
    /// An empty selection means every struct. Unknown names fail with the
    /// closest known name as a suggestion.
    pub fn select(&self, names: &[String]) -> Result<Vec<StructDescriptor>, GenError> {
        if self.structs.is_empty() {
            return Err(GenError::NoStructsFound);
        }
        if names.is_empty() {
            return Ok(self.structs.clone());
        }

        for name in names {
            if self.get(name).is_none() {
                return Err(GenError::StructNotFound {
                    name: name.clone(),
                    suggestion: self.closest_name(name),
                });
            }
        }

        Ok(self
            .structs
            .iter()
            .filter(|s| names.iter().any(|n| n == &s.name))
            .cloned()
            .collect())
    }

    fn closest_name(&self, name: &str) -> Option<String> {
        self.structs
            .iter()
            .map(|s| (strsim::jaro_winkler(name, &s.name), &s.name))
            .filter(|(score, _)| *score > 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, n)| n.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> StructModel {
        StructModel::new(vec![
            StructDescriptor::new("User", vec![Field::new("id", "int64")]),
            StructDescriptor::new("Order", vec![Field::new("total", "*float64")]),
            StructDescriptor::new("Empty", vec![]),
        ])
    }

    #[test]
    fn test_pointer_detection() {
        assert!(Field::new("name", "*string").is_pointer_type());
        assert!(!Field::new("names", "[]*string").is_pointer_type());
        assert_eq!(Field::new("name", "*string").pointee_type(), "string");
        assert_eq!(Field::new("age", "int").pointee_type(), "int");
        assert_eq!(Field::new("p", "**T").pointee_type(), "*T");
    }

    #[test]
    fn test_select_all_keeps_document_order() {
        let selected = model().select(&[]).unwrap();
        let names: Vec<_> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Order", "Empty"]);
    }

    #[test]
    fn test_select_subset_keeps_document_order() {
        let selected = model()
            .select(&["Order".to_string(), "User".to_string()])
            .unwrap();
        let names: Vec<_> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Order"]);
    }

    #[test]
    fn test_select_unknown_suggests() {
        let err = model().select(&["Usr".to_string()]).unwrap_err();
        match err {
            GenError::StructNotFound { name, suggestion } => {
                assert_eq!(name, "Usr");
                assert_eq!(suggestion.as_deref(), Some("User"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_select_on_empty_model() {
        let err = StructModel::default().select(&[]).unwrap_err();
        assert!(matches!(err, GenError::NoStructsFound));
    }

    #[test]
    fn test_field_serializes_type_key() {
        let json = serde_json::to_string(&Field::new("id", "int32")).unwrap();
        assert_eq!(json, r#"{"name":"id","type":"int32"}"#);
    }
}
