//! Accessor synthesis: Go getter/setter text for struct fields.
//!
//! Everything here is a pure function of its inputs. Output is already laid
//! out the way `gofmt` would print it (tab indentation, one blank line
//! between methods), so no formatting pass is needed for correctness.
//!
//! Malformed input (empty names, a type that is only `*`) is not rejected;
//! it produces degenerate text rather than an error.

use std::fmt::Write;

use crate::model::{Field, StructDescriptor};

/// Prefix of every generated getter
pub const GETTER_PREFIX: &str = "Get";
/// Prefix of every generated setter
pub const SETTER_PREFIX: &str = "Set";

const NON_POINTER_SUFFIX: &str = "NonPointer";

/// Name of the named result (getters) and the parameter (setters)
const OUT: &str = "out";

/// The four accessor shapes a field can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    GetterNonPointer,
    Setter,
    SetterNonPointer,
}

impl AccessorKind {
    /// Accessors emitted for a field, in emission order
    pub fn for_field(field: &Field) -> &'static [AccessorKind] {
        if field.is_pointer_type() {
            &[
                AccessorKind::Getter,
                AccessorKind::GetterNonPointer,
                AccessorKind::Setter,
                AccessorKind::SetterNonPointer,
            ]
        } else {
            &[AccessorKind::Getter, AccessorKind::Setter]
        }
    }

    pub fn method_name(&self, field_name: &str) -> String {
        let base = capitalize(field_name);
        match self {
            AccessorKind::Getter => format!("{}{}", GETTER_PREFIX, base),
            AccessorKind::GetterNonPointer => {
                format!("{}{}{}", GETTER_PREFIX, base, NON_POINTER_SUFFIX)
            }
            AccessorKind::Setter => format!("{}{}", SETTER_PREFIX, base),
            AccessorKind::SetterNonPointer => {
                format!("{}{}{}", SETTER_PREFIX, base, NON_POINTER_SUFFIX)
            }
        }
    }
}

/// Upper-case the first character and keep the rest verbatim.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Receiver used when the struct name does not start with a letter (`_cache`)
pub const FALLBACK_RECEIVER: &str = "r";

/// Receiver identifier: the struct name's first character, lower-cased.
pub fn receiver_name(struct_name: &str) -> String {
    match struct_name.chars().next() {
        Some(c) if c.is_alphabetic() => c.to_lowercase().collect(),
        Some(_) => FALLBACK_RECEIVER.to_string(),
        None => String::new(),
    }
}

/// Render one accessor method, ending with a newline.
pub fn render_accessor(struct_name: &str, field: &Field, kind: AccessorKind) -> String {
    let recv = receiver_name(struct_name);
    let method = kind.method_name(&field.name);
    let name = &field.name;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = match kind {
        AccessorKind::Getter => write!(
            out,
            "func ({recv} *{struct_name}) {method}() ({OUT} {ty}) {{\n\
             \tif {recv} == nil {{\n\
             \t\treturn {OUT}\n\
             \t}}\n\
             \treturn {recv}.{name}\n\
             }}\n",
            ty = field.ty,
        ),
        AccessorKind::GetterNonPointer => write!(
            out,
            "func ({recv} *{struct_name}) {method}() ({OUT} {ty}) {{\n\
             \tif {recv} == nil || {recv}.{name} == nil {{\n\
             \t\treturn {OUT}\n\
             \t}}\n\
             \treturn *{recv}.{name}\n\
             }}\n",
            ty = field.pointee_type(),
        ),
        AccessorKind::Setter => write!(
            out,
            "func ({recv} *{struct_name}) {method}({OUT} {ty}) {{\n\
             \tif {recv} == nil {{\n\
             \t\treturn\n\
             \t}}\n\
             \t{recv}.{name} = {OUT}\n\
             }}\n",
            ty = field.ty,
        ),
        AccessorKind::SetterNonPointer => write!(
            out,
            "func ({recv} *{struct_name}) {method}({OUT} {ty}) {{\n\
             \tif {recv} == nil {{\n\
             \t\treturn\n\
             \t}}\n\
             \t{recv}.{name} = &{OUT}\n\
             }}\n",
            ty = field.pointee_type(),
        ),
    };

    out
}

/// All accessors of one field, separated by blank lines.
pub fn synthesize(struct_name: &str, field: &Field) -> String {
    AccessorKind::for_field(field)
        .iter()
        .map(|kind| render_accessor(struct_name, field, *kind))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accessors for every field of a struct in declaration order.
///
/// Returns an empty string for a struct without fields.
pub fn synthesize_all(descriptor: &StructDescriptor) -> String {
    descriptor
        .fields
        .iter()
        .map(|field| synthesize(&descriptor.name, field))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_names(text: &str) -> Vec<String> {
        text.lines()
            .filter(|l| l.starts_with("func "))
            .map(|l| {
                let after_recv = &l[l.find(") ").unwrap() + 2..];
                after_recv[..after_recv.find('(').unwrap()].to_string()
            })
            .collect()
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("id"), "Id");
        assert_eq!(capitalize("ID"), "ID");
        assert_eq!(capitalize("myCode"), "MyCode");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("_private"), "_private");
    }

    #[test]
    fn test_underscore_struct_has_usable_receiver() {
        let text = synthesize("_cache", &Field::new("size", "*int"));
        assert!(text.contains("func (r *_cache) GetSize() (out *int) {"));
        assert!(text.contains("if r == nil || r.size == nil {"));
        assert!(!text.contains("_ == nil"));
    }

    #[test]
    fn test_receiver_name() {
        assert_eq!(receiver_name("MyStruct"), "m");
        assert_eq!(receiver_name("user"), "u");
        assert_eq!(receiver_name(""), "");
        assert_eq!(receiver_name("_cache"), "r");
        assert_eq!(receiver_name("Éclair"), "é");
    }

    #[test]
    fn test_getter_text() {
        let text = render_accessor("MyStruct", &Field::new("myCode", "int32"), AccessorKind::Getter);
        assert_eq!(
            text,
            "func (m *MyStruct) GetMyCode() (out int32) {\n\
             \tif m == nil {\n\
             \t\treturn out\n\
             \t}\n\
             \treturn m.myCode\n\
             }\n"
        );
    }

    #[test]
    fn test_setter_text() {
        let text = render_accessor("MyStruct", &Field::new("myCode", "int32"), AccessorKind::Setter);
        assert_eq!(
            text,
            "func (m *MyStruct) SetMyCode(out int32) {\n\
             \tif m == nil {\n\
             \t\treturn\n\
             \t}\n\
             \tm.myCode = out\n\
             }\n"
        );
    }

    #[test]
    fn test_non_pointer_variants() {
        let field = Field::new("name", "*string");

        let getter = render_accessor("Foo", &field, AccessorKind::GetterNonPointer);
        assert_eq!(
            getter,
            "func (f *Foo) GetNameNonPointer() (out string) {\n\
             \tif f == nil || f.name == nil {\n\
             \t\treturn out\n\
             \t}\n\
             \treturn *f.name\n\
             }\n"
        );

        let setter = render_accessor("Foo", &field, AccessorKind::SetterNonPointer);
        assert_eq!(
            setter,
            "func (f *Foo) SetNameNonPointer(out string) {\n\
             \tif f == nil {\n\
             \t\treturn\n\
             \t}\n\
             \tf.name = &out\n\
             }\n"
        );
    }

    #[test]
    fn test_capitalization_in_names() {
        assert_eq!(method_names(&synthesize("Foo", &Field::new("id", "int32"))), vec!["GetId", "SetId"]);
        assert_eq!(method_names(&synthesize("Foo", &Field::new("ID", "int32"))), vec!["GetID", "SetID"]);
    }

    #[test]
    fn test_pointer_fan_out() {
        let names = method_names(&synthesize("Foo", &Field::new("name", "*string")));
        assert_eq!(
            names,
            vec!["GetName", "GetNameNonPointer", "SetName", "SetNameNonPointer"]
        );

        let names = method_names(&synthesize("Foo", &Field::new("age", "int")));
        assert_eq!(names, vec!["GetAge", "SetAge"]);
    }

    #[test]
    fn test_nil_check_precedes_field_access() {
        let text = synthesize("Foo", &Field::new("name", "*string"));
        for method in text.split("\n\n") {
            let nil_check = method.find("if f == nil").expect("missing nil check");
            let access = method.rfind("f.name").expect("missing field access");
            assert!(nil_check < access, "nil check must come first:\n{method}");
        }
    }

    #[test]
    fn test_methods_separated_by_blank_line() {
        let text = synthesize("Foo", &Field::new("age", "int"));
        assert_eq!(text.matches("}\n\nfunc").count(), 1);
        assert!(text.ends_with("}\n"));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn test_synthesize_all_concatenates_in_order() {
        let descriptor = StructDescriptor::new(
            "User",
            vec![Field::new("id", "int64"), Field::new("email", "*string")],
        );
        let text = synthesize_all(&descriptor);
        assert_eq!(
            method_names(&text),
            vec!["GetId", "SetId", "GetEmail", "GetEmailNonPointer", "SetEmail", "SetEmailNonPointer"]
        );
        assert_eq!(text.matches("\n\nfunc").count(), 5);
    }

    #[test]
    fn test_synthesize_all_empty_struct() {
        assert_eq!(synthesize_all(&StructDescriptor::new("Empty", vec![])), "");
    }

    #[test]
    fn test_degenerate_input_does_not_panic() {
        let text = synthesize("", &Field::new("", "*"));
        assert_eq!(text.matches("func ").count(), 4);
        assert!(text.contains("GetNonPointer"));
    }

    #[test]
    fn test_complex_types_are_opaque() {
        let text = synthesize("Cache", &Field::new("entries", "map[string]*Entry"));
        assert!(text.contains("(out map[string]*Entry)"));
        assert!(!text.contains("NonPointer"));
    }
}
