//! Regeneration planning: which existing methods are stale accessors, and
//! what text replaces them.
//!
//! Detection is by convention only. A method whose name starts with `Get` or
//! `Set` and whose receiver is `*S` for a regenerated struct `S` is treated as
//! generated, including hand-written methods that happen to match.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{pointer_receiver, GeneratedMethodSpan, StructDescriptor};
use crate::synth::{synthesize_all, GETTER_PREFIX, SETTER_PREFIX};

pub fn is_accessor_name(method_name: &str) -> bool {
    method_name.starts_with(GETTER_PREFIX) || method_name.starts_with(SETTER_PREFIX)
}

/// Existing spans to delete before re-emitting accessors for `struct_names`.
///
/// The result is sorted by descending start offset, so deleting in order
/// never shifts the offsets of spans still pending.
pub fn plan_regeneration<S: AsRef<str>>(
    struct_names: &[S],
    existing_spans: &[GeneratedMethodSpan],
) -> Vec<GeneratedMethodSpan> {
    let receivers: HashSet<String> = struct_names
        .iter()
        .map(|name| pointer_receiver(name.as_ref()))
        .collect();

    let mut stale: Vec<GeneratedMethodSpan> = existing_spans
        .iter()
        .filter(|m| is_accessor_name(&m.method_name) && receivers.contains(&m.receiver_type))
        .cloned()
        .collect();

    stale.sort_by(|a, b| b.span.start.cmp(&a.span.start));
    stale
}

/// Generated text for the given structs, struct by struct, blank-line separated.
pub fn render_insertion(structs: &[StructDescriptor]) -> String {
    structs
        .iter()
        .map(synthesize_all)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deletions plus the text to append once they are applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerationPlan {
    pub deletions: Vec<GeneratedMethodSpan>,
    pub insertion: String,
}

impl RegenerationPlan {
    pub fn build(structs: &[StructDescriptor], existing_spans: &[GeneratedMethodSpan]) -> Self {
        let names: Vec<&str> = structs.iter().map(|s| s.name.as_str()).collect();
        Self {
            deletions: plan_regeneration(&names, existing_spans),
            insertion: render_insertion(structs),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.deletions.is_empty() && self.insertion.is_empty()
    }
}
