use serde::Serialize;
use tracing::debug;

use crate::error::GenError;
use crate::model::{GeneratedMethodSpan, StructModel};
use crate::parser::{GoSource, GoSyntax};
use crate::planner::RegenerationPlan;
use crate::synth::AccessorKind;

/// Result of one regeneration pass over a document
#[derive(Debug, Clone, Serialize)]
pub struct RegenerationOutcome {
    pub changed: bool,
    /// Structs whose accessors were regenerated, in document order
    pub structs: Vec<String>,
    /// Stale accessor methods removed, latest in the document first
    pub removed: Vec<GeneratedMethodSpan>,
    /// Number of accessor methods emitted
    pub emitted: usize,
}

/// An in-memory Go document that accessors are regenerated into.
pub struct GoEditor {
    content: String,
}

impl GoEditor {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Structs and existing methods of the current document
    pub fn inspect(&self) -> Result<(StructModel, Vec<GeneratedMethodSpan>), GenError> {
        let source = GoSource::parse(&self.content)?;
        Ok((source.list_structs(), source.list_method_spans()))
    }

    /// Compute the plan for `selection` (empty = every struct) without mutating.
    pub fn plan(&self, selection: &[String]) -> Result<(StructModel, RegenerationPlan), GenError> {
        let (model, methods) = self.inspect()?;
        let structs = model.select(selection)?;
        let plan = RegenerationPlan::build(&structs, &methods);
        Ok((StructModel::new(structs), plan))
    }

    pub fn regenerate(&mut self, selection: &[String]) -> Result<RegenerationOutcome, GenError> {
        let (selected, plan) = self.plan(selection)?;

        debug!(
            "Regenerating {} struct(s): {} stale method(s)",
            selected.len(),
            plan.deletions.len()
        );

        let emitted: usize = selected
            .structs
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|f| AccessorKind::for_field(f).len())
            .sum();

        let changed = self.apply_plan(&plan)?;

        Ok(RegenerationOutcome {
            changed,
            structs: selected.structs.into_iter().map(|s| s.name).collect(),
            removed: plan.deletions,
            emitted,
        })
    }

    /// Apply deletions then append the insertion.
    ///
    /// Either the whole plan is applied or the document is left untouched.
    /// Returns whether the document changed.
    pub fn apply_plan(&mut self, plan: &RegenerationPlan) -> Result<bool, GenError> {
        let updated = apply_plan_to(&self.content, plan)?;
        let changed = updated != self.content;
        self.content = updated;
        Ok(changed)
    }

    pub fn to_string(&self) -> String {
        self.content.clone()
    }
}

/// Pure form of [`GoEditor::apply_plan`].
pub fn apply_plan_to(content: &str, plan: &RegenerationPlan) -> Result<String, GenError> {
    validate_deletions(content, &plan.deletions)?;

    if plan.is_noop() {
        return Ok(content.to_string());
    }

    let mut out = content.to_string();
    for method in &plan.deletions {
        // Take the whitespace after the method with it so repeated runs
        // don't pile up blank lines.
        let rest = &out[method.span.end..];
        let trailing = rest.len() - rest.trim_start().len();
        out.replace_range(method.span.start..method.span.end + trailing, "");
    }

    let body_len = out.trim_end().len();
    out.truncate(body_len);

    if plan.insertion.is_empty() {
        out.push('\n');
    } else {
        out.push_str("\n\n");
        out.push_str(&plan.insertion);
    }

    Ok(out)
}

/// Deletions must be in bounds, on char boundaries, strictly descending and
/// non-overlapping.
fn validate_deletions(content: &str, deletions: &[GeneratedMethodSpan]) -> Result<(), GenError> {
    let len = content.len();
    let mut floor: Option<usize> = None;

    for method in deletions {
        let span = method.span;
        let invalid = || GenError::InvalidSpan {
            start: span.start,
            end: span.end,
            len,
        };

        if span.start > span.end
            || span.end > len
            || !content.is_char_boundary(span.start)
            || !content.is_char_boundary(span.end)
        {
            return Err(invalid());
        }
        if let Some(prev_start) = floor {
            if span.end > prev_start {
                return Err(invalid());
            }
        }
        floor = Some(span.start);
    }

    Ok(())
}
