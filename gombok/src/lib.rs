pub mod diff;
pub mod editor;
pub mod error;
pub mod files;
pub mod formatter;
pub mod model;
pub mod operations;
pub mod parser;
pub mod planner;
pub mod runner;
pub mod state;
pub mod synth;


pub use diff::{generate_unified_diff, print_diff, DiffStats};
pub use editor::{GoEditor, RegenerationOutcome};
pub use error::GenError;
pub use formatter::FormatMode;
pub use model::{Field, GeneratedMethodSpan, StructDescriptor, StructModel, TextSpan};
pub use parser::{GoSource, GoSyntax};
pub use planner::{plan_regeneration, RegenerationPlan};
pub use synth::{synthesize, synthesize_all};
