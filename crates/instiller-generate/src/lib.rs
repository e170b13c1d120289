//! Directive-driven fixture synthesis.
//!
//! [`FixtureGenerator`] walks the description of a type, asks generator
//! plugins for field values, shares values between fields through aliases and
//! bounds self-referencing graphs. [`persistence`] saves the result as JSON
//! and loads it back, decoding alias placeholders.

pub mod assets;
pub mod converter;
pub mod directives;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod guard;
pub mod logging;
pub mod model;
pub mod persistence;

pub use converter::{AliasConverter, Category, Placeholder, categorize};
pub use directives::{DirectiveSource, DirectiveStore};
pub use engine::{DEFAULT_IMPLEMENTATIONS, FixtureGenerator, MAP_CARDINALITY};
pub use errors::{GenerationError, Result};
pub use generators::{GeneratorPlugin, PluginRegistry};
pub use guard::RecursionGuard;
pub use model::{FixtureReport, GenerationIssue, GeneratorConfig};
pub use persistence::{from_json, to_json};
