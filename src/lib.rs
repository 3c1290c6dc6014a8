//! Companion-class generator for `@event`, `@request` and `@response` tagged
//! declarations.
//!
//! A run builds a read-only [`model::DeclarationModel`], classifies every
//! declaration, resolves request/response partners by naming convention,
//! reconciles constructors and renders one abstract class per tagged
//! declaration through Handlebars templates.
pub mod attributes;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod partner;
pub mod path_de;
pub mod reconcile;
pub mod templates;
pub mod variant;

pub use config::GeneratorConfig;
pub use error::{GenError, SkipReason};
pub use generator::{GenerationReport, Generator};
pub use model::{Declaration, DeclarationModel};
pub use templates::{Renderer, Templates};
pub use variant::Variant;
