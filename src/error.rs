use std::path::PathBuf;

use crate::variant::Variant;

/// Fatal failures: the run stops and the error is surfaced once.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid declaration model in {path}: {message}")]
    Model { path: PathBuf, message: String },
    #[error("bad input pattern `{pattern}`: {message}")]
    Input { pattern: String, message: String },
    #[error("invalid naming pattern: {0}")]
    NamingPattern(String),
    #[error("template `{name}` failed to register: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },
    #[error("template `{name}` failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Why a tagged declaration produced no output. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no superclass specified")]
    NoSuperclass,
    #[error("carries more than one variant tag ({})", list_variants(.0))]
    MultipleVariants(Vec<Variant>),
}

fn list_variants(vs: &[Variant]) -> String {
    vs.iter().map(|v| v.name()).collect::<Vec<_>>().join(", ")
}
