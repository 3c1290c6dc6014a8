//! Template-instantiation service.
//!
//! Templates are Handlebars, one per variant, named after the variant. The
//! defaults are compiled in; a directory can override any of them with
//! `<variant>.hbs`.
use std::path::Path;

use handlebars::Handlebars;

use crate::attributes::RenderableAttributes;
use crate::error::GenError;
use crate::variant::Variant;

pub const TEMPLATE_EXTENSION: &str = "hbs";

const EVENT: &str = include_str!("templates/event.hbs");
const REQUEST: &str = include_str!("templates/request.hbs");
const RESPONSE: &str = include_str!("templates/response.hbs");

fn embedded_source(variant: Variant) -> &'static str {
    match variant {
        Variant::Event => EVENT,
        Variant::Request => REQUEST,
        Variant::Response => RESPONSE,
    }
}

/// Turns typed attributes into source text.
pub trait Renderer {
    fn render<A: RenderableAttributes>(&self, attributes: &A) -> Result<String, GenError>;
}

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn embedded() -> Result<Self, GenError> {
        Self::with_overrides(None)
    }

    /// Embedded templates, replaced by `<dir>/<variant>.hbs` where present.
    pub fn with_overrides(dir: Option<&Path>) -> Result<Self, GenError> {
        let mut sources = Vec::with_capacity(Variant::ALL.len());
        for variant in Variant::ALL {
            let path = dir
                .map(|d| d.join(format!("{}.{TEMPLATE_EXTENSION}", variant.name())))
                .filter(|p| p.is_file());
            let text = match path {
                Some(path) => {
                    tracing::info!(template = variant.name(), path = %path.display(), "template override");
                    std::fs::read_to_string(&path).map_err(|source| GenError::Read { path, source })?
                }
                None => embedded_source(variant).to_string(),
            };
            sources.push((variant, text));
        }
        Self::from_sources(sources)
    }

    pub fn from_sources<S: AsRef<str>>(
        sources: impl IntoIterator<Item = (Variant, S)>,
    ) -> Result<Self, GenError> {
        let mut registry = Handlebars::new();
        // Generated code is not HTML: `List<Foo>` must stay as written.
        registry.register_escape_fn(handlebars::no_escape);
        for (variant, text) in sources {
            registry
                .register_template_string(variant.name(), text)
                .map_err(|e| GenError::Template {
                    name: variant.name().to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(Self { registry })
    }
}

impl Renderer for Templates {
    fn render<A: RenderableAttributes>(&self, attributes: &A) -> Result<String, GenError> {
        let name = attributes.template_name();
        self.registry.render(name, attributes).map_err(|e| GenError::Render {
            name: name.to_string(),
            source: Box::new(e),
        })
    }
}
