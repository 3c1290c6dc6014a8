//! Variant taxonomy and tag classification.
use std::fmt;

use serde::Serialize;

use crate::error::SkipReason;
use crate::model::{Declaration, Tag};

/// The three generation kinds. Closed set; order is classification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Event,
    Request,
    Response,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Event, Variant::Request, Variant::Response];

    /// Tag name, and also the template name.
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Event => "event",
            Variant::Request => "request",
            Variant::Response => "response",
        }
    }

    pub const fn default_superclass(self) -> &'static str {
        match self {
            Variant::Event => "GwtEvent",
            Variant::Request => "AbstractRequest",
            Variant::Response => "AbstractResponse",
        }
    }

    /// Suffix appended to the name stem to find the counterpart declaration.
    pub const fn partner_suffix(self) -> Option<&'static str> {
        match self {
            Variant::Event => None,
            Variant::Request => Some("Response"),
            Variant::Response => Some("Request"),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with a declaration tagged for more than one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiTagPolicy {
    /// Take the first variant in [`Variant::ALL`] order and warn.
    #[default]
    FirstWins,
    /// Skip the declaration with an error.
    Reject,
}

/// A declaration's variant plus the tag that selected it.
#[derive(Debug, Clone)]
pub struct Classification<'m> {
    pub variant: Variant,
    pub tag: &'m Tag,
    /// Lower-priority variant tags ignored under [`MultiTagPolicy::FirstWins`].
    pub ignored: Vec<Variant>,
}

impl<'m> Classification<'m> {
    /// Explicit `superclass=` override on the tag, if non-empty.
    pub fn superclass_override(&self) -> Option<&'m str> {
        self.tag.param("superclass").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn effective_superclass(&self) -> &'m str {
        self.superclass_override().unwrap_or(self.variant.default_superclass())
    }
}

/// `Ok(None)` for untagged declarations; they are skipped without diagnostics.
/// Extra variant tags are reported through [`Classification::ignored`] or,
/// under [`MultiTagPolicy::Reject`], as a [`SkipReason`].
pub fn classify<'m>(
    decl: &'m Declaration,
    policy: MultiTagPolicy,
) -> Result<Option<Classification<'m>>, SkipReason> {
    let mut found = Variant::ALL
        .into_iter()
        .filter_map(|variant| decl.tag(variant.name()).map(|tag| (variant, tag)));

    let Some((variant, tag)) = found.next() else { return Ok(None) };
    let ignored: Vec<Variant> = found.map(|(v, _)| v).collect();
    if ignored.is_empty() || policy == MultiTagPolicy::FirstWins {
        return Ok(Some(Classification { variant, tag, ignored }));
    }

    let mut all = vec![variant];
    all.extend(ignored);
    Err(SkipReason::MultipleVariants(all))
}

// ------------------------------- Tests ------------------------------------ //
