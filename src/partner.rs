//! Request/response partner lookup by naming convention.
use std::collections::HashMap;

use regex::Regex;

use crate::error::GenError;
use crate::model::{Declaration, DeclarationModel};
use crate::variant::Variant;

/// Default convention: an identifier stem, optionally followed by one of the
/// variant suffixes.
pub const DEFAULT_NAMING_PATTERN: &str =
    r"^(?P<stem>[A-Za-z_$][A-Za-z0-9_$]*?)(?:Event|Request|Response)?$";

// ------------------------------ NameIndex -------------------------------- //

/// Simple-name lookup over one model, memoized for the lifetime of a run.
///
/// Entries are only ever added. Misses are cached too, which is sound
/// because the model cannot change underneath the index.
#[derive(Debug)]
pub struct NameIndex<'m> {
    model: &'m DeclarationModel,
    cache: HashMap<String, Option<usize>>,
}

impl<'m> NameIndex<'m> {
    pub fn new(model: &'m DeclarationModel) -> Self {
        Self { model, cache: HashMap::new() }
    }

    pub fn lookup(&mut self, simple_name: &str) -> Option<&'m Declaration> {
        let model = self.model;
        let ix = *self
            .cache
            .entry(simple_name.to_string())
            .or_insert_with(|| model.position_by_name(simple_name));
        ix.and_then(|ix| model.get(ix))
    }

    /// Number of names looked up so far.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

// --------------------------- Naming convention --------------------------- //

/// Which name the convention is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PartnerNameSource {
    /// The tagged declaration's own simple name.
    #[default]
    Subclass,
    /// The simple name of the tagged declaration's superclass.
    Superclass,
}

#[derive(Debug, Clone)]
pub struct NamingConvention {
    /// Pattern as given.
    source_pattern: String,
    /// The same pattern anchored to the whole name.
    pattern: Regex,
    pub source: PartnerNameSource,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::new(DEFAULT_NAMING_PATTERN, PartnerNameSource::default())
            .expect("default naming pattern")
    }
}

impl NamingConvention {
    /// The pattern needs a `stem` group, or at least one capture group. It
    /// must match the whole name; `^` and `$` are implied.
    pub fn new(pattern: &str, source: PartnerNameSource) -> Result<Self, GenError> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| GenError::NamingPattern(e.to_string()))?;
        if anchored.captures_len() < 2 {
            return Err(GenError::NamingPattern(format!(
                "`{pattern}` has no capture group for the name stem"
            )));
        }
        Ok(Self { source_pattern: pattern.to_string(), pattern: anchored, source })
    }

    pub fn pattern(&self) -> &str {
        &self.source_pattern
    }

    /// Stem of `name`, or `None` when the name breaks the convention.
    pub fn stem<'a>(&self, name: &'a str) -> Option<&'a str> {
        let caps = self.pattern.captures(name)?;
        caps.name("stem").or_else(|| caps.get(1)).map(|m| m.as_str())
    }
}

// ------------------------------- Resolve --------------------------------- //

#[derive(Debug, Clone, PartialEq)]
pub enum PartnerLookup<'m> {
    /// Events have no partner.
    NotApplicable,
    /// The name the convention applies to does not match it.
    NamingMismatch { name: String },
    /// Convention applied but nothing by that name exists.
    Missing { expected: String },
    Found(&'m Declaration),
}

impl<'m> PartnerLookup<'m> {
    pub fn declaration(&self) -> Option<&'m Declaration> {
        match self {
            PartnerLookup::Found(d) => Some(d),
            _ => None,
        }
    }
}

pub fn resolve_partner<'m>(
    decl: &Declaration,
    variant: Variant,
    naming: &NamingConvention,
    index: &mut NameIndex<'m>,
) -> PartnerLookup<'m> {
    let Some(suffix) = variant.partner_suffix() else {
        return PartnerLookup::NotApplicable;
    };
    let name = match naming.source {
        PartnerNameSource::Subclass => decl.name.as_str(),
        PartnerNameSource::Superclass => decl.superclass_name().unwrap_or_default(),
    };
    let Some(stem) = naming.stem(name) else {
        return PartnerLookup::NamingMismatch { name: name.to_string() };
    };
    let expected = format!("{stem}{suffix}");
    match index.lookup(&expected) {
        Some(found) => PartnerLookup::Found(found),
        None => PartnerLookup::Missing { expected },
    }
}

// ------------------------------- Tests ------------------------------------ //
