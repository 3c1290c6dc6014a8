//! Read-only declaration model.
//!
//! A [`DeclarationModel`] is built once per run, either from JSON declaration
//! files ([`load`]) or by scanning Java sources ([`java`]), and is never
//! mutated afterwards. Everything downstream treats it as an oracle.
pub mod java;
pub mod load;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ------------------------------- Types ----------------------------------- //

/// A parsed class declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Dotted package name; empty for the default package.
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<Constructor>,
    /// Where the declaration came from, for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

/// A type reference as written, plus whether the provider could bind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TypeRefRepr")]
pub struct TypeRef {
    pub text: String,
    pub resolved: bool,
}

/// JSON accepts either `"List<Foo>"` (resolved) or `{"text": "T", "resolved": false}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRefRepr {
    Text(String),
    Full {
        text: String,
        #[serde(default = "default_resolved")]
        resolved: bool,
    },
}

fn default_resolved() -> bool { true }

impl From<TypeRefRepr> for TypeRef {
    fn from(repr: TypeRefRepr) -> Self {
        match repr {
            TypeRefRepr::Text(text) => TypeRef { text, resolved: true },
            TypeRefRepr::Full { text, resolved } => TypeRef { text, resolved },
        }
    }
}

/// A doc tag such as `@request superclass=BaseRequest`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Raw text following the tag name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constructor {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

// ---------------------------- Declaration -------------------------------- //

impl Declaration {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            superclass: None,
            type_parameters: Vec::new(),
            tags: Vec::new(),
            constructors: Vec::new(),
            source: None,
        }
    }

    /// `package.Name`, or just `Name` in the default package.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Unqualified, erased name of the superclass (`Bar` for `com.x.Bar<T>`).
    pub fn superclass_name(&self) -> Option<&str> {
        self.superclass
            .as_ref()
            .map(TypeRef::simple_name)
            .filter(|s| !s.is_empty())
    }

    pub fn with_superclass(mut self, text: &str) -> Self {
        self.superclass = Some(TypeRef::resolved(text));
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }
}

impl TypeRef {
    pub fn resolved(text: &str) -> Self {
        Self { text: text.to_string(), resolved: true }
    }

    pub fn unresolved(text: &str) -> Self {
        Self { text: text.to_string(), resolved: false }
    }

    /// Type text with generic arguments, array brackets and varargs removed.
    pub fn erased(&self) -> &str {
        erase(&self.text)
    }

    /// Last dotted segment of [`TypeRef::erased`].
    pub fn simple_name(&self) -> &str {
        simple_type_name(&self.text)
    }
}

/// `Bar` for `com.x.Bar<T>`.
pub fn simple_type_name(text: &str) -> &str {
    let erased = erase(text);
    erased.rsplit('.').next().unwrap_or(erased)
}

pub(crate) fn erase(text: &str) -> &str {
    let end = text
        .find(|c: char| c == '<' || c == '[' || c.is_whitespace())
        .unwrap_or(text.len());
    text[..end].trim_end_matches("...")
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl Constructor {
    pub fn new(name: &str, params: Vec<Param>) -> Self {
        Self { name: name.to_string(), params }
    }
}

impl Param {
    pub fn new(ty: TypeRef, name: &str) -> Self {
        Self { name: name.to_string(), ty }
    }
}

// ------------------------------- Model ----------------------------------- //

/// Immutable, ordered collection of declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationModel {
    decls: Vec<Declaration>,
}

impl DeclarationModel {
    /// Keeps the first declaration for every qualified name.
    pub fn from_declarations(decls: impl IntoIterator<Item = Declaration>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for decl in decls {
            let qualified = decl.qualified_name();
            if !seen.insert(qualified.clone()) {
                tracing::warn!(
                    declaration = %qualified,
                    source = ?decl.source,
                    "duplicate declaration ignored"
                );
                continue;
            }
            out.push(decl);
        }
        Self { decls: out }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.decls.iter()
    }

    pub fn get(&self, ix: usize) -> Option<&Declaration> {
        self.decls.get(ix)
    }

    /// Index of the first declaration with this simple name (linear scan).
    pub fn position_by_name(&self, simple_name: &str) -> Option<usize> {
        self.decls.iter().position(|d| d.name == simple_name)
    }

    pub fn len(&self) -> usize { self.decls.len() }
    pub fn is_empty(&self) -> bool { self.decls.is_empty() }

    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }
}

impl<'a> IntoIterator for &'a DeclarationModel {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;
    fn into_iter(self) -> Self::IntoIter { self.decls.iter() }
}

/// Short form of a source path for log lines.
pub(crate) fn display_source(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_else(|| "<memory>".to_string())
}

// ------------------------------- Tests ------------------------------------ //
