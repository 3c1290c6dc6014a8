//! Constructor descriptors for the templates.
use serde::Serialize;

use crate::model::{Declaration, TypeRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorDescriptor {
    pub name: String,
    pub args: Vec<ArgDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgDescriptor {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

/// One descriptor per constructor of `decl`, constructor and parameter order
/// kept. `partner` feeds [`substitute_unresolved_generic`].
pub fn reconcile(decl: Option<&Declaration>, partner: Option<&Declaration>) -> Vec<ConstructorDescriptor> {
    let Some(decl) = decl else { return Vec::new() };
    decl.constructors
        .iter()
        .map(|ctor| ConstructorDescriptor {
            name: ctor.name.clone(),
            args: ctor
                .params
                .iter()
                .map(|p| ArgDescriptor {
                    ty: substitute_unresolved_generic(&p.ty, partner)
                        .unwrap_or_else(|| p.ty.text.clone()),
                    name: p.name.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Guess the binding of a generic parameter the model could not resolve.
///
/// An unresolved, single-character type is assumed to be bound to the
/// partner declaration, so the partner's qualified name is returned. This is
/// a naming heuristic, not type resolution: a base class whose type parameter
/// means something else gets the wrong type.
pub fn substitute_unresolved_generic(ty: &TypeRef, partner: Option<&Declaration>) -> Option<String> {
    let partner = partner?;
    let single_char = ty.text.chars().count() == 1;
    (!ty.resolved && single_char).then(|| partner.qualified_name())
}
