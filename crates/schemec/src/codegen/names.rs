//! C identifier naming and collision avoidance.
//!
//! Scheme identifiers can contain characters C identifiers can't (`-`,
//! `?`, `!`, `*`, `+`, `<`, `=`, `>`), so every source name is rewritten
//! through [`sanitize`] before it reaches generated C. Nodes and bindings
//! that need a *globally* unique C name (lifted lambda bodies, their
//! environment structs) are additionally suffixed with their arena index,
//! which is already unique by construction.

use schemec_support::{Interner, Symbol};

use crate::ast::NodeId;
use crate::binder::BindingId;

/// Rewrites `name` into a valid, if ugly, C identifier fragment.
/// Collisions between two different Scheme names that sanitize to the
/// same fragment are resolved by the caller's numeric suffix, not here.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => out.push(c),
            '-' => out.push('_'),
            '?' => out.push_str("_p"),
            '!' => out.push_str("_b"),
            '*' => out.push_str("_star"),
            '+' => out.push_str("_plus"),
            '/' => out.push_str("_slash"),
            '<' => out.push_str("_lt"),
            '>' => out.push_str("_gt"),
            '=' => out.push_str("_eq"),
            _ => out.push_str(&format!("_u{:x}", c as u32)),
        }
    }
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Top-level `define`s get their sanitized source name verbatim — module
/// scope is never captured (see `crate::binder`), so these names are
/// already unique across the program and never need an arena suffix.
pub fn toplevel_name(interner: &Interner, name: Symbol) -> String {
    let sanitized = sanitize(interner.resolve(name));
    if sanitized == "main" {
        // Collision with the synthesized C entry point; the generated
        // `main` calls this one after running top-level statements.
        "main_".to_string()
    } else {
        sanitized
    }
}

/// A non-top-level binding's local C variable name: the sanitized source
/// name plus its `BindingId`, so two `let`-bound `x`s in sibling scopes
/// never collide.
pub fn local_name(interner: &Interner, scheme_name: Symbol, binding: BindingId) -> String {
    format!("{}_{}", sanitize(interner.resolve(scheme_name)), binding.as_u32())
}

/// C function name for a lambda lifted out of expression position.
pub fn lambda_fn_name(node: NodeId) -> String {
    format!("lambda_{}", node.as_u32())
}

/// C struct/variable name for a lambda's heap-allocated capture environment.
pub fn env_struct_name(node: NodeId) -> String {
    format!("env_{}", node.as_u32())
}

pub fn env_var_name(node: NodeId) -> String {
    format!("env_{}_v", node.as_u32())
}
