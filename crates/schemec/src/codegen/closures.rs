//! Closure lowering: every lambda that is used as a first-class value
//! (as opposed to being the direct right-hand side of a top-level
//! `define`, see `crate::binder`'s module-scope-is-never-captured rule)
//! becomes a lifted top-level C function plus a heap-allocated
//! environment struct holding its free variables.
//!
//! A binding flagged `boxed` (mutable *and* captured) is stored as a
//! pointer indirection (`T*`) everywhere, including inside the
//! environment struct and at its original declaration site, so every
//! closure sharing it observes the same cell after a `set!`.

use crate::ast::NodeId;
use crate::binder::{BindingId, BindingTable};
use crate::infer::{Type, TypeMap};

use super::names::{env_struct_name, env_var_name, lambda_fn_name, local_name};
use super::types::c_type;

pub struct EnvField {
    pub binding: BindingId,
    pub field_name: String,
    pub c_type: String,
    pub boxed: bool,
}

/// The fields of `lambda_node`'s environment struct, in the lambda's
/// first-reference capture order (`IndexSet` preserves this already).
pub fn env_fields(lambda_node: NodeId, binder: &BindingTable, types: &TypeMap, interner: &schemec_support::Interner) -> Vec<EnvField> {
    let info = binder.lambda_info(lambda_node).expect("binder annotates every Lambda node");
    info.free_bindings
        .iter()
        .map(|&binding_id| {
            let binding = binder.binding(binding_id);
            let field_name = local_name(interner, binding.name, binding_id);
            let inner_ty = types.get(&binding.defining_node_id).cloned().unwrap_or(Type::Unknown);
            let boxed = binding.flags.boxed;
            let ty = if boxed { format!("{}*", c_type(&inner_ty)) } else { c_type(&inner_ty) };
            EnvField { binding: binding_id, field_name, c_type: ty, boxed }
        })
        .collect()
}

pub fn env_typedef(lambda_node: NodeId, fields: &[EnvField]) -> String {
    let name = env_struct_name(lambda_node);
    let mut body = String::new();
    for f in fields {
        body.push_str(&format!("    {} {};\n", f.c_type, f.field_name));
    }
    format!("typedef struct {name} {{\n{body}}} {name};\n")
}

/// C expression allocating and populating the environment struct for a
/// closure literal at its creation site (already-lowered capture value
/// expressions, one per field, in the same order as `fields`).
pub fn env_alloc_expr(lambda_node: NodeId, fields: &[EnvField], field_values: &[String]) -> String {
    let struct_name = env_struct_name(lambda_node);
    let var_name = env_var_name(lambda_node);
    let mut assigns = String::new();
    for (f, value) in fields.iter().zip(field_values) {
        assigns.push_str(&format!("{var_name}->{} = {value}; ", f.field_name));
    }
    format!(
        "({{ {struct_name}* {var_name} = ({struct_name}*)arena_alloc(arena, sizeof({struct_name})); {assigns}(ClosureRef){{ .function_pointer = (void*){}, .environment_pointer = (void*){var_name} }}; }})",
        lambda_fn_name(lambda_node)
    )
}
