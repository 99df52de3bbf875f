//! Maps the inferencer's [`Type`] onto the fixed C type vocabulary the
//! runtime header (`preamble`) declares.

use crate::infer::Type;

/// The C type a value of this `Type` is represented as.
pub fn c_type(ty: &Type) -> String {
    match ty {
        Type::Integer => "int64_t".to_string(),
        Type::Float => "double".to_string(),
        Type::Bool => "bool".to_string(),
        Type::String => "const char*".to_string(),
        Type::Char => "char".to_string(),
        Type::Symbol => "SchemeDatum*".to_string(),
        Type::Void => "void".to_string(),
        // Gradually-typed positions fall back to the tagged runtime
        // value; codegen emits a boxing/unboxing call at every boundary
        // where a concrete type meets an `Unknown` one.
        Type::Unknown => "SchemeValue".to_string(),
        Type::Pair(_, _) => "SchemeDatum*".to_string(),
        Type::Vector(elem) if matches!(**elem, Type::Float) => "VectorF".to_string(),
        Type::Vector(_) => "SchemeDatum*".to_string(),
        Type::Function(_, _) => "ClosureRef".to_string(),
        Type::Var(_) => "SchemeValue".to_string(),
    }
}

/// A C expression producing a reasonable default value for `ty`, used
/// where an `if` with no `else` or an empty `begin` is used in expression
/// position (spec.md's "unspecified" result still has to be *some* C
/// value).
pub fn default_value_for(ty: &Type) -> String {
    match ty {
        Type::Integer => "0".to_string(),
        Type::Float => "0.0".to_string(),
        Type::Bool => "false".to_string(),
        Type::String => "\"\"".to_string(),
        Type::Char => "'\\0'".to_string(),
        Type::Void => "".to_string(),
        Type::Symbol | Type::Pair(_, _) => "NULL".to_string(),
        Type::Vector(elem) if matches!(**elem, Type::Float) => "vector_f_create_from_array(NULL, 0)".to_string(),
        Type::Vector(_) => "NULL".to_string(),
        Type::Function(_, _) => "((ClosureRef){ .function_pointer = NULL, .environment_pointer = NULL })".to_string(),
        Type::Unknown | Type::Var(_) => "scheme_value_void()".to_string(),
    }
}
