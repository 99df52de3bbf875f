//! Lowers an intrinsic call (spec.md §4.5/§6) to a C expression, given the
//! already-lowered C source text of each argument.
//!
//! Arity is checked here, not by the inferencer (which is deliberately
//! permissive about pending `Unknown` types) — a bad arity is a genuine
//! code generation failure, not a recoverable diagnostic.

use schemec_support::Span;

use crate::diagnostics::Diagnostics;
use crate::infer::operators::{self, Intrinsic};
use crate::infer::Type;

/// Returns the lowered C expression, or `None` if arity didn't match (a
/// diagnostic has already been emitted in that case). `op_name` is the
/// literal Scheme operator text (`"+"`, `"<="`, `"v-"`, ...) since several
/// distinct operators share one [`Intrinsic`] variant. `arg_types` is
/// each argument's resolved type, needed only to pick the right
/// `scheme_display_*` overload for `display`/`printf`.
pub fn lower(
    kind: Intrinsic,
    op_name: &str,
    args: &[String],
    arg_types: &[Type],
    span: Span,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    let (min, max) = operators::arity(kind);
    if args.len() < min || max.is_some_and(|max| args.len() > max) {
        let max_desc = max.map(|m| format!("..={m}")).unwrap_or_else(|| "..".to_string());
        diagnostics
            .error(span, format!("wrong number of arguments to `{op_name}`: expected {min}{max_desc}, found {}", args.len()))
            .emit();
        return None;
    }

    Some(match kind {
        Intrinsic::Arithmetic => lower_arithmetic(op_name, args),
        Intrinsic::Comparison => lower_comparison(op_name, args),
        Intrinsic::Not => format!("(!({}))", args[0]),
        Intrinsic::Vector => {
            let n = args.len();
            let array = args.join(", ");
            format!("vector_f_create_from_array((double[]){{{array}}}, {n})")
        }
        Intrinsic::VectorArith => lower_vector_arith(op_name, args),
        Intrinsic::Dot => format!("vector_f_dot({}, {})", args[0], args[1]),
        Intrinsic::Cross => format!("vector_f_cross({}, {})", args[0], args[1]),
        Intrinsic::Norm => format!("vector_f_magnitude({})", args[0]),
        Intrinsic::Gradient | Intrinsic::AutodiffForwardGradient | Intrinsic::AutodiffReverseGradient => {
            format!("compute_gradient({}, {})", args[0], args[1])
        }
        Intrinsic::Divergence => format!("compute_divergence({}, {})", args[0], args[1]),
        Intrinsic::Curl => format!("compute_curl({}, {})", args[0], args[1]),
        Intrinsic::Laplacian => format!("compute_laplacian({}, {})", args[0], args[1]),
        Intrinsic::AutodiffForward => format!("compute_gradient_autodiff({}, {})", args[0], args[1]),
        Intrinsic::AutodiffReverse => format!("compute_gradient_reverse_mode({}, {})", args[0], args[1]),
        Intrinsic::AutodiffJacobian => format!("compute_jacobian({}, {})", args[0], args[1]),
        Intrinsic::AutodiffHessian => format!("compute_hessian({}, {})", args[0], args[1]),
        Intrinsic::Derivative => format!("compute_nth_derivative({}, {}, 1)", args[0], args[1]),
        Intrinsic::Display | Intrinsic::Printf => {
            let calls = args
                .iter()
                .zip(arg_types)
                .map(|(a, ty)| format!("{}({a})", display_fn_for(ty)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({calls})")
        }
        Intrinsic::StringAppend => {
            args.iter().fold("\"\"".to_string(), |acc, a| format!("scheme_string_append({acc}, {a})"))
        }
        Intrinsic::NumberToString => format!("scheme_number_to_string({})", args[0]),
    })
}

/// `(+ a b c ...)`/`(- a b ...)`/`(* a b ...)`/`(/ a b ...)` left-fold
/// into a parenthesized C infix chain. A unary `-` negates; a unary `/`
/// takes a reciprocal of `1.0`, matching Scheme's single-argument forms.
fn lower_arithmetic(op: &str, args: &[String]) -> String {
    if args.len() == 1 {
        return match op {
            "-" => format!("(-({}))", args[0]),
            "/" => format!("(1.0 / ({}))", args[0]),
            _ => args[0].clone(),
        };
    }
    let joined = args.join(&format!(" {op} "));
    format!("({joined})")
}

fn lower_comparison(op: &str, args: &[String]) -> String {
    let c_op = if op == "=" { "==" } else { op };
    let chain = args.windows(2).map(|w| format!("({} {c_op} {})", w[0], w[1])).collect::<Vec<_>>().join(" && ");
    format!("({chain})")
}

fn display_fn_for(ty: &Type) -> &'static str {
    match ty {
        Type::Integer => "scheme_display_int",
        Type::Float => "scheme_display_float",
        Type::Bool => "scheme_display_bool",
        Type::Char => "scheme_display_char",
        Type::String => "scheme_display_string",
        _ => "scheme_display_value",
    }
}

fn lower_vector_arith(op: &str, args: &[String]) -> String {
    match op {
        "v+" => format!("vector_f_add({}, {})", args[0], args[1]),
        "v-" => format!("vector_f_sub({}, {})", args[0], args[1]),
        "v*" => format!("vector_f_mul_scalar({}, {})", args[0], args[1]),
        _ => unreachable!("lower_vector_arith is only called for v+/v-/v*"),
    }
}
