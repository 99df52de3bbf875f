//! The built-in operator table (spec.md §4.4's "concrete operator-type
//! table"). Shared by the binder (to recognize an unresolved call head as
//! an intrinsic rather than a missing binding), the inferencer (to
//! generate that intrinsic's constraints), and the code generator (to
//! lower the call to the matching runtime entry point) — one name list,
//! three consumers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `+ - * /`: n-ary left-fold, integer/float promotion.
    Arithmetic,
    /// `= < > <= >=`: operands unify to one common numeric type.
    Comparison,
    Not,
    /// `vector`: any number of floats into one `VectorF`.
    Vector,
    /// `v+ v- v*`: vector arithmetic.
    VectorArith,
    Dot,
    Cross,
    Norm,
    Gradient,
    Divergence,
    Curl,
    Laplacian,
    AutodiffForward,
    AutodiffReverse,
    AutodiffForwardGradient,
    AutodiffReverseGradient,
    AutodiffJacobian,
    AutodiffHessian,
    Derivative,
    Display,
    Printf,
    StringAppend,
    NumberToString,
}

pub fn lookup(name: &str) -> Option<Intrinsic> {
    Some(match name {
        "+" | "-" | "*" | "/" => Intrinsic::Arithmetic,
        "=" | "<" | ">" | "<=" | ">=" => Intrinsic::Comparison,
        "not" => Intrinsic::Not,
        "vector" => Intrinsic::Vector,
        "v+" | "v-" | "v*" => Intrinsic::VectorArith,
        "dot" => Intrinsic::Dot,
        "cross" => Intrinsic::Cross,
        "norm" => Intrinsic::Norm,
        "gradient" => Intrinsic::Gradient,
        "divergence" => Intrinsic::Divergence,
        "curl" => Intrinsic::Curl,
        "laplacian" => Intrinsic::Laplacian,
        "autodiff-forward" => Intrinsic::AutodiffForward,
        "autodiff-reverse" => Intrinsic::AutodiffReverse,
        "autodiff-forward-gradient" => Intrinsic::AutodiffForwardGradient,
        "autodiff-reverse-gradient" => Intrinsic::AutodiffReverseGradient,
        "autodiff-jacobian" => Intrinsic::AutodiffJacobian,
        "autodiff-hessian" => Intrinsic::AutodiffHessian,
        "derivative" => Intrinsic::Derivative,
        "display" => Intrinsic::Display,
        "printf" => Intrinsic::Printf,
        "string-append" => Intrinsic::StringAppend,
        "number->string" => Intrinsic::NumberToString,
        _ => return None,
    })
}

/// `(min, max)` argument count, `max = None` meaning unbounded. Checked by
/// the code generator before lowering (spec.md §4.5's "intrinsic arity
/// mismatch" failure mode); the inferencer is more permissive since a
/// zero-arg arithmetic call is still type-checkable (it just gets
/// diagnosed separately as needing at least one operand).
pub fn arity(kind: Intrinsic) -> (usize, Option<usize>) {
    match kind {
        Intrinsic::Arithmetic => (1, None),
        Intrinsic::Comparison => (1, None),
        Intrinsic::Not => (1, Some(1)),
        Intrinsic::Vector => (0, None),
        Intrinsic::VectorArith => (2, Some(2)),
        Intrinsic::Dot | Intrinsic::Cross => (2, Some(2)),
        Intrinsic::Norm => (1, Some(1)),
        Intrinsic::Gradient
        | Intrinsic::Divergence
        | Intrinsic::Curl
        | Intrinsic::Laplacian
        | Intrinsic::AutodiffForward
        | Intrinsic::AutodiffReverse
        | Intrinsic::AutodiffForwardGradient
        | Intrinsic::AutodiffReverseGradient
        | Intrinsic::AutodiffJacobian
        | Intrinsic::AutodiffHessian => (2, Some(2)),
        Intrinsic::Derivative => (2, Some(2)),
        Intrinsic::Display | Intrinsic::Printf => (0, None),
        Intrinsic::StringAppend => (0, None),
        Intrinsic::NumberToString => (1, Some(1)),
    }
}
