//! Union-find over type variables, with path compression and an occurs
//! check. This is the solver half of the inferencer; `constrain` is the
//! half that walks the AST generating the equalities fed into it.

use schemec_support::{Idx, Span};

use crate::diagnostics::Diagnostics;
use crate::infer::types::Type;

/// Uninhabited marker distinguishing [`TypeVarId`] from every other
/// [`Idx`] handle in the compiler.
pub enum TypeVarMarker {}
pub type TypeVarId = Idx<TypeVarMarker>;

#[derive(Debug, Default)]
pub struct UnionFind {
    parent: Vec<TypeVarId>,
    bound: Vec<Option<Type>>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> TypeVarId {
        let id = Idx::from_raw(self.parent.len() as u32);
        self.parent.push(id);
        self.bound.push(None);
        id
    }

    pub fn find(&mut self, v: TypeVarId) -> TypeVarId {
        let i = v.as_u32() as usize;
        let parent = self.parent[i];
        if parent == v {
            return v;
        }
        let root = self.find(parent);
        self.parent[i] = root;
        root
    }

    fn bound_at(&self, root: TypeVarId) -> Option<Type> {
        self.bound[root.as_u32() as usize].clone()
    }

    /// Follows `ty` one level: a `Var` resolves to its union-find root,
    /// and then to that root's bound type if it has one. Every other
    /// shape is returned untouched — use [`resolve`](Self::resolve) to
    /// substitute recursively through structural positions too.
    pub fn shallow(&mut self, ty: Type) -> Type {
        match ty {
            Type::Var(v) => {
                let root = self.find(v);
                match self.bound_at(root) {
                    Some(bound) => self.shallow(bound),
                    None => Type::Var(root),
                }
            }
            other => other,
        }
    }

    /// Fully resolves `ty`, substituting every bound variable it
    /// contains, recursively. A variable left with no binding remains as
    /// `Type::Var` — the caller widens those to `Unknown` once inference
    /// is otherwise complete (spec.md §4.4 step 5).
    pub fn resolve(&mut self, ty: &Type) -> Type {
        match self.shallow(ty.clone()) {
            Type::Pair(a, b) => Type::Pair(Box::new(self.resolve(&a)), Box::new(self.resolve(&b))),
            Type::Vector(a) => Type::Vector(Box::new(self.resolve(&a))),
            Type::Function(args, ret) => {
                Type::Function(args.iter().map(|a| self.resolve(a)).collect(), Box::new(self.resolve(&ret)))
            }
            other => other,
        }
    }

    fn bind_var(&mut self, v: TypeVarId, ty: Type, span: Span, diagnostics: &mut Diagnostics) {
        if occurs(self, v, &ty) {
            diagnostics
                .error(span, format!("infinite type while solving `?{}`", v.as_u32()))
                .emit();
            return;
        }
        let root = self.find(v);
        self.bound[root.as_u32() as usize] = Some(ty);
    }

    /// Unifies `a` and `b`. `Unknown` absorbs against constraint
    /// failures on either side without forcing a binding onto the other
    /// side — unifying a lone variable against `Unknown` leaves that
    /// variable free, so it is later widened to `Unknown` by the
    /// finalization step rather than pinned to it here. This is what
    /// keeps gradual typing gradual: a variable that *does* get
    /// constrained elsewhere to something concrete still resolves to
    /// that concrete type.
    pub fn unify(&mut self, a: Type, b: Type, span: Span, diagnostics: &mut Diagnostics) {
        let a = self.shallow(a);
        let b = self.shallow(b);
        match (a, b) {
            (Type::Unknown, _) | (_, Type::Unknown) => {}
            (Type::Var(va), Type::Var(vb)) => {
                let (ra, rb) = (self.find(va), self.find(vb));
                if ra != rb {
                    self.parent[rb.as_u32() as usize] = ra;
                }
            }
            (Type::Var(v), other) | (other, Type::Var(v)) => self.bind_var(v, other, span, diagnostics),
            (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::Char, Type::Char)
            | (Type::Symbol, Type::Symbol)
            | (Type::Void, Type::Void) => {}
            (Type::Pair(a1, a2), Type::Pair(b1, b2)) => {
                self.unify(*a1, *b1, span, diagnostics);
                self.unify(*a2, *b2, span, diagnostics);
            }
            (Type::Vector(a1), Type::Vector(b1)) => self.unify(*a1, *b1, span, diagnostics),
            (Type::Function(pa, ra), Type::Function(pb, rb)) => {
                if pa.len() != pb.len() {
                    diagnostics
                        .warning(span, format!("expected a function of {} argument(s), found {}", pa.len(), pb.len()))
                        .emit();
                    return;
                }
                for (x, y) in pa.into_iter().zip(pb) {
                    self.unify(x, y, span, diagnostics);
                }
                self.unify(*ra, *rb, span, diagnostics);
            }
            (a, b) => {
                // TypeMismatch is deliberately a warning, not an error:
                // spec.md §4.4 has inference recover by widening the
                // offending node to Unknown and letting code generation
                // proceed, rather than stopping the pipeline.
                diagnostics.warning(span, format!("type mismatch: expected `{a}`, found `{b}`")).emit();
            }
        }
    }
}

fn occurs(uf: &mut UnionFind, v: TypeVarId, ty: &Type) -> bool {
    match uf.shallow(ty.clone()) {
        Type::Var(other) => uf.find(other) == uf.find(v),
        Type::Pair(a, b) => occurs(uf, v, &a) || occurs(uf, v, &b),
        Type::Vector(a) => occurs(uf, v, &a),
        Type::Function(args, ret) => args.iter().any(|a| occurs(uf, v, a)) || occurs(uf, v, &ret),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemec_support::Span;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn unifies_two_fresh_vars_to_same_root() {
        let mut uf = UnionFind::new();
        let mut diagnostics = Diagnostics::new();
        let a = uf.fresh();
        let b = uf.fresh();
        uf.unify(Type::Var(a), Type::Var(b), span(), &mut diagnostics);
        uf.unify(Type::Var(a), Type::Integer, span(), &mut diagnostics);
        assert_eq!(uf.resolve(&Type::Var(b)), Type::Integer);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_does_not_bind_the_other_side() {
        let mut uf = UnionFind::new();
        let mut diagnostics = Diagnostics::new();
        let a = uf.fresh();
        uf.unify(Type::Var(a), Type::Unknown, span(), &mut diagnostics);
        assert_eq!(uf.resolve(&Type::Var(a)), Type::Var(uf.find(a)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn mismatched_ground_types_warn_not_error() {
        let mut uf = UnionFind::new();
        let mut diagnostics = Diagnostics::new();
        uf.unify(Type::Integer, Type::Bool, span(), &mut diagnostics);
        assert!(!diagnostics.is_empty());
        assert!(!diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut uf = UnionFind::new();
        let mut diagnostics = Diagnostics::new();
        let a = uf.fresh();
        let recursive = Type::Vector(Box::new(Type::Var(a)));
        uf.unify(Type::Var(a), recursive, span(), &mut diagnostics);
        assert!(diagnostics.has_errors());
    }
}
