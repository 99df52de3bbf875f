//! Constraint generation: one post-order walk of the AST that assigns a
//! fresh type variable to every node and binding, generates the
//! equalities spec.md §4.4 describes for each node kind, and defers the
//! handful of rules (arithmetic promotion, `and`/`or`'s common-type
//! fallback) that need every operand's *resolved* type rather than
//! pairwise equality.

use std::collections::HashMap;

use schemec_support::{Interner, Span, Symbol};

use crate::ast::{Ast, CallForm, IfForm, LambdaForm, LetForm, NodeId, NodeKind, TypeAnnotation};
use crate::binder::{BindingId, BindingTable};
use crate::diagnostics::Diagnostics;
use crate::infer::operators::{self, Intrinsic};
use crate::infer::types::Type;
use crate::infer::unify::{TypeVarId, UnionFind};
use crate::infer::TypeMap;

struct DeferredArith {
    span: Span,
    result_var: TypeVarId,
    operand_vars: Vec<TypeVarId>,
}

struct DeferredAndOr {
    span: Span,
    result_var: TypeVarId,
    operand_vars: Vec<TypeVarId>,
}

struct Infer<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    binder: &'a BindingTable,
    diagnostics: &'a mut Diagnostics,
    declarations: HashMap<Symbol, TypeAnnotation>,
    uf: UnionFind,
    node_vars: HashMap<NodeId, TypeVarId>,
    binding_vars: HashMap<BindingId, TypeVarId>,
    deferred_arith: Vec<DeferredArith>,
    deferred_and_or: Vec<DeferredAndOr>,
}

pub fn run(ast: &Ast, interner: &Interner, binder: &BindingTable, diagnostics: &mut Diagnostics) -> TypeMap {
    let mut declarations = HashMap::new();
    if let Some(program) = ast.program {
        if let NodeKind::Program(forms) = &ast.node(program).kind {
            for &f in forms {
                if let NodeKind::TypeDeclaration { name, signature } = &ast.node(f).kind {
                    declarations.insert(*name, signature.clone());
                }
            }
        }
    }
    let mut infer = Infer {
        ast,
        interner,
        binder,
        diagnostics,
        declarations,
        uf: UnionFind::new(),
        node_vars: HashMap::new(),
        binding_vars: HashMap::new(),
        deferred_arith: Vec::new(),
        deferred_and_or: Vec::new(),
    };
    if let Some(program) = ast.program {
        infer.infer_expr(program);
    }
    infer.finalize()
}

impl Infer<'_> {
    fn fresh_var(&mut self) -> TypeVarId {
        self.uf.fresh()
    }

    fn var_for_node(&mut self, node: NodeId) -> TypeVarId {
        *self.node_vars.entry(node).or_insert_with(|| self.uf.fresh())
    }

    fn var_for_binding(&mut self, id: BindingId) -> TypeVarId {
        *self.binding_vars.entry(id).or_insert_with(|| self.uf.fresh())
    }

    fn unify_vars(&mut self, a: TypeVarId, b: TypeVarId, span: Span) {
        self.uf.unify(Type::Var(a), Type::Var(b), span, self.diagnostics);
    }

    fn bind(&mut self, var: TypeVarId, ty: Type, span: Span) {
        self.uf.unify(Type::Var(var), ty, span, self.diagnostics);
    }

    fn convert_annotation(&self, ann: &TypeAnnotation) -> Type {
        Type::from_annotation(ann)
    }

    fn infer_expr(&mut self, node: NodeId) -> TypeVarId {
        let v = self.var_for_node(node);
        let span = self.ast.node(node).span;
        match self.ast.node(node).kind.clone() {
            NodeKind::IntegerLiteral(_) => self.bind(v, Type::Integer, span),
            NodeKind::FloatLiteral(_) => self.bind(v, Type::Float, span),
            NodeKind::BoolLiteral(_) => self.bind(v, Type::Bool, span),
            NodeKind::StringLiteral(_) => self.bind(v, Type::String, span),
            NodeKind::CharLiteral(_) => self.bind(v, Type::Char, span),
            NodeKind::Identifier(_) => {
                if let Some(binding_id) = self.binder.resolution(node) {
                    let bv = self.var_for_binding(binding_id);
                    self.unify_vars(v, bv, span);
                } else {
                    // Either an intrinsic name used bare (not as a call
                    // head — unsupported, see codegen) or a poisoned
                    // reference the binder already diagnosed.
                    self.bind(v, Type::Unknown, span);
                }
            }
            NodeKind::Lambda(form) => self.infer_lambda(node, v, form),
            NodeKind::Define { name, value, .. } => self.infer_define(v, name, value, span, node),
            NodeKind::If(f) => self.infer_if(v, f, span),
            NodeKind::Let(f) => self.infer_let(node, v, f, span),
            NodeKind::Set { target, value } => self.infer_set(v, target, value, span),
            NodeKind::Begin(exprs) => self.infer_begin(v, &exprs, span),
            NodeKind::Quote(_) => self.bind(v, Type::Unknown, span),
            NodeKind::And(exprs) | NodeKind::Or(exprs) => self.infer_and_or(v, &exprs, span),
            NodeKind::Call(c) => self.infer_call(v, c, span),
            NodeKind::TypeDeclaration { .. } => self.bind(v, Type::Void, span),
            NodeKind::Program(forms) => {
                for f in forms {
                    self.infer_expr(f);
                }
                self.bind(v, Type::Void, span);
            }
            NodeKind::Erroneous => self.bind(v, Type::Unknown, span),
        }
        v
    }

    fn infer_lambda(&mut self, node: NodeId, v: TypeVarId, form: LambdaForm) {
        let span = self.ast.node(node).span;
        let parameter_bindings = self
            .binder
            .lambda_info(node)
            .expect("binder annotates every Lambda node")
            .parameter_bindings
            .clone();
        let mut param_vars = Vec::with_capacity(form.params.len());
        for (param, &binding_id) in form.params.iter().zip(parameter_bindings.iter()) {
            let pv = self.var_for_binding(binding_id);
            if let Some(ann) = &param.annotation {
                let t = self.convert_annotation(ann);
                self.bind(pv, t, param.span);
            }
            param_vars.push(pv);
        }
        let body_span = self.ast.node(form.body).span;
        let body_var = self.infer_expr(form.body);
        if let Some(ret_ann) = &form.return_annotation {
            let t = self.convert_annotation(ret_ann);
            self.bind(body_var, t, body_span);
        }
        let fn_type = Type::Function(param_vars.into_iter().map(Type::Var).collect(), Box::new(Type::Var(body_var)));
        self.bind(v, fn_type, span);
    }

    fn infer_define(&mut self, v: TypeVarId, name: Symbol, value: NodeId, span: Span, node: NodeId) {
        let value_var = self.infer_expr(value);
        if let Some(&binding_id) = self.binder.define_bindings.get(&node) {
            let bv = self.var_for_binding(binding_id);
            if let Some(decl) = self.declarations.get(&name).cloned() {
                let t = self.convert_annotation(&decl);
                self.bind(bv, t, span);
            }
            self.unify_vars(bv, value_var, span);
        }
        self.bind(v, Type::Void, span);
    }

    fn infer_if(&mut self, v: TypeVarId, f: IfForm, span: Span) {
        let test_v = self.infer_expr(f.test);
        self.bind(test_v, Type::Bool, span);
        let cons_v = self.infer_expr(f.consequent);
        match f.alternate {
            Some(alt) => {
                let alt_v = self.infer_expr(alt);
                self.unify_vars(cons_v, alt_v, span);
            }
            None => {}
        }
        self.unify_vars(v, cons_v, span);
    }

    fn infer_let(&mut self, node: NodeId, v: TypeVarId, f: LetForm, span: Span) {
        let binding_ids = self.binder.let_bindings.get(&node).cloned().unwrap_or_default();
        match f.kind {
            crate::ast::LetKind::Let => {
                for (b, &bid) in f.bindings.iter().zip(binding_ids.iter()) {
                    let init_v = self.infer_expr(b.value);
                    let bv = self.var_for_binding(bid);
                    if let Some(ann) = &b.annotation {
                        let t = self.convert_annotation(ann);
                        self.bind(bv, t, b.span);
                    }
                    self.unify_vars(bv, init_v, b.span);
                }
            }
            crate::ast::LetKind::LetStar | crate::ast::LetKind::LetRec => {
                for (b, &bid) in f.bindings.iter().zip(binding_ids.iter()) {
                    let bv = self.var_for_binding(bid);
                    if let Some(ann) = &b.annotation {
                        let t = self.convert_annotation(ann);
                        self.bind(bv, t, b.span);
                    }
                    let init_v = self.infer_expr(b.value);
                    self.unify_vars(bv, init_v, b.span);
                }
            }
        }
        let body_v = self.infer_expr(f.body);
        self.unify_vars(v, body_v, span);
    }

    fn infer_set(&mut self, v: TypeVarId, target: NodeId, value: NodeId, span: Span) {
        let target_v = self.infer_expr(target);
        let value_v = self.infer_expr(value);
        // Open Question resolved: `set!` must preserve the binding's
        // inferred type (spec.md's design notes), so this is an ordinary
        // equality constraint, not a widening one.
        self.unify_vars(target_v, value_v, span);
        self.bind(v, Type::Void, span);
    }

    fn infer_begin(&mut self, v: TypeVarId, exprs: &[NodeId], span: Span) {
        if exprs.is_empty() {
            self.bind(v, Type::Void, span);
            return;
        }
        let mut last = None;
        for &e in exprs {
            last = Some(self.infer_expr(e));
        }
        self.unify_vars(v, last.expect("checked non-empty above"), span);
    }

    fn infer_and_or(&mut self, v: TypeVarId, exprs: &[NodeId], span: Span) {
        if exprs.is_empty() {
            self.bind(v, Type::Bool, span);
            return;
        }
        let operand_vars: Vec<_> = exprs.iter().map(|&e| self.infer_expr(e)).collect();
        self.deferred_and_or.push(DeferredAndOr { span, result_var: v, operand_vars });
    }

    fn infer_call(&mut self, v: TypeVarId, c: CallForm, span: Span) {
        if let NodeKind::Identifier(sym) = self.ast.node(c.callee).kind.clone() {
            let is_user_binding = self.binder.resolution(c.callee).is_some();
            if !is_user_binding {
                let name = self.interner.resolve(sym).to_string();
                if let Some(kind) = operators::lookup(&name) {
                    self.infer_intrinsic_call(v, kind, &c.args, span);
                    return;
                }
            }
        }
        let callee_var = self.infer_expr(c.callee);
        let arg_vars: Vec<TypeVarId> = c.args.iter().map(|&a| self.infer_expr(a)).collect();
        let fn_type = Type::Function(arg_vars.into_iter().map(Type::Var).collect(), Box::new(Type::Var(v)));
        self.bind(callee_var, fn_type, span);
    }

    fn infer_intrinsic_call(&mut self, v: TypeVarId, kind: Intrinsic, args: &[NodeId], span: Span) {
        let arg_vars: Vec<TypeVarId> = args.iter().map(|&a| self.infer_expr(a)).collect();
        match kind {
            Intrinsic::Arithmetic => {
                if arg_vars.is_empty() {
                    self.diagnostics.warning(span, "arithmetic operator needs at least one argument").emit();
                    self.bind(v, Type::Unknown, span);
                    return;
                }
                self.deferred_arith.push(DeferredArith { span, result_var: v, operand_vars: arg_vars });
            }
            Intrinsic::Comparison => {
                for w in arg_vars.windows(2) {
                    self.unify_vars(w[0], w[1], span);
                }
                self.bind(v, Type::Bool, span);
            }
            Intrinsic::Not => {
                self.bind(v, Type::Bool, span);
            }
            Intrinsic::Vector => {
                for &a in &arg_vars {
                    self.bind(a, Type::Float, span);
                }
                self.bind(v, Type::Vector(Box::new(Type::Float)), span);
            }
            Intrinsic::VectorArith => {
                for &a in &arg_vars {
                    self.bind(a, Type::Vector(Box::new(Type::Float)), span);
                }
                self.bind(v, Type::Vector(Box::new(Type::Float)), span);
            }
            Intrinsic::Dot => {
                for &a in &arg_vars {
                    self.bind(a, Type::Vector(Box::new(Type::Float)), span);
                }
                self.bind(v, Type::Float, span);
            }
            Intrinsic::Cross => {
                for &a in &arg_vars {
                    self.bind(a, Type::Vector(Box::new(Type::Float)), span);
                }
                self.bind(v, Type::Vector(Box::new(Type::Float)), span);
            }
            Intrinsic::Norm => {
                self.bind(arg_vars[0], Type::Vector(Box::new(Type::Float)), span);
                self.bind(v, Type::Float, span);
            }
            Intrinsic::Gradient => self.field_op(&arg_vars, v, Type::Vector(Box::new(Type::Float)), Type::Float, Type::Vector(Box::new(Type::Float)), span),
            Intrinsic::Divergence => self.field_op(&arg_vars, v, Type::Vector(Box::new(Type::Float)), Type::Vector(Box::new(Type::Float)), Type::Float, span),
            Intrinsic::Curl => self.field_op(&arg_vars, v, Type::Vector(Box::new(Type::Float)), Type::Vector(Box::new(Type::Float)), Type::Vector(Box::new(Type::Float)), span),
            Intrinsic::Laplacian => self.field_op(&arg_vars, v, Type::Vector(Box::new(Type::Float)), Type::Float, Type::Float, span),
            Intrinsic::AutodiffForward | Intrinsic::AutodiffReverse | Intrinsic::Derivative => {
                if let Some(&fv) = arg_vars.first() {
                    self.bind(fv, Type::Function(vec![Type::Float], Box::new(Type::Float)), span);
                }
                for &a in arg_vars.iter().skip(1) {
                    self.bind(a, Type::Float, span);
                }
                self.bind(v, Type::Float, span);
            }
            Intrinsic::AutodiffForwardGradient | Intrinsic::AutodiffReverseGradient => {
                self.field_op(&arg_vars, v, Type::Vector(Box::new(Type::Float)), Type::Float, Type::Vector(Box::new(Type::Float)), span)
            }
            Intrinsic::AutodiffJacobian => self.field_op(
                &arg_vars,
                v,
                Type::Vector(Box::new(Type::Float)),
                Type::Vector(Box::new(Type::Float)),
                Type::Vector(Box::new(Type::Vector(Box::new(Type::Float)))),
                span,
            ),
            Intrinsic::AutodiffHessian => self.field_op(
                &arg_vars,
                v,
                Type::Vector(Box::new(Type::Float)),
                Type::Float,
                Type::Vector(Box::new(Type::Vector(Box::new(Type::Float)))),
                span,
            ),
            Intrinsic::Display | Intrinsic::Printf => {
                self.bind(v, Type::Void, span);
            }
            Intrinsic::StringAppend => {
                for &a in &arg_vars {
                    self.bind(a, Type::String, span);
                }
                self.bind(v, Type::String, span);
            }
            Intrinsic::NumberToString => {
                self.bind(v, Type::String, span);
            }
        }
    }

    /// Shared shape for the vector-calculus/autodiff operators taking a
    /// function argument plus a point argument: constrains the function
    /// to `Function([arg_ty], ret_ty)`, the point argument (if present)
    /// to `arg_ty`, and the call's own type to `result_ty`.
    fn field_op(&mut self, arg_vars: &[TypeVarId], v: TypeVarId, arg_ty: Type, ret_ty: Type, result_ty: Type, span: Span) {
        if let Some(&fv) = arg_vars.first() {
            self.bind(fv, Type::Function(vec![arg_ty.clone()], Box::new(ret_ty)), span);
        }
        for &a in arg_vars.iter().skip(1) {
            self.bind(a, arg_ty.clone(), span);
        }
        self.bind(v, result_ty, span);
    }

    fn resolve_deferred_arith(&mut self, item: DeferredArith) {
        let mut any_float = false;
        let mut any_integer = false;
        for &ov in &item.operand_vars {
            match self.uf.resolve(&Type::Var(ov)) {
                Type::Float => any_float = true,
                Type::Integer => any_integer = true,
                Type::Unknown | Type::Var(_) => {}
                other => {
                    self.diagnostics
                        .warning(item.span, format!("arithmetic operand must be numeric, found `{other}`"))
                        .emit();
                }
            }
        }
        let result = if any_float {
            Type::Float
        } else if any_integer {
            Type::Integer
        } else {
            Type::Unknown
        };
        self.bind(item.result_var, result, item.span);
    }

    fn resolve_deferred_and_or(&mut self, item: DeferredAndOr) {
        let resolved: Vec<Type> = item.operand_vars.iter().map(|&ov| self.uf.resolve(&Type::Var(ov))).collect();
        if resolved.iter().any(|t| *t == Type::Bool) {
            self.bind(item.result_var, Type::Bool, item.span);
            return;
        }
        for w in item.operand_vars.windows(2) {
            self.unify_vars(w[0], w[1], item.span);
        }
        if let Some(&first) = item.operand_vars.first() {
            self.unify_vars(item.result_var, first, item.span);
        } else {
            self.bind(item.result_var, Type::Bool, item.span);
        }
    }

    fn finalize(mut self) -> TypeMap {
        for item in std::mem::take(&mut self.deferred_arith) {
            self.resolve_deferred_arith(item);
        }
        for item in std::mem::take(&mut self.deferred_and_or) {
            self.resolve_deferred_and_or(item);
        }

        let mut map = TypeMap::new();
        let nodes: Vec<_> = self.node_vars.iter().map(|(&n, &v)| (n, v)).collect();
        for (node, var) in nodes {
            let resolved = self.uf.resolve(&Type::Var(var));
            let (widened, had_unresolved) = widen(resolved);
            if had_unresolved {
                let span = self.ast.node(node).span;
                self.diagnostics
                    .info(span, "type left ambiguous after inference; widened to `unknown`")
                    .emit();
            }
            map.insert(node, widened);
        }
        map
    }
}

/// Replaces every remaining `Var` in `ty` with `Unknown`, bottom-up.
/// Returns whether any substitution happened (spec.md §4.4 step 5).
fn widen(ty: Type) -> (Type, bool) {
    match ty {
        Type::Var(_) => (Type::Unknown, true),
        Type::Pair(a, b) => {
            let (a, ca) = widen(*a);
            let (b, cb) = widen(*b);
            (Type::Pair(Box::new(a), Box::new(b)), ca || cb)
        }
        Type::Vector(a) => {
            let (a, changed) = widen(*a);
            (Type::Vector(Box::new(a)), changed)
        }
        Type::Function(args, ret) => {
            let mut changed = false;
            let args = args
                .into_iter()
                .map(|a| {
                    let (a, c) = widen(a);
                    changed |= c;
                    a
                })
                .collect();
            let (ret, c) = widen(*ret);
            changed |= c;
            (Type::Function(args, Box::new(ret)), changed)
        }
        other => (other, false),
    }
}
