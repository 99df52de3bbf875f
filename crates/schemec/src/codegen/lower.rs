//! Per-`NodeKind` lowering to C source text.
//!
//! Expression-position forms return a C expression string; `let` and
//! `begin` fall back to a GNU C statement-expression (`({ ...; value; })`)
//! when used as values, since standard C has no block-as-expression.

use std::collections::{HashMap, HashSet};

use schemec_support::{Interner, Symbol};

use crate::ast::{CallForm, DatumId, DatumKind, LetForm, LetKind, LambdaForm, NodeId, NodeKind};
use crate::binder::{BindingId, BindingTable, ScopeKind};
use crate::diagnostics::Diagnostics;
use crate::infer::{operators, Type, TypeMap};

use super::closures::{env_alloc_expr, env_fields, env_typedef, EnvField};
use super::emitter::Emitter;
use super::names::{env_struct_name, env_var_name, lambda_fn_name, local_name, toplevel_name};
use super::types::{c_type, default_value_for};
use super::{intrinsics, EXIT_SUCCESS};
use crate::ast::Ast;

pub struct Lowering<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    binder: &'a BindingTable,
    types: &'a TypeMap,
    diagnostics: &'a mut Diagnostics,
    /// Lambda node -> its top-level C name, for lambdas that are the
    /// direct value of a module-scope `define` (never closures, since
    /// module scope can't be captured).
    direct_toplevel: HashMap<NodeId, String>,
    /// Lambda nodes lifted as closures, queued the first time they're
    /// encountered and drained after the main pass.
    queue: Vec<NodeId>,
    queued: HashSet<NodeId>,
    /// The lambda currently being lowered, if any — tells `lvalue` when a
    /// binding reference must route through `env->field` instead of a
    /// bare local C variable.
    current_lambda: Option<NodeId>,
    /// Counter for the arena-allocated temporaries a quoted list/pair
    /// lowers through; just needs to be unique per translation unit.
    quote_tmp_counter: u32,
    failed: bool,
}

fn node_type(types: &TypeMap, node: NodeId) -> Type {
    types.get(&node).cloned().unwrap_or(Type::Unknown)
}

impl<'a> Lowering<'a> {
    pub fn new(ast: &'a Ast, interner: &'a Interner, binder: &'a BindingTable, types: &'a TypeMap, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            ast,
            interner,
            binder,
            types,
            diagnostics,
            direct_toplevel: HashMap::new(),
            queue: Vec::new(),
            queued: HashSet::new(),
            current_lambda: None,
            quote_tmp_counter: 0,
            failed: false,
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Emits everything but the fixed preamble.
    pub fn generate(&mut self) -> Option<String> {
        let Some(program) = self.ast.program else { return Some(String::new()) };
        let NodeKind::Program(forms) = self.ast.node(program).kind.clone() else {
            unreachable!("Ast::program always points at a Program node")
        };

        for &f in &forms {
            if let NodeKind::Define { name, value, .. } = self.ast.node(f).kind.clone() {
                if matches!(self.ast.node(value).kind, NodeKind::Lambda(_)) {
                    self.direct_toplevel.insert(value, toplevel_name(self.interner, name));
                }
            }
        }

        let mut globals = Emitter::new();
        let mut functions = Emitter::new();
        let mut main_init = Emitter::new();
        let mut has_user_main = false;

        for &f in &forms {
            match self.ast.node(f).kind.clone() {
                NodeKind::Define { name, value, .. } => {
                    if let Some(fn_name) = self.direct_toplevel.get(&value).cloned() {
                        has_user_main |= fn_name == "main_";
                        let NodeKind::Lambda(form) = self.ast.node(value).kind.clone() else {
                            unreachable!("direct_toplevel only ever maps Lambda nodes")
                        };
                        self.emit_function(&mut functions, &fn_name, value, &form);
                    } else {
                        let ty = node_type(self.types, value);
                        let cty = c_type(&ty);
                        let cname = toplevel_name(self.interner, name);
                        globals.line(format!("static {cty} {cname};"));
                        let expr = self.lower_expr(&mut main_init, value);
                        main_init.line(format!("{cname} = {expr};"));
                    }
                }
                NodeKind::TypeDeclaration { .. } => {}
                _ => {
                    let expr = self.lower_expr(&mut main_init, f);
                    main_init.line(format!("(void){expr};"));
                }
            }
        }

        self.drain_closure_queue(&mut functions);

        if self.failed {
            return None;
        }

        let mut out = Emitter::new();
        out.line("static Arena* arena;");
        out.blank();
        out.raw(functions.finish());
        out.blank();
        out.raw(globals.finish());
        out.blank();
        out.line("int main(void) {");
        out.indent();
        out.line("arena = arena_create();");
        out.raw(main_init.finish());
        if has_user_main {
            out.line("main_();");
        }
        out.line("arena_destroy(arena);");
        out.line(format!("return {EXIT_SUCCESS};"));
        out.dedent();
        out.line("}");
        Some(out.finish())
    }

    fn drain_closure_queue(&mut self, functions: &mut Emitter) {
        while let Some(lambda_node) = self.queue.pop() {
            let NodeKind::Lambda(form) = self.ast.node(lambda_node).kind.clone() else {
                unreachable!("only Lambda nodes are ever queued")
            };
            let fields = env_fields(lambda_node, self.binder, self.types, self.interner);
            functions.raw(env_typedef(lambda_node, &fields));
            functions.blank();
            let fn_name = lambda_fn_name(lambda_node);
            self.emit_closure_function(functions, &fn_name, lambda_node, &form, &fields);
        }
    }

    fn emit_function(&mut self, functions: &mut Emitter, fn_name: &str, lambda_node: NodeId, form: &LambdaForm) {
        let ret_ty = node_type(self.types, form.body);
        let params = self.params_decl(lambda_node, form);
        functions.line(format!("static {} {fn_name}({}) {{", c_type(&ret_ty), if params.is_empty() { "void".to_string() } else { params }));
        functions.indent();
        let prev = self.current_lambda.replace(lambda_node);
        let expr = self.lower_expr(functions, form.body);
        self.current_lambda = prev;
        functions.line(format!("return {expr};"));
        functions.dedent();
        functions.line("}");
        functions.blank();
    }

    fn emit_closure_function(&mut self, functions: &mut Emitter, fn_name: &str, lambda_node: NodeId, form: &LambdaForm, _fields: &[EnvField]) {
        let ret_ty = node_type(self.types, form.body);
        let struct_name = env_struct_name(lambda_node);
        let env_param = format!("{struct_name}* {}", env_var_name(lambda_node));
        let params = self.params_decl(lambda_node, form);
        let params = if params.is_empty() { env_param } else { format!("{env_param}, {params}") };
        functions.line(format!("static {} {fn_name}({params}) {{", c_type(&ret_ty)));
        functions.indent();
        let prev = self.current_lambda.replace(lambda_node);
        let expr = self.lower_expr(functions, form.body);
        self.current_lambda = prev;
        functions.line(format!("return {expr};"));
        functions.dedent();
        functions.line("}");
        functions.blank();
    }

    fn params_decl(&self, lambda_node: NodeId, form: &LambdaForm) -> String {
        let info = self.binder.lambda_info(lambda_node).expect("binder annotates every Lambda node");
        form.params
            .iter()
            .zip(info.parameter_bindings.iter())
            .map(|(p, &binding_id)| {
                let binding = self.binder.binding(binding_id);
                let ty = p.annotation.as_ref().map(Type::from_annotation).unwrap_or(Type::Unknown);
                let cty = c_type(&ty);
                let cty = if binding.flags.boxed { format!("{cty}*") } else { cty };
                format!("{cty} {}", local_name(self.interner, p.name, binding_id))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The plain (un-dereferenced) C lvalue text for `binding_id`: a bare
    /// local variable, unless we're currently lowering a lambda body that
    /// captured it (then it's a field access on that lambda's environment
    /// parameter), or the binding lives in module scope (then it's the
    /// unsuffixed top-level name its `define` declared it under).
    fn lvalue(&self, binding_id: BindingId) -> String {
        if let Some(lambda_node) = self.current_lambda {
            if let Some(info) = self.binder.lambda_info(lambda_node) {
                if info.free_bindings.contains(&binding_id) {
                    let binding = self.binder.binding(binding_id);
                    let field = local_name(self.interner, binding.name, binding_id);
                    return format!("{}->{field}", env_var_name(lambda_node));
                }
            }
        }
        let binding = self.binder.binding(binding_id);
        if self.binder.scope(binding.scope_id).kind == ScopeKind::Module {
            toplevel_name(self.interner, binding.name)
        } else {
            local_name(self.interner, binding.name, binding_id)
        }
    }

    /// If `binding_id` names a module-scope `define` whose value is a
    /// lambda lifted as a plain top-level C function (see
    /// `direct_toplevel`), its C function name — distinct from a
    /// module-scope binding whose value merely *evaluates to* a closure
    /// (e.g. `(define add3 (make-adder 3))`), which still goes through
    /// the general `ClosureRef` calling convention.
    fn toplevel_fn(&self, binding_id: BindingId) -> Option<String> {
        let binding = self.binder.binding(binding_id);
        if self.binder.scope(binding.scope_id).kind != ScopeKind::Module {
            return None;
        }
        let NodeKind::Define { value, .. } = self.ast.node(binding.defining_node_id).kind.clone() else {
            return None;
        };
        self.direct_toplevel.get(&value).cloned()
    }

    fn binding_ref(&self, binding_id: BindingId) -> String {
        let lvalue = self.lvalue(binding_id);
        if self.binder.binding(binding_id).flags.boxed {
            format!("(*{lvalue})")
        } else {
            lvalue
        }
    }

    fn lower_expr(&mut self, out: &mut Emitter, node: NodeId) -> String {
        match self.ast.node(node).kind.clone() {
            NodeKind::IntegerLiteral(v) => format!("{v}LL"),
            NodeKind::FloatLiteral(v) => format!("{v:?}"),
            NodeKind::BoolLiteral(v) => v.to_string(),
            NodeKind::StringLiteral(sym) => format!("{:?}", self.interner.resolve(sym)),
            NodeKind::CharLiteral(c) => format!("'{}'", escape_char(c)),
            NodeKind::Identifier(_) => match self.binder.resolution(node) {
                Some(binding_id) => match self.toplevel_fn(binding_id) {
                    // Referenced as a value (not called directly) a plain
                    // top-level function still needs to present itself as
                    // a `ClosureRef`, matching what `lower_closure_literal`
                    // does for a `Lambda` node used the same way.
                    Some(fn_name) => format!("((ClosureRef){{ .function_pointer = (void*){fn_name}, .environment_pointer = NULL }})"),
                    None => self.binding_ref(binding_id),
                },
                None => {
                    self.diagnostics.error(self.ast.node(node).span, "reference to an unbound name reached code generation").emit();
                    self.failed = true;
                    "0".to_string()
                }
            },
            NodeKind::Lambda(_) => self.lower_closure_literal(node),
            NodeKind::Define { .. } => {
                self.diagnostics.error(self.ast.node(node).span, "nested `define` is not valid in expression position").emit();
                self.failed = true;
                "0".to_string()
            }
            NodeKind::If(f) => {
                let test = self.lower_expr(out, f.test);
                let cons = self.lower_expr(out, f.consequent);
                let alt = match f.alternate {
                    Some(alt) => self.lower_expr(out, alt),
                    None => default_value_for(&node_type(self.types, node)),
                };
                format!("({test} ? {cons} : {alt})")
            }
            NodeKind::Let(form) => self.lower_let_expr(node, &form),
            NodeKind::Set { target, value } => {
                let value_expr = self.lower_expr(out, value);
                let target_ref = match self.binder.resolution(target) {
                    Some(binding_id) => self.binding_ref(binding_id),
                    None => "/* unresolved */ 0".to_string(),
                };
                format!("({target_ref} = {value_expr})")
            }
            NodeKind::Begin(exprs) => self.lower_begin_expr(out, &exprs, node),
            NodeKind::Quote(datum) => self.lower_quote(datum),
            NodeKind::And(exprs) => self.lower_and_or_expr(out, &exprs, true),
            NodeKind::Or(exprs) => self.lower_and_or_expr(out, &exprs, false),
            NodeKind::Call(c) => self.lower_call(out, c, node),
            NodeKind::TypeDeclaration { .. } | NodeKind::Program(_) => {
                unreachable!("TypeDeclaration/Program never appear in expression position")
            }
            NodeKind::Erroneous => {
                self.failed = true;
                "0".to_string()
            }
        }
    }

    fn lower_closure_literal(&mut self, node: NodeId) -> String {
        if let Some(fn_name) = self.direct_toplevel.get(&node).cloned() {
            return format!("((ClosureRef){{ .function_pointer = (void*){fn_name}, .environment_pointer = NULL }})");
        }
        if self.queued.insert(node) {
            self.queue.push(node);
        }
        let fields = env_fields(node, self.binder, self.types, self.interner);
        let field_values: Vec<String> = fields
            .iter()
            .map(|f| {
                let lvalue = self.lvalue(f.binding);
                if f.boxed {
                    lvalue
                } else {
                    format!("&{lvalue}")
                }
            })
            .collect();
        env_alloc_expr(node, &fields, &field_values)
    }

    fn lower_let_expr(&mut self, node: NodeId, form: &LetForm) -> String {
        let binding_ids = self.binder.let_bindings.get(&node).cloned().unwrap_or_default();
        let mut block = Emitter::new();
        match form.kind {
            LetKind::Let => {
                let inits: Vec<String> = form.bindings.iter().map(|b| self.lower_expr(&mut block, b.value)).collect();
                for ((b, &binding_id), init) in form.bindings.iter().zip(&binding_ids).zip(inits) {
                    self.declare_local(&mut block, b.name, binding_id, &init);
                }
            }
            LetKind::LetStar | LetKind::LetRec => {
                for (b, &binding_id) in form.bindings.iter().zip(&binding_ids) {
                    let init = self.lower_expr(&mut block, b.value);
                    self.declare_local(&mut block, b.name, binding_id, &init);
                }
            }
        }
        let value = self.lower_expr(&mut block, form.body);
        let body_text = block.finish();
        format!("({{\n{body_text}{value};\n}})")
    }

    fn declare_local(&mut self, block: &mut Emitter, name: Symbol, binding_id: BindingId, init: &str) {
        let binding = self.binder.binding(binding_id);
        let ty = node_type(self.types, binding.defining_node_id);
        let cty = c_type(&ty);
        let cname = local_name(self.interner, name, binding_id);
        if binding.flags.boxed {
            block.line(format!("{cty}* {cname} = ({cty}*)arena_alloc(arena, sizeof({cty}));"));
            block.line(format!("*{cname} = {init};"));
        } else {
            block.line(format!("{cty} {cname} = {init};"));
        }
    }

    fn lower_begin_expr(&mut self, out: &mut Emitter, exprs: &[NodeId], node: NodeId) -> String {
        if exprs.is_empty() {
            return default_value_for(&node_type(self.types, node));
        }
        let parts: Vec<String> = exprs.iter().map(|&e| self.lower_expr(out, e)).collect();
        format!("({})", parts.join(", "))
    }

    fn lower_and_or_expr(&mut self, out: &mut Emitter, exprs: &[NodeId], is_and: bool) -> String {
        if exprs.is_empty() {
            return is_and.to_string();
        }
        let parts: Vec<String> = exprs.iter().map(|&e| self.lower_expr(out, e)).collect();
        let op = if is_and { "&&" } else { "||" };
        format!("({})", parts.join(&format!(" {op} ")))
    }

    /// Number/string/char/bool literals lower directly to their own C
    /// type, matching `c_type`'s mapping for `Type::Integer` etc. Symbols
    /// and (dotted) lists map to `Type::Symbol`/`Type::Pair`, both of
    /// which `c_type` represents as `SchemeDatum*` — so those lower
    /// through `lower_quote_ptr` into an arena-allocated, tagged datum.
    fn lower_quote(&mut self, datum: DatumId) -> String {
        match self.ast.datum(datum).kind.clone() {
            DatumKind::Integer(v) => format!("{v}LL"),
            DatumKind::Float(v) => format!("{v:?}"),
            DatumKind::Bool(v) => v.to_string(),
            DatumKind::Char(c) => format!("'{}'", escape_char(c)),
            DatumKind::String(sym) => format!("{:?}", self.interner.resolve(sym)),
            DatumKind::Symbol(_) | DatumKind::List(_) | DatumKind::DottedList(_, _) => self.lower_quote_ptr(datum),
        }
    }

    /// A `SchemeDatum*` expression for any quoted datum, heap-allocating
    /// (proper or dotted) lists as a chain of pair cells terminated by
    /// `SCHEME_DATUM_NULL` (or, for a dotted list, by its tail datum).
    fn lower_quote_ptr(&mut self, datum: DatumId) -> String {
        match self.ast.datum(datum).kind.clone() {
            DatumKind::List(items) => {
                let tail = self.alloc_datum("SCHEME_DATUM_NULL, .value = { .as_int = 0 }".to_string());
                self.lower_quote_chain(&items, tail)
            }
            DatumKind::DottedList(items, tail) => {
                let tail = self.lower_quote_ptr(tail);
                self.lower_quote_chain(&items, tail)
            }
            DatumKind::Integer(v) => self.alloc_datum(format!("SCHEME_DATUM_INT, .value = {{ .as_int = {v}LL }}")),
            DatumKind::Float(v) => self.alloc_datum(format!("SCHEME_DATUM_FLOAT, .value = {{ .as_float = {v:?} }}")),
            DatumKind::Bool(v) => self.alloc_datum(format!("SCHEME_DATUM_BOOL, .value = {{ .as_bool = {v} }}")),
            DatumKind::Char(c) => self.alloc_datum(format!("SCHEME_DATUM_CHAR, .value = {{ .as_char = '{}' }}", escape_char(c))),
            DatumKind::String(sym) => {
                self.alloc_datum(format!("SCHEME_DATUM_STRING, .value = {{ .as_string = {:?} }}", self.interner.resolve(sym)))
            }
            DatumKind::Symbol(sym) => {
                self.alloc_datum(format!("SCHEME_DATUM_SYMBOL, .value = {{ .as_symbol = {:?} }}", self.interner.resolve(sym)))
            }
        }
    }

    /// Conses `items` onto an already-lowered `tail` pointer, back to front.
    fn lower_quote_chain(&mut self, items: &[DatumId], tail: String) -> String {
        let mut acc = tail;
        for &item in items.iter().rev() {
            let car = self.lower_quote_ptr(item);
            acc = self.alloc_datum(format!("SCHEME_DATUM_PAIR, .value = {{ .as_pair = {{ .car = {car}, .cdr = {acc} }} }}"));
        }
        acc
    }

    /// Arena-allocates one `SchemeDatum` cell and returns a pointer to it,
    /// as a GNU statement-expression so it can appear inline in a larger
    /// expression the way `env_alloc_expr` does for closure environments.
    fn alloc_datum(&mut self, tag_and_value: String) -> String {
        let tmp = format!("quote_{}", self.quote_tmp_counter);
        self.quote_tmp_counter += 1;
        format!("({{ SchemeDatum* {tmp} = (SchemeDatum*)arena_alloc(arena, sizeof(SchemeDatum)); *{tmp} = (SchemeDatum){{ .tag = {tag_and_value} }}; {tmp}; }})")
    }

    fn lower_call(&mut self, out: &mut Emitter, c: CallForm, node: NodeId) -> String {
        if let NodeKind::Identifier(sym) = self.ast.node(c.callee).kind {
            let resolution = self.binder.resolution(c.callee);
            if resolution.is_none() {
                let name = self.interner.resolve(sym).to_string();
                if let Some(kind) = operators::lookup(&name) {
                    let args: Vec<String> = c.args.iter().map(|&a| self.lower_expr(out, a)).collect();
                    let arg_types: Vec<Type> = c.args.iter().map(|&a| node_type(self.types, a)).collect();
                    let span = self.ast.node(node).span;
                    return match intrinsics::lower(kind, &name, &args, &arg_types, span, self.diagnostics) {
                        Some(expr) => expr,
                        None => {
                            self.failed = true;
                            "0".to_string()
                        }
                    };
                }
            }
            // A call whose callee is a plain top-level C function (not a
            // closure) is called directly, with no `ClosureRef` unwrapping
            // and no environment argument — it isn't a struct at all.
            if let Some(binding_id) = resolution {
                if let Some(fn_name) = self.toplevel_fn(binding_id) {
                    let args: Vec<String> = c.args.iter().map(|&a| self.lower_expr(out, a)).collect();
                    return format!("{fn_name}({})", args.join(", "));
                }
            }
        }

        let callee_ty = node_type(self.types, c.callee);
        let (param_tys, ret_ty) = match callee_ty {
            Type::Function(params, ret) => (params, *ret),
            _ => (c.args.iter().map(|&a| node_type(self.types, a)).collect(), node_type(self.types, node)),
        };
        let callee = self.lower_expr(out, c.callee);
        let args: Vec<String> = c.args.iter().map(|&a| self.lower_expr(out, a)).collect();
        let fn_ptr_params = std::iter::once("void*".to_string()).chain(param_tys.iter().map(c_type)).collect::<Vec<_>>().join(", ");
        let mut call_args = vec![format!("{callee}.environment_pointer")];
        call_args.extend(args);
        format!(
            "(({} (*)({fn_ptr_params}))({callee}.function_pointer))({})",
            c_type(&ret_ty),
            call_args.join(", ")
        )
    }
}

fn escape_char(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        other => other.to_string(),
    }
}
