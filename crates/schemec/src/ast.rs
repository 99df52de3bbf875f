//! The untyped, unresolved AST produced by the parser.
//!
//! Every node lives in a single [`Arena<Node>`] and is addressed by the
//! dense [`NodeId`] the arena hands back on allocation — node ids are
//! therefore unique within a compilation unit and assigned in allocation
//! order, per the data-model invariant. Later stages (binder, inferencer)
//! attach their own results in side tables keyed by `NodeId` rather than
//! mutating the node payloads below, except where a node is outright
//! replaced with [`NodeKind::Erroneous`].

use schemec_support::{Arena, Idx, Span, Symbol};

pub type NodeId = Idx<Node>;
pub type DatumId = Idx<Datum>;

#[derive(Debug, Clone)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// A `lambda`/`define` parameter: a name with an optional `[name : type]`
/// annotation.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Symbol,
    pub span: Span,
    pub annotation: Option<TypeAnnotation>,
}

/// One binding clause of a `let`/`let*`/`letrec` form.
#[derive(Debug, Clone)]
pub struct LetBinding {
    pub name: Symbol,
    pub span: Span,
    pub annotation: Option<TypeAnnotation>,
    pub value: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetKind {
    Let,
    LetStar,
    LetRec,
}

#[derive(Debug, Clone)]
pub struct LetForm {
    pub kind: LetKind,
    pub bindings: Vec<LetBinding>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct LambdaForm {
    pub params: Vec<Parameter>,
    pub return_annotation: Option<TypeAnnotation>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct IfForm {
    pub test: NodeId,
    pub consequent: NodeId,
    /// `None` when the source omitted the alternate branch ("unspecified").
    pub alternate: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CallForm {
    pub callee: NodeId,
    pub args: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    StringLiteral(Symbol),
    CharLiteral(char),
    /// Resolution to a `BindingId` is recorded by the binder in a side
    /// table, not on this node.
    Identifier(Symbol),
    Lambda(LambdaForm),
    Define {
        name: Symbol,
        name_span: Span,
        value: NodeId,
    },
    If(IfForm),
    Let(LetForm),
    /// `target` is an `Identifier` node so the binder resolves it the
    /// same way any other reference is resolved.
    Set {
        target: NodeId,
        value: NodeId,
    },
    Begin(Vec<NodeId>),
    /// A quoted datum tree; symbols inside it do not resolve to bindings.
    Quote(DatumId),
    And(Vec<NodeId>),
    Or(Vec<NodeId>),
    Call(CallForm),
    TypeDeclaration {
        name: Symbol,
        signature: TypeAnnotation,
    },
    Program(Vec<NodeId>),
    /// Produced when parsing (or a later pass) cannot make sense of a
    /// form; poisons every composite built from it.
    Erroneous,
}

/// A quoted datum: the restricted data subset a `quote` can produce
/// (literals, symbols, proper lists, dotted pairs). Lives in its own
/// arena because quoted symbols are not identifiers and never
/// participate in binding resolution.
#[derive(Debug, Clone)]
pub struct Datum {
    pub span: Span,
    pub kind: DatumKind,
}

#[derive(Debug, Clone)]
pub enum DatumKind {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    String(Symbol),
    Symbol(Symbol),
    List(Vec<DatumId>),
    DottedList(Vec<DatumId>, DatumId),
}

/// A source-level type annotation, as written by the programmer (or
/// absent). The inferencer's internal `Type` (with its type-variable
/// placeholder) is a separate, richer representation — see
/// `crate::infer::Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Integer,
    Float,
    Bool,
    String,
    Char,
    Symbol,
    Void,
    Unknown,
    Pair(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Vector(Box<TypeAnnotation>),
    Function(Vec<TypeAnnotation>, Box<TypeAnnotation>),
}

/// Owns every AST node and quoted datum allocated while parsing one
/// compilation unit.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Arena<Node>,
    data: Arena<Datum>,
    pub program: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_node(&mut self, span: Span, kind: NodeKind) -> NodeId {
        self.nodes.alloc(Node { span, kind })
    }

    pub fn alloc_datum(&mut self, span: Span, kind: DatumKind) -> DatumId {
        self.data.alloc(Datum { span, kind })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(id)
    }

    pub fn datum(&self, id: DatumId) -> &Datum {
        self.data.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn is_erroneous(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Erroneous)
    }

    /// True if `id`, or any direct child of `id`, is `Erroneous`. Used by
    /// the parser's composite-builders to propagate poisoning upward one
    /// level at a time as each form finishes parsing.
    pub fn any_erroneous(&self, ids: &[NodeId]) -> bool {
        ids.iter().any(|&id| self.is_erroneous(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_node_returns_stable_dense_ids() {
        let mut ast = Ast::new();
        let a = ast.alloc_node(Span::default(), NodeKind::IntegerLiteral(1));
        let b = ast.alloc_node(Span::default(), NodeKind::IntegerLiteral(2));
        assert_ne!(a, b);
        assert!(matches!(ast.node(a).kind, NodeKind::IntegerLiteral(1)));
        assert!(matches!(ast.node(b).kind, NodeKind::IntegerLiteral(2)));
    }

    #[test]
    fn any_erroneous_detects_poisoned_child() {
        let mut ast = Ast::new();
        let ok = ast.alloc_node(Span::default(), NodeKind::IntegerLiteral(1));
        let bad = ast.alloc_node(Span::default(), NodeKind::Erroneous);
        assert!(!ast.any_erroneous(&[ok]));
        assert!(ast.any_erroneous(&[ok, bad]));
    }

    #[test]
    fn node_mut_can_poison_in_place() {
        let mut ast = Ast::new();
        let sym = Symbol::from_raw(0);
        let id = ast.alloc_node(Span::default(), NodeKind::Identifier(sym));
        ast.node_mut(id).kind = NodeKind::Erroneous;
        assert!(ast.is_erroneous(id));
    }
}
