mod const_eval;
mod error;
mod scope;
mod table;

pub use const_eval::{fold, is_constant_zero};
pub use error::{SemanticError, UsageError};
pub use scope::{Scope, ScopeId, ScopeTree, Symbol, SymbolKind, Type};
pub use table::{SymbolRow, format_symbol_table};

use crate::ast::{Node, NodeKind};
use crate::diagnostic::Diagnostic;
use crate::token::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    diagnostics: Vec<Diagnostic>,
    scopes: ScopeTree,
}

impl Analysis {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn symbol_rows(&self) -> Vec<SymbolRow> {
        table::rows(&self.scopes)
    }

    pub fn format_symbol_table(&self) -> String {
        format_symbol_table(&self.symbol_rows())
    }
}

pub struct SemanticAnalyzer {
    scopes: ScopeTree,
    diagnostics: Vec<Diagnostic>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeTree::with_builtins(),
            diagnostics: Vec::new(),
        }
    }

    pub fn analyze(mut self, root: Option<&Node>) -> Analysis {
        match root {
            Some(root) => {
                self.visit(root, ScopeId::GLOBAL);
            }
            None => self.diagnostics.push(Diagnostic::new(UsageError::MissingAst, None)),
        }
        Analysis {
            diagnostics: self.diagnostics,
            scopes: self.scopes,
        }
    }

    fn visit(&mut self, node: &Node, scope: ScopeId) -> Type {
        match node.kind {
            NodeKind::Program => {
                for child in &node.children {
                    self.visit(child, scope);
                }
                Type::Unknown
            }
            NodeKind::FunctionDeclaration => self.visit_function(node, scope),
            NodeKind::VariableDeclaration => self.visit_variable(node, scope),
            NodeKind::Block => {
                let block = self.scopes.create_child(scope, "block");
                self.visit_statements(node, block);
                Type::Unknown
            }
            NodeKind::ExpressionStatement => match node.child(0) {
                Some(expr) => self.visit(expr, scope),
                None => Type::Unknown,
            },
            NodeKind::Identifier => self.visit_identifier(node, scope),
            NodeKind::NumberLiteral => Type::Number,
            NodeKind::StringLiteral => Type::String,
            NodeKind::BinaryExpression => self.visit_binary(node, scope),
            NodeKind::UnaryExpression => self.visit_unary(node, scope),
            NodeKind::CallExpression => self.visit_call(node, scope),
            NodeKind::MemberExpression => self.visit_member(node, scope),
            NodeKind::Initializer | NodeKind::Arguments => {
                let mut last = Type::Unknown;
                for child in &node.children {
                    last = self.visit(child, scope);
                }
                last
            }
            // already reported by the parser
            NodeKind::Error => Type::Error,
        }
    }

    fn visit_statements(&mut self, block: &Node, scope: ScopeId) {
        for statement in &block.children {
            self.visit(statement, scope);
        }
    }

    fn visit_function(&mut self, node: &Node, scope: ScopeId) -> Type {
        let Some(name) = node.child(0).and_then(Node::identifier_name) else {
            if let Some(body) = node.child(1) {
                let block = self.scopes.create_child(scope, "block");
                self.visit_statements(body, block);
            }
            return Type::Unknown;
        };

        let symbol = Symbol::new(name, SymbolKind::Function, Type::Function, false);
        if !self.scopes.define(scope, symbol) {
            self.report(
                SemanticError::DuplicateFunction {
                    name: name.to_string(),
                    scope: self.scopes.label(scope).to_string(),
                },
                node.span,
            );
        }

        // the function scope doubles as the body's block scope
        let body_scope = self.scopes.create_child(scope, format!("func:{name}"));
        if let Some(body) = node.child(1) {
            self.visit_statements(body, body_scope);
        }
        Type::Function
    }

    fn visit_variable(&mut self, node: &Node, scope: ScopeId) -> Type {
        let Some(name) = node.child(0).and_then(Node::identifier_name) else {
            return Type::Unknown;
        };
        let ty = match node.child(1).and_then(|init| init.child(0)) {
            Some(value) => self.visit(value, scope),
            None => Type::Unknown,
        };
        let mutable = node.value() != Some("const");

        let symbol = Symbol::new(name, SymbolKind::Variable, ty, mutable);
        if !self.scopes.define(scope, symbol) {
            let previous = self
                .scopes
                .lookup_local(scope, name)
                .map_or(Type::Unknown, |symbol| symbol.ty);
            let error = if previous != Type::Unknown && previous != ty {
                SemanticError::ConflictingRedeclaration {
                    name: name.to_string(),
                    previous,
                    current: ty,
                }
            } else {
                SemanticError::DuplicateVariable {
                    name: name.to_string(),
                    scope: self.scopes.label(scope).to_string(),
                }
            };
            self.report(error, node.span);
        }
        ty
    }

    fn visit_identifier(&mut self, node: &Node, scope: ScopeId) -> Type {
        let name = node.value().unwrap_or_default();
        match self.scopes.resolve(scope, name) {
            Some(symbol) => symbol.ty,
            None => {
                self.report(
                    SemanticError::UndeclaredIdentifier {
                        name: name.to_string(),
                    },
                    node.span,
                );
                Type::Error
            }
        }
    }

    fn visit_binary(&mut self, node: &Node, scope: ScopeId) -> Type {
        let (Some(left_node), Some(right_node)) = (node.child(0), node.child(1)) else {
            return Type::Unknown;
        };
        let left = self.visit(left_node, scope);
        let right = self.visit(right_node, scope);
        let op = node.value().unwrap_or_default();

        if op == "/" && is_constant_zero(right_node) {
            self.report(SemanticError::DivisionByZero, right_node.span);
        }

        match op {
            "-" | "*" | "/" | "%" => {
                if left.is_numeric_compatible() && right.is_numeric_compatible() {
                    Type::Number
                } else {
                    self.report(
                        SemanticError::NonNumericOperands {
                            op: op.to_string(),
                            left,
                            right,
                        },
                        node.span,
                    );
                    Type::Error
                }
            }
            "+" => {
                if left == Type::String && right == Type::String {
                    Type::String
                } else if left.is_numeric_compatible() && right.is_numeric_compatible() {
                    Type::Number
                } else {
                    self.report(SemanticError::IncompatibleAddition { left, right }, node.span);
                    Type::Error
                }
            }
            _ => Type::Unknown,
        }
    }

    fn visit_unary(&mut self, node: &Node, scope: ScopeId) -> Type {
        let operand = match node.child(0) {
            Some(operand) => self.visit(operand, scope),
            None => Type::Unknown,
        };
        match node.value() {
            Some(op @ ("+" | "-")) if !operand.is_numeric_compatible() => {
                self.report(
                    SemanticError::NonNumericUnary {
                        op: op.to_string(),
                        operand,
                    },
                    node.span,
                );
                Type::Error
            }
            Some("!") => Type::Boolean,
            _ => operand,
        }
    }

    fn visit_call(&mut self, node: &Node, scope: ScopeId) -> Type {
        let Some(callee) = node.child(0) else {
            return Type::Unknown;
        };
        let callee_type = self.visit(callee, scope);
        if let Some(arguments) = node.child(1) {
            for argument in &arguments.children {
                self.visit(argument, scope);
            }
        }
        if !matches!(callee_type, Type::Function | Type::Unknown | Type::Error) {
            self.report(SemanticError::InvalidCallee, node.span);
        }
        Type::Unknown
    }

    fn visit_member(&mut self, node: &Node, scope: ScopeId) -> Type {
        let (Some(object), Some(member)) = (node.child(0), node.child(1)) else {
            return Type::Unknown;
        };
        if self.visit(object, scope) == Type::Error {
            return Type::Error;
        }
        let Some(member_name) = member.identifier_name() else {
            self.report(SemanticError::NonIdentifierMember, member.span);
            return Type::Error;
        };

        let builtin = object
            .identifier_name()
            .and_then(|name| self.scopes.resolve(scope, name))
            .filter(|symbol| symbol.kind == SymbolKind::Builtin);
        let Some(builtin) = builtin else {
            return Type::Unknown;
        };
        match builtin.member(member_name) {
            Some(ty) => ty,
            None => {
                let error = SemanticError::UnknownMember {
                    member: member_name.to_string(),
                    object: builtin.name.clone(),
                };
                self.report(error, member.span);
                Type::Error
            }
        }
    }

    fn report(&mut self, error: SemanticError, span: Span) {
        self.diagnostics.push(Diagnostic::at(error, span));
    }
}

/// Analyzes `root` with a fresh scope tree; `None` yields a single usage
/// diagnostic.
pub fn analyze(root: Option<&Node>) -> Analysis {
    SemanticAnalyzer::new().analyze(root)
}
