use std::fmt::{self, Write};

use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    FunctionDeclaration,
    VariableDeclaration,
    Identifier,
    NumberLiteral,
    StringLiteral,
    BinaryExpression,
    UnaryExpression,
    CallExpression,
    MemberExpression,
    Arguments,
    ExpressionStatement,
    Block,
    Initializer,
    Error,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Program => "Program",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::Identifier => "Identifier",
            NodeKind::NumberLiteral => "NumberLiteral",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::UnaryExpression => "UnaryExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::MemberExpression => "MemberExpression",
            NodeKind::Arguments => "Arguments",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::Block => "Block",
            NodeKind::Initializer => "Initializer",
            NodeKind::Error => "Error",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: Option<String>,
    pub span: Span,
    pub children: Vec<Node>,
    height: usize,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            value: None,
            span,
            children: Vec::new(),
            height: 1,
        }
    }

    pub fn leaf(kind: NodeKind, value: impl Into<String>, span: Span) -> Self {
        Self::new(kind, span).with_value(value)
    }

    pub fn error(span: Span) -> Self {
        Self::new(NodeKind::Error, span)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.push(child);
        self
    }

    pub fn push(&mut self, child: Node) {
        self.height = self.height.max(child.height + 1);
        self.children.push(child);
    }

    /// Levels in the longest path down to a leaf; a leaf has height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Identifier => self.value(),
            _ => None,
        }
    }

    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        match self.value() {
            Some(value) => {
                let _ = writeln!(out, "{}: {value}", self.kind);
            }
            None => {
                let _ = writeln!(out, "{}", self.kind);
            }
        }
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// `Kind(value) → [child, child]`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(value) = self.value() {
            write!(f, "({value})")?;
        }
        if !self.children.is_empty() {
            f.write_str(" → [")?;
            for (index, child) in self.children.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

pub fn to_dot(root: &Node) -> String {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    add_dot_node(root, &mut nodes, &mut edges);

    let mut lines = vec![
        "digraph AST {".to_string(),
        "rankdir=TB;".to_string(),
        "bgcolor=\"transparent\";".to_string(),
    ];
    lines.extend(nodes);
    lines.extend(edges);
    lines.push("}".to_string());
    lines.join("\n")
}

fn add_dot_node(node: &Node, nodes: &mut Vec<String>, edges: &mut Vec<String>) -> String {
    let id = format!("node{}", nodes.len());
    let label = match node.value().filter(|value| !value.is_empty()) {
        Some(value) => {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            format!("{}\\n{escaped}", node.kind)
        }
        None => node.kind.to_string(),
    };
    nodes.push(format!(
        "{id} [label=\"{label}\", shape=box, style=\"rounded,filled\", fillcolor=\"#1f2a44\", fontcolor=\"#f0f3ff\"];"
    ));
    for child in &node.children {
        let child_id = add_dot_node(child, nodes, edges);
        edges.push(format!("{id} -> {child_id};"));
    }
    id
}
