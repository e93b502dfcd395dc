mod encoding;

pub use encoding::{OPERAND_BITS, encode, to_binary};

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::{Node, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    PushConst,
    LoadVar,
    StoreVar,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Call,
    Pop,
    Comment,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::PushConst => "PUSH_CONST",
            Opcode::LoadVar => "LOAD_VAR",
            Opcode::StoreVar => "STORE_VAR",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Call => "CALL",
            Opcode::Pop => "POP",
            Opcode::Comment => "COMMENT",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Opcode::PushConst => 0b0000_0001,
            Opcode::LoadVar => 0b0000_0010,
            Opcode::StoreVar => 0b0000_0011,
            Opcode::Add => 0b0000_0100,
            Opcode::Sub => 0b0000_0101,
            Opcode::Mul => 0b0000_0110,
            Opcode::Div => 0b0000_0111,
            Opcode::Mod => 0b0000_1000,
            Opcode::Call => 0b0000_1001,
            Opcode::Pop => 0b0000_1010,
            Opcode::Comment => 0b1111_1111,
        }
    }

    fn for_operator(op: &str) -> Option<Self> {
        match op {
            "+" => Some(Opcode::Add),
            "-" => Some(Opcode::Sub),
            "*" => Some(Opcode::Mul),
            "/" => Some(Opcode::Div),
            "%" => Some(Opcode::Mod),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    /// `text` is the literal as written in the source.
    Number { value: f64, text: String },
    /// `id` is only meaningful within the run that produced it.
    Symbol { id: u32, text: String },
}

impl Operand {
    pub fn text(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Number { text, .. } => Some(text.clone()),
            Operand::Symbol { text, .. } => Some(text.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: Operand) -> Self {
        Self { opcode, operand }
    }

    /// `("CALL", Some("console.log:1"))`
    pub fn as_tuple(&self) -> (&'static str, Option<String>) {
        (self.opcode.mnemonic(), self.operand.text())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand.text() {
            Some(text) => write!(f, "{} {text}", self.opcode),
            None => write!(f, "{}", self.opcode),
        }
    }
}

#[derive(Default)]
pub struct BytecodeGenerator {
    instructions: Vec<Instruction>,
    symbol_ids: FxHashMap<String, u32>,
}

impl BytecodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(mut self, root: &Node) -> Vec<Instruction> {
        self.visit(root);
        self.instructions
    }

    fn visit(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Program | NodeKind::Block => self.visit_children(node),
            NodeKind::FunctionDeclaration => match node.child(0).and_then(Node::identifier_name) {
                Some(name) => {
                    self.emit_text(Opcode::Comment, &format!("Function {name}"));
                    if let Some(body) = node.child(1) {
                        self.visit(body);
                    }
                    self.emit_text(Opcode::Comment, &format!("EndFunction {name}"));
                }
                None => self.visit_children(node),
            },
            NodeKind::VariableDeclaration => match node.child(0).and_then(Node::identifier_name) {
                Some(name) => {
                    match node.child(1).and_then(|init| init.child(0)) {
                        Some(value) => self.visit(value),
                        None => self.emit_text(Opcode::PushConst, "undefined"),
                    }
                    self.emit_text(Opcode::StoreVar, name);
                }
                None => self.visit_children(node),
            },
            NodeKind::ExpressionStatement => {
                self.visit_children(node);
                self.emit(Opcode::Pop, Operand::None);
            }
            NodeKind::NumberLiteral => {
                let text = node.value().unwrap_or_default();
                let operand = Operand::Number {
                    value: text.parse().unwrap_or(0.0),
                    text: text.to_string(),
                };
                self.emit(Opcode::PushConst, operand);
            }
            NodeKind::StringLiteral => {
                self.emit_text(Opcode::PushConst, node.value().unwrap_or_default());
            }
            NodeKind::Identifier => {
                self.emit_text(Opcode::LoadVar, node.value().unwrap_or_default());
            }
            NodeKind::BinaryExpression => {
                let (Some(left), Some(right)) = (node.child(0), node.child(1)) else {
                    return;
                };
                self.visit(left);
                self.visit(right);
                if let Some(opcode) = node.value().and_then(Opcode::for_operator) {
                    self.emit(opcode, Operand::None);
                }
            }
            NodeKind::CallExpression => {
                let Some(callee) = node.child(0) else {
                    return;
                };
                let mut argc = 0;
                if let Some(arguments) = node.child(1) {
                    for argument in &arguments.children {
                        self.visit(argument);
                        argc += 1;
                    }
                }
                let target = call_target(callee).unwrap_or_else(|| "anon".to_string());
                self.emit_text(Opcode::Call, &format!("{target}:{argc}"));
            }
            NodeKind::UnaryExpression
            | NodeKind::MemberExpression
            | NodeKind::Initializer
            | NodeKind::Arguments
            | NodeKind::Error => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: &Node) {
        for child in &node.children {
            self.visit(child);
        }
    }

    fn emit(&mut self, opcode: Opcode, operand: Operand) {
        self.instructions.push(Instruction::new(opcode, operand));
    }

    fn emit_text(&mut self, opcode: Opcode, text: &str) {
        let next = self.symbol_ids.len() as u32 + 1;
        let id = *self.symbol_ids.entry(text.to_string()).or_insert(next);
        self.emit(
            opcode,
            Operand::Symbol {
                id,
                text: text.to_string(),
            },
        );
    }
}

/// `name` for an identifier callee, `a.b.c` for a member chain rooted at an
/// identifier, `None` for anything else.
fn call_target(callee: &Node) -> Option<String> {
    match callee.kind {
        NodeKind::Identifier => callee.value().map(str::to_string),
        NodeKind::MemberExpression => {
            let object = call_target(callee.child(0)?)?;
            let member = callee.child(1)?.identifier_name()?;
            Some(format!("{object}.{member}"))
        }
        _ => None,
    }
}

/// Lowers `root` into instructions.
///
/// Symbol ids start at 1 for every call and follow first appearance, so ids
/// from different runs must not be compared.
pub fn lower(root: &Node) -> Vec<Instruction> {
    BytecodeGenerator::new().generate(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use indoc::indoc;

    fn lowered(source: &str) -> Vec<(&'static str, Option<String>)> {
        lower(&parse(source).program)
            .iter()
            .map(Instruction::as_tuple)
            .collect()
    }

    fn op(mnemonic: &'static str, operand: Option<&str>) -> (&'static str, Option<String>) {
        (mnemonic, operand.map(str::to_string))
    }

    #[test]
    fn lowers_declaration_in_postfix_order() {
        assert_eq!(
            lowered("let x = 5 + 2 * 3;"),
            vec![
                op("PUSH_CONST", Some("5")),
                op("PUSH_CONST", Some("2")),
                op("PUSH_CONST", Some("3")),
                op("MUL", None),
                op("ADD", None),
                op("STORE_VAR", Some("x")),
            ]
        );
    }

    #[test]
    fn number_operands_keep_the_literal_text() {
        let instructions = lower(&parse("let x = 5.0 + 2.50;").program);
        assert_eq!(
            instructions.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["PUSH_CONST 5.0", "PUSH_CONST 2.50", "ADD", "STORE_VAR x"]
        );
        assert_eq!(
            instructions[0].operand,
            Operand::Number {
                value: 5.0,
                text: "5.0".to_string()
            }
        );
    }

    #[test]
    fn uninitialized_declaration_pushes_undefined() {
        assert_eq!(
            lowered("var y;"),
            vec![op("PUSH_CONST", Some("undefined")), op("STORE_VAR", Some("y"))]
        );
    }

    #[test]
    fn lowers_functions_and_calls() {
        let source = indoc! {r#"
            function saludar() {
                console.log("hola", n % 2);
            }
            saludar();
        "#};
        assert_eq!(
            lowered(source),
            vec![
                op("COMMENT", Some("Function saludar")),
                op("PUSH_CONST", Some("\"hola\"")),
                op("LOAD_VAR", Some("n")),
                op("PUSH_CONST", Some("2")),
                op("MOD", None),
                op("CALL", Some("console.log:2")),
                op("POP", None),
                op("COMMENT", Some("EndFunction saludar")),
                op("CALL", Some("saludar:0")),
                op("POP", None),
            ]
        );
    }

    #[test]
    fn unnamed_call_targets_are_anon() {
        assert_eq!(
            lowered("f()(1);"),
            vec![
                op("PUSH_CONST", Some("1")),
                op("CALL", Some("anon:1")),
                op("POP", None),
            ]
        );
    }

    #[test]
    fn unary_and_member_emit_only_their_operands() {
        assert_eq!(
            lowered("-a; console.log;"),
            vec![
                op("LOAD_VAR", Some("a")),
                op("POP", None),
                op("LOAD_VAR", Some("console")),
                op("LOAD_VAR", Some("log")),
                op("POP", None),
            ]
        );
    }

    #[test]
    fn equal_text_shares_an_id() {
        let instructions = lower(&parse("let a = b; let b = a;").program);
        let ids = instructions
            .iter()
            .map(|instruction| match &instruction.operand {
                Operand::Symbol { id, .. } => *id,
                _ => 0,
            })
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 2, 1]);
    }

    #[test]
    fn lowering_is_repeatable() {
        let program = parse("let s = \"a\" + \"b\"; console.warn(s);").program;
        assert_eq!(lower(&program), lower(&program));
    }

    #[test]
    fn malformed_declaration_emits_only_its_value() {
        let output = parse("let 5 = 6;");
        assert!(!output.is_clean());
        let instructions = lower(&output.program)
            .iter()
            .map(Instruction::as_tuple)
            .collect::<Vec<_>>();
        assert_eq!(instructions, vec![op("PUSH_CONST", Some("6"))]);
    }
}
