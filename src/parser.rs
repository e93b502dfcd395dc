mod error;

pub use error::SyntaxError;

use crate::ast::{Node, NodeKind};
use crate::diagnostic::Diagnostic;
use crate::lexer::tokenize;
use crate::token::{Span, Token, TokenKind};

const DECLARATION_KEYWORDS: [&str; 3] = ["var", "let", "const"];

/// Bounds both parser recursion and the height of expression chains, so
/// every later pass over the tree stays shallow.
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub program: Node,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }
}

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if !tokens.last().is_some_and(|token| token.kind == TokenKind::EOF) {
            let span = match tokens.last() {
                Some(last) => Span::new(
                    last.span.end,
                    last.span.end,
                    last.span.line,
                    last.span.column + last.text.chars().count(),
                ),
                None => Span::new(0, 0, 1, 1),
            };
            tokens.push(Token::new(TokenKind::EOF, "", span));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> ParseOutput {
        let mut program = Node::new(NodeKind::Program, self.current().span);
        while !self.at_eof() {
            let statement = self.parse_statement();
            program.push(statement);
        }
        ParseOutput {
            program,
            diagnostics: self.diagnostics,
        }
    }

    fn parse_statement(&mut self) -> Node {
        let start = self.pos;
        let span = self.current().span;
        if !self.descend() {
            if self.pos == start || self.current().is_punct(";") {
                self.advance();
            }
            return Node::error(span);
        }
        let statement = self.parse_statement_kind();
        self.depth -= 1;
        statement
    }

    fn parse_statement_kind(&mut self) -> Node {
        let token = self.current();
        if token.is_keyword("function") {
            let keyword = self.advance();
            return self.parse_function_rest(keyword.span);
        }
        if token.kind == TokenKind::Keyword && DECLARATION_KEYWORDS.contains(&token.text) {
            return self.parse_variable_declaration();
        }
        if token.is_punct("{") {
            let open = self.advance();
            return self.parse_block_body(open.span);
        }
        if self.looks_like_unmarked_function() {
            let name = self.current().clone();
            self.report(
                SyntaxError::MissingFunctionKeyword {
                    name: name.text.to_string(),
                },
                name.span,
            );
            return self.parse_function_rest(name.span);
        }
        self.parse_expression_statement()
    }

    /// `IDENT ( ) {` in statement position.
    fn looks_like_unmarked_function(&self) -> bool {
        self.current().kind == TokenKind::Identifier
            && self.peek_at(1).is_some_and(|token| token.is_punct("("))
            && self.peek_at(2).is_some_and(|token| token.is_punct(")"))
            && self.peek_at(3).is_some_and(|token| token.is_punct("{"))
    }

    fn parse_function_rest(&mut self, span: Span) -> Node {
        let name = self.expect_identifier();
        self.expect_punct("(");
        self.expect_punct(")");
        let open = self.expect_punct("{");
        let body = self.parse_block_body(open);
        Node::new(NodeKind::FunctionDeclaration, span)
            .with_child(name)
            .with_child(body)
    }

    fn parse_block_body(&mut self, span: Span) -> Node {
        let mut block = Node::new(NodeKind::Block, span);
        while !self.at_eof() && !self.current().is_punct("}") {
            let statement = self.parse_statement();
            block.push(statement);
        }
        if self.current().is_punct("}") {
            self.advance();
        } else {
            let found = self.current().describe();
            let span = self.current().span;
            self.report(SyntaxError::UnclosedBlock { found }, span);
        }
        block
    }

    fn parse_variable_declaration(&mut self) -> Node {
        let keyword = self.advance();
        let mut declaration = Node::leaf(NodeKind::VariableDeclaration, keyword.text, keyword.span);
        declaration.push(self.expect_identifier());
        if self.current().is_punct("=") {
            let equals = self.advance();
            let value = self.parse_expression();
            declaration.push(Node::new(NodeKind::Initializer, equals.span).with_child(value));
        }
        self.expect_semicolon();
        declaration
    }

    fn parse_expression_statement(&mut self) -> Node {
        let span = self.current().span;
        let expression = self.parse_expression();
        self.expect_semicolon();
        Node::new(NodeKind::ExpressionStatement, span).with_child(expression)
    }

    fn parse_expression(&mut self) -> Node {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Node {
        let mut expr = self.parse_multiplicative();
        while self.current().is_punct("+") || self.current().is_punct("-") {
            let op = self.advance();
            let right = self.parse_multiplicative();
            let span = op.span;
            expr = self.bounded(binary(op, expr, right), span);
        }
        expr
    }

    fn parse_multiplicative(&mut self) -> Node {
        let mut expr = self.parse_postfix();
        while ["*", "/", "%"].iter().any(|op| self.current().is_punct(op)) {
            let op = self.advance();
            let right = self.parse_postfix();
            let span = op.span;
            expr = self.bounded(binary(op, expr, right), span);
        }
        expr
    }

    fn parse_postfix(&mut self) -> Node {
        let mut expr = self.parse_unary();
        loop {
            if self.current().is_punct(".") {
                let dot = self.advance();
                let member = self.expect_identifier();
                let node = Node::new(NodeKind::MemberExpression, dot.span)
                    .with_child(expr)
                    .with_child(member);
                expr = self.bounded(node, dot.span);
            } else if self.current().is_punct("(") {
                let open = self.advance();
                let arguments = self.parse_arguments(open.span);
                self.expect_punct(")");
                let node = Node::new(NodeKind::CallExpression, open.span)
                    .with_child(expr)
                    .with_child(arguments);
                expr = self.bounded(node, open.span);
            } else {
                break;
            }
        }
        expr
    }

    fn parse_arguments(&mut self, span: Span) -> Node {
        let mut arguments = Node::new(NodeKind::Arguments, span);
        if self.current().is_punct(")") {
            return arguments;
        }
        loop {
            let argument = self.parse_additive();
            arguments.push(argument);
            if self.current().is_punct(",") {
                self.advance();
            } else {
                break;
            }
        }
        arguments
    }

    fn parse_unary(&mut self) -> Node {
        if ["+", "-", "!"].iter().any(|op| self.current().is_punct(op)) {
            let span = self.current().span;
            if !self.descend() {
                return Node::error(span);
            }
            let op = self.advance();
            let operand = self.parse_unary();
            self.depth -= 1;
            return Node::leaf(NodeKind::UnaryExpression, op.text, op.span).with_child(operand);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Node {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Node::leaf(NodeKind::NumberLiteral, token.text, token.span)
            }
            TokenKind::String => {
                self.advance();
                Node::leaf(NodeKind::StringLiteral, token.text, token.span)
            }
            TokenKind::Identifier => {
                self.advance();
                Node::leaf(NodeKind::Identifier, token.text, token.span)
            }
            TokenKind::Punctuation if token.text == "(" => {
                if !self.descend() {
                    return Node::error(token.span);
                }
                self.advance();
                let expr = self.parse_expression();
                self.expect_punct(")");
                self.depth -= 1;
                expr
            }
            _ => {
                self.report(
                    SyntaxError::InvalidPrimary {
                        found: token.describe(),
                    },
                    token.span,
                );
                self.advance();
                Node::error(token.span)
            }
        }
    }

    fn expect_identifier(&mut self) -> Node {
        let token = self.current().clone();
        if token.kind == TokenKind::Identifier {
            self.advance();
            return Node::leaf(NodeKind::Identifier, token.text, token.span);
        }
        self.report_unexpected("identificador".to_string(), &token);
        self.advance();
        Node::error(token.span)
    }

    fn expect_punct(&mut self, text: &str) -> Span {
        let token = self.current().clone();
        if !token.is_punct(text) {
            self.report_unexpected(format!("'{text}'"), &token);
        }
        self.advance();
        token.span
    }

    fn expect_semicolon(&mut self) {
        if self.current().is_punct(";") {
            self.advance();
            return;
        }
        let found = self.current().describe();
        let span = self.current().span;
        self.report(SyntaxError::MissingSemicolon { found }, span);
        self.synchronize();
    }

    /// Stops at `;` (consumed), or at `}`, a declaration keyword or EOF.
    fn synchronize(&mut self) {
        loop {
            let token = self.current();
            if token.kind == TokenKind::EOF || token.is_punct("}") || starts_declaration(token) {
                return;
            }
            if token.is_punct(";") {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn descend(&mut self) -> bool {
        if self.depth < MAX_NESTING {
            self.depth += 1;
            return true;
        }
        self.report_nesting(self.current().span, true);
        false
    }

    fn bounded(&mut self, node: Node, span: Span) -> Node {
        if node.height() <= MAX_NESTING {
            return node;
        }
        self.report_nesting(span, false);
        Node::error(span)
    }

    fn report_nesting(&mut self, span: Span, stop_after_group: bool) {
        self.report(SyntaxError::NestingTooDeep { limit: MAX_NESTING }, span);
        self.skip_nested(stop_after_group);
    }

    /// Skips balanced `()`/`{}` groups up to a `;`, `,` or unmatched closer,
    /// all left in place. With `stop_after_group` the first complete group
    /// also ends the skip.
    fn skip_nested(&mut self, stop_after_group: bool) {
        let mut balance = 0usize;
        loop {
            let token = self.current();
            if token.kind == TokenKind::EOF {
                return;
            }
            if token.is_punct("(") || token.is_punct("{") {
                balance += 1;
            } else if token.is_punct(")") || token.is_punct("}") {
                if balance == 0 {
                    return;
                }
                balance -= 1;
                if balance == 0 && stop_after_group {
                    self.advance();
                    return;
                }
            } else if balance == 0 && (token.is_punct(";") || token.is_punct(",")) {
                return;
            }
            self.advance();
        }
    }

    fn report_unexpected(&mut self, expected: String, found: &Token<'a>) {
        self.report(
            SyntaxError::UnexpectedToken {
                expected,
                found: found.describe(),
            },
            found.span,
        );
    }

    fn report(&mut self, error: SyntaxError, span: Span) {
        self.diagnostics.push(Diagnostic::at(error, span));
    }

    fn current(&self) -> &Token<'a> {
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::EOF
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.current().clone();
        if token.kind != TokenKind::EOF {
            self.pos += 1;
        }
        token
    }
}

fn binary(op: Token<'_>, left: Node, right: Node) -> Node {
    Node::leaf(NodeKind::BinaryExpression, op.text, op.span)
        .with_child(left)
        .with_child(right)
}

fn starts_declaration(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Keyword
        && (token.text == "function" || DECLARATION_KEYWORDS.contains(&token.text))
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseOutput {
    Parser::new(tokens).parse_program()
}

pub fn parse(input: &str) -> ParseOutput {
    parse_tokens(tokenize(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn statements(input: &str) -> Vec<String> {
        parse(input)
            .program
            .children
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn parses_declaration_with_precedence() {
        let output = parse("let x = 5 + 2 * 3;");
        assert!(output.is_clean(), "{:?}", output.messages());
        assert_eq!(
            output.program.to_string(),
            "Program → [VariableDeclaration(let) → [Identifier(x), Initializer → [BinaryExpression(+) → [NumberLiteral(5), BinaryExpression(*) → [NumberLiteral(2), NumberLiteral(3)]]]]]"
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(
            statements("1 - 2 - 3 % 4;"),
            vec![
                "ExpressionStatement → [BinaryExpression(-) → [BinaryExpression(-) → [NumberLiteral(1), NumberLiteral(2)], BinaryExpression(%) → [NumberLiteral(3), NumberLiteral(4)]]]"
            ]
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            statements("(1 + 2) * -x;"),
            vec![
                "ExpressionStatement → [BinaryExpression(*) → [BinaryExpression(+) → [NumberLiteral(1), NumberLiteral(2)], UnaryExpression(-) → [Identifier(x)]]]"
            ]
        );
    }

    #[test]
    fn parses_member_calls_with_arguments() {
        assert_eq!(
            statements("console.log(a, 1 + 2);"),
            vec![
                "ExpressionStatement → [CallExpression → [MemberExpression → [Identifier(console), Identifier(log)], Arguments → [Identifier(a), BinaryExpression(+) → [NumberLiteral(1), NumberLiteral(2)]]]]"
            ]
        );
        assert_eq!(
            statements("f()();"),
            vec![
                "ExpressionStatement → [CallExpression → [CallExpression → [Identifier(f), Arguments], Arguments]]"
            ]
        );
    }

    #[test]
    fn postfix_binds_looser_than_prefix() {
        assert_eq!(
            statements("-a.b;"),
            vec![
                "ExpressionStatement → [MemberExpression → [UnaryExpression(-) → [Identifier(a)], Identifier(b)]]"
            ]
        );
    }

    #[test]
    fn parses_functions_and_blocks() {
        let input = indoc! {r#"
            function saludar() {
                const msg = "hola";
                console.log(msg);
            }
            { var y; }
        "#};
        let output = parse(input);
        assert!(output.is_clean(), "{:?}", output.messages());
        assert_eq!(
            output
                .program
                .children
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "FunctionDeclaration → [Identifier(saludar), Block → [VariableDeclaration(const) → [Identifier(msg), Initializer → [StringLiteral(\"hola\")]], ExpressionStatement → [CallExpression → [MemberExpression → [Identifier(console), Identifier(log)], Arguments → [Identifier(msg)]]]]]",
                "Block → [VariableDeclaration(var) → [Identifier(y)]]",
            ]
        );
    }

    #[test]
    fn reports_missing_function_keyword_and_recovers() {
        let output = parse("saludar() { let x = 1; }");
        assert_eq!(
            output.messages(),
            vec!["Falta la palabra clave 'function' antes de 'saludar' en linea 1, columna 1"]
        );
        assert_eq!(
            output.program.to_string(),
            "Program → [FunctionDeclaration → [Identifier(saludar), Block → [VariableDeclaration(let) → [Identifier(x), Initializer → [NumberLiteral(1)]]]]]"
        );
    }

    #[test]
    fn missing_semicolon_before_declaration_keeps_both() {
        let output = parse("let a = 1\nlet b = 2;");
        assert_eq!(
            output.messages(),
            vec!["Falta ';' al final de la sentencia, se obtuvo KEYWORD:let en linea 2, columna 1"]
        );
        assert_eq!(output.program.children.len(), 2);
    }

    #[test]
    fn missing_semicolon_skips_to_boundary() {
        let output = parse("let a = 1 2 3; let b = 4;");
        assert_eq!(
            output.messages(),
            vec!["Falta ';' al final de la sentencia, se obtuvo NUMBER:2 en linea 1, columna 11"]
        );
        assert_eq!(output.program.children.len(), 2);
        assert_eq!(
            output.program.children[1].to_string(),
            "VariableDeclaration(let) → [Identifier(b), Initializer → [NumberLiteral(4)]]"
        );
    }

    #[test]
    fn lexical_errors_surface_through_the_parser() {
        let output = parse("let x = 1 @ 2;");
        assert_eq!(
            output.messages(),
            vec!["Falta ';' al final de la sentencia, se obtuvo ERROR:@ en linea 1, columna 11"]
        );
    }

    #[test]
    fn invalid_primary_becomes_error_node() {
        let output = parse("let x = ;");
        assert_eq!(
            output.messages(),
            vec![
                "Expresion primaria invalida: PUNCT:; en linea 1, columna 9",
                "Falta ';' al final de la sentencia, se obtuvo EOF: en linea 1, columna 10",
            ]
        );
        assert_eq!(
            output.program.to_string(),
            "Program → [VariableDeclaration(let) → [Identifier(x), Initializer → [Error]]]"
        );
    }

    #[test]
    fn non_identifier_member_is_reported() {
        let output = parse("a.1;");
        assert_eq!(
            output.messages(),
            vec!["Se esperaba identificador y se obtuvo NUMBER:1 en linea 1, columna 3"]
        );
        assert_eq!(
            output.program.to_string(),
            "Program → [ExpressionStatement → [MemberExpression → [Identifier(a), Error]]]"
        );
    }

    #[test]
    fn repeated_keywords_make_progress() {
        let output = parse("var var var");
        assert_eq!(
            output.messages(),
            vec![
                "Se esperaba identificador y se obtuvo KEYWORD:var en linea 1, columna 5",
                "Falta ';' al final de la sentencia, se obtuvo KEYWORD:var en linea 1, columna 9",
                "Se esperaba identificador y se obtuvo EOF: en linea 1, columna 12",
                "Falta ';' al final de la sentencia, se obtuvo EOF: en linea 1, columna 12",
            ]
        );
        assert_eq!(output.program.children.len(), 2);
    }

    #[test]
    fn unterminated_block_is_reported() {
        let output = parse("function f() { let x = 1;");
        assert_eq!(
            output.messages(),
            vec!["Falta '}' para cerrar el bloque, se obtuvo EOF: en linea 1, columna 26"]
        );
        assert_eq!(output.program.children.len(), 1);
    }

    #[test]
    fn empty_and_eof_only_streams_yield_program() {
        let output = Parser::new(Vec::new()).parse_program();
        assert!(output.is_clean());
        assert!(output.program.is(NodeKind::Program));
        assert!(output.program.children.is_empty());

        let output = parse("");
        assert!(output.is_clean());
        assert!(output.program.children.is_empty());
    }

    #[test]
    fn stream_without_eof_gets_one() {
        let mut tokens = tokenize("x;");
        tokens.pop();
        let output = parse_tokens(tokens);
        assert!(output.is_clean(), "{:?}", output.messages());
        assert_eq!(output.program.children.len(), 1);
    }

    #[test]
    fn deep_parentheses_are_cut_at_the_limit() {
        let depth = 10_000;
        let input = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
        let output = parse(&input);
        assert_eq!(
            output.messages(),
            vec![format!(
                "Anidamiento demasiado profundo, el maximo es {MAX_NESTING} niveles en linea 1, columna {MAX_NESTING}"
            )]
        );
        assert_eq!(output.program.to_string(), "Program → [ExpressionStatement → [Error]]");
    }

    #[test]
    fn unclosed_deep_parentheses_terminate() {
        let output = parse(&"(".repeat(10_000));
        assert!(!output.is_clean());
        assert!(output.diagnostics.len() <= MAX_NESTING + 2);
        assert!(output.program.height() <= MAX_NESTING);
    }

    #[test]
    fn deep_prefix_operators_skip_to_statement_end() {
        let input = format!("let x = {}1; let y = 2;", "-".repeat(10_000));
        let output = parse(&input);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.program.children.len(), 2);
        assert_eq!(
            output.program.children[1].to_string(),
            "VariableDeclaration(let) → [Identifier(y), Initializer → [NumberLiteral(2)]]"
        );
    }

    #[test]
    fn deep_blocks_are_skipped_whole() {
        let depth = 5_000;
        let input = format!("{}{} x;", "{".repeat(depth), "}".repeat(depth));
        let output = parse(&input);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.program.children.len(), 2);
        assert!(output.program.height() <= MAX_NESTING + 2);
    }

    #[test]
    fn long_chains_are_bounded() {
        let sum = vec!["1"; 10_000].join(" + ");
        let calls = format!("f{};", "()".repeat(10_000));
        let members = format!("a{};", ".b".repeat(10_000));
        for input in [format!("let s = {sum}; s;"), calls, members] {
            let output = parse(&input);
            assert_eq!(output.diagnostics.len(), 1, "{:?}", output.messages());
            assert!(output.program.height() <= MAX_NESTING + 4);
        }
    }

    #[test]
    fn nesting_below_the_limit_is_clean() {
        let depth = MAX_NESTING - 1;
        let input = format!("{}x{};", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&input).is_clean());
    }

    #[test]
    fn malformed_inputs_terminate() {
        for input in [
            "}", "}}}", "((((", "function", "function (", "a.", "f(1,", ")))", "{", "var",
            "= = =", "let 5 = 6;", "@ @ @", "f(,);", "{ x }",
        ] {
            let output = parse(input);
            assert!(output.program.is(NodeKind::Program));
        }
    }
}
