pub mod ast;
pub mod bytecode;
pub mod cli;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod token;

use crate::ast::Node;
use crate::bytecode::Instruction;
use crate::diagnostic::Diagnostic;
use crate::parser::ParseOutput;
use crate::semantic::Analysis;
use crate::token::Token;

/// Every stage's output for one source text.
#[derive(Debug, Clone)]
pub struct Compilation<'a> {
    pub tokens: Vec<Token<'a>>,
    pub program: Node,
    pub syntax_diagnostics: Vec<Diagnostic>,
    pub analysis: Analysis,
    pub instructions: Vec<Instruction>,
}

impl Compilation<'_> {
    /// Syntax diagnostics first, then semantic ones.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.syntax_diagnostics
            .iter()
            .chain(self.analysis.diagnostics())
    }

    pub fn has_diagnostics(&self) -> bool {
        self.diagnostics().next().is_some()
    }
}

/// Runs the whole pipeline. Analysis and lowering both read the same tree and
/// neither depends on the other.
pub fn compile(source: &str) -> Compilation<'_> {
    let tokens = lexer::tokenize(source);
    let ParseOutput {
        program,
        diagnostics,
    } = parser::parse_tokens(tokens.clone());
    let analysis = semantic::analyze(Some(&program));
    let instructions = bytecode::lower(&program);
    Compilation {
        tokens,
        program,
        syntax_diagnostics: diagnostics,
        analysis,
        instructions,
    }
}
