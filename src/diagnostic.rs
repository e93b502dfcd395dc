use std::fmt;

use thiserror::Error;

use crate::parser::SyntaxError;
use crate::semantic::{SemanticError, UsageError};
use crate::token::Span;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiagnosticError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// A reported problem that did not stop the pipeline.
///
/// Renders as `<message> en linea <line>, columna <column>` when a position is
/// known, otherwise as the bare message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub error: DiagnosticError,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(error: impl Into<DiagnosticError>, span: Option<Span>) -> Self {
        Self {
            error: error.into(),
            span,
        }
    }

    pub fn at(error: impl Into<DiagnosticError>, span: Span) -> Self {
        Self::new(error, Some(span))
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn line(&self) -> Option<usize> {
        self.span.map(|span| span.line)
    }

    pub fn column(&self) -> Option<usize> {
        self.span.map(|span| span.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(
                f,
                "{} en linea {}, columna {}",
                self.error, span.line, span.column
            ),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
