use thiserror::Error;

use super::scope::Type;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("La funcion '{name}' ya fue declarada en el ambito '{scope}'")]
    DuplicateFunction { name: String, scope: String },
    #[error("La variable '{name}' ya fue declarada en el ambito '{scope}'")]
    DuplicateVariable { name: String, scope: String },
    #[error(
        "La variable '{name}' ya declarada como '{previous}' no puede redeclararse con tipo '{current}'"
    )]
    ConflictingRedeclaration {
        name: String,
        previous: Type,
        current: Type,
    },
    #[error("El identificador '{name}' no ha sido declarado")]
    UndeclaredIdentifier { name: String },
    #[error("Operador '{op}' requiere operandos numericos, se recibieron '{left}' y '{right}'")]
    NonNumericOperands { op: String, left: Type, right: Type },
    #[error("No se puede sumar/concatenar tipos incompatibles '{left}' y '{right}'")]
    IncompatibleAddition { left: Type, right: Type },
    #[error("El operador unario '{op}' solo acepta numeros, se recibio '{operand}'")]
    NonNumericUnary { op: String, operand: Type },
    #[error("Division por cero detectada en tiempo de compilacion")]
    DivisionByZero,
    #[error("Solo se pueden invocar funciones o referencias desconocidas")]
    InvalidCallee,
    #[error("Solo se admiten identificadores como miembros")]
    NonIdentifierMember,
    #[error("El miembro '{member}' no existe en '{object}'")]
    UnknownMember { member: String, object: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No se proporciono un AST para analizar")]
    MissingAst,
}
