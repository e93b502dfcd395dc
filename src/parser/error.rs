use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Se esperaba {expected} y se obtuvo {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("Falta ';' al final de la sentencia, se obtuvo {found}")]
    MissingSemicolon { found: String },
    #[error("Falta '}}' para cerrar el bloque, se obtuvo {found}")]
    UnclosedBlock { found: String },
    #[error("Expresion primaria invalida: {found}")]
    InvalidPrimary { found: String },
    #[error("Falta la palabra clave 'function' antes de '{name}'")]
    MissingFunctionKeyword { name: String },
    #[error("Anidamiento demasiado profundo, el maximo es {limit} niveles")]
    NestingTooDeep { limit: usize },
}
