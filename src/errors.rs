//! Build-time errors raised by the builder engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("don't know how to create {0}")]
    UnknownNodeType(String),

    #[error("\"{0}\" does not support nesting")]
    NestingNotSupported(String),

    #[error("abstract operation called for {0}")]
    AbstractOperation(String),

    #[error("{0} already bound in namespace")]
    SymbolCollision(String),

    #[error("failed to construct {name}: {reason}")]
    NodeConstruction { name: String, reason: String },

    #[error("no node is currently being configured")]
    NoActiveNode,

    #[error("no binding for symbol {0}")]
    UnboundSymbol(String),

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("{0} is not a property")]
    NotAProperty(String),

    #[error("{0} is not a method")]
    NotAMethod(String),

    #[error("context stack underflow")]
    ContextUnderflow,
}

pub type BuildResult<T> = Result<T, BuildError>;
