//! Host/infrastructure errors.
//!
//! These are distinct from language diagnostics (see [`crate::diagnostic`]):
//! a `Diagnostic` describes something wrong with the program being analysed,
//! while an `Error` describes a violated contract between the analyser and
//! its caller (a malformed package map, a type-context handle from another
//! arena). Analysis of a single file never produces one of these on its own;
//! only misuse of the external interfaces does.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("package `{0}` was not found in the resolved package map")]
    UnknownPackage(String),

    #[error("type handle does not belong to this type context")]
    ForeignTypeHandle,

    #[error("declaration handle {0:?} is out of range for this file's declaration table")]
    InvalidDeclId(crate::ids::DeclId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
