//! Configuration error types.

use std::path::PathBuf;

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// TOML deserialization failed.
    #[error(transparent)]
    Deserialization(#[from] toml::de::Error),

    /// A mandatory descriptor field is empty.
    #[error("Test `{descriptor}` has an empty `{field}`")]
    EmptyField {
        descriptor: String,
        field: &'static str,
    },

    /// Two descriptors share a name.
    #[error("Test name `{0}` is declared more than once")]
    DuplicateName(String),

    /// Two descriptors would write the same artifact.
    #[error("Tests `{first}` and `{second}` both write {output:?}")]
    OutputCollision {
        first: String,
        second: String,
        output: PathBuf,
    },

    /// A test name requested by the operator is not declared.
    #[error("No test named `{0}`")]
    UnknownDescriptor(String),

    #[error("Unknown build profile `{0}`, expected `debug` or `release`")]
    InvalidProfile(String),
}
