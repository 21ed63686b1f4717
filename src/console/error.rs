use miette::Diagnostic;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Diagnostic, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to write console output")]
    #[diagnostic(
        code(hbnb::console::output),
        help("The output stream was closed or is not writable.")
    )]
    Output {
        #[from]
        source: std::io::Error,
    },
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
