use thiserror::Error;

#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project root does not exist: {path}")]
    RootNotFound { path: String },

    #[error("Compilation database not found: {path}")]
    CompilationDatabaseNotFound { path: String },

    #[error("Compilation database is not readable: {error}")]
    CompilationDatabaseNotReadable { error: String },

    #[error("Compilation database is invalid: {error}")]
    CompilationDatabaseInvalid { error: String },

    #[error("Compilation database is empty")]
    CompilationDatabaseEmpty,
}
