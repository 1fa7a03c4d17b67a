use orca_core::OrcaError;
use orca_dag::DagError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Core(#[from] OrcaError),

    #[error("Invalid dependency graph: {0}")]
    Graph(#[from] DagError),

    #[error("Invalid execution context: {0}")]
    InvalidExecutionContext(String),

    #[error("Extension '{name}' does not exist in project '{project}'")]
    UnknownExtension { project: String, name: String },

    #[error("No branches matching '{search}' were found")]
    NoBranchesFound { search: String },

    #[error("Could not determine the current branch")]
    CurrentBranchUnknown,

    #[error("Aborted by user")]
    Aborted,

    #[error("Extension '{name}' must have a service defined; running on the host is not yet implemented")]
    ExtensionWithoutService { name: String },
}

impl OrchestratorError {
    /// Exit code of the failed external command, if that is what failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            OrchestratorError::Core(err) => err.exit_code(),
            _ => None,
        }
    }
}
