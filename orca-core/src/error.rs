use std::path::PathBuf;
use thiserror::Error;

/// Exit status reported by a container runtime when the user leaves an
/// interactive session with Ctrl-C / Ctrl-D.
pub const INTERRUPTED_SESSION_EXIT_CODE: i32 = 130;

#[derive(Error, Debug)]
pub enum OrcaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown workspace: '{0}'")]
    UnknownWorkspace(String),

    #[error("Unknown project '{project}' in workspace '{workspace}'")]
    UnknownProject { workspace: String, project: String },

    #[error("Workspace '{0}' already exists")]
    WorkspaceAlreadyExists(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{} is not valid YAML: {message}", path.display())]
    InvalidYaml { path: PathBuf, message: String },

    #[error("Invalid value for label '{label}' on service '{service}': {message}")]
    InvalidOverlayModifier {
        service: String,
        label: String,
        message: String,
    },

    #[error("Invalid input to {target}: {message}")]
    InvalidInput { target: String, message: String },

    #[error("Command `{command}` {}", describe_exit(.code, .stderr))]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Tools not available on PATH: {}", .0.join(", "))]
    Dependency(Vec<String>),

    #[error("Template error in '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{label} failed: {source}")]
    Failed {
        label: String,
        #[source]
        source: Box<OrcaError>,
    },
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    };

    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    }
}

impl OrcaError {
    /// Wrap this error with a label naming what was being operated on.
    pub fn labelled(self, label: impl Into<String>) -> Self {
        OrcaError::Failed {
            label: label.into(),
            source: Box::new(self),
        }
    }

    /// Exit code of the failed external command, looking through labels.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            OrcaError::Command { code, .. } => *code,
            OrcaError::Failed { source, .. } => source.exit_code(),
            _ => None,
        }
    }

    /// True when an attached interactive session was ended by the user.
    pub fn is_interrupted_session(&self) -> bool {
        self.exit_code() == Some(INTERRUPTED_SESSION_EXIT_CODE)
    }
}

impl From<serde_yaml_ng::Error> for OrcaError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        OrcaError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrcaError>;
