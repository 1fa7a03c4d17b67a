pub mod command_stream;
pub mod error;
pub mod output_macros;
pub mod user_paths;

pub use command_stream::{CapturedOutput, CommandRunner, CommandSpec, HostCommandRunner};
pub use error::{OrcaError, Result};
