//! Workspace orchestration.
//!
//! Resolves which workspace and project a command targets, plans the
//! dependency order across projects, and drives the compose runner and
//! version control on their behalf.

pub mod branches;
pub mod context;
pub mod controller;
pub mod error;
pub mod git;
pub mod workspaces;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use branches::{BranchListing, BranchWorkflow, CheckoutOutcome, Prompt};
pub use context::{ContextResolver, RuntimeContext, Scope};
pub use controller::{check, shutdown_order, startup_order, Controller};
pub use error::{OrchestratorError, Result};
pub use git::{parse_branches, Branch, GitCli, VersionControl};
pub use workspaces::{CloneOutcome, CloneRequest, WorkspaceListing, WorkspaceManager};
