pub mod env;
pub mod workflow;

pub use env::{env_command, EnvCommands};
pub use workflow::{workflow_command, WorkflowCommands};
