/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Azure CLI invocations (resource groups, registry, Container Apps, PostgreSQL, service principals)
/// - GitHub CLI invocations (authentication, repository secrets)
/// - Configuration file loading
/// - Process execution (child processes, dry runs, PATH lookup)
pub mod azure;
pub mod filesystem;
pub mod github;
pub mod identity;
pub mod process;

// Re-export commonly used types
pub use azure::AzureCli;
pub use filesystem::ConfigStore;
pub use github::GitHubCli;
pub use identity::SystemIdentity;
pub use process::{CommandRunner, DryRunRunner, ProcessRunner, ToolLocator};
