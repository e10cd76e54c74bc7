pub mod gh_cli;

pub use gh_cli::GitHubCli;
