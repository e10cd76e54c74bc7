/// Application layer: the setup and cleanup workflows, expressed as use cases
/// over the Azure and GitHub CLI adapters.
pub mod services;
pub mod use_cases;
