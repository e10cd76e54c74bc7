pub mod configure_repository;
pub mod login;
pub mod preflight_check;
pub mod provision_infrastructure;
pub mod teardown_infrastructure;

pub use configure_repository::{ConfigureRepositoryUseCase, RepositoryOutcome};
pub use login::{LoginConfig, LoginUseCase};
pub use preflight_check::{PreflightCheckUseCase, ToolStatus};
pub use provision_infrastructure::{
    ProvisionInfrastructureConfig, ProvisionInfrastructureUseCase, ProvisionOutcome, ProvisionStep,
};
pub use teardown_infrastructure::{TeardownConfig, TeardownInfrastructureUseCase, TeardownOutcome};
