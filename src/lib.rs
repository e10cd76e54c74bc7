//! # azprov - per-developer Azure environments
//!
//! `azprov` provisions a small, fixed set of Azure resources for one developer
//! and stores the credentials a CI pipeline needs in a GitHub repository. It
//! drives the `az` and `gh` command-line tools; it keeps no state of its own.
//!
//! ## Quick Start
//!
//! ```bash
//! export AZPROV_DB_PASSWORD='...'
//! azprov setup            # log in, create everything, store CI secrets
//! azprov setup -s         # same, reusing existing az/gh sessions
//! azprov cleanup          # delete the resource group
//! azprov cleanup --purge-credentials
//! azprov --dry-run setup  # print the commands instead of running them
//! ```
//!
//! ## Resources
//!
//! Names are derived from a prefix (default `demo`) and the local user name:
//!
//! - resource group `rg-{prefix}-{user}`
//! - Log Analytics workspace `log-{prefix}-{user}`
//! - container registry `acr{prefix}{user}`
//! - Container Apps environment `cae-{prefix}-{user}`
//! - PostgreSQL flexible server `psql-{prefix}-{user}`
//! - container app `ca-{prefix}-{user}`
//! - service principal `sp-{prefix}-{user}`
//!
//! ## Architecture
//!
//! - [`domain`]: configuration, resource naming and credential types
//! - [`application`]: the setup and cleanup workflows
//! - [`infrastructure`]: `az`/`gh` adapters, config loading and process execution
//! - [`presentation`]: CLI interface and console output
//! - [`common`]: shared error handling and logging
//!
//! Every external call goes through the
//! [`CommandRunner`](infrastructure::process::CommandRunner) trait, so a dry run
//! or a test only has to swap the runner.
//!
//! ## Using the Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use azprov::application::services::SilentProgress;
//! use azprov::application::use_cases::{TeardownConfig, TeardownInfrastructureUseCase};
//! use azprov::domain::entities::provision_config::SecretNames;
//! use azprov::infrastructure::{AzureCli, DryRunRunner, GitHubCli};
//!
//! # async fn example() -> azprov::Result<()> {
//! let runner = Arc::new(DryRunRunner::new());
//! let use_case = TeardownInfrastructureUseCase::new(
//!     AzureCli::new(runner.clone()),
//!     GitHubCli::new(runner, None),
//!     TeardownConfig {
//!         resource_group: "rg-demo-alice".to_string(),
//!         service_principal: "sp-demo-alice".to_string(),
//!         secrets: SecretNames::default(),
//!         purge_credentials: false,
//!     },
//!     Arc::new(SilentProgress),
//! );
//! use_case.execute().await?;
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::ProvisionError;
pub use crate::common::result::ProvisionResult as Result;
