pub mod az_cli;

pub use az_cli::{AzureCli, ContainerAppSpec, PostgresServerSpec, DB_PASSWORD_SECRET};
