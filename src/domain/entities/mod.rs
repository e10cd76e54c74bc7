pub mod credentials;
pub mod provision_config;
