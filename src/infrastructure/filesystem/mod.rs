pub mod config_store;

pub use config_store::{ConfigFormat, ConfigStore, ConfigStoreError};
