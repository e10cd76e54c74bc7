pub mod cli_tool;
pub mod resource_name;
pub mod secret;
