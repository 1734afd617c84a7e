pub mod env;
pub mod transfer;

pub use env::{EnvCommands, env_command};
pub use transfer::{export_command, import_command, serializers_command};
