//! CLI 命令实现

mod config_gen;
mod users;

pub use config_gen::config_generate;
pub use users::{reset_password, verify_user};
