//! 静态配置
//!
//! 启动时从 `config.toml`（可选）和 `UT__*` 环境变量加载一次，
//! 之后通过 [`get_config`] 共享。

mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, replace_config};
pub use structs::*;
