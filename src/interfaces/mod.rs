//! 运维接口

#[cfg(feature = "cli")]
pub mod cli;
