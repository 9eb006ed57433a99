//! HTTP 层：处理函数、中间件与会话令牌

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;
