//! HTTP 处理函数，按页面区域分组

pub mod accounts;
pub mod assets;
pub mod content;
pub mod feed;
pub mod forms;
pub mod friends;
pub mod health;
pub mod helpers;
pub mod profile;
pub mod routes;

pub use helpers::{CookieBuilder, Services, decode_flashes, encode_flashes};
pub use routes::{configure, login_rate_limiter, member_routes, not_found, public_routes};
