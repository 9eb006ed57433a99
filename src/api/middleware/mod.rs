pub mod csrf;
pub mod request_id;
pub mod session;
pub mod timing;

pub use csrf::CsrfGuard;
pub use request_id::{RequestId, RequestIdMiddleware};
pub use session::{LOGIN_REQUIRED_MESSAGE, SessionGuard, SessionUser};
pub use timing::TimingMiddleware;
