//! Authentication: sessions and the extractors that require them.

mod middleware;
mod session;

pub use middleware::{AdminUser, AuthUser};
pub use session::{Login, SessionRegistry};
