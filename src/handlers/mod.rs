mod error;
mod health;
mod service;
mod session_auth;
mod users;

pub use error::{ApiError, ErrorResponse};
pub use health::*;
pub use service::*;
pub use session_auth::*;
pub use users::*;
