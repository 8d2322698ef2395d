mod basic;
mod middleware;
mod password;
mod policy;
mod service;
mod session;

pub use basic::BasicAuth;
pub use middleware::{auth_middleware, AuthState};
pub use password::{hash_password, verify_password, PasswordError};
pub use policy::{extract_bearer, extract_session_cookie, requires_auth, Auth, AuthPolicy};
pub use service::{AuthError, AuthService};
pub use session::{generate_session_id, SessionAuth, SessionManager};
