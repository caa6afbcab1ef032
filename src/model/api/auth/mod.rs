mod request;
mod token;

pub use request::{ChangePasswordRequest, Credentials, LoginResponse, RegisterRequest};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
