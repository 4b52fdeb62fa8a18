pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use token::{
    Claims, Clock, FixedClock, IssuedToken, SystemClock, TokenError, TokenService, VerifiedToken, TOKEN_TTL_HOURS,
};
