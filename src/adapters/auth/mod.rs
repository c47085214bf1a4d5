//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 session tokens from the hosted auth service
//! - `mock` - Test implementation that doesn't require real tokens

mod jwt;
mod mock;

pub use jwt::{Audience, JwtConfig, JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
