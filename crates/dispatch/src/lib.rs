pub mod callback;
pub mod error;
pub mod gate;
pub mod rate_limit;
pub mod services;

pub use callback::{verify as verify_callback, CallbackBody, CallbackStatus};
pub use error::DispatchError;
pub use gate::{dispatch, DispatchOutcome, DispatchRequest};
pub use rate_limit::RateLimiter;
pub use services::Services;
