pub mod auth;
pub mod error_boundary;
pub mod logging;
pub mod request_id;

pub use auth::*;
pub use error_boundary::*;
pub use logging::*;
pub use request_id::*;
