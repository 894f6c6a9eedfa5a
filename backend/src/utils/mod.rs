pub mod csv;
pub mod ids;
pub mod password;
pub mod time;

pub use ids::*;
pub use password::*;
pub use time::*;
