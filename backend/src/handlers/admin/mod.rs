pub mod activities;
pub mod data;
pub mod export;
pub mod users;

pub use activities::*;
pub use data::*;
pub use export::*;
pub use users::*;
