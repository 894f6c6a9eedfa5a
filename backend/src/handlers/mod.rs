pub mod academics;
pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod extract;
pub mod profile;
pub mod students;
pub mod timetable;
pub mod users;
