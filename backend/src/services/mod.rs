pub mod access;
pub mod audit_log;
pub mod bootstrap;
pub mod session;
pub mod timetable;

pub use audit_log::AuditLogService;
pub use session::SessionManager;
