pub mod library;
pub mod profile;
pub mod providers;
pub mod session;

pub use library::{Library, LibraryHandle};
pub use profile::ProfileService;
pub use session::{RouteAccess, SessionGate, SessionState};
