pub mod request_id;
pub mod session_guard;
