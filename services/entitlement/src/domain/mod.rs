pub mod clock;
pub mod code;
pub mod password;
pub mod repository;
pub mod time_window;
pub mod types;
