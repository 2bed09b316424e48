pub mod events;
pub mod lifecycle;
pub mod operations;
pub mod session;
pub mod traits;
pub mod transcript;
