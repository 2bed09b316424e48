pub mod parse;
pub mod playground;
pub mod request;
pub mod runtime;
