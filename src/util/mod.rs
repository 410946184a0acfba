pub mod error;
pub mod logger;
pub mod thai_text;
