pub mod catalog;
pub mod counter;
pub mod quote;
