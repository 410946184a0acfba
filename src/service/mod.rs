pub mod catalog_service;
pub mod duplicator;
pub mod list_query;
pub mod quote_service;
pub mod resolver;
pub mod running_number;
