pub mod catalog_repo;
pub mod counter_repo;
pub mod mongo;
pub mod quote_repo;
pub mod repository_error;
