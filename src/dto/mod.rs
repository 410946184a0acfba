pub mod catalog_dto;
pub mod list_dto;
pub mod quote_dto;
