pub mod catalog_handler;
pub mod quote_handler;

use crate::util::error::HandlerError;
use bson::oid::ObjectId;

/// Path ids must be ObjectId hex; anything else is a 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", what)))
}
