use core::str::FromStr;

use axum::response::Response;

use yamdb_auth::Username;

use crate::app::errors;

/// Parse a path identifier, answering 400 when it is not one.
pub fn parse_id<T: FromStr>(raw: &str, what: &'static str) -> Result<T, Response> {
    raw.parse::<T>().map_err(|_| errors::invalid_id(what))
}

pub fn parse_username(raw: &str) -> Result<Username, Response> {
    Username::parse(raw).map_err(errors::domain_error_to_response)
}
