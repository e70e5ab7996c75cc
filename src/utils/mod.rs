pub mod json_converter;
pub mod query_string;

pub use json_converter::value_to_text;
pub use query_string::redacted_query_string;
