mod converter;
pub mod errors;

pub use converter::{convert, convert_file};
pub use errors::ConvertError;
