/// Verimail Crypto Library
///
/// Single-use verification tokens: 256 bits from the OS random source,
/// base64url-encoded so they can be dropped into a link as-is.
pub mod token;

pub use token::{TOKEN_BYTES, generate_verification_token};
