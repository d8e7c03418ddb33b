//! Payment gateway domain.
//!
//! - `codec` - AES-128-CBC wire cipher
//! - `fields` - `key=value&...` field codec
//! - `response` - parsed callback payload
//! - `redirect` - success/failure redirect URLs
//! - `errors` - callback error vocabulary

mod codec;
mod errors;
mod fields;
mod redirect;
mod response;

pub use codec::{decrypt, encrypt, CryptoError, WORKING_KEY_LEN};
pub use errors::CallbackError;
pub use fields::{parse_fields, stringify_fields};
pub use redirect::{sanitize_reason, PaymentRedirect, MAX_REASON_LEN};
pub use response::GatewayResponse;
