//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod account;
pub mod payment;

pub use account::{
    AccountSetupError, CompleteAccountSetupCommand, CompleteAccountSetupHandler,
    CompleteAccountSetupResult, VerifySetupTokenHandler, VerifySetupTokenQuery,
    VerifySetupTokenResult,
};
pub use payment::{
    CallbackOutcome, CheckoutError, CheckoutSettings, HandlePaymentCallbackCommand,
    HandlePaymentCallbackHandler, HandlePaymentCallbackResult, InitiateCheckoutCommand,
    InitiateCheckoutHandler, InitiateCheckoutResult,
};
