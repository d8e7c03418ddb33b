//! Account setup handlers for guests provisioned at purchase.

mod complete_account_setup;
mod verify_setup_token;

pub use complete_account_setup::{
    AccountSetupError, CompleteAccountSetupCommand, CompleteAccountSetupHandler,
    CompleteAccountSetupResult,
};
pub use verify_setup_token::{
    VerifySetupTokenHandler, VerifySetupTokenQuery, VerifySetupTokenResult,
};
