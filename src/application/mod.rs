//! Application layer - command handlers and the services they share.
//!
//! Handlers orchestrate domain operations through ports. Services hold the
//! reusable pieces (token lifecycle, email delivery, provisioning, analytics)
//! that more than one handler or background job needs.

mod background;

pub mod handlers;
pub mod services;

pub use background::BackgroundTasks;
