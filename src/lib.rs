//! Payflow - payment gateway callback pipeline with guest account
//! provisioning.
//!
//! Decrypts gateway callbacks, completes orders exactly once, provisions
//! accounts for guest buyers, sends account setup email and reports
//! purchase conversions.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
