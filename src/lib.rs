//! Release Date Calculation Engine for UK custodial sentences
//!
//! This crate provides functionality for identifying the legal release track of
//! a custodial sentence and calculating its release, eligibility and expiry
//! dates, combined across a booking and adjusted onto working days.

#![warn(missing_docs)]

pub mod calculation;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
