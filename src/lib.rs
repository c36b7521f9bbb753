#![warn(clippy::all)]

//! Voting, acceptance and counter consistency for a Q&A content service.
//!
//! The glue layer resolves a [`types::principal::Principal`] and hands it,
//! together with already validated input, to one of the [`services`]. All
//! persistence goes through a [`store::RecordStore`].

pub mod config;
pub mod ledger;
pub mod services;
pub mod store;
pub mod types;

pub use handle_errors::{Error, ErrorKind};
