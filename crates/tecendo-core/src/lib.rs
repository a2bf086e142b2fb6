//! Core types and trait definitions for the Tecendo Arte backend.
//!
//! This crate owns the two pieces of the platform with real invariants: the
//! account identity / role-transition protocol ([`identity`]) and the report
//! moderation state machine ([`moderation`]). It has no HTTP or database
//! dependencies; storage and credential handling are reached through the
//! traits in [`store`] and [`auth`].

pub mod account;
pub mod auth;
pub mod error;
pub mod identity;
pub mod moderation;
pub mod profile;
pub mod report;
pub mod store;

pub use error::{Error, Result};
