//! Journal API: users sign up, keep journals, and add dated entries to them.
//!
//! The store lives in memory for the lifetime of the process, which makes the
//! server suitable as a development backend for the journal frontend.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
