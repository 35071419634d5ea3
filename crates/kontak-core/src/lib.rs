//! Core types and trait definitions for Kontak.
//!
//! This crate is free of HTTP and database dependencies. It owns the contact
//! model, the phone and search rules, and [`book::ContactBook`], which drives
//! the list view and the contact form against any [`store::ContactStore`].

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// `ContactStore` signatures instead.
#![allow(async_fn_in_trait)]

pub mod book;
pub mod contact;
pub mod error;
pub mod guard;
pub mod notify;
pub mod phone;
pub mod search;
pub mod store;

pub use error::{Error, Result};
