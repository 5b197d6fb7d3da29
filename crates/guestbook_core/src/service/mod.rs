//! Guestbook use-case services.
//!
//! # Responsibility
//! - Wire feed events, paging, composer and submission into one session.
//! - Keep hosts decoupled from store, paging and policy details.

pub mod guestbook_service;
pub mod overlay;
pub mod renderer;
