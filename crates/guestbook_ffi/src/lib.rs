//! Flutter-facing bindings for the guestbook core.

pub mod api;
