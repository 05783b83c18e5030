//! Harvests a YouTube user's own top-level comments from recent videos.
//!
//! The videos come from two places: a configured set of channels searched by keyword, and the
//! channels the user is subscribed to. See [`harvest`] for the pipeline itself.

pub mod auth;
pub mod config;
pub mod harvest;
pub mod oauth;
pub mod youtube_api;
