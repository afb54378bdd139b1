//! `grind_shared`
//!
//! Libraries shared by the room client, its binary and the integration tests.
//!
//! Design goals:
//! - Keep the wire protocol in one place.
//! - Hide the renderer behind a trait so the scene runs headless.
//! - No `unsafe`.

pub mod config;
pub mod event;
pub mod math;
pub mod net;
pub mod render;
