//! Client for the discharge note simplifier
//!
//! Talks to a stateless backend that turns hospital discharge notes into
//! plain-language guidance, either as a multi-turn chat with an optional
//! document attachment or as a one-shot structured breakdown.

pub mod api;
pub mod attachment;
pub mod controller;
pub mod error;
pub mod form;
pub mod mime;
pub mod models;
pub mod render;
pub mod session;

pub use error::{Error, Result};
