//! Provider payload shapes and their mapping into [`FlightOffer`](crate::common::FlightOffer).
//!
//! Raw vendor structures stop here: adapters deserialize into the types of
//! the provider submodule and only hand normalized records onwards.

pub mod base;
pub mod edreams;
pub mod ryanair;

pub use base::{format_duration, sort_by_price, FareComponent, FareSelection, LegTimeline};
