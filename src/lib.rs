//! citylog - reducer-backed data provider for a travel-log city collection
//!
//! State lives in a [`provider::CitiesProvider`] and changes only through
//! the transition table in [`reducer`]; all network I/O happens behind the
//! [`api::CitySource`] seam.

pub mod action;
pub mod api;
pub mod provider;
pub mod reducer;
pub mod state;
