//! Boundary input model: events, places, legend entries and options as supplied by the host.

pub mod document;
pub mod model;
