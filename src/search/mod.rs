//! People search
//!
//! - `SearchParams`: keywords and filters, rendered into result page URLs
//! - `SearchCollector`: walks result pages and streams profile records

mod collector;
mod params;

pub use collector::{pages_for, ProfileStream, SearchCollector, PAGE_SIZE};
pub use params::{NetworkDistance, SearchParams};
