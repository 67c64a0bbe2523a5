//! Integration tests
//!
//! Every scenario runs against `mock::MockSite`, a scripted stand-in for
//! the remote site, on a paused tokio clock so cooldowns, checkpoint
//! polling and grace delays complete instantly.

mod mock;

mod auth_tests;
mod search_tests;
