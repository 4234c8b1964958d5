//! Integration tests for the authorization engine.
//! These tests drive complete request flows through the public API.

mod support;

mod authorization;
mod scoring;
