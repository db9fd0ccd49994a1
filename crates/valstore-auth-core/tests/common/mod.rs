//! Common test utilities for valstore-auth-core integration tests

pub mod upstream_mock;

#[allow(unused_imports)]
pub use upstream_mock::{storefront_body, UpstreamMock, TEST_SECRET};
