//! In-memory Magento store for end-to-end testing.
//!
//! Unlike wiremock, which mocks single exchanges per test, this server
//! keeps catalog, cart and order state across requests so a whole
//! checkout can be driven against it.
//!
//! # Example
//!
//! ```ignore
//! use m2rest::mock_server::{Fixtures, MockServer};
//! use m2rest::{Lookup, ProductHandle};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = server.client();
//!
//!     let handle = ProductHandle::lookup(&client, "MH01-XS-Black".to_string()).await.unwrap();
//!     assert_eq!(handle.product.price, Some(52.0));
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::{MockServer, STORE_CODE};
pub use state::MockState;
