//! Immutable HTTP server request and body stream abstractions
//!
//! This crate provides the value objects an application sees for one incoming request:
//! an immutable [`ServerRequest`](protocol::ServerRequest) and the [`Stream`](stream::Stream)
//! carrying its body. Parsing the wire format and running a server are left to other layers.
//!
//! # Features
//!
//! - Immutable requests with copy-on-write `with_*` mutators
//! - Case-preserving headers with case-insensitive lookup
//! - Lazy JSON decoding of the request body
//! - A stream wrapper with strict capability checks and one-shot detach
//! - Bootstrapping from CGI-style gateway tables
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use micro_message::protocol::ServerRequest;
//! use micro_message::stream::Stream;
//!
//! let request = ServerRequest::builder()
//!     .uri("http://example.com/search".parse()?)
//!     .header("Content-Type", "application/json")
//!     .query_params(HashMap::from([("q".to_owned(), "x".to_owned())]))
//!     .body(Stream::from_bytes(r#"{"page": 2}"#))
//!     .build();
//!
//! let routed = request.with_attribute("route", "search");
//!
//! assert_eq!(routed.attribute::<&str>("route"), Some(&"search"));
//! assert!(request.attribute::<&str>("route").is_none());
//!
//! let parsed = routed.parsed_body()?.expect("body attached");
//! assert_eq!(parsed.as_map().and_then(|map| map.get("page")), Some(&2.into()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: the request, its value types and the error types
//! - [`stream`]: the byte-stream wrapper and built-in handles
//! - [`globals`]: building the initial request from raw gateway tables
//!
//! # Concurrency
//!
//! A [`ServerRequest`](protocol::ServerRequest) is never mutated after construction and can be
//! shared across threads freely. A [`Stream`](stream::Stream) has one cursor and is not meant
//! for concurrent use; requests hand it out behind a lock as [`Body`](protocol::Body).
//!
//! # Limitations
//!
//! - Only `GET`, `POST`, `PUT` and `DELETE` are accepted as methods
//! - Header names and values are not validated

pub mod globals;
pub mod protocol;
pub mod stream;

mod utils;
pub(crate) use utils::ensure;
