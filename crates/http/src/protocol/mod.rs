//! Core HTTP message abstractions.
//!
//! This module provides the immutable server request and the value types it is composed of.
//!
//! # Architecture
//!
//! - **Request** ([`request`]): the immutable request and its builder
//!   - [`ServerRequest`]: every `with_*` call returns a new, independent request
//!   - [`ServerRequestBuilder`]: collects initial values, all of them defaulted
//!
//! - **Headers** ([`header`]): case-preserving storage, case-insensitive lookup
//!   - [`Headers`]: ordered `(name, values)` entries
//!   - [`IntoHeaderValues`]: accepts one value or a sequence of values
//!
//! - **Request data**
//!   - [`RequestMethod`]: the four supported methods
//!   - [`ParsedBody`]: a decoded body, mapping or application object
//!   - [`Attributes`]: request-scoped, type-erased metadata
//!   - [`UploadedFile`]: a spooled multipart file part
//!   - [`Body`]: the body [`Stream`](crate::stream::Stream), shared between generations
//!
//! - **Error Handling**:
//!   - [`MessageError`]: Top-level error type
//!   - [`RequestError`]: request construction and access errors
//!   - [`StreamError`]: stream operation errors

mod attributes;
pub use attributes::AttributeValue;
pub use attributes::Attributes;

mod body;
pub use body::Body;

mod error;
pub use error::MessageError;
pub use error::RequestError;
pub use error::StreamError;

pub mod header;
pub use header::Headers;
pub use header::IntoHeaderValues;

mod method;
pub use method::RequestMethod;

mod parsed_body;
pub use parsed_body::ParsedBody;

pub mod request;
pub use request::Params;
pub use request::ServerParams;
pub use request::ServerRequest;
pub use request::ServerRequestBuilder;

mod uploaded_file;
pub use uploaded_file::UploadError;
pub use uploaded_file::UploadedFile;
