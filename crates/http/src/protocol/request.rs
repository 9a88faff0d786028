//! The immutable server request.
//!
//! [`ServerRequest`] is a value: every `with_*`/`without_*` method returns a new request and
//! leaves the receiver untouched. Unchanged containers are shared between generations through
//! reference counting; the one container a mutator changes is copied first (copy-on-write), so
//! no two requests can observe each other's changes.
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::ServerRequest;
//!
//! let request = ServerRequest::builder().uri("https://example.com/users".parse()?).build();
//! let derived = request.with_header("Accept", "application/json").with_method("PUT")?;
//!
//! assert_eq!(derived.header_line("accept"), "application/json");
//! assert_eq!(derived.method(), "PUT");
//! assert!(!request.has_header("Accept"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::any::Any;
use std::collections::HashMap;

use http::request::Parts;
use http::{Uri, Version};
use serde_json::Value;
use triomphe::Arc;

use crate::protocol::{
    Attributes, Body, Headers, IntoHeaderValues, ParsedBody, RequestError, RequestMethod, UploadedFile,
};

/// Query string and cookie parameters.
pub type Params = HashMap<String, String>;

/// Server/environment parameters, passed through untouched.
pub type ServerParams = HashMap<String, Value>;

const DEFAULT_PROTOCOL_VERSION: &str = "1.1";
const DEFAULT_REQUEST_TARGET: &str = "/";

#[derive(Debug, Clone, Default)]
enum ParsedBodyState {
    /// Never set; derived from the body stream on demand.
    #[default]
    Unset,
    /// Set explicitly, possibly to nothing.
    Set(Option<ParsedBody>),
}

/// An incoming HTTP request as seen by the application.
///
/// Cloning is cheap and clones are fully independent values; instances can be shared
/// across threads without synchronization. The one exception is the [`Body`] stream,
/// which all generations derived from the same request share.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    uri: Uri,
    method: RequestMethod,
    protocol_version: String,
    headers: Arc<Headers>,
    cookie_params: Arc<Params>,
    query_params: Arc<Params>,
    parsed_body: ParsedBodyState,
    server_params: Arc<ServerParams>,
    uploaded_files: Arc<Vec<UploadedFile>>,
    attributes: Arc<Attributes>,
    request_target: Option<String>,
    body: Option<Body>,
}

impl ServerRequest {
    pub fn builder() -> ServerRequestBuilder {
        ServerRequestBuilder::new()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// All headers, with names spelled as they were stored.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Values of `name` (case-insensitive); empty when absent.
    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    /// Values of `name` (case-insensitive) joined with `", "`; empty when absent.
    pub fn header_line(&self, name: &str) -> String {
        self.headers.line(name)
    }

    pub fn cookie_params(&self) -> &Params {
        &self.cookie_params
    }

    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    pub fn server_params(&self) -> &ServerParams {
        &self.server_params
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploaded_files
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute<T: Any>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name)
    }

    pub fn attribute_or<'a, T: Any>(&'a self, name: &str, default: &'a T) -> &'a T {
        self.attributes.get(name).unwrap_or(default)
    }

    /// The parsed body.
    ///
    /// An explicitly set value (including `None`) is returned as is. Otherwise, with a body
    /// attached, the whole stream is read (rewinding first when the stream is seekable) and
    /// decoded as a JSON object; anything that is not an object, including bytes that are
    /// not UTF-8, yields an empty mapping. The decode is repeated on every call and is not
    /// cached, so for a non-seekable body the second call sees only what the first left
    /// unread.
    ///
    /// This locks the body, so it must not be called while a guard from [`Body::lock`] on
    /// the same body is alive on this thread.
    pub fn parsed_body(&self) -> Result<Option<ParsedBody>, RequestError> {
        match &self.parsed_body {
            ParsedBodyState::Set(parsed_body) => Ok(parsed_body.clone()),
            ParsedBodyState::Unset => match &self.body {
                None => Ok(None),
                Some(body) => {
                    let bytes = body.apply(|stream| stream.read_all())?;
                    Ok(Some(ParsedBody::from_json(&bytes)))
                }
            },
        }
    }

    /// The stored request target, or `"/"` when none was set.
    pub fn request_target(&self) -> &str {
        self.request_target.as_deref().unwrap_or(DEFAULT_REQUEST_TARGET)
    }

    pub fn body(&self) -> Result<&Body, RequestError> {
        self.body.as_ref().ok_or(RequestError::MissingBody)
    }

    /// Replaces the URI.
    ///
    /// Unless `preserve_host` is set and a `Host` header already exists, the `Host` header is
    /// replaced by the new URI's host, which may be empty. Every stored spelling of the name
    /// (`host`, `HOST`, ...) is removed first, so afterwards the header is stored once, under
    /// the canonical `Host` spelling.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut request = self.clone();
        request.uri = uri;

        if preserve_host && request.has_header("Host") {
            return request;
        }

        let host = request.uri.host().unwrap_or_default().to_owned();
        let headers = Arc::make_mut(&mut request.headers);
        headers.remove_ignore_case("Host");
        headers.set("Host", vec![host]);
        request
    }

    /// Replaces the method, failing for anything but `GET`, `POST`, `PUT` and `DELETE`.
    pub fn with_method(&self, method: impl AsRef<str>) -> Result<Self, RequestError> {
        let method = method.as_ref().parse::<RequestMethod>()?;
        let mut request = self.clone();
        request.method = method;
        Ok(request)
    }

    pub fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.protocol_version = version.into();
        request
    }

    /// Stores `value` under exactly `name`, replacing only an entry with that exact spelling.
    pub fn with_header(&self, name: impl Into<String>, value: impl IntoHeaderValues) -> Self {
        let mut request = self.clone();
        Arc::make_mut(&mut request.headers).set(name, value.into_header_values());
        request
    }

    /// Appends `value` to the entry stored under exactly `name`, creating it when absent.
    pub fn with_added_header(&self, name: impl Into<String>, value: impl IntoHeaderValues) -> Self {
        let mut request = self.clone();
        Arc::make_mut(&mut request.headers).append(name, value.into_header_values());
        request
    }

    /// Sets the entry under `name` to an empty list of values.
    ///
    /// The entry itself stays, so [`has_header`](Self::has_header) still reports it.
    pub fn without_header(&self, name: impl Into<String>) -> Self {
        self.with_header(name, Vec::<String>::new())
    }

    pub fn with_cookie_params(&self, cookies: Params) -> Self {
        let mut request = self.clone();
        request.cookie_params = Arc::new(cookies);
        request
    }

    pub fn with_query_params(&self, query: Params) -> Self {
        let mut request = self.clone();
        request.query_params = Arc::new(query);
        request
    }

    pub fn with_uploaded_files(&self, files: Vec<UploadedFile>) -> Self {
        let mut request = self.clone();
        request.uploaded_files = Arc::new(files);
        request
    }

    /// Sets the parsed body explicitly; `None` disables decoding from the body stream.
    pub fn with_parsed_body(&self, parsed_body: Option<ParsedBody>) -> Self {
        let mut request = self.clone();
        request.parsed_body = ParsedBodyState::Set(parsed_body);
        request
    }

    pub fn with_attribute<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> Self {
        let mut request = self.clone();
        Arc::make_mut(&mut request.attributes).insert(name, value);
        request
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        let mut request = self.clone();
        if request.attributes.contains(name) {
            Arc::make_mut(&mut request.attributes).remove(name);
        }
        request
    }

    pub fn with_request_target(&self, target: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.request_target = Some(target.into());
        request
    }

    pub fn with_body(&self, body: impl Into<Body>) -> Self {
        let mut request = self.clone();
        request.body = Some(body.into());
        request
    }
}

impl Default for ServerRequest {
    fn default() -> Self {
        ServerRequestBuilder::new().build()
    }
}

/// Converts the head of an `http` request, e.g. one produced by a wire parser.
///
/// Fails when the method is not one of the supported four.
impl TryFrom<Parts> for ServerRequest {
    type Error = RequestError;

    fn try_from(parts: Parts) -> Result<Self, Self::Error> {
        let method = RequestMethod::try_from(&parts.method)?;

        let mut headers = Headers::new();
        for (name, value) in &parts.headers {
            headers.append(name.as_str(), vec![String::from_utf8_lossy(value.as_bytes()).into_owned()]);
        }

        let request_target = parts.uri.path_and_query().map(|target| target.as_str().to_owned());

        Ok(ServerRequestBuilder::new()
            .method(method)
            .protocol_version(version_str(parts.version))
            .headers(headers)
            .request_target(request_target)
            .uri(parts.uri)
            .build())
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => DEFAULT_PROTOCOL_VERSION,
    }
}

/// Collects the initial values of a [`ServerRequest`].
///
/// Every field has a default: URI `/`, method `GET`, protocol `1.1`, empty header,
/// cookie, query, server and attribute maps, no uploaded files, no parsed body, no
/// request target and no body.
#[derive(Debug)]
pub struct ServerRequestBuilder {
    uri: Uri,
    method: RequestMethod,
    protocol_version: String,
    headers: Headers,
    cookie_params: Params,
    query_params: Params,
    parsed_body: ParsedBodyState,
    server_params: ServerParams,
    uploaded_files: Vec<UploadedFile>,
    attributes: Attributes,
    request_target: Option<String>,
    body: Option<Body>,
}

impl ServerRequestBuilder {
    fn new() -> Self {
        Self {
            uri: Uri::from_static("/"),
            method: RequestMethod::default(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_owned(),
            headers: Headers::new(),
            cookie_params: Params::new(),
            query_params: Params::new(),
            parsed_body: ParsedBodyState::Unset,
            server_params: ServerParams::new(),
            uploaded_files: Vec::new(),
            attributes: Attributes::new(),
            request_target: None,
            body: None,
        }
    }

    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    pub fn method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Appends `value` to the header stored under exactly `name`.
    pub fn header(mut self, name: impl Into<String>, value: impl IntoHeaderValues) -> Self {
        self.headers.append(name, value.into_header_values());
        self
    }

    pub fn cookie_params(mut self, cookies: Params) -> Self {
        self.cookie_params = cookies;
        self
    }

    pub fn query_params(mut self, query: Params) -> Self {
        self.query_params = query;
        self
    }

    /// Sets the parsed body explicitly, which turns off decoding from the body stream.
    pub fn parsed_body(mut self, parsed_body: Option<ParsedBody>) -> Self {
        self.parsed_body = ParsedBodyState::Set(parsed_body);
        self
    }

    pub fn server_params(mut self, server_params: ServerParams) -> Self {
        self.server_params = server_params;
        self
    }

    pub fn uploaded_files(mut self, files: Vec<UploadedFile>) -> Self {
        self.uploaded_files = files;
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn request_target(mut self, target: Option<String>) -> Self {
        self.request_target = target;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> ServerRequest {
        ServerRequest {
            uri: self.uri,
            method: self.method,
            protocol_version: self.protocol_version,
            headers: Arc::new(self.headers),
            cookie_params: Arc::new(self.cookie_params),
            query_params: Arc::new(self.query_params),
            parsed_body: self.parsed_body,
            server_params: Arc::new(self.server_params),
            uploaded_files: Arc::new(self.uploaded_files),
            attributes: Arc::new(self.attributes),
            request_target: self.request_target,
            body: self.body,
        }
    }
}
