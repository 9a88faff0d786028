//! Builds the initial [`ServerRequest`] from raw gateway tables.
//!
//! A CGI-style gateway hands over a server/environment table (`REQUEST_METHOD`, `HTTP_*`
//! keys, ...) alongside already-decoded query, form, cookie and file tables. [`RawGlobals`]
//! carries those tables as they are; [`ServerRequest::from_globals`] turns them into a request.

use std::collections::HashMap;
use std::env;
use std::io::{self, Read};

use http::Uri;
use serde_json::Value;
use tracing::debug;

use crate::protocol::{
    Headers, Params, ParsedBody, RequestError, RequestMethod, ServerParams, ServerRequest, UploadedFile,
};
use crate::stream::Stream;

/// Headers that reach the server table without the `HTTP_` prefix.
const UNPREFIXED_HEADERS: [&str; 3] = ["CONTENT_TYPE", "CONTENT_LENGTH", "CONTENT_MD5"];

/// The raw input tables of one request.
#[derive(Debug, Default)]
pub struct RawGlobals {
    pub server: HashMap<String, String>,
    pub query: Params,
    pub post: Params,
    pub cookies: Params,
    pub files: Vec<UploadedFile>,
    pub body: Option<Stream>,
}

impl RawGlobals {
    /// Reads the server table from the process environment and, when `CONTENT_LENGTH`
    /// announces one, the body from standard input.
    pub fn from_env() -> Self {
        let server: HashMap<String, String> = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        let body = server
            .get("CONTENT_LENGTH")
            .and_then(|length| length.trim().parse::<u64>().ok())
            .filter(|length| *length > 0)
            .map(|length| Stream::from_reader(io::stdin().take(length)));

        Self { server, body, ..Self::default() }
    }
}

impl ServerRequest {
    /// Builds a request from raw gateway tables.
    ///
    /// Fails only when `REQUEST_METHOD` names an unsupported method.
    pub fn from_globals(globals: RawGlobals) -> Result<Self, RequestError> {
        let RawGlobals { server, query, post, cookies, files, body } = globals;

        let method = match server.get("REQUEST_METHOD") {
            Some(method) => method.parse::<RequestMethod>()?,
            None => RequestMethod::default(),
        };

        let headers = headers_from_server(&server);

        let query = if query.is_empty() { query_from_server(&server) } else { query };
        let cookies = if cookies.is_empty() { cookies_from_header(&headers) } else { cookies };

        let mut builder = ServerRequest::builder()
            .uri(uri_from_server(&server))
            .method(method)
            .request_target(server.get("REQUEST_URI").cloned())
            .query_params(query)
            .cookie_params(cookies)
            .uploaded_files(files);

        if let Some(version) = server.get("SERVER_PROTOCOL").and_then(|protocol| protocol.strip_prefix("HTTP/")) {
            builder = builder.protocol_version(version);
        }

        if method == RequestMethod::Post && is_form_content(&headers) {
            builder = builder.parsed_body(Some(ParsedBody::from(post)));
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        let server_params: ServerParams = server.into_iter().map(|(key, value)| (key, Value::String(value))).collect();

        Ok(builder.headers(headers).server_params(server_params).build())
    }
}

/// `HTTP_X_FORWARDED_FOR` style keys become `X-Forwarded-For` headers, in key order.
fn headers_from_server(server: &HashMap<String, String>) -> Headers {
    let mut keys: Vec<&String> = server.keys().collect();
    keys.sort();

    let mut headers = Headers::new();
    for key in keys {
        let raw_name = match key.strip_prefix("HTTP_") {
            Some(rest) => rest,
            None if UNPREFIXED_HEADERS.contains(&key.as_str()) => key.as_str(),
            None => continue,
        };

        if raw_name.is_empty() {
            debug!(key = %key, "skip server parameter without header name");
            continue;
        }

        headers.set(header_name(raw_name), vec![server[key].clone()]);
    }
    headers
}

fn header_name(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn uri_from_server(server: &HashMap<String, String>) -> Uri {
    let https = server.get("HTTPS").is_some_and(|value| !value.is_empty() && !value.eq_ignore_ascii_case("off"));
    let scheme = if https { "https" } else { "http" };

    let host = server.get("HTTP_HOST").filter(|host| !host.is_empty()).cloned().or_else(|| {
        let name = server.get("SERVER_NAME").filter(|name| !name.is_empty())?;
        match server.get("SERVER_PORT").map(String::as_str) {
            Some(port) if !is_default_port(scheme, port) => Some(format!("{name}:{port}")),
            _ => Some(name.clone()),
        }
    });

    let target = match server.get("REQUEST_URI").filter(|uri| !uri.is_empty()) {
        Some(request_uri) => request_uri.clone(),
        None => match server.get("QUERY_STRING").filter(|query| !query.is_empty()) {
            Some(query) => format!("/?{query}"),
            None => String::from("/"),
        },
    };

    let text = match host {
        Some(host) if target.starts_with('/') => format!("{scheme}://{host}{target}"),
        _ => target,
    };

    text.parse::<Uri>().unwrap_or_else(|e| {
        debug!(uri = %text, cause = %e, "malformed request uri, falling back to '/'");
        Uri::from_static("/")
    })
}

fn is_default_port(scheme: &str, port: &str) -> bool {
    matches!((scheme, port), ("http", "80") | ("https", "443"))
}

fn query_from_server(server: &HashMap<String, String>) -> Params {
    let Some(query) = server.get("QUERY_STRING").filter(|query| !query.is_empty()) else {
        return Params::new();
    };

    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            debug!(query = %query, cause = %e, "unparsable query string, ignoring it");
            Params::new()
        }
    }
}

fn cookies_from_header(headers: &Headers) -> Params {
    headers
        .get("Cookie")
        .iter()
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn is_form_content(headers: &Headers) -> bool {
    let Ok(content_type) = headers.line("Content-Type").parse::<mime::Mime>() else {
        return false;
    };

    content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()
        || (content_type.type_() == mime::MULTIPART && content_type.subtype() == mime::FORM_DATA)
}
