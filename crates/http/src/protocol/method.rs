use std::fmt;
use std::str::FromStr;

use crate::protocol::RequestError;

/// The request methods accepted by [`ServerRequest::with_method`](super::ServerRequest::with_method).
///
/// Only these four are recognised; `PATCH`, `HEAD`, `OPTIONS` and friends are rejected.
/// Parsing is case-sensitive.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            other => Err(RequestError::invalid_method(other)),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequestMethod> for http::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => http::Method::GET,
            RequestMethod::Post => http::Method::POST,
            RequestMethod::Put => http::Method::PUT,
            RequestMethod::Delete => http::Method::DELETE,
        }
    }
}

impl TryFrom<&http::Method> for RequestMethod {
    type Error = RequestError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl PartialEq<str> for RequestMethod {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for RequestMethod {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
