//! Case-preserving header storage with case-insensitive lookup.
//!
//! Names are stored exactly as given, so `"content-type"` and `"Content-Type"` are two
//! distinct entries. Only the lookup methods ([`Headers::contains`], [`Headers::get`],
//! [`Headers::line`]) fold case, which keeps the original spelling visible when iterating.

use std::slice;

/// Ordered header entries, each a name with its sequence of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive existence check. An entry with no values still exists.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Values for `name`, matched case-insensitively. An entry stored under the exact
    /// spelling wins over other spellings. Empty when nothing matches.
    pub fn get(&self, name: &str) -> &[String] {
        match self.find(name) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    /// Values for `name` joined with `", "`; empty when nothing matches.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// Values stored under exactly `name`, without case folding.
    pub fn get_exact(&self, name: &str) -> Option<&[String]> {
        self.position_exact(name).map(|index| self.entries[index].1.as_slice())
    }

    /// Replaces the entry stored under exactly `name`, or appends a new one.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.position_exact(&name) {
            Some(index) => self.entries[index].1 = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Appends to the entry stored under exactly `name`, creating it when absent.
    pub fn append(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.position_exact(&name) {
            Some(index) => self.entries[index].1.extend(values),
            None => self.entries.push((name, values)),
        }
    }

    /// Removes the entry stored under exactly `name`.
    pub fn remove_exact(&mut self, name: &str) -> Option<Vec<String>> {
        self.position_exact(name).map(|index| self.entries.remove(index).1)
    }

    /// Removes every entry whose name matches `name` case-insensitively and returns how many went.
    pub fn remove_ignore_case(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(stored, _)| !stored.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { inner: self.entries.iter() }
    }

    fn position_exact(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(stored, _)| stored == name)
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.position_exact(name)
            .or_else(|| self.entries.iter().position(|(stored, _)| stored.eq_ignore_ascii_case(name)))
    }
}

/// Iterator over `(name, values)` pairs in storage order.
#[derive(Debug)]
pub struct Iter<'a> {
    inner: slice::Iter<'a, (String, Vec<String>)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a [String]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a [String]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: IntoHeaderValues,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.append(name, values.into_header_values());
        }
        headers
    }
}

/// Normalizes the accepted header value shapes (one string or a sequence) into a sequence.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|value| (*value).to_owned()).collect()
    }
}

impl IntoHeaderValues for &[String] {
    fn into_header_values(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}
