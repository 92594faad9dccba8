//! Per-connection session state.

use bytes::{Bytes, BytesMut};
use miltr_protocol::Macros;

/// Ordered collection of message headers.
///
/// Duplicates and insertion order are preserved. Name lookups ignore ASCII
/// case; storage keeps the spelling the MTA sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, keeping any earlier ones with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value recorded under `name`.
    pub fn get<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.get_all(name).next()
    }

    /// Every value recorded under `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State accumulated across the packets of one MTA connection.
///
/// Macros are scoped to the single command type they were declared for;
/// headers and body build up until their end markers and reset on abort.
#[derive(Debug, Default)]
pub struct Session {
    macros: Macros,
    macros_for: u8,
    headers: Headers,
    body: BytesMut,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the macro-scope rule for an incoming command tag: a macro
    /// set declared for tag X is gone once a command with a different tag
    /// is processed without an intervening redefinition.
    pub fn enter_command(&mut self, tag: u8) {
        if tag != self.macros_for {
            self.macros.clear();
        }
    }

    /// Replaces the macro set and the command tag it applies to.
    pub fn define_macros(&mut self, target: u8, macros: Macros) {
        self.macros_for = target;
        self.macros = macros;
    }

    /// Macros visible to the command currently being processed.
    pub fn macros(&self) -> &Macros {
        &self.macros
    }

    pub fn add_header(&mut self, name: String, value: String) {
        self.headers.add(name, value);
    }

    /// Hands out the accumulated headers and resets the accumulator.
    pub fn take_headers(&mut self) -> Headers {
        std::mem::take(&mut self.headers)
    }

    pub fn append_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Hands out the accumulated body and resets the accumulator.
    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body).freeze()
    }

    /// Drops any half-assembled message state after an abort.
    pub fn abort(&mut self) {
        self.headers = Headers::default();
        self.body.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macros(pairs: &[(&str, &str)]) -> Macros {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn macros_survive_their_own_command_tag() {
        let mut session = Session::new();
        session.define_macros(b'H', macros(&[("x", "1")]));

        session.enter_command(b'H');
        assert_eq!(session.macros().get("x").map(String::as_str), Some("1"));

        // Still there for a second command of the same type.
        session.enter_command(b'H');
        assert_eq!(session.macros().len(), 1);
    }

    #[test]
    fn macros_vanish_on_a_different_command_tag() {
        let mut session = Session::new();
        session.define_macros(b'H', macros(&[("x", "1")]));

        session.enter_command(b'C');
        assert!(session.macros().is_empty());

        // And they do not come back.
        session.enter_command(b'H');
        assert!(session.macros().is_empty());
    }

    #[test]
    fn redefinition_replaces_the_whole_set() {
        let mut session = Session::new();
        session.define_macros(b'M', macros(&[("x", "1"), ("y", "2")]));
        session.define_macros(b'M', macros(&[("z", "3")]));

        session.enter_command(b'M');
        assert_eq!(session.macros().len(), 1);
        assert_eq!(session.macros().get("z").map(String::as_str), Some("3"));
    }

    #[test]
    fn headers_preserve_duplicates_and_order() {
        let mut headers = Headers::new();
        headers.add("Subject", "hi");
        headers.add("Received", "by a");
        headers.add("Subject", "hi2");

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Subject"), Some("hi"));
        let subjects: Vec<_> = headers.get_all("Subject").collect();
        assert_eq!(subjects, ["hi", "hi2"]);

        let order: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(order, ["Subject", "Received", "Subject"]);
    }

    #[test]
    fn header_lookup_ignores_ascii_case() {
        let mut headers = Headers::new();
        headers.add("Subject", "hi");

        assert_eq!(headers.get("subject"), Some("hi"));
        assert_eq!(headers.get("SUBJECT"), Some("hi"));
        // The stored spelling is what the MTA sent.
        assert_eq!(headers.iter().next(), Some(("Subject", "hi")));
    }

    #[test]
    fn take_headers_resets_the_accumulator() {
        let mut session = Session::new();
        session.add_header("A".to_string(), "1".to_string());

        let taken = session.take_headers();
        assert_eq!(taken.len(), 1);
        assert!(session.take_headers().is_empty());
    }

    #[test]
    fn body_accumulates_chunks() {
        let mut session = Session::new();
        session.append_body(b"first ");
        session.append_body(b"second");

        assert_eq!(&session.take_body()[..], b"first second");
        assert!(session.take_body().is_empty());
    }

    #[test]
    fn abort_clears_headers_and_body_but_not_macros() {
        let mut session = Session::new();
        session.define_macros(b'A', macros(&[("i", "q1")]));
        session.add_header("Subject".to_string(), "hi".to_string());
        session.append_body(b"data");

        session.abort();

        assert!(session.take_headers().is_empty());
        assert!(session.take_body().is_empty());
        assert_eq!(session.macros().len(), 1);
    }
}
