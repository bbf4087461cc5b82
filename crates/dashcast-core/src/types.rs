use std::fmt;
use uuid::Uuid;

/// Registry key for one accepted socket.
///
/// Minted on accept and dropped with the connection; never reused or
/// stored. Generated ids are time-ordered UUIDs in compact hex, which keeps
/// log lines for the same client easy to grep. Tests build named ids via
/// `From`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnId(String);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for ConnId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_distinct_compact_hex() {
        let a = ConnId::new();
        let b = ConnId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn named_id_displays_verbatim() {
        let id = ConnId::from("conn-1");
        assert_eq!(id.to_string(), "conn-1");
        assert_eq!(id, ConnId::from(String::from("conn-1")));
    }
}
