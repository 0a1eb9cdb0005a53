//! Passphrase candidate held in zeroizing memory.

use std::fmt;

use zeroize::Zeroizing;

/// A passphrase candidate.
///
/// The backing string is zeroized when dropped and never shows up in
/// `Debug` output.
#[derive(Clone, Default)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The empty passphrase, used to probe for unprotected keys.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Passphrase {}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let passphrase = Passphrase::from("hunter2");
        let debug = format!("{:?}", passphrase);
        assert!(!debug.contains("hunter2"));
        assert_eq!(debug, "Passphrase(***)");
    }

    #[test]
    fn test_empty_passphrase() {
        assert!(Passphrase::empty().is_empty());
        assert_eq!(Passphrase::empty(), Passphrase::from(""));
        assert_ne!(Passphrase::empty(), Passphrase::from("x"));
    }
}
