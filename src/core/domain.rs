use crate::core::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility domain in which a balance is held.
///
/// Rate-determining pool state is only legible in the disclosed domain;
/// confidential balances can hold value but cannot read the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Disclosed,
    Confidential,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Disclosed => "disclosed",
            Domain::Confidential => "confidential",
        }
    }

    /// Parse the lowercase name used in serialized keys.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "disclosed" => Some(Domain::Disclosed),
            "confidential" => Some(Domain::Confidential),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A balance slot: one owner in one domain.
///
/// # Examples
///
/// ```
/// use vault_engine::core::domain::{Account, Domain};
///
/// let acc = Account::confidential("alice");
/// assert_eq!(acc.domain, Domain::Confidential);
/// assert_eq!(acc.to_string(), "alice:confidential");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Account {
    pub owner: Address,
    pub domain: Domain,
}

impl Account {
    pub fn new(owner: impl Into<Address>, domain: Domain) -> Self {
        Self {
            owner: owner.into(),
            domain,
        }
    }

    pub fn disclosed(owner: impl Into<Address>) -> Self {
        Self::new(owner, Domain::Disclosed)
    }

    pub fn confidential(owner: impl Into<Address>) -> Self {
        Self::new(owner, Domain::Confidential)
    }

    pub fn is_confidential(&self) -> bool {
        self.domain == Domain::Confidential
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_round_trip() {
        for d in [Domain::Disclosed, Domain::Confidential] {
            assert_eq!(Domain::parse(d.as_str()), Some(d));
        }
        assert_eq!(Domain::parse("public"), None);
    }

    #[test]
    fn test_account_constructors() {
        let a = Account::disclosed("alice");
        assert_eq!(a.owner, Address::new("alice"));
        assert!(!a.is_confidential());
        assert!(Account::confidential("alice").is_confidential());
        assert_ne!(a, Account::confidential("alice"));
    }

    #[test]
    fn test_domain_serde_lowercase() {
        let json = serde_json::to_string(&Domain::Confidential).unwrap();
        assert_eq!(json, "\"confidential\"");
    }
}
