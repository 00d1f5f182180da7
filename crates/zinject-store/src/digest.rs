use std::fmt;
use std::str::FromStr;

use zinject_verify::Algorithm;

use crate::{Error, Result};

/// The content address of an implementation, written `algorithm=value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImplDigest {
    algorithm: Algorithm,
    value: String,
}

impl ImplDigest {
    pub fn new(algorithm: Algorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Name of the directory holding this implementation inside a store.
    pub fn dir_name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for ImplDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (alg, value) = s.split_once('=').unwrap_or((s, ""));
        let algorithm = Algorithm::from_name(alg)?;
        if value.is_empty()
            || !value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(Error::InvalidDigest(s.to_string()));
        }
        Ok(Self::new(algorithm, value))
    }
}

impl fmt::Display for ImplDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.value)
    }
}
