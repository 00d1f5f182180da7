use crate::error::{FetchError, Result};

/// Keeps the first error of a group of tasks; later errors are handed to a
/// reporter instead of being propagated.
#[derive(Debug, Default)]
pub struct FirstError {
    first: Option<FetchError>,
}

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: FetchError, report: impl FnOnce(&FetchError)) {
        if self.first.is_none() {
            self.first = Some(error);
        } else {
            report(&error);
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self.first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
