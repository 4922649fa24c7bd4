//! Page controllers. Each page issues its backend calls, keeps every result
//! in its own [`Region`], and renders regions independently so one failed
//! call never blanks the rest of the page.

pub mod admin;
pub mod catalogue;
pub mod details;
pub mod home;

use crate::error::user_message;
use anyhow::Result;
use tracing::warn;

/// Outcome of loading one page region.
#[derive(Debug, Clone, PartialEq)]
pub enum Region<T> {
    Ready(T),
    Empty,
    Failed(String),
}

impl<T> Region<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Region::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Region::Ready(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Region<Vec<T>> {
    /// Settles a list call: empty lists are `Empty`, errors are logged
    /// under `what` and kept as `Failed`.
    pub fn from_list(what: &str, result: Result<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Region::Empty,
            Ok(items) => Region::Ready(items),
            Err(e) => {
                warn!("Failed to load {}: {:#}", what, e);
                Region::Failed(user_message(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_regions_distinguish_empty_from_failed() {
        let empty: Region<Vec<u8>> = Region::from_list("things", Ok(vec![]));
        assert_eq!(empty, Region::Empty);
        let ready = Region::from_list("things", Ok(vec![1u8]));
        assert_eq!(ready.ready(), Some(&vec![1u8]));
        let failed: Region<Vec<u8>> = Region::from_list("things", Err(anyhow::anyhow!("boom")));
        assert!(failed.is_failed());
    }
}
