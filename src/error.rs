use thiserror::Error;

use crate::store::StoreError;

/// Hard failure of an arena derivation: a fetch the result cannot be built
/// without.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ArenaError {
    pub fn fetch(what: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Fetch { what, source }
    }
}
