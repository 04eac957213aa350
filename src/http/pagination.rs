//! Offset pagination for the published relations.

use serde::{Deserialize, Serialize};

use crate::store::Listing;

pub const DEFAULT_LIMIT: usize = 500;

/// `?limit=&offset=` query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageQuery {
    /// Effective `(limit, offset)`. A zero or absent limit means the default.
    pub fn resolve(&self) -> (usize, usize) {
        let limit = match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_LIMIT,
        };
        (limit, self.offset.unwrap_or(0))
    }
}

/// One page of results as sent to agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Paginated<T> {
    pub total: u64,
    pub offset: usize,
    pub limit: usize,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(listing: Listing<T>, limit: usize, offset: usize) -> Self {
        Self {
            total: listing.total,
            offset,
            limit,
            items: listing.items,
        }
    }

    pub fn has_more(&self) -> bool {
        ((self.offset + self.items.len()) as u64) < self.total
    }
}
