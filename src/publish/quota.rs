//! Page size quota.

use std::collections::HashSet;

use crate::config::PageConfig;
use crate::error::{Error, Result};
use crate::model::{ChangeType, Draft, Entity, Page, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub size_limit: u64,
    pub total_size_limit: u64,
}

impl From<&PageConfig> for PageLimits {
    fn from(config: &PageConfig) -> Self {
        Self {
            size_limit: config.size_limit,
            total_size_limit: config.total_size_limit,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::from(&PageConfig::default())
    }
}

impl PageLimits {
    pub fn check_page(&self, page: &Page) -> Result<()> {
        let size = page.content_size();
        if size > self.size_limit {
            return Err(Error::QuotaExceeded(format!(
                "page {} is {size} bytes, limit is {}",
                page.path, self.size_limit
            )));
        }
        Ok(())
    }

    pub fn check_total(&self, projected: u64) -> Result<()> {
        if projected > self.total_size_limit {
            return Err(Error::QuotaExceeded(format!(
                "pages would total {projected} bytes, limit is {}",
                self.total_size_limit
            )));
        }
        Ok(())
    }
}

/// Total page size after publishing `drafts` on top of `published`.
///
/// Published pages referenced by any draft are replaced (UPDATE) or removed
/// (DELETE), so only unshadowed ones count, plus every CREATE and UPDATE
/// payload.
pub fn projected_total_size(published: &[Record<Page>], drafts: &[Draft<Page>]) -> u64 {
    let shadowed: HashSet<u64> = drafts.iter().filter_map(Draft::replaces).collect();
    let kept: u64 = published
        .iter()
        .filter(|record| !shadowed.contains(&record.id))
        .map(|record| record.value.content_size())
        .sum();
    let staged: u64 = drafts
        .iter()
        .filter(|d| matches!(d.change_type, ChangeType::Create | ChangeType::Update))
        .filter_map(|d| d.new_value.as_ref())
        .map(|page| Entity::content_size(page))
        .sum();
    kept + staged
}
