use std::collections::HashMap;

use super::pattern::PatternError;
use crate::model::{Page, PageType};

/// Literal page lookup: host scoped first, then global.
#[derive(Debug, Clone, Default)]
pub struct PageTree {
    basic: HashMap<String, Page>,
    basic_host: HashMap<String, Page>,
}

impl PageTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<I>(pages: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Page>,
    {
        let mut tree = Self::new();
        for page in pages {
            tree.insert(page)?;
        }
        Ok(tree)
    }

    pub fn insert(&mut self, page: Page) -> Result<(), PatternError> {
        let bucket = match page.kind {
            PageType::Basic => &mut self.basic,
            PageType::BasicHost => &mut self.basic_host,
            PageType::Unknown => {
                return Err(PatternError::UnsupportedType { pattern: page.path })
            }
        };
        bucket.insert(page.path.clone(), page);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.basic.len() + self.basic_host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, host: &str, uri: &str) -> Option<&Page> {
        self.basic_host
            .get(&format!("{host}{uri}"))
            .or_else(|| self.basic.get(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentType;

    #[test]
    fn test_basic_page_matches_any_host() {
        let tree = PageTree::build([Page::new(
            PageType::Basic,
            "/robots.txt",
            "User-agent: *",
            ContentType::TextPlain,
        )])
        .unwrap();
        let page = tree.find("any", "/robots.txt").unwrap();
        assert_eq!(page.content, b"User-agent: *");
        assert!(tree.find("any", "/sitemap.xml").is_none());
    }

    #[test]
    fn test_host_scoped_page_wins() {
        let tree = PageTree::build([
            Page::new(PageType::Basic, "/robots.txt", "global", ContentType::TextPlain),
            Page::new(PageType::BasicHost, "shop.com/robots.txt", "shop", ContentType::TextPlain),
        ])
        .unwrap();
        assert_eq!(tree.find("shop.com", "/robots.txt").unwrap().content, b"shop");
        assert_eq!(tree.find("blog.com", "/robots.txt").unwrap().content, b"global");
        assert_eq!(tree.len(), 2);
    }
}
