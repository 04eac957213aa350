//! Shape checks for staged redirects and pages.

use crate::error::{Error, Result};
use crate::matching::pattern::compile;
use crate::model::{Page, PageType, Redirect, RedirectStatus, RedirectType};
use crate::publish::quota::PageLimits;
use crate::store::StoredEntity;

/// A value that can be staged as a draft.
pub trait DraftValue: StoredEntity {
    /// Recompute derived fields before the value is stored.
    fn normalize(&mut self) {}

    fn validate(&self, limits: &PageLimits) -> Result<()>;
}

impl DraftValue for Redirect {
    fn validate(&self, _limits: &PageLimits) -> Result<()> {
        if self.kind == RedirectType::Unknown {
            return Err(Error::BadRequest("unknown redirect type".to_string()));
        }
        if self.status == RedirectStatus::Unknown {
            return Err(Error::BadRequest("unknown redirect status".to_string()));
        }
        if self.target.trim().is_empty() {
            return Err(Error::MissingField("target"));
        }
        match self.kind {
            RedirectType::Basic => check_path("source", &self.source)?,
            RedirectType::BasicHost => check_host_path("source", &self.source)?,
            _ => {
                if self.source.is_empty() {
                    return Err(Error::MissingField("source"));
                }
            }
        }
        compile(self.kind, &self.source)?;
        Ok(())
    }
}

impl DraftValue for Page {
    fn normalize(&mut self) {
        self.refresh_content_size();
    }

    fn validate(&self, limits: &PageLimits) -> Result<()> {
        match self.kind {
            PageType::Basic => check_path("path", &self.path)?,
            PageType::BasicHost => check_host_path("path", &self.path)?,
            PageType::Unknown => return Err(Error::BadRequest("unknown page type".to_string())),
        }
        limits.check_page(self)
    }
}

/// An absolute URI path.
fn check_path(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MissingField(field));
    }
    if !value.starts_with('/') {
        return Err(Error::BadRequest(format!("{field} {value:?} must start with /")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::BadRequest(format!("{field} {value:?} contains whitespace")));
    }
    Ok(())
}

/// `host[:port]/path` with a non-empty host and a path.
fn check_host_path(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MissingField(field));
    }
    let invalid = |why: &str| Error::BadRequest(format!("{field} {value:?} {why}"));
    let slash = value.find('/').ok_or_else(|| invalid("must be host[:port]/path"))?;
    let (authority, path) = value.split_at(slash);
    if authority.is_empty() {
        return Err(invalid("has an empty host"));
    }
    let host = match authority.rsplit_once(':') {
        Some((host, port)) => {
            if port.parse::<u16>().is_err() {
                return Err(invalid("has an invalid port"));
            }
            host
        }
        None => authority,
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if !host_ok {
        return Err(invalid("has an invalid host"));
    }
    check_path(field, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentType;

    fn redirect(kind: RedirectType, source: &str) -> Redirect {
        Redirect::new(kind, source, "/target", RedirectStatus::Found)
    }

    #[test]
    fn test_basic_source_must_be_absolute() {
        let limits = PageLimits::default();
        assert!(redirect(RedirectType::Basic, "/old").validate(&limits).is_ok());
        assert!(matches!(
            redirect(RedirectType::Basic, "old").validate(&limits),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            redirect(RedirectType::Basic, "").validate(&limits),
            Err(Error::MissingField("source"))
        ));
    }

    #[test]
    fn test_host_sources() {
        let limits = PageLimits::default();
        for ok in ["example.com/", "example.com:8080/a", "localhost/x"] {
            assert!(redirect(RedirectType::BasicHost, ok).validate(&limits).is_ok(), "{ok}");
        }
        for bad in ["example.com", "/path", "example.com:http/a", "exa mple.com/a"] {
            assert!(redirect(RedirectType::BasicHost, bad).validate(&limits).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_regex_must_compile() {
        let limits = PageLimits::default();
        assert!(redirect(RedirectType::Regex, "/a/(.*)").validate(&limits).is_ok());
        assert!(matches!(
            redirect(RedirectType::Regex, "/a/(").validate(&limits),
            Err(Error::InvalidSource(_))
        ));
    }

    #[test]
    fn test_unknown_variants_rejected() {
        let limits = PageLimits::default();
        let mut r = redirect(RedirectType::Unknown, "/a");
        assert!(matches!(r.validate(&limits), Err(Error::BadRequest(_))));
        r.kind = RedirectType::Basic;
        r.status = RedirectStatus::Unknown;
        assert!(matches!(r.validate(&limits), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_page_size_limit() {
        let limits = PageLimits {
            size_limit: 4,
            total_size_limit: 8,
        };
        let mut page = Page::new(PageType::Basic, "/robots.txt", "12345", ContentType::TextPlain);
        page.content_size = 0;
        page.normalize();
        assert_eq!(page.content_size, 5);
        assert!(matches!(page.validate(&limits), Err(Error::QuotaExceeded(_))));
    }
}
