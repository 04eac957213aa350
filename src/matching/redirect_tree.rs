//! Redirect dispatch tree.
//!
//! # Data Flow
//! ```text
//! (host, uri)
//!     → basic_host[host+uri]             literal, host scoped
//!     → basic[uri]                       literal, global
//!     → regex_host by prefix of host+uri + regex_host_root
//!     → regex by prefix of uri           + regex_root
//! ```
//!
//! # Design Decisions
//! - Immutable once built; agents rebuild and swap instead of mutating
//! - Within a regex tier the longest source wins, ties go to the earlier
//!   insert. Length is a coarse proxy for specificity: `(.*)\.html` can
//!   outrank `/product/([0-9]+)`
//! - Duplicate literal keys overwrite; uniqueness is enforced by the store

use std::collections::HashMap;

use regex::Regex;

use super::pattern::{compile, PatternError};
use super::substitute::substitute;
use crate::model::{Redirect, RedirectType};

#[derive(Debug, Clone)]
struct RegexRule {
    seq: usize,
    regex: Regex,
    redirect: Redirect,
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectMatch<'a> {
    pub redirect: &'a Redirect,
    /// `target` with capture placeholders expanded.
    pub target: String,
}

impl RedirectMatch<'_> {
    pub fn status_code(&self) -> u16 {
        self.redirect.status.http_code()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RedirectTree {
    basic: HashMap<String, Redirect>,
    basic_host: HashMap<String, Redirect>,
    regex: HashMap<String, Vec<RegexRule>>,
    regex_host: HashMap<String, Vec<RegexRule>>,
    regex_root: Vec<RegexRule>,
    regex_host_root: Vec<RegexRule>,
    len: usize,
}

impl RedirectTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from rules, failing on the first invalid regex.
    pub fn build<I>(redirects: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Redirect>,
    {
        let mut tree = Self::new();
        for redirect in redirects {
            tree.insert(redirect)?;
        }
        Ok(tree)
    }

    pub fn insert(&mut self, redirect: Redirect) -> Result<(), PatternError> {
        let compiled = compile(redirect.kind, &redirect.source)?;
        let seq = self.len;
        match (redirect.kind, compiled.regex) {
            (RedirectType::Basic, _) => {
                self.basic.insert(redirect.source.clone(), redirect);
            }
            (RedirectType::BasicHost, _) => {
                self.basic_host.insert(redirect.source.clone(), redirect);
            }
            (kind, Some(regex)) => {
                let rule = RegexRule { seq, regex, redirect };
                let (buckets, root) = if kind == RedirectType::RegexHost {
                    (&mut self.regex_host, &mut self.regex_host_root)
                } else {
                    (&mut self.regex, &mut self.regex_root)
                };
                if compiled.literal_prefix.is_empty() {
                    root.push(rule);
                } else {
                    buckets.entry(compiled.literal_prefix).or_default().push(rule);
                }
            }
            (_, None) => {
                return Err(PatternError::UnsupportedType {
                    pattern: redirect.source,
                })
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Number of rules inserted, counting overwritten literal rules.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolve `(host, uri)` to at most one redirect.
    pub fn find(&self, host: &str, uri: &str) -> Option<RedirectMatch<'_>> {
        let host_uri = format!("{host}{uri}");

        if let Some(redirect) = self.basic_host.get(&host_uri) {
            return Some(literal_match(redirect));
        }
        if let Some(redirect) = self.basic.get(uri) {
            return Some(literal_match(redirect));
        }
        find_regex(&self.regex_host, &self.regex_host_root, &host_uri)
            .or_else(|| find_regex(&self.regex, &self.regex_root, uri))
    }
}

fn literal_match(redirect: &Redirect) -> RedirectMatch<'_> {
    RedirectMatch {
        redirect,
        target: redirect.target.clone(),
    }
}

fn find_regex<'a>(
    buckets: &'a HashMap<String, Vec<RegexRule>>,
    root: &'a [RegexRule],
    input: &str,
) -> Option<RedirectMatch<'a>> {
    let prefixed = input
        .char_indices()
        .map(|(i, c)| &input[..i + c.len_utf8()])
        .filter_map(|prefix| buckets.get(prefix))
        .flatten();

    let mut best: Option<(&RegexRule, regex::Captures<'_>)> = None;
    for rule in prefixed.chain(root.iter()) {
        if let Some((current, _)) = &best {
            if !outranks(rule, current) {
                continue;
            }
        }
        if let Some(captures) = rule.regex.captures(input) {
            best = Some((rule, captures));
        }
    }

    best.map(|(rule, captures)| RedirectMatch {
        redirect: &rule.redirect,
        target: substitute(&rule.redirect.target, &captures),
    })
}

/// Longer source wins; on equal length the earlier insert wins.
fn outranks(candidate: &RegexRule, current: &RegexRule) -> bool {
    let (a, b) = (candidate.redirect.source.len(), current.redirect.source.len());
    a > b || (a == b && candidate.seq < current.seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RedirectStatus;

    fn rule(kind: RedirectType, source: &str, target: &str) -> Redirect {
        Redirect::new(kind, source, target, RedirectStatus::Found)
    }

    #[test]
    fn test_longest_regex_wins() {
        let tree = RedirectTree::build([
            rule(RedirectType::Regex, "/product/(.*)", "/short"),
            rule(RedirectType::Regex, "/product/category/(.*)", "/long"),
        ])
        .unwrap();
        let found = tree.find("shop.example", "/product/category/shoes").unwrap();
        assert_eq!(found.target, "/long");
    }

    #[test]
    fn test_regex_host_beats_regex() {
        let tree = RedirectTree::build([
            rule(RedirectType::Regex, "/user/([0-9]+)", "/regex/$1"),
            rule(RedirectType::RegexHost, "example.com/user/([0-9]+)", "/host/$1"),
        ])
        .unwrap();
        assert_eq!(tree.find("example.com", "/user/123").unwrap().target, "/host/123");
        assert_eq!(tree.find("other.com", "/user/123").unwrap().target, "/regex/123");
    }

    #[test]
    fn test_precedence_across_tiers() {
        let tree = RedirectTree::build([
            rule(RedirectType::Regex, "/a(.*)", "regex"),
            rule(RedirectType::RegexHost, "h.com/a(.*)", "regex-host"),
            rule(RedirectType::Basic, "/a", "basic"),
            rule(RedirectType::BasicHost, "h.com/a", "basic-host"),
        ])
        .unwrap();
        assert_eq!(tree.find("h.com", "/a").unwrap().target, "basic-host");
        assert_eq!(tree.find("x.com", "/a").unwrap().target, "basic");
        assert_eq!(tree.find("h.com", "/ab").unwrap().target, "regex-host");
        assert_eq!(tree.find("x.com", "/ab").unwrap().target, "regex");
        assert!(tree.find("x.com", "/b").is_none());
    }

    #[test]
    fn test_root_bucket_rules_are_probed() {
        let tree = RedirectTree::build([
            rule(RedirectType::Regex, "(.*)\\.html", "$1"),
            rule(RedirectType::Regex, "/blog/(.*)", "/posts/$1"),
        ])
        .unwrap();
        assert_eq!(tree.find("h", "/about.html").unwrap().target, "/about");
        // Equal length sources: the earlier insert wins.
        assert_eq!(tree.find("h", "/blog/x.html").unwrap().target, "/blog/x");
    }

    #[test]
    fn test_longer_root_rule_outranks_prefixed_rule() {
        let tree = RedirectTree::build([
            rule(RedirectType::Regex, "/p/(.*)", "prefixed"),
            rule(RedirectType::Regex, ".*/p/([a-z]+)$", "root"),
        ])
        .unwrap();
        assert_eq!(tree.find("h", "/p/abc").unwrap().target, "root");
    }

    #[test]
    fn test_prefix_must_lead_the_input() {
        let tree =
            RedirectTree::build([rule(RedirectType::Regex, "/old/(.*)", "/new/$1")]).unwrap();
        assert!(tree.find("h", "/x/old/a").is_none());
        assert_eq!(tree.find("h", "/old/a").unwrap().target, "/new/a");
    }

    #[test]
    fn test_duplicate_literal_overwrites() {
        let tree = RedirectTree::build([
            rule(RedirectType::Basic, "/dup", "/first"),
            rule(RedirectType::Basic, "/dup", "/second"),
        ])
        .unwrap();
        assert_eq!(tree.find("h", "/dup").unwrap().target, "/second");
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut tree = RedirectTree::new();
        assert!(tree.insert(rule(RedirectType::Regex, "/(", "/x")).is_err());
        assert!(tree.insert(rule(RedirectType::Unknown, "/x", "/y")).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_status_code_reported() {
        let tree = RedirectTree::build([Redirect::new(
            RedirectType::Basic,
            "/old",
            "/new",
            RedirectStatus::MovedPermanent,
        )])
        .unwrap();
        assert_eq!(tree.find("h", "/old").unwrap().status_code(), 301);
    }
}
