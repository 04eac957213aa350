//! `$1`..`$9` placeholder expansion for regex redirect targets.

use regex::Captures;

/// Render `target` with the groups of a regex match.
pub fn substitute(target: &str, captures: &Captures<'_>) -> String {
    let groups: Vec<Option<&str>> = captures.iter().map(|m| m.map(|m| m.as_str())).collect();
    substitute_groups(target, &groups)
}

/// Replace `$N` (N in 1..=9) with `groups[N]`, where `groups[0]` is the whole
/// match. A placeholder without a corresponding group stays literal; a group
/// that did not participate renders as the empty string.
pub fn substitute_groups(target: &str, groups: &[Option<&str>]) -> String {
    let mut out = String::with_capacity(target.len());
    let mut chars = target.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let index = chars
            .peek()
            .and_then(|d| d.to_digit(10))
            .filter(|n| (1..=9).contains(n))
            .map(|n| n as usize);
        match index {
            Some(n) if n < groups.len() => {
                chars.next();
                out.push_str(groups[n].unwrap_or(""));
            }
            _ => out.push('$'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_groups() {
        let groups = [Some("full"), Some("a"), Some("b"), Some("c")];
        assert_eq!(substitute_groups("/$3/$2/$1", &groups), "/c/b/a");
    }

    #[test]
    fn test_missing_group_stays_literal() {
        let groups = [Some("full"), Some("a")];
        assert_eq!(substitute_groups("/$1/$2", &groups), "/a/$2");
        assert_eq!(substitute_groups("/$0/$x/$", &groups), "/$0/$x/$");
    }

    #[test]
    fn test_repeated_placeholder() {
        let groups = [Some("full"), Some("x")];
        assert_eq!(substitute_groups("/$1-$1", &groups), "/x-x");
    }

    #[test]
    fn test_only_single_digit_placeholders() {
        let groups = [Some("full"), Some("one")];
        assert_eq!(substitute_groups("/$12", &groups), "/one2");
    }

    #[test]
    fn test_from_regex_captures() {
        let re = regex::Regex::new("/user/([0-9]+)(/edit)?").unwrap();
        let caps = re.captures("/user/42").unwrap();
        assert_eq!(substitute("/profile/$1$2", &caps), "/profile/42");
    }
}
