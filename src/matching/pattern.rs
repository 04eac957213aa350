//! Rule source compilation.
//!
//! # Responsibilities
//! - Compile regex sources (no implicit anchoring)
//! - Extract the literal head of a regex for bucket indexing
//!
//! # Design Decisions
//! - The prefix is derived from the syntax tree, not the HIR: the HIR folds
//!   single-member classes and repetitions into literals, which would make
//!   `[a]` or `a{1}` behave differently from what the author wrote
//! - A leading `^` is stripped before prefix extraction only; the compiled
//!   regex keeps it

use regex::Regex;
use regex_syntax::ast::{self, Ast, GroupKind, RepetitionKind, RepetitionRange};
use thiserror::Error;

use crate::model::RedirectType;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid source {pattern:?}: {reason}")]
    InvalidSource { pattern: String, reason: String },

    #[error("unsupported rule type for {pattern:?}")]
    UnsupportedType { pattern: String },
}

/// A rule source ready for dispatch.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub literal_prefix: String,
    pub regex: Option<Regex>,
}

/// Compile a redirect source according to its type.
pub fn compile(kind: RedirectType, source: &str) -> Result<CompiledPattern, PatternError> {
    match kind {
        RedirectType::Basic | RedirectType::BasicHost => Ok(CompiledPattern {
            literal_prefix: source.to_string(),
            regex: None,
        }),
        RedirectType::Regex | RedirectType::RegexHost => Ok(CompiledPattern {
            literal_prefix: extract_literal_prefix(source)?,
            regex: Some(compile_regex(source)?),
        }),
        RedirectType::Unknown => Err(PatternError::UnsupportedType {
            pattern: source.to_string(),
        }),
    }
}

pub fn compile_regex(source: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|e| PatternError::InvalidSource {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

/// The longest fixed string every match of `source` must start with.
///
/// `"/api/v1/users/[0-9]+/posts"` yields `"/api/v1/users/"`,
/// `"[a-z]+/path"` yields `""`.
pub fn extract_literal_prefix(source: &str) -> Result<String, PatternError> {
    let stripped = source.strip_prefix('^').unwrap_or(source);
    let ast = ast::parse::Parser::new()
        .parse(stripped)
        .map_err(|e| PatternError::InvalidSource {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
    let mut prefix = String::new();
    collect_prefix(&ast, &mut prefix);
    Ok(prefix)
}

/// Append the literal head of `ast` to `out`. Returns true when the whole
/// node was literal, so the caller may keep descending into its siblings.
fn collect_prefix(ast: &Ast, out: &mut String) -> bool {
    match ast {
        Ast::Empty(_) => true,
        Ast::Literal(literal) => {
            out.push(literal.c);
            true
        }
        Ast::Concat(concat) => {
            for child in &concat.asts {
                if !collect_prefix(child, out) {
                    return false;
                }
            }
            true
        }
        Ast::Group(group) => {
            let plain = match &group.kind {
                GroupKind::CaptureIndex(_) | GroupKind::CaptureName { .. } => true,
                GroupKind::NonCapturing(flags) => flags.items.is_empty(),
            };
            if !plain {
                return false;
            }
            // Only a fully literal body contributes.
            let mut body = String::new();
            if collect_prefix(&group.ast, &mut body) {
                out.push_str(&body);
                true
            } else {
                false
            }
        }
        Ast::Repetition(repetition) => {
            let exactly_once = matches!(
                repetition.op.kind,
                RepetitionKind::Range(RepetitionRange::Exactly(1))
                    | RepetitionKind::Range(RepetitionRange::Bounded(1, 1))
            );
            exactly_once && collect_prefix(&repetition.ast, out)
        }
        Ast::Flags(_)
        | Ast::Dot(_)
        | Ast::Assertion(_)
        | Ast::ClassUnicode(_)
        | Ast::ClassPerl(_)
        | Ast::ClassBracketed(_)
        | Ast::Alternation(_) => false,
    }
}
