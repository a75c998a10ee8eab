//! SVG identifier rewriting.
//!
//! The renderer assigns short ids to gradients, filters and clip paths that
//! are only unique inside one document. When several exported documents end
//! up in the same page or sprite, those ids collide. [`rewrite_ids`] suffixes
//! every such id with a value drawn from a shared [`RewriteCounter`].

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared, monotonically increasing sequence for id suffixes.
///
/// Clones draw from the same sequence.
#[derive(Debug, Clone, Default)]
pub struct RewriteCounter(Arc<AtomicU64>);

impl RewriteCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next value.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The value the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r##"url\(#([^)\s"']+)\)|href="#([^"]+)""##).expect("valid regex")
    })
}

fn declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<(?:filter|linearGradient|radialGradient|clipPath|mask|pattern|symbol|marker|image)\b[^>]*?\sid="([^"]+)""#,
        )
        .expect("valid regex")
    })
}

fn occurrence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r##"(url\(#)([^)\s"']+)(\))|(\sid=")([^"]+)(")|(href="#)([^"]+)(")"##)
            .expect("valid regex")
    })
}

/// Distinct ids referenced or declared in `svg`, in first-seen order.
pub fn collect_ids(svg: &str) -> Vec<&str> {
    let mut positioned: Vec<(usize, &str)> = reference_regex()
        .captures_iter(svg)
        .chain(declaration_regex().captures_iter(svg))
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    positioned.sort_by_key(|(start, _)| *start);

    let mut ids: Vec<&str> = Vec::new();
    for (_, id) in positioned {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Make every internal id of `svg` unique for this run.
///
/// Each distinct id becomes `{id}_{n}` where `n` is taken from `counter`.
/// The declaration and every `url(#id)` / `href="#id"` reference are
/// rewritten together. Documents without such ids are returned unchanged.
pub fn rewrite_ids<'s>(svg: &'s str, counter: &RewriteCounter) -> Cow<'s, str> {
    let ids = collect_ids(svg);
    if ids.is_empty() {
        return Cow::Borrowed(svg);
    }

    let renamed: HashMap<&str, String> = ids
        .into_iter()
        .map(|id| (id, format!("{}_{}", id, counter.next())))
        .collect();

    occurrence_regex().replace_all(svg, |caps: &Captures<'_>| {
        for group in [1, 4, 7] {
            if let (Some(open), Some(id), Some(close)) =
                (caps.get(group), caps.get(group + 1), caps.get(group + 2))
            {
                let id = renamed
                    .get(id.as_str())
                    .map(String::as_str)
                    .unwrap_or(id.as_str());
                return format!("{}{}{}", open.as_str(), id, close.as_str());
            }
        }
        caps[0].to_string()
    })
}

/// Byte-level wrapper around [`rewrite_ids`].
///
/// Payloads that are not valid UTF-8 are returned untouched.
pub fn rewrite_svg_bytes(bytes: Vec<u8>, counter: &RewriteCounter) -> Vec<u8> {
    match String::from_utf8(bytes) {
        Ok(text) => match rewrite_ids(&text, counter) {
            Cow::Borrowed(_) => text.into_bytes(),
            Cow::Owned(rewritten) => rewritten.into_bytes(),
        },
        Err(err) => {
            log::warn!("SVG payload is not valid UTF-8; ids left unchanged");
            err.into_bytes()
        }
    }
}
