//! SQLite identifier helpers: sanitizing header text, quoting, and resolving duplicates.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Name used when sanitizing leaves nothing behind.
pub const FALLBACK_IDENT: &str = "col";

/// Anything that is not a letter, a decimal digit or `_`.
static NON_IDENT_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{Nd}_]").expect("Invalid identifier regex"));

/// Make a best-effort identifier from arbitrary text.
///
/// Characters other than letters, decimal digits (Unicode `Nd`) and `_` become `_`, surrounding
/// underscores are trimmed, and a leading ASCII digit gets a `c_` prefix. The result is never empty.
pub fn sanitize(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return FALLBACK_IDENT.to_string();
    }

    let replaced = NON_IDENT_CHAR.replace_all(raw, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        return FALLBACK_IDENT.to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("c_{trimmed}");
    }
    trimmed.to_string()
}

/// Quote an identifier for SQLite, doubling embedded double quotes.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Resolve duplicate identifiers while preserving order.
///
/// The first occurrence of a name is kept. Later occurrences get `_N` appended, where `N` starts at
/// 2 and skips any candidate that is already taken, including names produced earlier in this call.
pub fn dedupe<S: AsRef<str>>(idents: &[S]) -> Vec<String> {
    // base name -> last suffix handed out (1 = only the bare name so far)
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(idents.len());
    let mut out = Vec::with_capacity(idents.len());

    for ident in idents {
        let base = ident.as_ref();
        let mut n = seen.get(base).copied().unwrap_or(0);
        if n == 0 {
            seen.insert(base.to_string(), 1);
            out.push(base.to_string());
            continue;
        }
        loop {
            n += 1;
            let candidate = format!("{base}_{n}");
            if seen.contains_key(&candidate) {
                continue;
            }
            seen.insert(base.to_string(), n);
            seen.insert(candidate.clone(), 1);
            out.push(candidate);
            break;
        }
    }
    out
}
