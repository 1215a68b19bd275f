//! Account discriminators.
//!
//! A discriminator is the leading bytes of
//! `sha256("<namespace>:<CanonicalName>")`, where the canonical name is the
//! type name rewritten into upper camel case (`my_account`, `myAccount` and
//! `MyAccount` all become `MyAccount`). Runs of capitals are preserved, so
//! `NFTAccount` stays `NFTAccount`.
//!
//! Everything here is a pure function: no state, no allocation beyond the
//! returned values, safe to call from any thread.
//!
//! Two distinct names are *assumed* to produce distinct truncated digests.
//! Collisions are not detected.

use sha2_const_stable::Sha256;

/// Namespace used when the caller does not provide one.
pub const DEFAULT_NAMESPACE: &str = "account";

/// Full-width (legacy) discriminator length.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Discriminator length inside a versioned header.
pub const VERSIONED_DISCRIMINATOR_LEN: usize = 4;

/// Full SHA-256 digest of `"<namespace>:<canonical_name>"`.
///
/// `canonical_name` is hashed as given. Usable in `const` context, so a
/// program that knows its type names up front can bake discriminators in:
///
/// ```rust,ignore
/// const VAULT_DISC: [u8; 8] = jiminy_coder::discriminator_const("account", "Vault");
/// ```
pub const fn digest(namespace: &str, canonical_name: &str) -> [u8; 32] {
    Sha256::new()
        .update(namespace.as_bytes())
        .update(b":")
        .update(canonical_name.as_bytes())
        .finalize()
}

/// 8-byte discriminator for an already-canonical name, computed at compile
/// time when called from a `const`.
pub const fn discriminator_const(namespace: &str, canonical_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = digest(namespace, canonical_name);
    let mut out = [0u8; DISCRIMINATOR_LEN];
    let mut i = 0;
    while i < DISCRIMINATOR_LEN {
        out[i] = hash[i];
        i += 1;
    }
    out
}

/// Discriminator of `len` bytes for `type_name` under `namespace`.
///
/// `len` is clamped to the digest width.
pub fn discriminator(namespace: &str, type_name: &str, len: usize) -> Vec<u8> {
    let hash = digest(namespace, &canonical_name(type_name));
    hash[..len.min(hash.len())].to_vec()
}

// ── Canonical case ───────────────────────────────────────────────────────────

#[inline]
fn is_separator(c: char) -> bool {
    matches!(c, '_' | '.' | '-' | ' ')
}

#[inline]
fn is_identifier(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c == '_'
}

/// Cased lowercase: has an uppercase form that differs from itself.
#[inline]
fn is_cased_lower(c: char) -> bool {
    c.is_lowercase() && !c.to_uppercase().eq(core::iter::once(c))
}

#[inline]
fn is_cased_upper(c: char) -> bool {
    c.is_uppercase() && !c.to_lowercase().eq(core::iter::once(c))
}

/// Insert `-` at word boundaries inside mixed-case input: between a lower
/// and an upper (`myAccount` → `my-Account`) and before the last capital of
/// a capital run that starts a lowercase word (`NFTAccount` → `NFT-Account`).
fn split_case_boundaries(input: &str) -> Vec<char> {
    let mut chars: Vec<char> = input.chars().collect();
    let mut last_lower = false;
    let mut last_upper = false;
    let mut last_last_upper = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if last_lower && c.is_uppercase() {
            chars.insert(i, '-');
            last_lower = false;
            last_last_upper = last_upper;
            last_upper = true;
            i += 1;
        } else if last_upper && last_last_upper && c.is_lowercase() {
            chars.insert(i - 1, '-');
            last_last_upper = last_upper;
            last_upper = false;
            last_lower = true;
        } else {
            last_lower = is_cased_lower(c);
            last_last_upper = last_upper;
            last_upper = is_cased_upper(c);
        }
        i += 1;
    }
    chars
}

fn push_upper(out: &mut Vec<char>, c: char) {
    out.extend(c.to_uppercase());
}

/// Drop separator runs, upper-casing the identifier character after each.
/// A separator run with nothing usable after it is kept, except that a
/// trailing run at the end of input disappears.
fn collapse_separators(chars: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if !is_separator(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_separator(chars[i]) {
            i += 1;
        }
        match chars.get(i) {
            None => {}
            Some(&next) if is_identifier(next) => {
                push_upper(&mut out, next);
                i += 1;
            }
            Some(_) if i - start > 1 && chars[i - 1] == '_' => {
                // The run's final `_` stands in as the identifier.
                out.push('_');
            }
            Some(_) => out.extend_from_slice(&chars[start..i]),
        }
    }
    out
}

/// Upper-case the identifier character that follows each run of digits
/// (`v2account` → `v2Account`).
fn capitalize_after_digits(chars: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
        if let Some(&next) = chars.get(i) {
            if is_identifier(next) {
                push_upper(&mut out, next);
                i += 1;
            }
        }
    }
    out
}

/// Canonical (upper camel case) form of a type name.
///
/// ```
/// use jiminy_coder::canonical_name;
///
/// assert_eq!(canonical_name("my_account"), "MyAccount");
/// assert_eq!(canonical_name("myAccount"), "MyAccount");
/// assert_eq!(canonical_name("NFTAccount"), "NFTAccount");
/// ```
pub fn canonical_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (None, _) => return String::new(),
        (Some(c), None) if is_separator(c) => return String::new(),
        (Some(c), None) => return c.to_uppercase().collect(),
        _ => {}
    }

    let has_upper = trimmed.to_lowercase() != trimmed;
    let split = if has_upper {
        split_case_boundaries(trimmed)
    } else {
        trimmed.chars().collect()
    };

    let leading = split.iter().take_while(|c| is_separator(**c)).count();
    let mut word: Vec<char> = Vec::with_capacity(split.len());
    if let Some((&first, rest)) = split[leading..].split_first() {
        push_upper(&mut word, first);
        word.extend_from_slice(rest);
    }

    capitalize_after_digits(&collapse_separators(&word))
        .into_iter()
        .collect()
}
