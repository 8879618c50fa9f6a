//! Slug derivation for organization, article and taxonomy URLs.
//!
//! Slugs keep Japanese text readable instead of transliterating it: ASCII word
//! characters, Hiragana, Katakana and the common CJK ideograph block survive,
//! everything else is dropped. Uniqueness against persisted rows is delegated
//! to an async predicate so the derivation itself stays pure.

use std::future::Future;

use thiserror::Error;

/// Maximum slug length, counted in characters.
pub const MAX_SLUG_CHARS: usize = 50;

/// Upper bound on `-N` suffixes tried before giving up.
pub const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text produced an empty slug")]
    EmptyInput,
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors raised while resolving a slug through an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Whether `ch` may appear in a slug (hyphens aside).
pub fn is_slug_char(ch: char) -> bool {
    ch.is_ascii_lowercase()
        || ch.is_ascii_digit()
        || ch == '_'
        || ('\u{3040}'..='\u{309F}').contains(&ch)
        || ('\u{30A0}'..='\u{30FF}').contains(&ch)
        || ('\u{4E00}'..='\u{9FAF}').contains(&ch)
}

/// Derive a slug from display text.
///
/// Returns an empty string when nothing in `input` survives filtering; callers
/// that persist slugs must reject that case.
pub fn derive_slug(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
            continue;
        }
        if !is_slug_char(ch) {
            continue;
        }
        if pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        pending_hyphen = false;
        slug.push(ch);
    }

    let truncated: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Append `-N`, shortening `base` so the result stays within [`MAX_SLUG_CHARS`].
fn with_suffix(base: &str, attempt: u32) -> String {
    let suffix = format!("-{attempt}");
    let room = MAX_SLUG_CHARS.saturating_sub(suffix.len());
    let head: String = base.chars().take(room).collect();
    format!("{}{suffix}", head.trim_end_matches('-'))
}

/// Resolve a slug that the supplied predicate reports as free.
///
/// `is_free` returns `true` when no row uses the candidate. Collisions are
/// retried as `base-1`, `base-2`, … up to [`MAX_SUFFIX_ATTEMPTS`].
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_free: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input);
    if base.is_empty() {
        return Err(SlugError::EmptyInput.into());
    }

    if is_free(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = with_suffix(&base, attempt);
        if is_free(&candidate).await.map_err(SlugAsyncError::Predicate)? {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn assert_well_formed(slug: &str) {
        assert!(slug.chars().count() <= MAX_SLUG_CHARS, "too long: {slug}");
        assert!(!slug.starts_with('-'), "leading hyphen: {slug}");
        assert!(!slug.ends_with('-'), "trailing hyphen: {slug}");
        assert!(!slug.contains("--"), "double hyphen: {slug}");
        assert!(
            slug.chars().all(|ch| ch == '-' || is_slug_char(ch)),
            "forbidden character in {slug}"
        );
    }

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_snapshot!(derive_slug("Sakura Club"), @"sakura-club");
        assert_snapshot!(derive_slug("  Hello   World  "), @"hello-world");
        assert_snapshot!(derive_slug("NPO -- Green / Town!"), @"npo-green-town");
    }

    #[test]
    fn derive_slug_keeps_japanese_text() {
        assert_snapshot!(derive_slug("地域活性化助成金"), @"地域活性化助成金");
        assert_snapshot!(derive_slug("さくら　クラブ"), @"さくら-クラブ");
        assert_snapshot!(derive_slug("子ども食堂「ひまわり」"), @"子ども食堂ひまわり");
    }

    #[test]
    fn derive_slug_returns_empty_for_filtered_input() {
        assert_eq!(derive_slug("!!! ★★★ ???"), "");
        assert_eq!(derive_slug("   "), "");
    }

    #[test]
    fn derive_slug_truncates_by_characters() {
        let long = "あ".repeat(80);
        let slug = derive_slug(&long);
        assert_eq!(slug.chars().count(), MAX_SLUG_CHARS);

        let edge = format!("{} {}", "a".repeat(49), "bcd");
        assert_eq!(derive_slug(&edge), "a".repeat(49));
    }

    #[test]
    fn derived_slugs_are_well_formed() {
        let inputs = [
            "Sakura Club",
            "-leading and trailing-",
            "Ünïcödé Straße",
            "多文化共生ネットワーク 2024",
            "snake_case_name",
            "tabs\tand\nnewlines",
            "———",
            "ＮＰＯ法人　みどりの会",
            &"word ".repeat(30),
        ];
        for input in inputs {
            assert_well_formed(&derive_slug(input));
        }
    }

    #[tokio::test]
    async fn unique_slug_appends_numeric_suffix() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["sakura-club".to_string()]));

        let slug = generate_unique_slug_async("Sakura Club", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let guard = existing.lock().await;
                Ok::<bool, std::convert::Infallible>(!guard.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "sakura-club-1");
    }

    #[tokio::test]
    async fn suffixed_slug_stays_within_the_cap() {
        let name = "a".repeat(60);
        let taken = derive_slug(&name);

        let slug = generate_unique_slug_async(&name, |candidate| {
            let free = candidate != taken;
            async move { Ok::<bool, std::convert::Infallible>(free) }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, format!("{}-1", "a".repeat(MAX_SLUG_CHARS - 2)));
        assert_well_formed(&slug);
    }

    #[test]
    fn suffix_does_not_leave_double_hyphens() {
        let base = format!("{}-bc", "a".repeat(46));
        let slug = with_suffix(&base, 12);
        assert_eq!(slug, format!("{}-12", "a".repeat(46)));
        assert_well_formed(&slug);
    }

    #[tokio::test]
    async fn unique_slug_rejects_empty_base() {
        let result = generate_unique_slug_async("★★★", |_| async {
            Ok::<bool, std::convert::Infallible>(true)
        })
        .await;
        assert!(matches!(result, Err(SlugAsyncError::Slug(SlugError::EmptyInput))));
    }

    #[tokio::test]
    async fn unique_slug_gives_up_after_bound() {
        let result = generate_unique_slug_async("busy", |_| async {
            Ok::<bool, std::convert::Infallible>(false)
        })
        .await;
        match result {
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => assert_eq!(base, "busy"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
