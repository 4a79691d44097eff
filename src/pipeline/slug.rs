//! URL slugs for demo pages.

use std::future::Future;

pub const MAX_SLUG_LEN: usize = 60;
const FALLBACK_SLUG: &str = "business";

/// Lowercase ASCII slug. Swedish letters are folded (`å`/`ä` to `a`, `ö` to
/// `o`), every other run of non-alphanumerics becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        let folded = match ch {
            'å' | 'ä' | 'à' | 'á' | 'â' => Some('a'),
            'ö' | 'ø' | 'ó' | 'ò' | 'ô' => Some('o'),
            'é' | 'è' | 'ê' | 'ë' => Some('e'),
            'ü' | 'ú' | 'ù' => Some('u'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        };

        match folded {
            Some(c) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            None => pending_dash = true,
        }
    }

    let slug = truncate_slug(&slug, MAX_SLUG_LEN);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn truncate_slug(slug: &str, max_len: usize) -> String {
    // slugs are ASCII, byte slicing is safe
    let cut = &slug[..slug.len().min(max_len)];
    cut.trim_end_matches('-').to_string()
}

/// First free slug among `base`, `base-2`, `base-3`, ... according to `exists`.
pub async fn unique_slug<F, Fut, E>(name: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let base = slugify(name);
    if !exists(base.clone()).await? {
        return Ok(base);
    }

    let mut suffix = 2u32;
    loop {
        let tail = format!("-{}", suffix);
        let candidate = format!(
            "{}{}",
            truncate_slug(&base, MAX_SLUG_LEN - tail.len()),
            tail
        );
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
