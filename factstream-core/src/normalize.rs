//! Canonical text used to recognise a fact that was already shown.

const STRIPPED_PUNCTUATION: [char; 4] = ['.', ',', '!', '?'];
const LEADING_ARTICLES: [&str; 3] = ["the ", "a ", "an "];

/// Canonicalize fact text for duplicate comparison.
///
/// Lowercases, drops `.` `,` `!` `?`, collapses whitespace runs to one space
/// (trimming the ends) and removes a single leading article.
///
/// ```
/// use factstream_core::normalize::normalize;
///
/// assert_eq!(normalize("  The Earth   is round! "), "earth is round");
/// assert_eq!(normalize("The Earth is round"), normalize("earth is round."));
/// assert_ne!(normalize("The The Earth is round"), normalize("Earth is round"));
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(STRIPPED_PUNCTUATION, "");
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    match LEADING_ARTICLES
        .iter()
        .find_map(|article| collapsed.strip_prefix(article))
    {
        Some(rest) => rest.to_string(),
        None => collapsed,
    }
}

/// Signature of a `{headline, detail}` pair: `normalize(headline + " " + detail)`.
pub fn fact_signature(headline: &str, detail: Option<&str>) -> String {
    normalize(&format!("{} {}", headline, detail.unwrap_or_default()))
}
