//! Remote path resolution helpers.
//!
//! Every remote operation targets `fs_root + interpolated_path`. Interpolated
//! paths are relative to the root; [`FsRoot::join`] is the only place the two
//! are combined.

use std::fmt;

use super::error::{StorageError, StorageResult};

/// Placeholder the url template is rewritten to when path templates are
/// normalized.
pub const PUBLIC_URL_PLACEHOLDER: &str = ":sftp_public_url";

/// Token in a path template that stands for the url template.
const URL_TOKEN: &str = ":url";

/// Token substituted with the style name.
pub const STYLE_TOKEN: &str = ":style";

/// Template tokens the adapter defines. Anything else after a `:` is part of
/// a file name.
const TEMPLATE_TOKENS: [&str; 3] = [STYLE_TOKEN, URL_TOKEN, PUBLIC_URL_PLACEHOLDER];

/// Normalized remote filesystem root.
///
/// Never empty and always ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsRoot(String);

impl FsRoot {
    /// Default root when none is configured.
    pub const DEFAULT: &'static str = "/";

    /// Normalize a configured root. Blank input falls back to `/`.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Self(Self::DEFAULT.to_string());
        }
        Self(format!("{trimmed}/"))
    }

    /// The root with its trailing `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix a root-relative path with the root.
    #[must_use]
    pub fn join(&self, relative: &str) -> String {
        format!("{}{}", self.0, relative.trim_start_matches('/'))
    }
}

impl Default for FsRoot {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for FsRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parent directory of a `/`-separated path, or `""` when it has none.
#[must_use]
pub fn parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((head, _)) => head,
        None => "",
    }
}

/// Final component of a `/`-separated path.
#[must_use]
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, tail)) => tail,
        None => trimmed,
    }
}

/// Whether `path` holds `token` as a whole word.
fn contains_token(path: &str, token: &str) -> bool {
    path.match_indices(token).any(|(at, _)| {
        path[at + token.len()..]
            .chars()
            .next()
            .is_none_or(|next| !(next.is_ascii_alphanumeric() || next == '_'))
    })
}

/// Reject paths that still carry one of the adapter's template tokens.
///
/// Other colons are left alone; `notes:final.txt` is a valid remote name.
pub fn ensure_resolved(path: &str) -> StorageResult<()> {
    let unresolved = TEMPLATE_TOKENS
        .iter()
        .any(|token| contains_token(path, token));

    if unresolved {
        return Err(StorageError::UnresolvedPlaceholder(path.to_string()));
    }
    Ok(())
}

/// Rewrite path/url templates so stored paths never contain `:url`.
///
/// When the url template is not already [`PUBLIC_URL_PLACEHOLDER`], each
/// `:url` in the path template is replaced by the url template and the url
/// template becomes [`PUBLIC_URL_PLACEHOLDER`].
#[must_use]
pub fn normalize_templates(path_template: &str, url_template: &str) -> (String, String) {
    if url_template == PUBLIC_URL_PLACEHOLDER {
        return (path_template.to_string(), url_template.to_string());
    }

    (
        path_template.replace(URL_TOKEN, url_template),
        PUBLIC_URL_PLACEHOLDER.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "/")]
    #[case("   ", "/")]
    #[case("/", "/")]
    #[case("/uploads", "/uploads/")]
    #[case("/uploads/", "/uploads/")]
    #[case("data", "data/")]
    #[case("/uploads//", "/uploads/")]
    #[case("//", "/")]
    fn test_fs_root_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(FsRoot::new(raw).as_str(), expected);
    }

    #[test]
    fn test_fs_root_join() {
        let root = FsRoot::new("/uploads");
        assert_eq!(root.join("photos/42/original.jpg"), "/uploads/photos/42/original.jpg");
        assert_eq!(root.join("/photos/42"), "/uploads/photos/42");
        assert_eq!(root.join(""), "/uploads/");
    }

    #[rstest]
    #[case("photos/42/original.jpg", "photos/42")]
    #[case("photos/42", "photos")]
    #[case("photos", "")]
    #[case("photos/42/", "photos")]
    #[case("/photos", "")]
    #[case("", "")]
    fn test_parent(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(parent(path), expected);
    }

    #[rstest]
    #[case("photos/42/original.jpg", "original.jpg")]
    #[case("original.jpg", "original.jpg")]
    #[case("/uploads/photos/", "photos")]
    fn test_base_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(base_name(path), expected);
    }

    #[test]
    fn test_ensure_resolved() {
        assert!(ensure_resolved("photos/42/original.jpg").is_ok());
        assert!(ensure_resolved("photos/42/10:30.jpg").is_ok());
        assert!(ensure_resolved("docs/42/original/notes:final.txt").is_ok());
        assert!(ensure_resolved("a:b.jpg").is_ok());
        assert!(ensure_resolved("docs/a:urls.txt").is_ok());
        assert!(ensure_resolved("docs/:stylesheet.css").is_ok());

        let err = ensure_resolved("photos/42/:style.jpg").unwrap_err();
        assert!(matches!(err, StorageError::UnresolvedPlaceholder(p) if p == "photos/42/:style.jpg"));
        assert!(ensure_resolved(":url").is_err());
        assert!(ensure_resolved("cdn/:sftp_public_url/x.jpg").is_err());
    }

    #[test]
    fn test_normalize_templates_expands_url_token() {
        let (path, url) = normalize_templates(":url", "system/:class/:id/:style/:filename");
        assert_eq!(path, "system/:class/:id/:style/:filename");
        assert_eq!(url, PUBLIC_URL_PLACEHOLDER);
    }

    #[test]
    fn test_normalize_templates_is_stable() {
        let (path, url) = normalize_templates("photos/:id/:style.jpg", PUBLIC_URL_PLACEHOLDER);
        assert_eq!(path, "photos/:id/:style.jpg");
        assert_eq!(url, PUBLIC_URL_PLACEHOLDER);

        let (again, url_again) = normalize_templates(&path, &url);
        assert_eq!(again, path);
        assert_eq!(url_again, url);
    }

    proptest! {
        #[test]
        fn prop_join_has_exactly_one_root(
            root in "/[a-z]{1,8}(/[a-z]{1,8}){0,2}/?",
            rel in "/?[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,3}",
        ) {
            let fs_root = FsRoot::new(&root);
            let joined = fs_root.join(&rel);
            prop_assert!(joined.starts_with(fs_root.as_str()));
            prop_assert!(!joined.contains("//"));
            prop_assert!(joined.ends_with(rel.trim_start_matches('/')));
        }

        #[test]
        fn prop_parent_plus_base_name_rebuilds_path(
            segments in prop::collection::vec("[a-z0-9]{1,8}", 1..5),
        ) {
            let path = segments.join("/");
            let dir = parent(&path);
            let name = base_name(&path);
            let rebuilt = if dir.is_empty() { name.to_string() } else { format!("{dir}/{name}") };
            prop_assert_eq!(rebuilt, path);
        }
    }
}
