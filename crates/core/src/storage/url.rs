//! Public URL construction.

use std::fmt;
use std::sync::Arc;

use super::attachment::Attachment;

/// Callback choosing a URL host for a given attachment.
pub type HostFn = dyn Fn(&dyn Attachment) -> String + Send + Sync;

/// Host prefix for public URLs.
#[derive(Clone)]
pub enum PublicHost {
    /// Same host for every attachment.
    Static(String),
    /// Host computed per call, e.g. for CDN sharding by record.
    Dynamic(Arc<HostFn>),
}

impl PublicHost {
    /// Create a static host.
    #[must_use]
    pub fn fixed(host: impl Into<String>) -> Self {
        Self::Static(host.into())
    }

    /// Create a host computed from the attachment.
    #[must_use]
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn Attachment) -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Resolve the host for `attachment`. Dynamic hosts are invoked once.
    #[must_use]
    pub fn resolve(&self, attachment: &dyn Attachment) -> String {
        match self {
            Self::Static(host) => host.clone(),
            Self::Dynamic(f) => f(attachment),
        }
    }
}

impl fmt::Debug for PublicHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(host) => f.debug_tuple("Static").field(host).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// Public URL of `style`: `{host}/{path}`, or `/{path}` without a host.
pub fn public_url<A: Attachment>(host: Option<&PublicHost>, attachment: &A, style: &str) -> String {
    let path = attachment.path(style);
    match host {
        Some(host) => format!("{}/{path}", host.resolve(attachment)),
        None => format!("/{path}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;

    use super::*;
    use crate::storage::attachment::TemplatePaths;

    #[test]
    fn test_public_url_without_host() {
        let paths = TemplatePaths::new("photos/42/:style.jpg");
        assert_eq!(public_url(None, &paths, "thumb"), "/photos/42/thumb.jpg");
    }

    #[test]
    fn test_public_url_static_host() {
        let paths = TemplatePaths::new("photos/42/:style.jpg");
        let host = PublicHost::fixed("https://cdn.example.com");
        assert_eq!(
            public_url(Some(&host), &paths, "original"),
            "https://cdn.example.com/photos/42/original.jpg"
        );
    }

    #[test]
    fn test_public_url_dynamic_host_called_once_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let host = PublicHost::dynamic(move |attachment| {
            counter.fetch_add(1, Ordering::SeqCst);
            let shard = attachment.path("original").len() % 4;
            format!("https://cdn{shard}.example.com")
        });
        let paths = TemplatePaths::new("photos/42/:style.jpg");

        let url = public_url(Some(&host), &paths, "thumb");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // "photos/42/original.jpg" is 22 bytes long
        assert_eq!(url, "https://cdn2.example.com/photos/42/thumb.jpg");

        public_url(Some(&host), &paths, "thumb");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_public_host_debug_hides_callback() {
        let host = PublicHost::dynamic(|_| String::new());
        assert_eq!(format!("{host:?}"), "Dynamic(<fn>)");
    }

    proptest! {
        #[test]
        fn prop_no_host_prefixes_slash(path in "[a-z0-9_]{1,10}(/[a-z0-9_.]{1,10}){0,4}") {
            let paths = TemplatePaths::new(path.clone());
            prop_assert_eq!(public_url(None, &paths, "original"), format!("/{path}"));
        }

        #[test]
        fn prop_static_host_joins_with_slash(
            host in "https://[a-z]{1,10}\\.example\\.com",
            path in "[a-z0-9_]{1,10}(/[a-z0-9_.]{1,10}){0,4}",
        ) {
            let paths = TemplatePaths::new(path.clone());
            let public_host = PublicHost::fixed(host.clone());
            prop_assert_eq!(
                public_url(Some(&public_host), &paths, "original"),
                format!("{host}/{path}")
            );
        }

        #[test]
        fn prop_dynamic_host_used_verbatim(host in "[a-zA-Z0-9:/._-]{0,20}") {
            let returned = host.clone();
            let public_host = PublicHost::dynamic(move |_| returned.clone());
            let paths = TemplatePaths::new("photos/:style.jpg");
            prop_assert_eq!(
                public_url(Some(&public_host), &paths, "thumb"),
                format!("{host}/photos/thumb.jpg")
            );
        }
    }
}
