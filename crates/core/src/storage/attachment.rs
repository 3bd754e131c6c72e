//! The host-framework side of an attachment.

use std::collections::HashMap;

use super::paths::{STYLE_TOKEN, normalize_templates};
use super::writer::QueuedWrite;

/// An attachment as seen by the storage adapter.
///
/// Interpolation of path templates belongs to the host framework; the
/// adapter only asks for the finished, root-relative path of a style.
pub trait Attachment {
    /// Interpolated root-relative path for `style`.
    fn path(&self, style: &str) -> String;

    /// Original filename marker. `None` means no file was ever assigned.
    fn original_filename(&self) -> Option<&str>;

    /// Called once every queued write has been uploaded.
    ///
    /// Typical use is removing the local temporary files.
    fn after_flush_writes(&mut self, _written: &[QueuedWrite]) {}
}

/// Minimal [`Attachment`] that substitutes `:style` into one template.
///
/// Individual styles may be pinned to explicit paths with
/// [`TemplatePaths::with_style_path`].
#[derive(Debug, Clone, Default)]
pub struct TemplatePaths {
    template: String,
    overrides: HashMap<String, String>,
    original_filename: Option<String>,
}

impl TemplatePaths {
    /// Create paths from a template such as `photos/42/:style.jpg`.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            overrides: HashMap::new(),
            original_filename: None,
        }
    }

    /// Create paths from a path template that may reference the url template
    /// through `:url`.
    #[must_use]
    pub fn from_templates(path_template: &str, url_template: &str) -> Self {
        let (template, _) = normalize_templates(path_template, url_template);
        Self::new(template)
    }

    /// Set the original filename marker.
    #[must_use]
    pub fn with_original_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = Some(name.into());
        self
    }

    /// Pin `style` to an explicit path.
    #[must_use]
    pub fn with_style_path(mut self, style: impl Into<String>, path: impl Into<String>) -> Self {
        self.overrides.insert(style.into(), path.into());
        self
    }

    /// Clear or set the original filename marker in place.
    pub fn set_original_filename(&mut self, name: Option<String>) {
        self.original_filename = name;
    }
}

impl Attachment for TemplatePaths {
    fn path(&self, style: &str) -> String {
        match self.overrides.get(style) {
            Some(path) => path.clone(),
            None => self.template.replace(STYLE_TOKEN, style),
        }
    }

    fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }
}
