use futures_util::future::join_all;
use thiserror::Error;

use crate::catalog::{fallback_paths, fragment_path, manifest_path, FallbackListing, SectionConfig};

pub const PREVIEW_MARKER: &str = ".project-preview";
pub const DETAIL_MARKER: &str = ".project-detail-content";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request for {path} failed: {message}")]
    Network { path: String, message: String },
    #[error("request for {path} returned status {status}")]
    Status { path: String, status: u16 },
    #[error("failed to read body of {path}: {message}")]
    Body { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("manifest {path} is not a list of file names: {message}")]
    Manifest { path: String, message: String },
    #[error("no {marker} found in {path}")]
    MissingMarker { path: String, marker: &'static str },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("dom operation failed: {0}")]
    Dom(String),
}

/// Retrieves fragment text and manifests.
#[allow(async_fn_in_trait)]
pub trait FragmentSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

/// Receives composed sections and project previews.
pub trait SectionSink {
    type Section;

    /// Creates the section container and attaches it to the page right away.
    fn open_section(&self, section: &SectionConfig) -> Result<Self::Section, ComposeError>;

    /// Rewrites, extracts and appends one fragment's preview to its section.
    fn mount_preview(&self, section: &Self::Section, path: &str, html: &str)
        -> Result<(), ComposeError>;

    fn report(&self, event: ComposeEvent<'_>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOrigin {
    Manifest,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSummary {
    pub id: &'static str,
    pub origin: ListOrigin,
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposeSummary {
    pub sections: Vec<SectionSummary>,
}

impl ComposeSummary {
    pub fn section(&self, id: &str) -> Option<&SectionSummary> {
        self.sections.iter().find(|summary| summary.id == id)
    }

    pub fn loaded_count(&self) -> usize {
        self.sections.iter().map(|summary| summary.loaded.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.sections.iter().map(|summary| summary.failed.len()).sum()
    }
}

#[derive(Debug)]
pub enum ComposeEvent<'a> {
    ManifestFallback {
        section: &'a SectionConfig,
        error: &'a ComposeError,
        files: usize,
    },
    FragmentFailed {
        section: &'a SectionConfig,
        path: &'a str,
        error: &'a ComposeError,
    },
    SectionFailed {
        section: &'a SectionConfig,
        error: &'a ComposeError,
    },
    SectionLoaded {
        section: &'a SectionConfig,
        summary: &'a SectionSummary,
    },
}

pub fn parse_manifest(path: &str, text: &str) -> Result<Vec<String>, ComposeError> {
    let files: Vec<String> =
        serde_json::from_str(text).map_err(|err| ComposeError::Manifest {
            path: path.to_string(),
            message: err.to_string(),
        })?;
    Ok(files
        .into_iter()
        .map(|file| file.trim().to_string())
        .filter(|file| !file.is_empty())
        .collect())
}

pub struct Composer<'a, F, S> {
    source: &'a F,
    sink: &'a S,
    fallbacks: &'a [FallbackListing],
}

impl<'a, F, S> Composer<'a, F, S>
where
    F: FragmentSource,
    S: SectionSink,
{
    pub fn new(source: &'a F, sink: &'a S, fallbacks: &'a [FallbackListing]) -> Self {
        Self {
            source,
            sink,
            fallbacks,
        }
    }

    /// Opens every section in order, then loads all of them concurrently.
    /// Resolves once each section's fragment loop has finished.
    pub async fn compose(&self, sections: &[SectionConfig]) -> ComposeSummary {
        let mut opened = Vec::with_capacity(sections.len());
        for section in sections {
            match self.sink.open_section(section) {
                Ok(handle) => opened.push((section, handle)),
                Err(error) => self.sink.report(ComposeEvent::SectionFailed {
                    section,
                    error: &error,
                }),
            }
        }
        let loads = opened
            .iter()
            .map(|(section, handle)| self.load_section(section, handle));
        ComposeSummary {
            sections: join_all(loads).await,
        }
    }

    pub async fn fragment_list(&self, section: &SectionConfig) -> (Vec<String>, ListOrigin) {
        let path = manifest_path(section.directory);
        let listed = match self.source.fetch_text(&path).await {
            Ok(text) => parse_manifest(&path, &text),
            Err(err) => Err(err.into()),
        };
        match listed {
            Ok(files) => {
                let paths = files
                    .iter()
                    .map(|file| fragment_path(section.directory, file))
                    .collect();
                (paths, ListOrigin::Manifest)
            }
            Err(error) => {
                let paths = fallback_paths(self.fallbacks, section.directory);
                self.sink.report(ComposeEvent::ManifestFallback {
                    section,
                    error: &error,
                    files: paths.len(),
                });
                (paths, ListOrigin::Fallback)
            }
        }
    }

    async fn load_section(&self, section: &SectionConfig, handle: &S::Section) -> SectionSummary {
        let (paths, origin) = self.fragment_list(section).await;
        let mut summary = SectionSummary {
            id: section.id,
            origin,
            loaded: Vec::with_capacity(paths.len()),
            failed: Vec::new(),
        };
        // One fragment at a time so items land in manifest order.
        for path in paths {
            match self.load_fragment(handle, &path).await {
                Ok(()) => summary.loaded.push(path),
                Err(error) => {
                    self.sink.report(ComposeEvent::FragmentFailed {
                        section,
                        path: &path,
                        error: &error,
                    });
                    summary.failed.push(path);
                }
            }
        }
        self.sink.report(ComposeEvent::SectionLoaded {
            section,
            summary: &summary,
        });
        summary
    }

    async fn load_fragment(&self, handle: &S::Section, path: &str) -> Result<(), ComposeError> {
        let html = self.source.fetch_text(path).await?;
        self.sink.mount_preview(handle, path, &html)
    }
}
