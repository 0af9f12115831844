pub mod career;
pub mod catalog;
pub mod composer;
pub mod detail;
pub mod gallery;
pub mod hero;
pub mod lazy;

pub use catalog::{SectionConfig, FALLBACK_LISTINGS, SECTIONS};
pub use composer::{
    ComposeError, ComposeEvent, ComposeSummary, Composer, FetchError, FragmentSource, ListOrigin,
    SectionSink, SectionSummary,
};
pub use detail::{ClosingDetail, DetailExclusion, DetailPhase, DETAIL_TRANSITION_MS};
pub use gallery::{GalleryKey, GalleryState};
pub use lazy::{DeferAction, DeferredImages, DeferredState, ImageTag, RewriteMode};
