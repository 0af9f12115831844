#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionConfig {
    pub id: &'static str,
    pub title: &'static str,
    pub directory: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct FallbackListing {
    pub directory: &'static str,
    pub files: &'static [&'static str],
}

pub const MANIFEST_FILE: &str = "index.json";

include!(concat!(env!("OUT_DIR"), "/section_catalog.rs"));

pub fn section_by_id(id: &str) -> Option<&'static SectionConfig> {
    let trimmed = id.trim();
    SECTIONS.iter().find(|section| section.id == trimmed)
}

pub fn manifest_path(directory: &str) -> String {
    format!("{}/{MANIFEST_FILE}", directory.trim_end_matches('/'))
}

pub fn fragment_path(directory: &str, file: &str) -> String {
    let directory = directory.trim_end_matches('/');
    let file = file.trim().trim_start_matches("./");
    if directory.is_empty() {
        file.to_string()
    } else {
        format!("{directory}/{file}")
    }
}

/// Static file list for a directory, used when its manifest is unavailable.
/// The list is maintained by hand and may lag behind the real directory.
pub fn fallback_paths(listings: &[FallbackListing], directory: &str) -> Vec<String> {
    let directory = directory.trim_end_matches('/');
    listings
        .iter()
        .find(|listing| listing.directory == directory)
        .map(|listing| {
            listing
                .files
                .iter()
                .map(|file| fragment_path(directory, file))
                .collect()
        })
        .unwrap_or_default()
}
