use serde::Deserialize;

pub const POPOVER_WIDTH: f64 = 140.0;
pub const POPOVER_PADDING: f64 = 16.0;
pub const POPOVER_MIN_HEIGHT: f64 = 100.0;
pub const POPOVER_CLOSE_DELAY_MS: u32 = 300;
pub const EMPTY_PROJECTS_LABEL: &str = "Under Construction";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CareerData {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
    #[serde(default)]
    pub article_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub person_url: Option<String>,
    #[serde(default)]
    pub article_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl Project {
    pub fn has_links(&self) -> bool {
        non_empty(&self.video_url).is_some() || non_empty(&self.article_url).is_some()
    }
}

impl Subcategory {
    /// Projects listed under this subcategory. Older data put a single
    /// article/video pair directly on the subcategory; that pair becomes one
    /// anonymous project.
    pub fn projects(&self) -> Vec<Project> {
        if let Some(projects) = &self.projects {
            return projects.clone();
        }
        if non_empty(&self.article_url).is_some() || non_empty(&self.video_url).is_some() {
            return vec![Project {
                person_name: None,
                person_url: None,
                article_url: self.article_url.clone(),
                video_url: self.video_url.clone(),
            }];
        }
        Vec::new()
    }
}

pub fn parse_career_data(text: &str) -> Result<CareerData, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn stagger_delay_secs(category_index: usize, subcategory_index: usize) -> f64 {
    category_index as f64 * 0.03 + subcategory_index as f64 * 0.08
}

/// Extracts the `BV…` id from a Bilibili video URL.
pub fn bilibili_id(url: &str) -> Option<&str> {
    const MARKER: &str = "bilibili.com/video/";
    let start = url.find(MARKER)? + MARKER.len();
    let rest = &url[start..];
    if !rest.starts_with("BV") {
        return None;
    }
    let end = rest
        .char_indices()
        .skip(2)
        .find(|(_, ch)| !ch.is_ascii_alphanumeric())
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    if end <= 2 {
        return None;
    }
    Some(&rest[..end])
}

pub fn bilibili_embed_url(bvid: &str) -> String {
    format!("//player.bilibili.com/player.html?isOutside=true&bvid={bvid}&autoplay=1")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Places the popover beside its anchor: right side first, then left, then
/// centred; vertically aligned with the anchor and kept inside the viewport.
pub fn popover_position(anchor: AnchorRect, viewport: Viewport) -> (f64, f64) {
    let space_right = viewport.width - anchor.right;
    let space_left = anchor.left;
    let left = if space_right >= POPOVER_WIDTH + POPOVER_PADDING {
        anchor.right
    } else if space_left >= POPOVER_WIDTH + POPOVER_PADDING {
        anchor.left - POPOVER_WIDTH
    } else {
        POPOVER_PADDING.max((viewport.width - POPOVER_WIDTH) / 2.0)
    };
    let mut top = anchor.top;
    if top + POPOVER_MIN_HEIGHT > viewport.height - POPOVER_PADDING {
        top = viewport.height - POPOVER_MIN_HEIGHT - POPOVER_PADDING;
    }
    if top < POPOVER_PADDING {
        top = POPOVER_PADDING;
    }
    (left, top)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeTarget {
    QrLightbox,
    VideoModal,
    Popover,
}

impl EscapeTarget {
    pub fn next(qr_open: bool, video_open: bool, popover_open: bool) -> Option<Self> {
        if qr_open {
            Some(EscapeTarget::QrLightbox)
        } else if video_open {
            Some(EscapeTarget::VideoModal)
        } else if popover_open {
            Some(EscapeTarget::Popover)
        } else {
            None
        }
    }
}
