#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryKey {
    Next,
    Previous,
    Close,
}

impl GalleryKey {
    /// Maps `KeyboardEvent.key` values, including the legacy short names.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" | "Right" => Some(GalleryKey::Next),
            "ArrowLeft" | "Left" => Some(GalleryKey::Previous),
            "Escape" | "Esc" => Some(GalleryKey::Close),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GalleryState {
    images: Vec<String>,
    index: usize,
    open: bool,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens on `start`, or on the first image when `start` is not listed.
    /// An empty list leaves the gallery closed.
    pub fn open(&mut self, images: Vec<String>, start: &str) -> Option<usize> {
        if images.is_empty() {
            self.close();
            return None;
        }
        self.index = images.iter().position(|image| image == start).unwrap_or(0);
        self.images = images;
        self.open = true;
        Some(self.index)
    }

    pub fn close(&mut self) {
        self.images.clear();
        self.index = 0;
        self.open = false;
    }

    /// Steps by `direction`, wrapping past either end.
    pub fn navigate(&mut self, direction: isize) -> Option<usize> {
        if !self.open || self.images.is_empty() {
            return None;
        }
        let len = self.images.len() as isize;
        let next = (self.index as isize + direction).rem_euclid(len);
        self.index = next as usize;
        Some(self.index)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.navigate(1)
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.navigate(-1)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn current(&self) -> Option<&str> {
        if !self.open {
            return None;
        }
        self.images.get(self.index).map(String::as_str)
    }

    /// Previous/next affordances are pointless with a single image.
    pub fn controls_visible(&self) -> bool {
        self.images.len() > 1
    }
}
