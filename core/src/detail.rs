use thiserror::Error;

pub const DETAIL_TRANSITION_MS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailPhase {
    MountedInactive,
    Active,
}

struct ActiveDetail<T> {
    owner: String,
    phase: DetailPhase,
    handle: T,
}

/// A detail that left the active slot and waits for its exit transition.
pub struct ClosingDetail<T> {
    pub owner: String,
    pub handle: T,
    /// Sections whose blocking overlays must be cleared right away.
    pub unblock: Vec<String>,
}

/// Holds the one detail view that may be open across the page, plus the set
/// of sections whose overlays block interaction while it is active.
pub struct DetailExclusion<T> {
    sections: Vec<String>,
    active: Option<ActiveDetail<T>>,
    blocked: Vec<String>,
}

impl<T> DetailExclusion<T> {
    pub fn new<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            active: None,
            blocked: Vec::new(),
        }
    }

    /// Places `handle` in the slot as mounted but not yet active. A detail
    /// already in the slot is moved to closing and returned.
    pub fn mount(&mut self, owner: &str, handle: T) -> Result<Option<ClosingDetail<T>>, DetailError> {
        if !self.sections.iter().any(|section| section == owner) {
            return Err(DetailError::UnknownSection(owner.to_string()));
        }
        let displaced = self.begin_close();
        self.active = Some(ActiveDetail {
            owner: owner.to_string(),
            phase: DetailPhase::MountedInactive,
            handle,
        });
        Ok(displaced)
    }

    /// Activates the mounted detail and returns the sections to block: every
    /// section except the owner.
    pub fn activate(&mut self) -> Vec<String> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        active.phase = DetailPhase::Active;
        let owner = active.owner.clone();
        self.blocked = self
            .sections
            .iter()
            .filter(|section| **section != owner)
            .cloned()
            .collect();
        self.blocked.clone()
    }

    /// Empties the slot. Every section is listed for unblocking so no overlay
    /// survives, even one set by hand.
    pub fn begin_close(&mut self) -> Option<ClosingDetail<T>> {
        let active = self.active.take()?;
        self.blocked.clear();
        Some(ClosingDetail {
            owner: active.owner,
            handle: active.handle,
            unblock: self.sections.clone(),
        })
    }

    /// Closes the detail only when `section` owns it.
    pub fn close_owned_by(&mut self, section: &str) -> Option<ClosingDetail<T>> {
        if self.owner() != Some(section) {
            return None;
        }
        self.begin_close()
    }

    pub fn owner(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.owner.as_str())
    }

    pub fn phase(&self) -> Option<DetailPhase> {
        self.active.as_ref().map(|active| active.phase)
    }

    pub fn handle(&self) -> Option<&T> {
        self.active.as_ref().map(|active| &active.handle)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    pub fn is_blocked(&self, section: &str) -> bool {
        self.blocked.iter().any(|blocked| blocked == section)
    }
}

/// The source shown for one image: its pending placeholder when it has not
/// resolved yet, otherwise its live `src`.
pub fn gallery_source(placeholder: Option<&str>, src: Option<&str>) -> Option<String> {
    placeholder
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| src.map(str::trim).filter(|value| !value.is_empty()))
        .map(str::to_string)
}

pub fn gallery_sources<'a, I>(images: I) -> Vec<String>
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    images
        .into_iter()
        .filter_map(|(placeholder, src)| gallery_source(placeholder, src))
        .collect()
}
