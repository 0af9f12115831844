pub const LOGO_HEIGHT_START: f64 = 400.0;
pub const SCROLL_EPSILON: f64 = 0.5;
pub const NAV_FADE_START: f64 = 0.6;
pub const NAV_FADE_RATE: f64 = 2.5;
pub const INDICATOR_FADE_END: f64 = 0.3;
pub const COLLAPSE_PROGRESS: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroMetrics {
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl HeroMetrics {
    pub fn navbar_height(&self) -> f64 {
        match self.viewport_width {
            w if w <= 360.0 => 100.0,
            w if w <= 480.0 => 110.0,
            w if w <= 640.0 => 130.0,
            w if w <= 768.0 => 150.0,
            _ => 200.0,
        }
    }

    pub fn logo_height_end(&self) -> f64 {
        match self.viewport_width {
            w if w <= 360.0 => 80.0,
            w if w <= 480.0 => 90.0,
            w if w <= 640.0 => 110.0,
            w if w <= 768.0 => 130.0,
            _ => 160.0,
        }
    }

    pub fn scroll_distance(&self) -> f64 {
        self.viewport_height - self.navbar_height()
    }

    pub fn progress(&self, scroll_y: f64) -> f64 {
        let distance = self.scroll_distance();
        if distance <= 0.0 {
            return 1.0;
        }
        (scroll_y / distance).clamp(0.0, 1.0)
    }
}

pub fn lerp(start: f64, end: f64, progress: f64) -> f64 {
    start + (end - start) * progress
}

/// Style values for one scroll position. Heights are whole pixels to keep the
/// logo from jittering on sub-pixel steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroFrame {
    pub progress: f64,
    pub hero_height: i32,
    pub logo_height: i32,
    pub nav_opacity: f64,
    pub indicator_opacity: f64,
    pub indicator_hidden: bool,
    pub collapsed: bool,
}

impl HeroFrame {
    pub fn at(scroll_y: f64, metrics: &HeroMetrics) -> Self {
        let progress = metrics.progress(scroll_y);
        let hero_height = lerp(metrics.viewport_height, metrics.navbar_height(), progress).round() as i32;
        let logo_height = lerp(LOGO_HEIGHT_START, metrics.logo_height_end(), progress).round() as i32;
        let nav_opacity = ((progress - NAV_FADE_START) * NAV_FADE_RATE).clamp(0.0, 1.0);
        let indicator_opacity = 1.0 - (progress / INDICATOR_FADE_END).min(1.0);
        Self {
            progress,
            hero_height,
            logo_height,
            nav_opacity,
            indicator_opacity,
            indicator_hidden: progress > INDICATOR_FADE_END,
            collapsed: progress >= COLLAPSE_PROGRESS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroUpdate {
    pub frame: HeroFrame,
    /// `Some` only when the collapsed state flipped on this update.
    pub collapse_changed: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct HeroAnimator {
    last_scroll_y: Option<f64>,
    collapsed: bool,
}

impl HeroAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips positions within half a pixel of the last applied one.
    pub fn update(&mut self, scroll_y: f64, metrics: &HeroMetrics) -> Option<HeroUpdate> {
        if let Some(last) = self.last_scroll_y {
            if (scroll_y - last).abs() < SCROLL_EPSILON {
                return None;
            }
        }
        self.last_scroll_y = Some(scroll_y);
        let frame = HeroFrame::at(scroll_y, metrics);
        let collapse_changed = if frame.collapsed != self.collapsed {
            self.collapsed = frame.collapsed;
            Some(frame.collapsed)
        } else {
            None
        };
        Some(HeroUpdate {
            frame,
            collapse_changed,
        })
    }

    /// Forces the next update through, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.last_scroll_y = None;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}
