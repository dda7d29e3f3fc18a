use std::collections::BTreeSet;

use serde::Serialize;

use crate::renderer::{Layout, Panel};
use crate::sequencer::Progress;
use crate::stimulus::Stimulus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Dismissible message shown over the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Everything currently visible to the participant.
///
/// Controllers mutate it; a frontend renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screen {
    panels: BTreeSet<Panel>,
    pub editor_heading: String,
    pub describe_heading: String,
    stimulus: Option<Stimulus>,
    progress: Option<Progress>,
    notice: Option<Notice>,
    navigation_enabled: bool,
    redirect: Option<String>,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            panels: BTreeSet::new(),
            editor_heading: String::new(),
            describe_heading: String::new(),
            stimulus: None,
            progress: None,
            notice: None,
            navigation_enabled: true,
            redirect: None,
        }
    }

    /// Hide every panel, then show exactly the ones `layout` selects.
    pub fn apply_layout(&mut self, layout: &Layout) {
        self.panels.clear();
        self.panels.extend(layout.panels.iter().copied());
        self.editor_heading = layout.editor_heading.clone();
        self.describe_heading = layout.describe_heading.clone();
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.panels.contains(&panel)
    }

    pub fn hidden_panels(&self) -> impl Iterator<Item = Panel> + '_ {
        Panel::ALL.into_iter().filter(|p| !self.panels.contains(p))
    }

    pub fn show_stimulus(&mut self, stimulus: Option<Stimulus>) {
        self.stimulus = stimulus;
    }

    pub fn stimulus(&self) -> Option<&Stimulus> {
        self.stimulus.as_ref()
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }

    pub fn navigation_enabled(&self) -> bool {
        self.navigation_enabled
    }

    pub fn redirect_to(&mut self, url: impl Into<String>) {
        self.redirect = Some(url.into());
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }
}

impl Screen {
    /// What is shown when a session cannot start: an error notice and no way
    /// forward.
    pub fn failed(text: impl Into<String>) -> Self {
        let mut screen = Self::new();
        screen.notify(NoticeKind::Error, text);
        screen.set_navigation_enabled(false);
        screen
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::CapabilityRenderer;
    use drawlang_core::{Capability, PhaseConfig};

    #[test]
    fn test_apply_layout_replaces_panels() {
        let mut screen = Screen::new();
        let draw = CapabilityRenderer::layout(&PhaseConfig::new([Capability::Draw]));
        let read = CapabilityRenderer::layout(&PhaseConfig::new([Capability::Descriptions]));

        screen.apply_layout(&draw);
        assert!(screen.is_visible(Panel::Sketchpad));

        screen.apply_layout(&read);
        assert!(!screen.is_visible(Panel::Sketchpad));
        assert!(screen.is_visible(Panel::DescriptionStimulus));
        assert_eq!(screen.hidden_panels().count(), 3);
    }

    #[test]
    fn test_apply_layout_is_idempotent() {
        let layout = CapabilityRenderer::layout(&PhaseConfig::new([
            Capability::Images,
            Capability::Describe,
        ]));
        let mut once = Screen::new();
        once.apply_layout(&layout);
        let mut twice = once.clone();
        twice.apply_layout(&layout);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_notice_lifecycle() {
        let mut screen = Screen::new();
        screen.notify(NoticeKind::Warning, "Fill everything in");
        assert_eq!(screen.notice().unwrap().kind, NoticeKind::Warning);
        screen.dismiss_notice();
        assert!(screen.notice().is_none());
        assert!(screen.navigation_enabled());
    }

    #[test]
    fn test_failed_screen() {
        let screen = Screen::failed("Failed to load experiment configuration: timeout");
        let notice = screen.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.text.ends_with("timeout"));
        assert!(!screen.navigation_enabled());
        assert!(screen.stimulus().is_none());
    }
}
