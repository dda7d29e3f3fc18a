//! Capability to panel resolution.
//!
//! A phase's capabilities decide which panels are visible, which stimulus kind
//! is presented, and what the headings and phase briefing say.

use std::collections::BTreeSet;
use std::fmt;

use drawlang_core::{Capability, DisplayMode, PhaseConfig};
use serde::Serialize;

pub const EDITOR_HEADING: &str = "Copy the image onto the sketchpad";
pub const DESCRIBE_HEADING: &str = "Describe the image";
const SAMPLE_DRAW_HEADING: &str = "Draw a new image like the ones you've seen";
const SAMPLE_DESCRIBE_HEADING: &str = "Describe a new image like the ones you've seen";
const SAMPLE_DESCRIBE_DRAWING_HEADING: &str = "Describe your drawing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Sketchpad,
    DescribeInput,
    ImageStimulus,
    DescriptionStimulus,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Sketchpad,
        Panel::DescribeInput,
        Panel::ImageStimulus,
        Panel::DescriptionStimulus,
    ];
}

/// Resolved presentation of one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub panels: BTreeSet<Panel>,
    pub display_mode: DisplayMode,
    pub editor_heading: String,
    pub describe_heading: String,
    /// Only images are shown and nothing is collected. Review holds
    /// navigation back on these.
    pub passive: bool,
}

impl Layout {
    pub fn shows(&self, panel: Panel) -> bool {
        self.panels.contains(&panel)
    }
}

pub struct CapabilityRenderer;

impl CapabilityRenderer {
    pub fn layout(phase: &PhaseConfig) -> Layout {
        let mut panels = BTreeSet::new();
        for capability in &phase.capabilities {
            let panel = match capability {
                Capability::Draw => Panel::Sketchpad,
                Capability::Describe => Panel::DescribeInput,
                Capability::Images => Panel::ImageStimulus,
                Capability::Descriptions => Panel::DescriptionStimulus,
            };
            panels.insert(panel);
        }

        let draw = phase.has(Capability::Draw);
        let describe = phase.has(Capability::Describe);
        let (editor_heading, describe_heading) = if phase.sampling {
            panels.remove(&Panel::ImageStimulus);
            panels.remove(&Panel::DescriptionStimulus);
            Self::sampling_headings(draw, describe)
        } else {
            (EDITOR_HEADING.to_string(), DESCRIBE_HEADING.to_string())
        };

        let passive = !draw && !describe && panels.contains(&Panel::ImageStimulus);

        Layout {
            panels,
            display_mode: phase.display_mode(),
            editor_heading,
            describe_heading,
            passive,
        }
    }

    fn sampling_headings(draw: bool, describe: bool) -> (String, String) {
        match (draw, describe) {
            (true, true) => (
                format!("1. {}", SAMPLE_DRAW_HEADING),
                format!("2. {}", SAMPLE_DESCRIBE_DRAWING_HEADING),
            ),
            (true, false) => (SAMPLE_DRAW_HEADING.to_string(), DESCRIBE_HEADING.to_string()),
            (false, _) => (
                EDITOR_HEADING.to_string(),
                SAMPLE_DESCRIBE_HEADING.to_string(),
            ),
        }
    }

    /// Explanation shown when a phase begins. `phase_number` is one-based.
    pub fn briefing(phase: &PhaseConfig, phase_number: usize) -> PhaseBriefing {
        let heading = format!("Beginning Phase {}:", phase_number);

        if phase.sampling {
            let output = match (phase.has(Capability::Draw), phase.has(Capability::Describe)) {
                (true, false) => "drawings",
                (false, true) => "descriptions",
                _ => "drawings and descriptions",
            };
            return PhaseBriefing {
                heading,
                items: vec![format!("Creating new {}.", output)],
                closing: "Remember, someone else will see these images. They should be able to \
                          verify that they look similar to the other images you've seen."
                    .to_string(),
            };
        }

        let items = phase
            .capabilities
            .iter()
            .map(|capability| match capability {
                Capability::Draw => "Copying images onto a sketchpad",
                Capability::Describe => "Describing those images in text",
                Capability::Images => "Looking at images",
                Capability::Descriptions => "Reading descriptions of images",
            })
            .map(str::to_string)
            .collect();

        PhaseBriefing {
            heading,
            items,
            closing: "Good luck!".to_string(),
        }
    }
}

/// What a new phase asks of the participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseBriefing {
    pub heading: String,
    pub items: Vec<String>,
    pub closing: String,
}

impl fmt::Display for PhaseBriefing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "In this phase, you will be:")?;
        for item in &self.items {
            writeln!(f, "  - {}", item)?;
        }
        write!(f, "{}", self.closing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panels_follow_capabilities() {
        let phase = PhaseConfig::new([Capability::Images, Capability::Draw, Capability::Describe]);
        let layout = CapabilityRenderer::layout(&phase);

        assert!(layout.shows(Panel::Sketchpad));
        assert!(layout.shows(Panel::DescribeInput));
        assert!(layout.shows(Panel::ImageStimulus));
        assert!(!layout.shows(Panel::DescriptionStimulus));
        assert!(!layout.passive);
        assert_eq!(layout.editor_heading, EDITOR_HEADING);
    }

    #[test]
    fn test_activation_is_order_independent() {
        let a = PhaseConfig::new([Capability::Draw, Capability::Images, Capability::Draw]);
        let b = PhaseConfig::new([Capability::Images, Capability::Draw]);
        assert_eq!(
            CapabilityRenderer::layout(&a).panels,
            CapabilityRenderer::layout(&b).panels
        );
    }

    #[test]
    fn test_both_display_capabilities() {
        let phase = PhaseConfig::new([
            Capability::Descriptions,
            Capability::Images,
            Capability::Draw,
        ]);
        let layout = CapabilityRenderer::layout(&phase);
        assert!(layout.shows(Panel::ImageStimulus));
        assert!(layout.shows(Panel::DescriptionStimulus));
        assert_eq!(layout.display_mode, DisplayMode::Images);
    }

    #[test]
    fn test_sampling_suppresses_display() {
        let phase = PhaseConfig::new([Capability::Images, Capability::Draw, Capability::Describe])
            .sampling();
        let layout = CapabilityRenderer::layout(&phase);

        assert!(!layout.shows(Panel::ImageStimulus));
        assert!(layout.shows(Panel::Sketchpad));
        assert_eq!(
            layout.editor_heading,
            "1. Draw a new image like the ones you've seen"
        );
        assert_eq!(layout.describe_heading, "2. Describe your drawing");
    }

    #[test]
    fn test_sampling_describe_only_heading() {
        let phase = PhaseConfig::new([Capability::Describe]).sampling();
        let layout = CapabilityRenderer::layout(&phase);
        assert_eq!(
            layout.describe_heading,
            "Describe a new image like the ones you've seen"
        );
        assert_eq!(layout.display_mode, DisplayMode::Images);
    }

    #[test]
    fn test_passive_phase() {
        let phase = PhaseConfig::new([Capability::Images]);
        assert!(CapabilityRenderer::layout(&phase).passive);

        let empty = PhaseConfig::default();
        assert!(!CapabilityRenderer::layout(&empty).passive);
    }

    #[test]
    fn test_description_viewing_is_not_passive() {
        let read = PhaseConfig::new([Capability::Descriptions]).with_descriptions(["a tall tower"]);
        let layout = CapabilityRenderer::layout(&read);
        assert!(layout.shows(Panel::DescriptionStimulus));
        assert!(!layout.passive);
    }

    #[test]
    fn test_briefing() {
        let phase = PhaseConfig::new([Capability::Images, Capability::Draw]);
        let briefing = CapabilityRenderer::briefing(&phase, 2);
        assert_eq!(briefing.heading, "Beginning Phase 2:");
        assert_eq!(
            briefing.items,
            vec!["Looking at images", "Copying images onto a sketchpad"]
        );
        assert!(briefing.to_string().ends_with("Good luck!"));

        let sampling = PhaseConfig::new([Capability::Draw]).sampling();
        let briefing = CapabilityRenderer::briefing(&sampling, 1);
        assert_eq!(briefing.items, vec!["Creating new drawings."]);
    }
}
