use serde::{Deserialize, Serialize};

use super::record::TrialRecord;

/// A UI affordance a phase declares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Collect a drawing on the sketchpad
    Draw,
    /// Collect a written description
    Describe,
    /// Show image stimuli
    Images,
    /// Show text description stimuli
    Descriptions,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Describe => "describe",
            Self::Images => "images",
            Self::Descriptions => "descriptions",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draw" => Some(Self::Draw),
            "describe" => Some(Self::Describe),
            "images" => Some(Self::Images),
            "descriptions" => Some(Self::Descriptions),
            _ => None,
        }
    }

    /// Whether this capability collects participant input.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Draw | Self::Describe)
    }
}

/// Which stimulus kind a phase presents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Images,
    Descriptions,
}

impl DisplayMode {
    /// Resolve the display mode from capabilities in declared order.
    ///
    /// The last of `images` / `descriptions` wins when both are declared. A
    /// phase declaring neither falls back to images.
    pub fn resolve(capabilities: &[Capability]) -> Self {
        capabilities
            .iter()
            .filter_map(|capability| match capability {
                Capability::Images => Some(Self::Images),
                Capability::Descriptions => Some(Self::Descriptions),
                _ => None,
            })
            .last()
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Descriptions => "descriptions",
        }
    }
}

/// Configuration of a single phase, plus any responses recorded against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhaseConfig {
    /// Declared capabilities, in the order the author wrote them
    #[serde(rename = "ui_components", alias = "capabilities", default)]
    pub capabilities: Vec<Capability>,
    /// Participant produces new output instead of responding to stimuli
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sampling: bool,
    /// Image stimulus filenames; `null` entries are sample slots
    #[serde(default)]
    pub images: Vec<Option<String>>,
    /// Text description stimuli
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<String>,
    /// Responses accumulated for this phase
    #[serde(flatten)]
    pub responses: TrialRecord,
}

impl PhaseConfig {
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(|i| Some(i.into())).collect();
        self
    }

    pub fn with_descriptions<I, S>(mut self, descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptions = descriptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn sampling(mut self) -> Self {
        self.sampling = true;
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::resolve(&self.capabilities)
    }

    /// Length of the stimulus list selected by `mode`.
    pub fn stimulus_len(&self, mode: DisplayMode) -> usize {
        match mode {
            DisplayMode::Images => self.images.len(),
            DisplayMode::Descriptions => self.descriptions.len(),
        }
    }

    /// Number of stimuli cycled through in this phase; zero for sampling phases.
    pub fn active_stimulus_count(&self) -> usize {
        if self.sampling {
            0
        } else {
            self.stimulus_len(self.display_mode())
        }
    }

    /// Number of responses the phase takes. A phase without stimuli still takes one.
    pub fn trial_count(&self) -> usize {
        self.active_stimulus_count().max(1)
    }
}
