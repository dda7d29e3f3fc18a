use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pen input for one trial, as produced by the drawing widget.
///
/// The value is relayed untouched between the widget and storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StrokeSet(Value);

impl StrokeSet {
    /// The stroke set recorded when drawing is inactive.
    pub fn empty() -> Self {
        Self(Value::Array(Vec::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for StrokeSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Responses accumulated for one phase.
///
/// Both sequences stay absent until the first trial is recorded, then grow
/// by exactly one entry per trial.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strokes: Option<Vec<StrokeSet>>,
    #[serde(
        default,
        alias = "userDescriptions",
        skip_serializing_if = "Option::is_none"
    )]
    user_descriptions: Option<Vec<String>>,
}

impl TrialRecord {
    pub fn is_initialized(&self) -> bool {
        self.strokes.is_some() || self.user_descriptions.is_some()
    }

    /// Append one trial's response, initializing the record on first use.
    pub fn push(&mut self, strokes: StrokeSet, description: String) {
        self.strokes.get_or_insert_with(Vec::new).push(strokes);
        self.user_descriptions
            .get_or_insert_with(Vec::new)
            .push(description);
    }

    pub fn strokes(&self) -> &[StrokeSet] {
        self.strokes.as_deref().unwrap_or_default()
    }

    pub fn user_descriptions(&self) -> &[String] {
        self.user_descriptions.as_deref().unwrap_or_default()
    }

    pub fn strokes_at(&self, index: usize) -> Option<&StrokeSet> {
        self.strokes().get(index)
    }

    pub fn description_at(&self, index: usize) -> Option<&str> {
        self.user_descriptions().get(index).map(String::as_str)
    }

    /// Number of recorded trials.
    pub fn len(&self) -> usize {
        self.strokes().len().max(self.user_descriptions().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
