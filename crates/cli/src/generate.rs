//! Experiment config generation.
//!
//! Builds the batch/shuffle config files the server's catalog serves, from a
//! stimuli set JSON file (`{"train": {group: [image, ...]}, "test": {condition: [image, ...]}}`).
//!
//! Besides the baseline-priors experiment, the single-config presets of the
//! first study (`TIAN_REPLICATION_0`, `drawOnly`, `describeOnly`,
//! `readDescriptions`, `bothStims`, `sampleImg`, `sampleText`, `sampleAll`) are
//! available. Each shuffle of those picks a training group at random.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use drawlang_core::{Capability, ExperimentConfig, PhaseConfig};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::json;

pub const BASELINE_PRIORS: &str =
    "0_baselines_priors__a_train-none__draw-describe-sample-interleave";
const BASELINE_PRIORS_DESCRIPTION: &str = "Baseline priors without learning. Uses the draw, \
    describe, and free-generation testing behaviors. Only contains a testing phase for testing \
    tasks.";
const ALL_CONDITION: &str = "all";
const SAMPLE_SLOTS: usize = 10;
const TRAIN_DESCRIPTION_WORDS: Range<usize> = 5..10;
const TEST_DESCRIPTION_WORDS: Range<usize> = 4..8;

/// Presets that produce one config per shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    TianReplication,
    DrawOnly,
    DescribeOnly,
    ReadDescriptions,
    BothStims,
    SampleImg,
    SampleText,
    SampleAll,
}

impl Preset {
    const ALL: [Self; 8] = [
        Self::TianReplication,
        Self::DrawOnly,
        Self::DescribeOnly,
        Self::ReadDescriptions,
        Self::BothStims,
        Self::SampleImg,
        Self::SampleText,
        Self::SampleAll,
    ];

    fn id(self) -> &'static str {
        match self {
            Self::TianReplication => "TIAN_REPLICATION_0",
            Self::DrawOnly => "drawOnly",
            Self::DescribeOnly => "describeOnly",
            Self::ReadDescriptions => "readDescriptions",
            Self::BothStims => "bothStims",
            Self::SampleImg => "sampleImg",
            Self::SampleText => "sampleText",
            Self::SampleAll => "sampleAll",
        }
    }

    fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.id() == id)
    }

    /// Capabilities of the training and test phases.
    fn phases(self) -> (Vec<Capability>, Vec<Capability>) {
        use Capability::*;
        let copy = vec![Images, Draw, Describe];
        match self {
            Self::TianReplication => (copy.clone(), copy),
            Self::DrawOnly => (vec![Images, Draw], copy),
            Self::DescribeOnly => (vec![Images, Describe], copy),
            Self::ReadDescriptions => {
                let read = vec![Descriptions, Draw, Describe];
                (read.clone(), read)
            }
            Self::BothStims => {
                let both = vec![Descriptions, Images, Draw, Describe];
                (both.clone(), both)
            }
            Self::SampleImg => (vec![Draw], Vec::new()),
            Self::SampleText => (vec![Describe], Vec::new()),
            Self::SampleAll => (vec![Draw, Describe], Vec::new()),
        }
    }

    fn is_sampling(self) -> bool {
        matches!(self, Self::SampleImg | Self::SampleText | Self::SampleAll)
    }

    fn shows_descriptions(self) -> bool {
        matches!(self, Self::ReadDescriptions | Self::BothStims)
    }
}

/// Whether generating `experiment` draws random words for description stimuli.
pub fn needs_word_list(experiment: &str) -> bool {
    Preset::parse(experiment).is_some_and(Preset::shows_descriptions)
}

/// Full pool of stimuli an experiment draws from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StimuliSet {
    #[serde(default)]
    pub train: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub test: BTreeMap<String, Vec<String>>,
}

impl StimuliSet {
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.json", name));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stimuli set {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid stimuli set {}", path.display()))
    }

    fn all_test_stimuli(&self) -> Vec<String> {
        self.test.values().flatten().cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub stimuli_set: String,
    /// `None` puts every test stimulus in a single batch
    pub test_batch_size: Option<usize>,
    pub shuffles: usize,
    pub seed: u64,
    /// Vocabulary for generated description stimuli
    pub words: Vec<String>,
}

/// One config file, with its path relative to the output directory.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub path: PathBuf,
    pub config: ExperimentConfig,
}

pub fn parse_batch_size(s: &str) -> std::result::Result<Option<usize>, String> {
    if s == ALL_CONDITION {
        return Ok(None);
    }
    match s.parse::<usize>() {
        Ok(0) => Err("batch size must be positive".to_string()),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(format!("expected a number or '{}', got '{}'", ALL_CONDITION, s)),
    }
}

/// Generate every config for `experiment`.
pub fn generate(
    experiment: &str,
    stimuli: &StimuliSet,
    options: &GenerateOptions,
) -> Result<Vec<GeneratedConfig>> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    if experiment == BASELINE_PRIORS {
        return baseline_priors(experiment, stimuli, options, &mut rng);
    }
    match Preset::parse(experiment) {
        Some(preset) => preset_configs(preset, stimuli, options, &mut rng),
        None => bail!("Experiment config not found: {}", experiment),
    }
}

/// Write `configs` under `output_dir`, creating directories as needed.
pub fn write_all(output_dir: &Path, configs: &[GeneratedConfig]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(configs.len());
    for generated in configs {
        let path = output_dir.join(&generated.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string(&generated.config)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote experiment config");
        written.push(path);
    }
    Ok(written)
}

/// Behaviours tested by an experiment, from the `__test1-test2-sample-interleave`
/// suffix of its id.
fn tested_behaviours(experiment: &str) -> Result<[Capability; 2]> {
    let suffix = experiment.rsplit("__").next().unwrap_or_default();
    let parts: Vec<&str> = suffix.split('-').collect();
    let [first, second, _sample, ordering] = parts.as_slice() else {
        bail!("Malformed experiment id: {}", experiment);
    };
    if *ordering != "interleave" {
        bail!("Only interleaved test orderings are supported, got '{}'", ordering);
    }
    let parse = |name: &str| {
        Capability::parse(name)
            .filter(Capability::is_input)
            .with_context(|| format!("Unknown test behaviour '{}' in {}", name, experiment))
    };
    Ok([parse(*first)?, parse(*second)?])
}

fn timestamp() -> String {
    Local::now()
        .format("%Y-%m-%dT%H-%M-%S-%6f")
        .to_string()
}

fn baseline_priors(
    experiment: &str,
    stimuli: &StimuliSet,
    options: &GenerateOptions,
    rng: &mut StdRng,
) -> Result<Vec<GeneratedConfig>> {
    let behaviours = tested_behaviours(experiment)?;
    let mut pool = stimuli.all_test_stimuli();
    if pool.is_empty() {
        bail!("Stimuli set '{}' has no test stimuli", options.stimuli_set);
    }

    let config_dir = PathBuf::from(format!("{}_{}", experiment, options.stimuli_set))
        .join(ALL_CONDITION);
    let batch_size = options.test_batch_size.unwrap_or(pool.len());
    let timestamp = timestamp();

    let mut configs = Vec::new();
    for shuffle in 0..options.shuffles {
        pool.shuffle(rng);
        for (batch, images) in pool.chunks(batch_size).enumerate() {
            let path = config_dir.join(format!("batch_{}_shuffle_{}.json", batch, shuffle));

            let mut draw_and_describe = vec![Capability::Images];
            draw_and_describe.extend(behaviours);
            let mut config = ExperimentConfig::new()
                .with_phase(
                    "phase_1",
                    PhaseConfig::new(draw_and_describe).with_images(images.iter().cloned()),
                )
                .with_phase("phase_2", PhaseConfig::new(behaviours).sampling());

            stamp(&mut config, experiment, options, &path, &timestamp);
            config
                .metadata
                .extra
                .insert("description".into(), json!(BASELINE_PRIORS_DESCRIPTION));

            configs.push(GeneratedConfig { path, config });
        }
    }
    Ok(configs)
}

fn stamp(
    config: &mut ExperimentConfig,
    experiment: &str,
    options: &GenerateOptions,
    path: &Path,
    timestamp: &str,
) {
    let metadata = &mut config.metadata;
    metadata.experiment_id = Some(experiment.to_string());
    metadata.condition = Some(ALL_CONDITION.to_string());
    metadata.extra.insert("timestamp".into(), json!(timestamp));
    metadata
        .extra
        .insert("stimuli_set".into(), json!(options.stimuli_set));
    metadata
        .extra
        .insert("full_config_path".into(), json!(path.to_string_lossy()));
}

fn preset_configs(
    preset: Preset,
    stimuli: &StimuliSet,
    options: &GenerateOptions,
    rng: &mut StdRng,
) -> Result<Vec<GeneratedConfig>> {
    if preset.shows_descriptions() && options.words.is_empty() {
        bail!("{} needs a word list for its description stimuli", preset.id());
    }
    let config_dir = PathBuf::from(format!("{}_{}", preset.id(), options.stimuli_set))
        .join(ALL_CONDITION);
    let timestamp = timestamp();
    let (train_caps, test_caps) = preset.phases();

    let mut configs = Vec::with_capacity(options.shuffles);
    for shuffle in 0..options.shuffles {
        let path = config_dir.join(format!("batch_0_shuffle_{}.json", shuffle));

        let mut config = if preset.is_sampling() {
            let mut phase = PhaseConfig::new(train_caps.clone()).sampling();
            phase.images = vec![None; SAMPLE_SLOTS];
            ExperimentConfig::new().with_phase("phase_1", phase)
        } else {
            let groups: Vec<&String> = stimuli.train.keys().collect();
            let Some(&group) = groups.choose(rng) else {
                bail!("Stimuli set '{}' has no training groups", options.stimuli_set);
            };
            let train = stimuli.train[group].clone();
            let test = stimuli.all_test_stimuli();

            let mut phase_1 = PhaseConfig::new(train_caps.clone()).with_images(train);
            let mut phase_2 = PhaseConfig::new(test_caps.clone()).with_images(test);
            if preset.shows_descriptions() {
                phase_1.descriptions = random_descriptions(
                    &options.words,
                    phase_1.images.len(),
                    TRAIN_DESCRIPTION_WORDS,
                    rng,
                );
                phase_2.descriptions = random_descriptions(
                    &options.words,
                    phase_2.images.len(),
                    TEST_DESCRIPTION_WORDS,
                    rng,
                );
            }

            let mut config = ExperimentConfig::new()
                .with_phase("phase_1", phase_1)
                .with_phase("phase_2", phase_2);
            config
                .metadata
                .extra
                .insert("group_type".into(), json!(group));
            config
        };

        stamp(&mut config, preset.id(), options, &path, &timestamp);
        configs.push(GeneratedConfig { path, config });
    }
    Ok(configs)
}

/// `count` strings of random words, each with a length drawn from `lengths`.
fn random_descriptions(
    words: &[String],
    count: usize,
    lengths: Range<usize>,
    rng: &mut StdRng,
) -> Vec<String> {
    let mut descriptions = Vec::with_capacity(count);
    for _ in 0..count {
        let len = rng.random_range(lengths.clone());
        let mut text = Vec::with_capacity(len);
        for _ in 0..len {
            if let Some(word) = words.choose(rng) {
                text.push(word.as_str());
            }
        }
        descriptions.push(text.join(" "));
    }
    descriptions
}

/// Read a newline separated word list, skipping blank lines.
pub fn load_words(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect())
}
