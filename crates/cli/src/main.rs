mod generate;
mod settings;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::{MemoryDrawingBackend, ReviewController, Screen, Stimulus, Transition};
use events::EventBus;
use experiment_client::{ExperimentClient, Participant};
use server::ServerSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::generate::{GenerateOptions, StimuliSet};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "drawlang")]
#[command(about = "Run and analyse drawing/description experiments", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./drawlang.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve experiment configs and record participant sessions
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        configs_dir: Option<PathBuf>,

        /// Condition directory to serve configs from
        #[arg(long)]
        condition: Option<String>,

        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// SQLite database URL
        #[arg(long)]
        database: Option<String>,
    },
    /// Generate experiment config files from a stimuli set
    GenerateConfigs {
        #[arg(long = "experiment", required = true)]
        experiments: Vec<String>,

        #[arg(long)]
        stimuli_set: String,

        #[arg(long, default_value = "static/stimuli_sets")]
        input_stimuli_set_dir: PathBuf,

        #[arg(long, default_value = "static/configs")]
        output_dir: PathBuf,

        /// Test stimuli per config, or "all"
        #[arg(long, default_value = "all", value_parser = generate::parse_batch_size)]
        test_batch_size: Option<usize>,

        #[arg(long, default_value_t = 1)]
        shuffles_per_stimuli_set: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Word list for presets with generated description stimuli
        #[arg(long, default_value = "/usr/share/dict/words")]
        word_list: PathBuf,
    },
    /// Dump every stored session of an experiment as JSON
    Export {
        #[arg(long)]
        database: Option<String>,

        #[arg(long)]
        experiment_id: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Step through a participant's recorded session
    Review {
        #[arg(long, default_value = "http://localhost:5000")]
        server_url: String,

        #[arg(long)]
        user_id: String,

        #[arg(long)]
        experiment_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            configs_dir,
            condition,
            static_dir,
            database,
        } => {
            let defaults = ServerSettings::default();
            let file = settings.server;
            let server_settings = ServerSettings {
                port: port.or(file.port).unwrap_or(defaults.port),
                configs_dir: configs_dir
                    .or(file.configs_dir)
                    .unwrap_or(defaults.configs_dir),
                condition: condition.or(file.condition).unwrap_or(defaults.condition),
                static_dir: static_dir.or(file.static_dir).or(defaults.static_dir),
                database_url: database
                    .or(file.database)
                    .unwrap_or(defaults.database_url),
            };
            server::serve(server_settings).await
        }
        Commands::GenerateConfigs {
            experiments,
            stimuli_set,
            input_stimuli_set_dir,
            output_dir,
            test_batch_size,
            shuffles_per_stimuli_set,
            seed,
            word_list,
        } => {
            let stimuli = StimuliSet::load(&input_stimuli_set_dir, &stimuli_set)?;
            let words = if experiments.iter().any(|e| generate::needs_word_list(e)) {
                generate::load_words(&word_list)?
            } else {
                Vec::new()
            };
            let options = GenerateOptions {
                stimuli_set,
                test_batch_size,
                shuffles: shuffles_per_stimuli_set,
                seed,
                words,
            };
            generate_configs(&experiments, &stimuli, &options, &output_dir)
        }
        Commands::Export {
            database,
            experiment_id,
            output,
        } => {
            let database = database
                .or(settings.server.database)
                .unwrap_or_else(|| ServerSettings::default().database_url);
            export(&database, &experiment_id, output).await
        }
        Commands::Review {
            server_url,
            user_id,
            experiment_id,
        } => review(&server_url, &user_id, &experiment_id, settings).await,
    }
}

fn generate_configs(
    experiments: &[String],
    stimuli: &StimuliSet,
    options: &GenerateOptions,
    output_dir: &std::path::Path,
) -> Result<()> {
    for experiment in experiments {
        let configs = generate::generate(experiment, stimuli, options)?;
        let written = generate::write_all(output_dir, &configs)?;
        println!("{}: wrote {} config(s)", experiment, written.len());
    }
    Ok(())
}

async fn export(database: &str, experiment_id: &str, output: Option<PathBuf>) -> Result<()> {
    let pool = db::create_pool(database)
        .await
        .with_context(|| format!("Failed to open database {}", database))?;
    db::run_migrations(&pool).await?;

    let responses = db::ResponseRepository::new(pool)
        .list_by_experiment(experiment_id)
        .await?;
    if responses.is_empty() {
        tracing::warn!(experiment_id, "No stored sessions");
    }

    let by_user: BTreeMap<String, _> = responses
        .into_iter()
        .map(|r| (r.user_id, r.document))
        .collect();
    let content = serde_json::to_string_pretty(&by_user)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} session(s) to {}", by_user.len(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn review(
    server_url: &str,
    user_id: &str,
    experiment_id: &str,
    settings: Settings,
) -> Result<()> {
    let client = ExperimentClient::new(server_url)
        .with_participant(Participant::new(user_id).with_experiment(experiment_id));
    let mut review = ReviewController::load(
        &client,
        Arc::new(MemoryDrawingBackend::new()),
        EventBus::new(),
        settings.engine,
    )
    .await?;

    println!("Reviewing {} / {}", experiment_id, user_id);
    print_trial(review.screen(), review.collector().description());
    loop {
        review.dismiss_notice();
        review.wait_for_navigation().await;
        match review.next()? {
            Transition::Completed => break,
            Transition::Unchanged => bail!("Review did not advance"),
            Transition::Trial { .. } | Transition::PhaseChanged { .. } => {
                print_trial(review.screen(), review.collector().description());
            }
        }
    }

    if let Some(notice) = review.screen().notice() {
        println!("{}", notice.text);
    }
    Ok(())
}

fn print_trial(screen: &Screen, description: &str) {
    if let Some(notice) = screen.notice() {
        println!();
        println!("{}", notice.text);
    }
    if let Some(progress) = screen.progress() {
        println!("[{}]", progress);
    }
    match screen.stimulus() {
        Some(Stimulus::Image { path }) => println!("  image:       {}", path),
        Some(Stimulus::Description { text }) => println!("  description: {}", text),
        None => println!("  (no stimulus)"),
    }
    if !description.is_empty() {
        println!("  response:    {}", description);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drawlang=info,server=info,engine=info,tower_http=info".into()),
        )
        .init();
}
