use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use oasis::collector::{run_collection, DataApiClient, Dataset, DatasetReport};
use oasis::config::{self, CollectorConfig, ItemPolicy, ProbeConfig};
use oasis::llm::{run_probe, ChatClient, ProbeMode, Prompts};

#[derive(Parser)]
#[command(
    name = "oasis",
    author,
    version,
    about = "Busan open-data collector and LLM chat probe",
    long_about = r#"oasis — gather Busan points of interest and smoke-test the chat model.

Credentials are read from the environment or a .env file:
  DATA_API_KEY   key for apis.data.go.kr
  LLM_API_KEY    key for the OpenAI-compatible chat endpoint

Examples:
  1) Collect both listings into ./data:
      oasis collect
  2) Collect restaurants only, three pages, no delay:
      oasis collect --dataset restaurants --max-pages 3 --delay-ms 0
  3) Probe the chat model:
      oasis probe --mode stream
"#,
    after_help = "Use `oasis <subcommand> --help` to get subcommand specific options."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
    /// Disable request/response logging
    #[arg(long, global = true)]
    silent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect points of interest and write them as JSON
    #[command(about = "Collect Busan points of interest", long_about = "Page through the Busan restaurant and tourist-information listings, keep entries with coordinates, and write one JSON file per listing into the output directory.")]
    Collect {
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
        /// Which listing to collect
        #[arg(long, value_enum, default_value_t = DatasetArg::All)]
        dataset: DatasetArg,
        /// Directory for the JSON files (default: $OUTPUT_DIR or ./data)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Stop after this many pages per listing
        #[arg(long)]
        max_pages: Option<u32>,
        /// Items requested per page (1-100)
        #[arg(long)]
        page_size: Option<u32>,
        /// Pause between pages, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Skip malformed items instead of stopping the listing
        #[arg(long, default_value_t = false)]
        skip_invalid: bool,
    },
    /// Run the chat-completion probe
    #[command(about = "Probe the chat model", long_about = "Send one streamed and one complete chat request to the configured OpenAI-compatible endpoint and print both answers. Errors are reported with their full cause chain.")]
    Probe {
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
        /// Which exchanges to run
        #[arg(long, value_enum, default_value_t = ModeArg::Both)]
        mode: ModeArg,
        /// Override the model identifier
        #[arg(long)]
        model: Option<String>,
        /// User message for the streamed exchange
        #[arg(long)]
        stream_prompt: Option<String>,
        /// User message for the complete exchange
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Validate configuration (env vars / API credentials)
    #[command(about = "Validate configuration", long_about = "Report which of the required API keys are set and which endpoints and limits are in effect.")]
    CheckConfig {
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Restaurants,
    TouristSpots,
    All,
}

impl DatasetArg {
    fn datasets(self) -> Vec<Dataset> {
        match self {
            DatasetArg::Restaurants => vec![Dataset::Restaurants],
            DatasetArg::TouristSpots => vec![Dataset::TouristSpots],
            DatasetArg::All => Dataset::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Both,
    Stream,
    Complete,
}

impl From<ModeArg> for ProbeMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Both => ProbeMode::Both,
            ModeArg::Stream => ProbeMode::Stream,
            ModeArg::Complete => ProbeMode::Complete,
        }
    }
}

fn fail(msg: &str, err: &dyn std::error::Error) -> ! {
    tracing::error!(error = %err, "{}", msg);
    eprintln!("{}: {}", yansi::Paint::new(msg).red(), err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  {} {}", yansi::Paint::new("caused by:").yellow(), cause);
        source = cause.source();
    }
    process::exit(1);
}

fn print_summary(reports: &[DatasetReport]) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w.saturating_sub(4));
    }
    table.set_header(vec!["Dataset", "Pages", "Items", "Records", "Dropped", "Skipped", "Stopped", "File"]);
    for r in reports {
        let c = &r.collection;
        table.add_row(vec![
            c.dataset.to_string(),
            c.pages_fetched.to_string(),
            c.items_seen.to_string(),
            c.records.len().to_string(),
            c.items_dropped.to_string(),
            c.items_skipped.to_string(),
            c.stop.to_string(),
            r.path.display().to_string(),
        ]);
    }
    println!("\n{table}\n");
}

async fn collect_command(
    env_file: Option<String>,
    dataset: DatasetArg,
    output_dir: Option<PathBuf>,
    max_pages: Option<u32>,
    page_size: Option<u32>,
    delay_ms: Option<u64>,
    skip_invalid: bool,
) {
    config::load_env_file(env_file.as_deref());
    let mut cfg = match CollectorConfig::from_env() {
        Ok(c) => c,
        Err(e) => fail("Cannot collect", &e),
    };
    if let Some(dir) = output_dir {
        cfg.output_dir = dir;
    }
    if let Some(n) = max_pages {
        cfg.max_pages = n;
    }
    if let Some(n) = page_size {
        cfg.page_size = config::clamp_page_size(n);
        if cfg.page_size != n {
            eprintln!(
                "{}",
                yansi::Paint::new(format!("--page-size {} is out of range, using {}", n, cfg.page_size)).yellow()
            );
        }
    }
    if let Some(ms) = delay_ms {
        cfg.page_delay = Duration::from_millis(ms);
    }
    if skip_invalid {
        cfg.item_policy = ItemPolicy::Skip;
    }

    let client = match DataApiClient::new(cfg.base_url.clone(), cfg.api_key.clone(), cfg.timeout) {
        Ok(c) => c,
        Err(e) => fail("Failed to create API client", &e),
    };
    tracing::info!(base_url = client.base_url(), output_dir = ?cfg.output_dir, "Collector configured");

    match run_collection(&client, &cfg, &dataset.datasets()).await {
        Ok(reports) => {
            print_summary(&reports);
            let failures = reports.iter().filter(|r| r.collection.stop.is_failure()).count();
            if failures > 0 {
                println!(
                    "{}",
                    yansi::Paint::new(format!("{} listing(s) stopped early; partial results were saved.", failures)).yellow()
                );
            } else {
                println!("{}", yansi::Paint::new("Collection complete").green());
            }
        }
        Err(e) => fail("Failed to save records", &e),
    }
}

async fn probe_command(
    env_file: Option<String>,
    mode: ModeArg,
    model: Option<String>,
    stream_prompt: Option<String>,
    prompt: Option<String>,
) {
    config::load_env_file(env_file.as_deref());
    let mut cfg = match ProbeConfig::from_env() {
        Ok(c) => c,
        Err(e) => fail("Cannot run probe", &e),
    };
    if let Some(m) = model {
        cfg.model = m;
    }
    let mut prompts = Prompts::default();
    if let Some(p) = stream_prompt {
        prompts.stream = p;
    }
    if let Some(p) = prompt {
        prompts.complete = p;
    }

    let client = match ChatClient::new(&cfg) {
        Ok(c) => c,
        Err(e) => fail("Failed to create chat client", &e),
    };
    match run_probe(&client, mode.into(), &prompts).await {
        Ok(_) => println!("{}", yansi::Paint::new("✓ All probes completed successfully!").green()),
        Err(e) => fail("✗ Probe failed", &e),
    }
}

fn check_config_command(env_file: Option<String>) {
    config::load_env_file(env_file.as_deref());
    let mut ok = true;
    for (var, value) in [
        (config::DATA_API_KEY_VAR, config::get_data_api_key()),
        (config::LLM_API_KEY_VAR, config::get_llm_api_key()),
    ] {
        if value.is_some() {
            println!("{} {}", yansi::Paint::new("✓").green(), var);
        } else {
            eprintln!("{}", yansi::Paint::new(format!("{} is not configured", var)).red());
            ok = false;
        }
    }
    println!("Data API:    {}", config::get_data_api_base_url());
    println!("Pages:       up to {} x {} items, {:?} apart", config::get_max_pages(), config::get_page_size(), config::get_page_delay());
    println!("Timeout:     {:?}", config::get_request_timeout());
    println!("Output dir:  {}", config::get_output_dir().display());
    println!("LLM:         {} ({})", config::get_llm_base_url(), config::get_llm_model());
    if !ok {
        process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    if cli.silent {
        oasis::api::set_silent(true);
    }

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    match command {
        Commands::Collect {
            env_file,
            dataset,
            output_dir,
            max_pages,
            page_size,
            delay_ms,
            skip_invalid,
        } => {
            collect_command(env_file, dataset, output_dir, max_pages, page_size, delay_ms, skip_invalid).await;
        }
        Commands::Probe {
            env_file,
            mode,
            model,
            stream_prompt,
            prompt,
        } => {
            probe_command(env_file, mode, model, stream_prompt, prompt).await;
        }
        Commands::CheckConfig { env_file } => check_config_command(env_file),
    }
}
