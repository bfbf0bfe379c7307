//! CLI command definitions, routing, and tracing setup.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use atlas_core::agents::{AgentRole, ChatAgent, OpenAiChatAgent, extract_topics};
use atlas_core::notion::{NotionClient, PagePublisher};
use atlas_core::pipeline::{
    self, AgentSet, PipelineConfig, ProgressReporter, RunResult, run_pipeline,
};
use atlas_core::stages::{self, Stage};
use atlas_shared::{AppConfig, init_config, load_config};
use atlas_transcript::{JsonFileSource, TimedTextClient, TranscriptSource, VideoId, segment};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Atlas — YouTube lectures in, Notion pages out.
#[derive(Parser)]
#[command(
    name = "atlas",
    version,
    about = "Turn YouTube transcripts into summarized, structured Notion pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full pipeline: fetch, summarize, format, research, publish.
    Run {
        /// YouTube video URL or 11-character id.
        video: String,

        /// Page title (defaults to a title derived from the video id).
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,

        /// Caption language code.
        #[arg(long, default_value = "en")]
        lang: String,

        /// Replay captions from a fragments JSON file instead of fetching.
        #[arg(long)]
        from_file: Option<String>,
    },

    /// Fetch captions and write the fragment and section stage files.
    Fetch {
        /// YouTube video URL or 11-character id.
        video: String,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,

        /// Caption language code.
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Summarize sections from the sections stage file.
    Summarize {
        /// Video id (defaults to the newest sections stage file).
        #[arg(long)]
        video: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Format summarized sections for page display.
    Format {
        /// Video id (defaults to the newest summarized stage file).
        #[arg(long)]
        video: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Research topics extracted from the formatted sections.
    Research {
        /// Video id (defaults to the newest formatted stage file).
        #[arg(long)]
        video: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Compile formatted sections (and research) into blocks. Offline.
    Compile {
        /// Video id (defaults to the newest formatted stage file).
        #[arg(long)]
        video: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Publish a compiled blocks stage file as a Notion page.
    Publish {
        /// Video id (defaults to the newest blocks stage file).
        #[arg(long)]
        video: Option<String>,

        /// Page title (defaults to a title derived from the video id).
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory for stage files.
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "atlas=info",
        1 => "atlas=debug",
        _ => "atlas=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            video,
            title,
            out,
            lang,
            from_file,
        } => cmd_run(&video, title, out.as_deref(), &lang, from_file.as_deref()).await,
        Command::Fetch { video, out, lang } => cmd_fetch(&video, out.as_deref(), &lang).await,
        Command::Summarize { video, out } => cmd_summarize(video.as_deref(), out.as_deref()).await,
        Command::Format { video, out } => cmd_format(video.as_deref(), out.as_deref()).await,
        Command::Research { video, out } => cmd_research(video.as_deref(), out.as_deref()).await,
        Command::Compile { video, out } => cmd_compile(video.as_deref(), out.as_deref()).await,
        Command::Publish { video, title, out } => {
            cmd_publish(video.as_deref(), title, out.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Resolve the stage-file output directory from flag or config.
fn output_dir(config: &AppConfig, out: Option<&str>) -> PathBuf {
    out.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir))
}

/// Resolve the target video from an explicit flag or the newest stage file.
fn resolve_video(
    explicit: Option<&str>,
    output_dir: &std::path::Path,
    stage: Stage,
) -> Result<VideoId> {
    match explicit {
        Some(v) => Ok(v.parse()?),
        None => Ok(stages::discover_video(output_dir, stage)?),
    }
}

fn build_agent(config: &AppConfig, role: AgentRole) -> Result<OpenAiChatAgent> {
    Ok(OpenAiChatAgent::new(&config.openai, role)?)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_run(
    video: &str,
    title: Option<String>,
    out: Option<&str>,
    lang: &str,
    from_file: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    let video: VideoId = video.parse()?;
    let out = output_dir(&config, out);

    let pipeline_config = PipelineConfig {
        video: video.clone(),
        output_dir: out,
        window_secs: config.defaults.section_window_secs,
        max_topics: config.defaults.max_topics,
        page_title: title,
    };

    let agents = AgentSet {
        summarizer: build_agent(&config, AgentRole::Summarizer)?,
        formatter: build_agent(&config, AgentRole::Formatter)?,
        researcher: build_agent(&config, AgentRole::Researcher)?,
    };
    let publisher = NotionClient::new(&config.notion)?;

    info!(video = %video, "starting full pipeline");
    let reporter = CliProgress::new();

    let result = match from_file {
        Some(path) => {
            let source = JsonFileSource::new(path);
            run_pipeline(&pipeline_config, &source, &agents, &publisher, &reporter).await?
        }
        None => {
            let source = TimedTextClient::new(lang)?;
            run_pipeline(&pipeline_config, &source, &agents, &publisher, &reporter).await?
        }
    };

    println!();
    println!("  Page published!");
    println!("  Video:    {video}");
    println!("  Sections: {}", result.section_count);
    println!("  Blocks:   {}", result.block_count);
    println!("  Topics:   {}", result.topics.join(", "));
    println!("  Page:     {}", result.page_ref);
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_fetch(video: &str, out: Option<&str>, lang: &str) -> Result<()> {
    let config = load_config()?;
    let video: VideoId = video.parse()?;
    let out = output_dir(&config, out);

    info!(video = %video, lang, "fetching captions");
    let source = TimedTextClient::new(lang)?;
    let fragments = source.fetch(&video).await?;
    stages::save(&out, Stage::Fragments, &video, &fragments)?;

    let sections = segment(&fragments, config.defaults.section_window_secs);
    let path = stages::save(&out, Stage::Sections, &video, &sections)?;

    println!(
        "  {} fragments → {} sections → {}",
        fragments.len(),
        sections.len(),
        path.display()
    );
    Ok(())
}

async fn cmd_summarize(video: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let out = output_dir(&config, out);
    let video = resolve_video(video, &out, Stage::Sections)?;

    let mut sections = stages::load_sections(&out, Stage::Sections, &video)?;
    let agent = build_agent(&config, AgentRole::Summarizer)?;

    info!(video = %video, sections = sections.len(), "summarizing sections");
    let bar = section_bar(sections.len());
    for section in sections.iter_mut() {
        section.summary = Some(agent.run(&section.text).await?);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let path = stages::save(&out, Stage::Summarized, &video, &sections)?;
    println!("  Summarized {} sections → {}", sections.len(), path.display());
    Ok(())
}

async fn cmd_format(video: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let out = output_dir(&config, out);
    let video = resolve_video(video, &out, Stage::Summarized)?;

    let mut sections = stages::load_sections(&out, Stage::Summarized, &video)?;
    let agent = build_agent(&config, AgentRole::Formatter)?;

    info!(video = %video, sections = sections.len(), "formatting summaries");
    let bar = section_bar(sections.len());
    for section in sections.iter_mut() {
        if let Some(summary) = section.summary.as_deref() {
            section.formatted_summary = Some(agent.run(summary).await?);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let path = stages::save(&out, Stage::Formatted, &video, &sections)?;
    println!("  Formatted {} sections → {}", sections.len(), path.display());
    Ok(())
}

async fn cmd_research(video: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let out = output_dir(&config, out);
    let video = resolve_video(video, &out, Stage::Formatted)?;

    let sections = stages::load_sections(&out, Stage::Formatted, &video)?;
    let topics = extract_topics(&sections, config.defaults.max_topics);
    if topics.is_empty() {
        println!("  No research topics found in formatted sections.");
        return Ok(());
    }

    let agent = build_agent(&config, AgentRole::Researcher)?;
    info!(video = %video, topics = topics.len(), "researching topics");

    let bar = section_bar(topics.len());
    let mut research: BTreeMap<String, String> = BTreeMap::new();
    for topic in &topics {
        let prompt = format!("Research and explain the topic: {topic}");
        research.insert(topic.clone(), agent.run(&prompt).await?);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let path = stages::save(&out, Stage::Research, &video, &research)?;
    println!("  Researched {}: {}", topics.join(", "), path.display());
    Ok(())
}

async fn cmd_compile(video: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let out = output_dir(&config, out);
    let video = resolve_video(video, &out, Stage::Formatted)?;

    let sections = stages::load_sections(&out, Stage::Formatted, &video)?;
    // Research is optional at compile time.
    let research = stages::load_research(&out, &video).unwrap_or_default();

    let blocks = pipeline::compile_document(&sections, &research);
    if blocks.is_empty() {
        return Err(eyre!(
            "no blocks compiled — have the sections been formatted yet?"
        ));
    }

    let path = stages::save(&out, Stage::Blocks, &video, &blocks)?;
    println!("  Compiled {} blocks → {}", blocks.len(), path.display());
    Ok(())
}

async fn cmd_publish(video: Option<&str>, title: Option<String>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let out = output_dir(&config, out);
    let video = resolve_video(video, &out, Stage::Blocks)?;

    let blocks = stages::load_blocks(&out, &video)?;
    let publisher = NotionClient::new(&config.notion)?;

    let title = title.unwrap_or_else(|| format!("Atlas Summary: YouTube Video {video}"));
    info!(video = %video, blocks = blocks.len(), "publishing page");

    let page_ref = publisher.publish(&title, &blocks).await?;
    println!("  Page published: {page_ref}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("  Config written to {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)?;
    println!("{rendered}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Per-item progress bar for the agent loops.
fn section_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("  [{bar:30.cyan/dim}] {pos}/{len}")
            .expect("progress template")
            .progress_chars("=> "),
    );
    bar
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, stage: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("{stage} [{current}/{total}]"));
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
