use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use inbox_harvest::auth::token_store::{self, Secret};
use inbox_harvest::config::{Config, check_window_days, load_config};
use inbox_harvest::domain::entry::ExportFormat;
use inbox_harvest::domain::timestamp::Window;
use inbox_harvest::remote::client::InboxClient;
use inbox_harvest::run::{RunOptions, run_digest, run_export};
use inbox_harvest::store::fs::FsStore;
use inbox_harvest::summarize::{OpenAiChat, Summarizer};

#[derive(Parser)]
#[command(name = "inbox_harvest")]
#[command(about = "Export and summarize recent read-it-later items", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Trailing window size in days
    #[arg(long)]
    days: Option<i64>,

    /// Export format: html, text or md
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Export recent items and write a JSON report (plus HTML files)
    Export(RunArgs),

    /// Export and summarize recent items into a dated Markdown digest
    Digest(RunArgs),

    /// Print the raw tag listing
    Tags,

    /// Store a credential in the OS keyring
    SetSecret {
        #[arg(value_enum)]
        name: Secret,
    },
}

fn options(cfg: &Config, args: &RunArgs, default_format: ExportFormat) -> Result<(RunOptions, PathBuf)> {
    let days = args.days.unwrap_or(cfg.window_days);
    check_window_days(days).map_err(|e| anyhow!("--days: {e}"))?;
    let opts = RunOptions {
        window: Window::trailing(days),
        order: cfg.sort,
        format: args.format.unwrap_or(default_format),
        delays: cfg.delays(),
    };
    let out = args.out.clone().unwrap_or_else(|| PathBuf::from(&cfg.output_dir));
    Ok((opts, out))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetSecret { name } => {
            eprintln!("Paste the secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_secret(name, secret.trim())?;
            println!("Saved {:?} into the keyring", name);
            Ok(())
        }

        Command::Tags => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let client = InboxClient::new(&cfg.base_url, token_store::resolve(Secret::InboxToken)?)?;
            println!("{}", serde_json::to_string_pretty(&client.list_tags()?)?);
            Ok(())
        }

        Command::Export(args) => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let (opts, out) = options(&cfg, &args, ExportFormat::Html)?;
            let client = InboxClient::new(&cfg.base_url, token_store::resolve(Secret::InboxToken)?)?;
            let store = FsStore::open(&out)?;

            let (report, path) = run_export(&client, &client, &store, &opts)
                .inspect_err(|e| log::error!("run aborted: {e}"))?;
            println!("Processed: {}", report.total_items);
            println!("Exported:  {}", report.successful_exports);
            println!("Report:    {}", path.display());
            Ok(())
        }

        Command::Digest(args) => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let (opts, out) = options(&cfg, &args, ExportFormat::Md)?;
            let client = InboxClient::new(&cfg.base_url, token_store::resolve(Secret::InboxToken)?)?;
            let chat = OpenAiChat::new(
                &cfg.llm.base_url,
                token_store::resolve(Secret::LlmApiKey)?,
                &cfg.llm.model,
            )?;
            let summarizer = Summarizer::new(Box::new(chat), &cfg.llm.language, cfg.llm.max_input_chars);
            let store = FsStore::open(&out)?;

            let today = chrono::Local::now().date_naive();
            let (digest, path) = run_digest(&client, &client, &summarizer, &store, &opts, today)
                .inspect_err(|e| log::error!("run aborted: {e}"))?;
            println!("Processed:  {}", digest.total_items);
            println!("Summarized: {}", digest.entries.len());
            println!("Digest:     {}", path.display());
            Ok(())
        }
    }
}
