//! # chatlog
//!
//! Extracts conversations from a local chat storage root into JSON
//! transcripts: lists conversations, lets the user pick some, then renders
//! every message with its media paths and speaker.

mod config;
mod menu;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chatlog_media::{
    CommandDecryptor, Decryptor, PathResolver, StorageLayout, Transcoder, UnavailableDecryptor,
};
use chatlog_render::{ContentRenderer, Participants, TranscriptBuilder};
use chatlog_shared::constants::APP_NAME;
use chatlog_shared::{ContactIdentity, DiagnosticSink, NicknameLookup, RecordingSink, TracingSink};
use chatlog_store::{ChatStore, ConversationSummary};

use crate::config::ExtractConfig;

#[derive(Parser)]
#[command(name = "chatlog")]
#[command(about = "Extract chat history into JSON transcripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage root of one local account, e.g. `.../User/wxid_xxx`.
    data_path: PathBuf,

    /// Directory for transcript files (env: CHATLOG_OUTPUT_DIR).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Local account id; defaults to the last component of DATA_PATH.
    #[arg(long)]
    account_id: Option<String>,

    /// Comma-separated conversation indices; skips the prompt.
    #[arg(short, long)]
    select: Option<String>,

    /// Where decrypted images are written (env: CHATLOG_IMAGE_DIR).
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Command run as `<cmd> <encrypted> <output>` to decrypt images
    /// (env: CHATLOG_DECRYPT_CMD).
    #[arg(long)]
    decrypt_cmd: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chatlog_cli=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ExtractConfig::from_env();
    config.data_path = cli.data_path;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(id) = cli.account_id {
        config.account_id = Some(id);
    }
    if let Some(dir) = cli.image_dir {
        config.image_dir = Some(dir);
    }
    if let Some(cmd) = cli.decrypt_cmd {
        config.decrypt_cmd = Some(cmd);
    }
    config.selection = cli.select;

    info!("Starting {APP_NAME} v{}", env!("CARGO_PKG_VERSION"));
    run(&config)
}

fn run(config: &ExtractConfig) -> anyhow::Result<()> {
    if !config.data_path.exists() {
        bail!("data path does not exist: {}", config.data_path.display());
    }

    let store = ChatStore::open(&config.data_path)
        .with_context(|| format!("opening storage at {}", config.data_path.display()))?;

    let conversations = store.list_conversations()?;
    if conversations.is_empty() {
        bail!("no conversations found");
    }

    println!("{}", menu::render_menu(&conversations));
    let input = match &config.selection {
        Some(selection) => selection.clone(),
        None => menu::prompt_line("Enter conversation indices (comma-separated, e.g. 1,3): ")?,
    };
    let selected = menu::parse_selection(&input, conversations.len())?;

    let account_id = config.account_id()?;
    let local = ContactIdentity {
        nickname: store.display_name(&account_id),
        account_id,
    };
    info!(
        data_path = %config.data_path.display(),
        account = %local.account_id,
        selected = selected.len(),
        "Extracting conversations"
    );

    let recorder = Arc::new(RecordingSink::default());
    let sink: Arc<dyn DiagnosticSink> = Arc::new((TracingSink, recorder.clone()));
    let renderer = build_renderer(config, &local.account_id, sink.clone());

    let mut written = 0;
    for (n, index) in selected.iter().enumerate() {
        let conversation = &conversations[*index];
        info!(
            progress = %format!("{}/{}", n + 1, selected.len()),
            talker = %conversation.account_id,
            "Processing conversation"
        );

        match extract_one(config, &store, &renderer, sink.clone(), &local, conversation) {
            Ok(path) => {
                println!("Saved transcript to {}", path.display());
                written += 1;
            }
            Err(e) => warn!(
                talker = %conversation.account_id,
                error = %format!("{e:#}"),
                "Skipping conversation"
            ),
        }
    }

    let degraded = recorder.events().len();
    info!(written, degraded, "Extraction finished");
    Ok(())
}

fn build_renderer(
    config: &ExtractConfig,
    account_id: &str,
    sink: Arc<dyn DiagnosticSink>,
) -> ContentRenderer {
    let decryptor: Arc<dyn Decryptor> = match config
        .decrypt_cmd
        .as_deref()
        .and_then(CommandDecryptor::from_command_line)
    {
        Some(cmd) => Arc::new(cmd),
        None => {
            info!("No decrypt command configured, images keep their encrypted path");
            Arc::new(UnavailableDecryptor)
        }
    };

    let resolver = PathResolver::new(
        StorageLayout::new(&config.data_path),
        account_id,
        sink.clone(),
    );
    let transcoder = Transcoder::new(decryptor, config.image_dir(), sink);
    ContentRenderer::new(resolver, transcoder)
}

fn extract_one(
    config: &ExtractConfig,
    store: &ChatStore,
    renderer: &ContentRenderer,
    sink: Arc<dyn DiagnosticSink>,
    local: &ContactIdentity,
    conversation: &ConversationSummary,
) -> anyhow::Result<PathBuf> {
    let messages = store.messages_for(&conversation.account_id)?;

    let counterpart = conversation.identity();
    let participants = Participants {
        local: local.clone(),
        counterpart: counterpart.clone(),
    };
    let transcript = TranscriptBuilder::new(renderer, store, sink, participants).build(&messages)?;

    let file_name =
        output::transcript_file_name(local.display_name(), counterpart.display_name(), &transcript);
    output::write_transcript(&config.output_dir, &file_name, &transcript)
}
