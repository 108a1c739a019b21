use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use warroom::compose::{self, Composer};
use warroom::config::{Config, ConfigError};
use warroom::net::api::{ApiClient, ApiError};
use warroom::net::link::{LinkStatus, ReconnectPolicy};
use warroom::render;
use warroom::session::{self, SessionSnapshot};
use warroom::state::channels::ChannelsState;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no channel available; pass a channel id or set an incident scope")]
    MissingChannel,
    #[error("cannot read attachment {path}: {error}")]
    Attachment { path: String, error: io::Error },
    #[error("input/output failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("chat session ended unexpectedly")]
    SessionEnded,
}

#[derive(Parser, Debug)]
#[command(name = "warroom", about = "Security-operations collab chat client")]
struct Cli {
    #[arg(long, env = "WARROOM_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    #[arg(long, env = "WARROOM_USER", default_value = "analyst")]
    user: String,

    #[arg(long, env = "WARROOM_INCIDENT_ID")]
    incident_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Channels(ChannelsCommand),
    Messages(MessagesCommand),
    /// Follow a channel live, printing list mutations as they apply.
    Tail {
        channel_id: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ChannelsCommand {
    #[command(subcommand)]
    command: ChannelsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChannelsSubcommand {
    List,
}

#[derive(Args, Debug)]
struct MessagesCommand {
    #[command(subcommand)]
    command: MessagesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MessagesSubcommand {
    List {
        channel_id: String,
        #[arg(long, default_value_t = session::HISTORY_LIMIT)]
        limit: u32,
    },
    Search {
        channel_id: String,
        query: String,
    },
    Send {
        channel_id: String,
        content: String,
        #[arg(long = "attach", help = "Attach a local file's metadata")]
        attachments: Vec<PathBuf>,
        #[arg(long)]
        reply_to: Option<String>,
    },
    React {
        message_id: String,
        emoji: String,
    },
    Delete {
        message_id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config {
        base_url: cli.base_url,
        user: cli.user,
        incident_id: cli.incident_id,
    };
    let api = ApiClient::new(config);

    match cli.command {
        Command::Channels(channels) => run_channels(&api, channels).await,
        Command::Messages(messages) => run_messages(&api, messages).await,
        Command::Tail { channel_id } => run_tail(api, channel_id).await,
    }
}

async fn run_channels(api: &ApiClient, channels: ChannelsCommand) -> Result<(), CliError> {
    match channels.command {
        ChannelsSubcommand::List => {
            let channels = api.list_channels().await?;
            print_json(&serde_json::to_value(&channels)?)
        }
    }
}

async fn run_messages(api: &ApiClient, messages: MessagesCommand) -> Result<(), CliError> {
    match messages.command {
        MessagesSubcommand::List { channel_id, limit } => {
            let page = api.list_messages(&channel_id, limit).await?;
            print_json(&serde_json::to_value(&page)?)
        }
        MessagesSubcommand::Search { channel_id, query } => {
            let results = api.search_messages(&channel_id, &query).await?;
            print_json(&serde_json::to_value(&results)?)
        }
        MessagesSubcommand::Send {
            channel_id,
            content,
            attachments,
            reply_to,
        } => {
            let mut described = Vec::with_capacity(attachments.len());
            for path in &attachments {
                let attachment =
                    compose::describe_path(path).map_err(|error| CliError::Attachment {
                        path: path.display().to_string(),
                        error,
                    })?;
                described.push(attachment);
            }

            let mut composer = Composer::new(
                api.config().user.clone(),
                channel_id,
                api.config().incident_id.clone(),
            );
            composer.set_reply_target(reply_to);
            api.create_message(&composer.draft(content, described))
                .await?;
            eprintln!("sent; the message will appear via the channel socket");
            Ok(())
        }
        MessagesSubcommand::React { message_id, emoji } => {
            api.add_reaction(&message_id, &emoji).await?;
            eprintln!("reaction sent");
            Ok(())
        }
        MessagesSubcommand::Delete { message_id, yes } => {
            if !yes && !confirm_delete(&message_id)? {
                eprintln!("aborted");
                return Ok(());
            }
            api.delete_message(&message_id).await?;
            eprintln!("delete requested");
            Ok(())
        }
    }
}

async fn run_tail(api: ApiClient, channel_id: Option<String>) -> Result<(), CliError> {
    let channel_id = match channel_id {
        Some(id) => id,
        None => resolve_channel(&api).await?,
    };

    eprintln!("tailing channel {channel_id} (ctrl-c to exit)");
    let handle = session::spawn(api, channel_id, ReconnectPolicy::default());
    let mut watch = handle.watch();
    let mut last = SessionSnapshot::default();

    loop {
        if watch.changed().await.is_err() {
            return Err(CliError::SessionEnded);
        }
        let next = watch.borrow().clone();
        print_tail_delta(&last, &next);
        last = next;
    }
}

/// First-wins channel resolution under the configured incident scope.
async fn resolve_channel(api: &ApiClient) -> Result<String, CliError> {
    let channels = api.list_channels().await?;
    let mut state = ChannelsState::default();
    state.apply_channel_list(channels, api.config().incident_id.is_some());
    state.active_channel_id.ok_or(CliError::MissingChannel)
}

fn print_tail_delta(previous: &SessionSnapshot, next: &SessionSnapshot) {
    if next.status != previous.status {
        match next.status {
            LinkStatus::Connected => eprintln!("· connected"),
            LinkStatus::Connecting => eprintln!("· connecting..."),
            LinkStatus::Disconnected => eprintln!("· offline"),
        }
    }
    if next.error != previous.error {
        if let Some(error) = &next.error {
            eprintln!("! {error}");
        }
    }

    let known: HashSet<&str> = previous.messages.iter().map(|m| m.id.as_str()).collect();
    for message in &next.messages {
        if !known.contains(message.id.as_str()) {
            println!("{}", render::render_message_line(message));
        }
    }

    let kept: HashSet<&str> = next.messages.iter().map(|m| m.id.as_str()).collect();
    for message in &previous.messages {
        if !kept.contains(message.id.as_str()) {
            eprintln!("✕ message {} deleted", message.id);
        }
    }
}

fn confirm_delete(message_id: &str) -> Result<bool, CliError> {
    eprint!("delete message {message_id}? [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
