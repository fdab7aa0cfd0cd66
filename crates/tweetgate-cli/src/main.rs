// ============================================================================
// post-tweet: publish one post with credentials saved by auth-server
// ============================================================================
// Usage:
//   post-tweet                              Post the default text
//   post-tweet --text "hello"               Post custom text
//   post-tweet --auth-file path/to.json     Read credentials from elsewhere
//
// Exit code 1 when the credential file is missing or unreadable. A failed
// post is reported on stderr but still exits 0.
// ============================================================================

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tweetgate_core::{
    post_with_stored_credentials, FileCredentialStore, PostDraft, TweetgateError,
    TwitterExecutor, DEFAULT_AUTH_DATA_FILE, DEFAULT_POST_TEXT,
};

/// Post a single tweet using the stored OAuth 2.0 access token
#[derive(Parser)]
#[command(name = "post-tweet", version, about = "Publish one post using credentials saved by auth-server")]
struct Cli {
    /// Text of the post
    #[arg(long, default_value = DEFAULT_POST_TEXT)]
    text: String,

    /// Credential file written by auth-server
    #[arg(long, env = "AUTH_DATA_PATH", default_value = DEFAULT_AUTH_DATA_FILE)]
    auth_file: PathBuf,

    /// Media IDs to attach (accepted but not sent; media attachment is unsupported)
    #[arg(long = "media-id")]
    media_ids: Vec<String>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("warn,tweetgate_core=info,post_tweet=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    init_logging();

    let cli = Cli::parse();
    let store = FileCredentialStore::new(cli.auth_file);

    let draft = PostDraft::new(cli.text).with_media_ids(cli.media_ids);

    let outcome = post_with_stored_credentials(
        &store,
        |credentials| {
            println!("{}", credentials.access_token);
            TwitterExecutor::new(credentials.access_token.clone())
        },
        &draft,
    )
    .await;

    match outcome {
        Ok(result) => {
            let response = serde_json::json!({ "data": result.data });
            println!(
                "Tweet posted successfully: {}",
                serde_json::to_string_pretty(&response)?
            );
            println!("{}", result.url);
        }
        // Nothing to authenticate with: exit 1
        Err(e @ TweetgateError::CredentialLoad(_)) => return Err(e.into()),
        Err(e) => eprintln!("Error posting tweet: {}", e),
    }

    Ok(())
}
