//! Terminal follow button: shows the follow state of one user and keeps it
//! live from the relay.

use clap::Parser;
use futures::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use social_relay::client::{FileFollowCache, FollowWidget, HttpFollowApi, WidgetState};
use social_relay::models::RelayEvent;

#[derive(Parser, Debug)]
#[command(name = "follow-watch", about = "Watch (and toggle) the follow state of a user")]
struct Args {
    /// Base URL of the social relay service
    #[arg(long, env = "SOCIAL_RELAY_URL", default_value = "http://localhost:3002")]
    server: String,

    /// Bearer token of the viewer
    #[arg(long, env = "SOCIAL_RELAY_TOKEN")]
    token: String,

    /// Id of the viewing user (the token subject)
    #[arg(long)]
    viewer: String,

    /// Id of the user whose follow button is shown
    #[arg(long)]
    target: String,

    /// Local follow-state cache
    #[arg(long, default_value = "follow-cache.json")]
    cache: std::path::PathBuf,

    /// Follow/unfollow once before watching
    #[arg(long)]
    toggle: bool,
}

fn print_state(target: &str, state: &WidgetState) {
    println!(
        "{} {} · {} follower(s) [{:?}]",
        if state.is_following { "✅ Following" } else { "➕ Follow" },
        target,
        state.followers_count,
        state.source
    );
}

fn relay_url(server: &str, token: &str) -> String {
    let base = server.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws?token={}", ws_base, urlencoding::encode(token))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let args = Args::parse();

    let api = HttpFollowApi::new(&args.server, args.token.clone())?;
    let cache = FileFollowCache::new(&args.cache);
    let mut widget = FollowWidget::new(api, cache, args.viewer.clone(), args.target.clone());

    if let Err(e) = widget.mount().await {
        eprintln!("⚠️  Showing cached state, server unavailable: {}", e);
    }
    print_state(&args.target, widget.state());

    if args.toggle {
        match widget.toggle().await {
            Ok(state) => print_state(&args.target, &state),
            Err(e) => eprintln!("❌ {}", e),
        }
    }

    let (mut socket, _) = connect_async(relay_url(&args.server, &args.token)).await?;
    log::info!("🔌 Connected to relay");

    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => match RelayEvent::from_frame(&text) {
                Ok(RelayEvent::Error(notice)) => eprintln!("❌ {}", notice.message),
                Ok(event) => {
                    if widget.apply_event(&event) {
                        print_state(&args.target, widget.state());
                    }
                }
                Err(e) => log::debug!("Ignoring relay frame: {}", e),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    log::info!("🔌 Relay closed");
    Ok(())
}
