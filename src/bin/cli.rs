//! webframe shell
//!
//! Opens a Chrome tab as the content surface and reads commands from stdin.
//! Any line that is not a command is submitted as input.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use webframe::auth::UnconfiguredAuthenticator;
use webframe::bridge::message::envelope_schema;
use webframe::navigation::DEFAULT_SEARCH_HOST;
use webframe::surface::ConnectionOptions;
use webframe::{
    BridgeOptions, Key, LaunchOptions, NativeSurface, Normalizer, Screen, ScreenDriver, ScreenEvent, ScreenUpdate,
    SearchEngine,
};

#[derive(Parser)]
#[command(name = "webframe")]
#[command(version)]
#[command(about = "Embedded browser screen with a sign-in bridge", long_about = None)]
struct Cli {
    /// Percent-encoded address to open on startup
    #[arg(value_name = "ADDRESS")]
    deep_link: Option<String>,

    /// Origin allowed to exchange sign-in messages
    #[arg(
        long,
        env = "WEBFRAME_TRUSTED_ORIGIN",
        value_name = "ORIGIN",
        required_unless_present = "print_schema"
    )]
    trusted_origin: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Host that free-text queries are sent to
    #[arg(long, env = "WEBFRAME_SEARCH_HOST", default_value = DEFAULT_SEARCH_HOST)]
    search_host: String,

    /// Delay between load completion and the fullscreen request
    #[arg(long, value_name = "MS", default_value_t = 800)]
    fullscreen_delay_ms: u64,

    /// Never request fullscreen
    #[arg(long)]
    no_fullscreen: bool,

    /// How often to check the browser for page events
    #[arg(long, value_name = "MS", default_value_t = 100)]
    poll_ms: u64,

    /// Print the JSON Schema of the page message envelope and exit
    #[arg(long)]
    print_schema: bool,
}

const HELP: &str = "\
commands:
    <text>      submit as an address or search
    :home       close the page
    :esc        press Escape
    :retry      retry a failed load
    :open       open the page in the system browser
    :reload     reload the page
    :back       history back
    :forward    history forward
    :quit       exit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_schema {
        println!("{}", serde_json::to_string_pretty(&envelope_schema())?);
        return Ok(());
    }

    let origin = cli
        .trusted_origin
        .as_deref()
        .context("--trusted-origin is required")?;
    let options = BridgeOptions::for_origin(origin)
        .context("Invalid trusted origin")?
        .fullscreen_delay(Duration::from_millis(cli.fullscreen_delay_ms))
        .auto_fullscreen(!cli.no_fullscreen);

    let surface = match cli.ws_endpoint {
        Some(ref endpoint) => {
            eprintln!("Connecting to {}", endpoint);
            NativeSurface::connect(ConnectionOptions::new(endpoint.clone()))
        }
        None => {
            let mut launch = LaunchOptions::new().headless(!cli.headed);
            if let Some(ref path) = cli.executable_path {
                launch = launch.chrome_path(path);
            }
            eprintln!("Browser mode: {}", if cli.headed { "headed" } else { "headless" });
            NativeSurface::launch(launch)
        }
    }
    .context("Failed to start browser")?;

    let screen = Screen::new(surface, options).with_normalizer(Normalizer::new(SearchEngine::new(&cli.search_host)));
    let mut driver = ScreenDriver::new(screen, Arc::new(UnconfiguredAuthenticator))
        .poll_every(Duration::from_millis(cli.poll_ms.max(10)));
    let mut updates = driver.subscribe();
    let events = driver.sender();

    if let Some(link) = cli.deep_link {
        events.send(ScreenEvent::DeepLink(link))?;
    }

    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            print_update(&update);
        }
    });

    let input = events.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => match parse_command(line.trim()) {
                    Some(event) => event,
                    None => continue,
                },
                Ok(None) => ScreenEvent::Shutdown,
                Err(e) => {
                    log::warn!("Failed to read stdin: {}", e);
                    ScreenEvent::Shutdown
                }
            };
            let quit = matches!(event, ScreenEvent::Shutdown);
            if input.send(event).is_err() || quit {
                break;
            }
        }
    });

    eprintln!("{}", HELP);
    let mut screen = driver.run().await;
    screen.go_home(webframe::HomeReason::Programmatic);

    Ok(())
}

fn parse_command(line: &str) -> Option<ScreenEvent> {
    let event = match line {
        "" => return None,
        ":home" => ScreenEvent::GoHome,
        ":esc" => ScreenEvent::Key(Key::Escape),
        ":retry" => ScreenEvent::Retry,
        ":open" => ScreenEvent::OpenExternally,
        ":reload" => ScreenEvent::Reload,
        ":back" => ScreenEvent::GoBack,
        ":forward" => ScreenEvent::GoForward,
        ":quit" | ":q" => ScreenEvent::Shutdown,
        ":help" => {
            eprintln!("{}", HELP);
            return None;
        }
        text => ScreenEvent::Navigate(text.to_string()),
    };
    Some(event)
}

fn print_update(update: &ScreenUpdate) {
    match update {
        ScreenUpdate::State(state) => match state.error_message() {
            Some(message) => println!("state: errored ({})", message),
            None => println!("state: {:?}", state),
        },
        ScreenUpdate::Address(address) => println!("address: {}", address),
        ScreenUpdate::Recovery(actions) => println!("recovery: {:?} (use :open or :retry)", actions),
        ScreenUpdate::FullscreenEntered(method) => println!("fullscreen: {}", method),
        ScreenUpdate::SignInRelayed { delivered } => println!("sign-in relayed: {}", delivered),
    }
}
