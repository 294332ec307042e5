use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use webframe::auth::AuthResult;
use webframe::bridge::{FullscreenDirection, RawMessage, RecoveryAction};
use webframe::surface::{SurfaceEvent, SurfaceKind, SurfaceTask};
use webframe::{
    AuthError, AuthTokens, Authenticator, BridgeMessage, BridgeOptions, ContentSurface, Destination, FrameSurface,
    Key, LoadState, Result, Screen, ScreenDriver, ScreenEvent, ScreenUpdate, TrustedOrigin,
};

const ORIGIN: &str = "https://app.example.com";

struct CountingAuthenticator {
    calls: Arc<AtomicUsize>,
    result: AuthResult,
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn sign_in(&self) -> AuthResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.result.clone()
    }
}

fn driver(result: AuthResult) -> (ScreenDriver<FrameSurface>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let authenticator = Arc::new(CountingAuthenticator {
        calls: Arc::clone(&calls),
        result,
    });
    let surface = FrameSurface::new("content").with_fullscreen_methods(["webkitRequestFullscreen", "exitFullscreen"]);
    let screen = Screen::new(surface, BridgeOptions::for_origin(ORIGIN).unwrap());
    (ScreenDriver::new(screen, authenticator), calls)
}

fn loaded(address: &str) -> ScreenEvent {
    ScreenEvent::Surface(SurfaceEvent::LoadFinished {
        address: address.to_string(),
    })
}

fn page_message(origin: &str, data: serde_json::Value) -> ScreenEvent {
    ScreenEvent::Surface(SurfaceEvent::Message {
        origin: origin.to_string(),
        raw: RawMessage::Object(data),
    })
}

fn drain(updates: &mut UnboundedReceiver<ScreenUpdate>) -> Vec<ScreenUpdate> {
    let mut collected = Vec::new();
    while let Ok(update) = updates.try_recv() {
        collected.push(update);
    }
    collected
}

#[tokio::test(start_paused = true)]
async fn test_auth_request_relays_single_response() {
    let (mut driver, calls) = driver(Ok(AuthTokens::new().with_access_token("T")));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("app.example.com".into())).unwrap();
    tx.send(loaded(ORIGIN)).unwrap();
    tx.send(page_message(ORIGIN, json!({"type": "GOOGLE_AUTH_REQUEST"}))).unwrap();
    // Ignored while the first sign-in is running
    tx.send(page_message(ORIGIN, json!({"type": "GOOGLE_AUTH_REQUEST"}))).unwrap();

    let (mut screen, relayed) = tokio::join!(driver.run(), async {
        let mut relayed = Vec::new();
        while let Some(update) = updates.recv().await {
            if let ScreenUpdate::SignInRelayed { delivered } = update {
                relayed.push(delivered);
                break;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = tx.send(ScreenEvent::Shutdown);
        relayed.extend(drain(&mut updates).into_iter().filter_map(|u| match u {
            ScreenUpdate::SignInRelayed { delivered } => Some(delivered),
            _ => None,
        }));
        relayed
    });

    assert_eq!(relayed, vec![true]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let posted = screen.bridge_mut().surface_mut().take_posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].target_origin, ORIGIN);
    assert_eq!(
        posted[0].data,
        json!({"type": "GOOGLE_AUTH_RESPONSE", "success": true, "data": {"accessToken": "T"}})
    );
}

#[tokio::test(start_paused = true)]
async fn test_untrusted_origin_never_signs_in() {
    let (mut driver, calls) = driver(Ok(AuthTokens::new().with_access_token("T")));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("app.example.com".into())).unwrap();
    tx.send(loaded(ORIGIN)).unwrap();

    tx.send(page_message("https://evil.example.com", json!({"type": "GOOGLE_AUTH_REQUEST"})))
        .unwrap();
    tx.send(page_message("null", json!({"type": "GOOGLE_AUTH_REQUEST"}))).unwrap();

    let (mut screen, _) = tokio::join!(driver.run(), async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let _ = tx.send(ScreenEvent::Shutdown);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(screen.bridge_mut().surface_mut().take_posted().is_empty());
    assert_eq!(screen.bridge().state(), &LoadState::Loaded);
    assert!(
        !drain(&mut updates)
            .iter()
            .any(|u| matches!(u, ScreenUpdate::SignInRelayed { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_sign_in_reaches_page() {
    let (mut driver, calls) = driver(Err(AuthError::Provider("access_denied".into())));
    let tx = driver.sender();
    let mut updates = driver.subscribe();

    tx.send(ScreenEvent::Navigate("app.example.com".into())).unwrap();
    tx.send(loaded(ORIGIN)).unwrap();
    tx.send(page_message(ORIGIN, json!(r#"{"type":"GOOGLE_AUTH_REQUEST"}"#))).unwrap();

    let (mut screen, _) = tokio::join!(driver.run(), async {
        while let Some(update) = updates.recv().await {
            if matches!(update, ScreenUpdate::SignInRelayed { .. }) {
                break;
            }
        }
        let _ = tx.send(ScreenEvent::Shutdown);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let posted = screen.bridge_mut().surface_mut().take_posted();
    assert_eq!(
        posted[0].data,
        json!({
            "type": "GOOGLE_AUTH_RESPONSE",
            "success": false,
            "data": {"error": "Identity provider error: access_denied"}
        })
    );
    assert_eq!(screen.bridge().state(), &LoadState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn test_fullscreen_after_delay() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("openai.com".into())).unwrap();
    tx.send(loaded("https://openai.com")).unwrap();

    let start = tokio::time::Instant::now();
    let (screen, entered_after) = tokio::join!(driver.run(), async {
        let mut entered_after = None;
        while let Some(update) = updates.recv().await {
            if let ScreenUpdate::FullscreenEntered(method) = update {
                assert_eq!(method, "webkitRequestFullscreen");
                entered_after = Some(start.elapsed());
                break;
            }
        }
        let _ = tx.send(ScreenEvent::Shutdown);
        entered_after
    });

    assert!(entered_after.unwrap() >= Duration::from_millis(800));
    assert!(screen.bridge().surface().is_fullscreen());
}

#[tokio::test(start_paused = true)]
async fn test_stale_fullscreen_timer_ignored() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("openai.com".into())).unwrap();
    tx.send(loaded("https://openai.com")).unwrap();
    tx.send(ScreenEvent::Navigate("docs.rs".into())).unwrap();

    let (screen, _) = tokio::join!(driver.run(), async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let _ = tx.send(ScreenEvent::Shutdown);
    });

    assert!(!screen.bridge().surface().is_fullscreen());
    assert!(
        !drain(&mut updates)
            .iter()
            .any(|u| matches!(u, ScreenUpdate::FullscreenEntered(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_offers_recovery_and_retry() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("blocked.example.com".into())).unwrap();
    tx.send(ScreenEvent::Surface(SurfaceEvent::LoadFailed {
        address: "https://blocked.example.com".into(),
        reason: "Refused to display in a frame".into(),
    }))
    .unwrap();
    tx.send(ScreenEvent::Retry).unwrap();
    tx.send(ScreenEvent::Shutdown).unwrap();

    let screen = driver.run().await;
    let updates = drain(&mut updates);

    assert_eq!(
        updates,
        vec![
            ScreenUpdate::State(LoadState::Loading),
            ScreenUpdate::Address("https://blocked.example.com".into()),
            ScreenUpdate::State(LoadState::Errored("This page could not be loaded.".into())),
            ScreenUpdate::Recovery(vec![
                RecoveryAction::OpenExternally(Destination::from_resolved("https://blocked.example.com")),
                RecoveryAction::Retry,
            ]),
            ScreenUpdate::State(LoadState::Loading),
            ScreenUpdate::Address("https://blocked.example.com".into()),
        ]
    );
    assert_eq!(screen.bridge().surface().src(), Some("https://blocked.example.com"));
}

#[tokio::test(start_paused = true)]
async fn test_escape_returns_home() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Key(Key::Escape)).unwrap();
    tx.send(ScreenEvent::Navigate("openai.com".into())).unwrap();
    tx.send(ScreenEvent::Key(Key::Escape)).unwrap();
    tx.send(ScreenEvent::Shutdown).unwrap();

    let screen = driver.run().await;

    assert!(!screen.is_showing_content());
    assert_eq!(screen.bridge().state(), &LoadState::Idle);
    assert_eq!(screen.keyboard().listener_count(), 0);
    assert_eq!(
        drain(&mut updates),
        vec![
            ScreenUpdate::State(LoadState::Loading),
            ScreenUpdate::Address("https://openai.com".into()),
            ScreenUpdate::State(LoadState::Idle),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_submit_does_nothing() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Input("   ".into())).unwrap();
    tx.send(ScreenEvent::Submit).unwrap();
    tx.send(ScreenEvent::Shutdown).unwrap();

    let screen = driver.run().await;

    assert_eq!(screen.bridge().state(), &LoadState::Idle);
    assert!(screen.bridge().surface().src().is_none());
    assert!(drain(&mut updates).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deep_link_loads_immediately() {
    let (mut driver, _) = driver(Err(AuthError::Unconfigured));
    let tx = driver.sender();

    tx.send(ScreenEvent::DeepLink("https%3A%2F%2Fapp.example.com%2Fhome".into()))
        .unwrap();
    tx.send(ScreenEvent::Shutdown).unwrap();

    let screen = driver.run().await;

    assert!(!screen.autofocus());
    assert_eq!(screen.bridge().state(), &LoadState::Loading);
    assert_eq!(screen.bridge().surface().src(), Some("https://app.example.com/home"));
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_not_relayed_into_replacement_page() {
    let (mut driver, calls) = driver(Ok(AuthTokens::new().with_access_token("A-token")));
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("app.example.com/a".into())).unwrap();
    tx.send(loaded("https://app.example.com/a")).unwrap();
    tx.send(page_message(ORIGIN, json!({"type": "GOOGLE_AUTH_REQUEST"}))).unwrap();
    tx.send(ScreenEvent::GoHome).unwrap();
    tx.send(ScreenEvent::Navigate("app.example.com/b".into())).unwrap();
    tx.send(loaded("https://app.example.com/b")).unwrap();

    let (mut screen, _) = tokio::join!(driver.run(), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = tx.send(ScreenEvent::Shutdown);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!screen.bridge().is_sign_in_pending());
    assert!(screen.bridge_mut().surface_mut().take_posted().is_empty());
}

/// Surface whose loads finish on a worker thread once the gate opens
struct GatedSurface {
    gate: Arc<Mutex<mpsc::Receiver<()>>>,
    events: VecDeque<SurfaceEvent>,
    tasks: Vec<SurfaceTask>,
}

impl ContentSurface for GatedSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Native
    }

    fn load(&mut self, destination: &Destination) -> Result<()> {
        let address = destination.as_str().to_string();
        self.events.push_back(SurfaceEvent::LoadStarted {
            address: address.clone(),
        });

        let gate = Arc::clone(&self.gate);
        self.tasks.push(Box::new(move || {
            let _ = gate.lock().unwrap().recv();
            vec![SurfaceEvent::LoadFinished { address }]
        }));
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        Ok(())
    }

    fn go_forward(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_message(&mut self, _message: &BridgeMessage, _target: &TrustedOrigin) -> Result<()> {
        Ok(())
    }

    fn invoke_fullscreen(&mut self, _direction: FullscreenDirection, _method: &str) -> Result<()> {
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.drain(..).collect()
    }

    fn take_tasks(&mut self) -> Vec<SurfaceTask> {
        std::mem::take(&mut self.tasks)
    }

    fn unload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_load_does_not_block_escape() {
    let (release, gate) = mpsc::channel();
    let surface = GatedSurface {
        gate: Arc::new(Mutex::new(gate)),
        events: VecDeque::new(),
        tasks: Vec::new(),
    };
    let screen = Screen::new(surface, BridgeOptions::for_origin(ORIGIN).unwrap());
    let mut driver = ScreenDriver::new(screen, Arc::new(webframe::auth::UnconfiguredAuthenticator));
    let mut updates = driver.subscribe();
    let tx = driver.sender();

    tx.send(ScreenEvent::Navigate("openai.com".into())).unwrap();
    tx.send(ScreenEvent::Key(Key::Escape)).unwrap();

    let (screen, seen) = tokio::join!(driver.run(), async {
        let mut seen = Vec::new();
        // Escape is handled while the load is still waiting on the gate
        while let Some(update) = updates.recv().await {
            let idle = update == ScreenUpdate::State(LoadState::Idle);
            seen.push(update);
            if idle {
                break;
            }
        }

        release.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(ScreenEvent::Shutdown);
        seen.extend(drain(&mut updates));
        seen
    });

    assert_eq!(screen.bridge().state(), &LoadState::Idle);
    assert!(!seen.contains(&ScreenUpdate::State(LoadState::Loaded)));
}
