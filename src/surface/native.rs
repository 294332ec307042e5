use crate::bridge::fullscreen::FullscreenDirection;
use crate::bridge::message::{BridgeMessage, RawMessage};
use crate::bridge::origin::TrustedOrigin;
use crate::bridge::state::NavigationState;
use crate::error::{BridgeError, Result};
use crate::navigation::Destination;
use crate::surface::config::{ConnectionOptions, LaunchOptions};
use crate::surface::{ContentSurface, SurfaceEvent, SurfaceKind, SurfaceTask};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Tab};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// A message captured by the injected shim
#[derive(Debug, Deserialize)]
struct ShimEnvelope {
    origin: String,
    data: String,
}

/// Content surface backed by a Chrome tab.
///
/// Starting a navigation is a single DevTools call. Waiting for it to finish
/// and polling the page for messages and history are queued as
/// [`SurfaceTask`]s.
pub struct NativeSurface {
    /// Kept alive for as long as the tab is used
    browser: Browser,

    tab: Arc<Tab>,

    /// Randomized global the shim stores its outbox under
    channel: String,

    /// Address of the load in progress or last completed
    requested: Option<String>,

    /// Navigation state as last seen by a poll
    navigation: Arc<Mutex<Option<NavigationState>>>,

    /// Navigations whose wait task has not finished
    navigating: Arc<AtomicUsize>,

    /// Set while a poll task is queued or running
    polling: Arc<AtomicBool>,

    events: VecDeque<SurfaceEvent>,

    tasks: Vec<SurfaceTask>,
}

impl NativeSurface {
    /// Launch a new Chrome instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        if options.start_fullscreen {
            launch_opts.args.push(OsStr::new("--start-fullscreen"));
        }

        // The default 30 second idle timeout closes an interactive session too soon
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser = Browser::new(launch_opts).map_err(|e| BridgeError::LaunchFailed(e.to_string()))?;

        Self::with_browser(browser)
    }

    /// Attach to a running Chrome instance via its DevTools WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| BridgeError::ConnectionFailed(e.to_string()))?;

        Self::with_browser(browser)
    }

    fn with_browser(browser: Browser) -> Result<Self> {
        let tab = browser
            .new_tab()
            .map_err(|e| BridgeError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        let channel = format!(
            "__webframe_{}",
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect::<String>()
        );

        install_shim(&tab, &channel)?;

        Ok(Self {
            browser,
            tab,
            channel,
            requested: None,
            navigation: Arc::new(Mutex::new(None)),
            navigating: Arc::new(AtomicUsize::new(0)),
            polling: Arc::new(AtomicBool::new(false)),
            events: VecDeque::new(),
            tasks: Vec::new(),
        })
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get the tab content is shown in
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Navigation state as last observed
    pub fn navigation(&self) -> Option<NavigationState> {
        self.navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start a navigation and queue the wait for it
    fn navigate(&mut self, address: &str) {
        if let Err(e) = self.tab.navigate_to(address) {
            self.events.push_back(SurfaceEvent::LoadFailed {
                address: address.to_string(),
                reason: e.to_string(),
            });
            return;
        }

        self.events.push_back(SurfaceEvent::LoadStarted {
            address: address.to_string(),
        });
        *self.navigation.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.navigating.fetch_add(1, Ordering::SeqCst);

        let tab = Arc::clone(&self.tab);
        let navigating = Arc::clone(&self.navigating);
        let address = address.to_string();
        self.tasks.push(Box::new(move || {
            let event = match tab.wait_until_navigated() {
                Ok(_) => SurfaceEvent::LoadFinished { address },
                Err(e) => SurfaceEvent::LoadFailed {
                    address,
                    reason: e.to_string(),
                },
            };
            navigating.fetch_sub(1, Ordering::SeqCst);
            vec![event]
        }));
    }

    /// Queue a read of page messages and history, unless one is already pending
    fn schedule_poll(&mut self) {
        if self.navigating.load(Ordering::SeqCst) > 0 || self.polling.swap(true, Ordering::SeqCst) {
            return;
        }

        let tab = Arc::clone(&self.tab);
        let channel = self.channel.clone();
        let last = Arc::clone(&self.navigation);
        let polling = Arc::clone(&self.polling);
        self.tasks.push(Box::new(move || {
            let mut events = match drain_outbox(&tab, &channel) {
                Ok(messages) => messages,
                Err(e) => {
                    log::debug!("Failed to drain page messages: {}", e);
                    Vec::new()
                }
            };

            match read_navigation(&tab) {
                Ok(state) => {
                    let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                    if last.as_ref() != Some(&state) {
                        *last = Some(state.clone());
                        events.push(SurfaceEvent::NavigationChanged(state));
                    }
                }
                Err(e) => log::debug!("Navigation state unavailable: {}", e),
            }

            polling.store(false, Ordering::SeqCst);
            events
        }));
    }

    fn history_step(&mut self, script: &str, operation: &str) -> Result<()> {
        evaluate(&self.tab, script)
            .map_err(|e| BridgeError::NavigationFailed(format!("Failed to {}: {}", operation, e)))?;
        Ok(())
    }
}

/// Register the message shim to run before any page script of every new document
fn install_shim(tab: &Tab, channel: &str) -> Result<()> {
    let channel = serde_json::to_string(channel)?;
    let source = include_str!("bridge_shim.js").replace("__CHANNEL__", &channel);

    tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
        source,
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    })
    .map_err(|e| BridgeError::TabOperationFailed(format!("Failed to install bridge shim: {}", e)))?;

    Ok(())
}

fn evaluate(tab: &Tab, script: &str) -> Result<Option<serde_json::Value>> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| BridgeError::EvaluationFailed(e.to_string()))?;
    Ok(result.value)
}

fn drain_outbox(tab: &Tab, channel: &str) -> Result<Vec<SurfaceEvent>> {
    let channel = serde_json::to_string(channel)?;
    let script = format!(
        "(function () {{ var c = window[{channel}]; return c ? c.drain() : \"[]\"; }})()",
        channel = channel
    );

    let text = match evaluate(tab, &script)? {
        Some(serde_json::Value::String(text)) => text,
        _ => return Ok(Vec::new()),
    };

    let envelopes: Vec<ShimEnvelope> = serde_json::from_str(&text)?;
    Ok(envelopes
        .into_iter()
        .map(|envelope| SurfaceEvent::Message {
            origin: envelope.origin,
            raw: RawMessage::Text(envelope.data),
        })
        .collect())
}

fn read_navigation(tab: &Tab) -> Result<NavigationState> {
    let history = tab
        .call_method(Page::GetNavigationHistory(None))
        .map_err(|e| BridgeError::TabOperationFailed(format!("Failed to read history: {}", e)))?;

    let current = history.current_index as usize;
    let mut state =
        NavigationState::new(tab.get_url()).with_history(current > 0, current + 1 < history.entries.len());

    if let Ok(title) = tab.get_title() {
        if !title.is_empty() {
            state = state.with_title(title);
        }
    }

    Ok(state)
}

impl ContentSurface for NativeSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Native
    }

    fn load(&mut self, destination: &Destination) -> Result<()> {
        self.requested = Some(destination.as_str().to_string());
        self.navigate(destination.as_str());
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let address = self.requested.clone().ok_or(BridgeError::NotMounted)?;
        self.navigate(&address);
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        self.history_step("(function () { window.history.back(); return true; })()", "go back")
    }

    fn go_forward(&mut self) -> Result<()> {
        self.history_step("(function () { window.history.forward(); return true; })()", "go forward")
    }

    fn post_message(&mut self, message: &BridgeMessage, target: &TrustedOrigin) -> Result<()> {
        // Native substrate delivers JSON strings
        let data = serde_json::to_string(&message.to_text()?)?;
        let origin = serde_json::to_string(target.as_str())?;
        let script = format!(
            "(function () {{ window.postMessage({data}, {origin}); return true; }})()",
            data = data,
            origin = origin
        );

        evaluate(&self.tab, &script)?;
        Ok(())
    }

    fn invoke_fullscreen(&mut self, direction: FullscreenDirection, method: &str) -> Result<()> {
        let target = match direction {
            FullscreenDirection::Enter => "document.documentElement",
            FullscreenDirection::Exit => "document",
        };
        let script = format!(
            r#"(function () {{
                var target = {target};
                var fn = target[{method}];
                if (typeof fn !== "function") return false;
                try {{
                    var r = fn.call(target);
                    if (r && typeof r.catch === "function") r.catch(function () {{}});
                    return true;
                }} catch (e) {{
                    return false;
                }}
            }})()"#,
            target = target,
            method = serde_json::to_string(method)?
        );

        match evaluate(&self.tab, &script)? {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(BridgeError::EvaluationFailed(format!("{} is not available", method))),
        }
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        if self.requested.is_some() {
            self.schedule_poll();
        }

        self.events.drain(..).collect()
    }

    fn take_tasks(&mut self) -> Vec<SurfaceTask> {
        std::mem::take(&mut self.tasks)
    }

    fn unload(&mut self) -> Result<()> {
        self.requested = None;
        *self.navigation.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.events.clear();
        self.tasks.clear();
        // A dropped poll task never clears its flag
        self.polling.store(false, Ordering::SeqCst);

        self.tab
            .navigate_to("about:blank")
            .map_err(|e| BridgeError::NavigationFailed(format!("Failed to unload page: {}", e)))?;

        Ok(())
    }
}
