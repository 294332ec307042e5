use crate::error::{BridgeError, Result};
use crate::navigation::Destination;
use std::process::{Command, Stdio};

/// Hands a destination to something outside the embedded surface
pub trait ExternalOpener {
    fn open(&self, destination: &Destination) -> Result<()>;
}

/// Opens destinations in the platform's default browser.
///
/// The opener process is started and left to run; `open` never waits for it.
#[derive(Debug, Clone)]
pub struct SystemOpener {
    program: String,
    args: Vec<String>,
}

impl Default for SystemOpener {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };

        Self::command(program, args.iter().copied())
    }
}

impl SystemOpener {
    /// Opener for the current platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Opener running `program` with `args`, followed by the address
    pub fn command<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program that receives the address
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ExternalOpener for SystemOpener {
    fn open(&self, destination: &Destination) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(destination.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::ExternalOpenFailed(format!("Failed to run {}: {}", self.program, e)))?;

        // Reap the opener without holding up the caller
        let program = self.program.clone();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => log::warn!("{} exited with {}", program, status),
            Ok(_) => {}
            Err(e) => log::warn!("Failed to wait for {}: {}", program, e),
        });

        log::info!("Opened {} externally", destination);
        Ok(())
    }
}
