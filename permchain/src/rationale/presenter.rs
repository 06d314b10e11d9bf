//! Rationale presenters
//!
//! A presenter renders a [`RationaleContent`] and collects the user's
//! action. Applications plug in their own UI by implementing
//! [`RationalePresenter`].

use async_trait::async_trait;
use permchain_api::SurfaceAction;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{RationaleContent, RationalePurpose};
use crate::error::PresentError;

/// Trait for rendering default rationale surfaces
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use permchain::rationale::{RationaleContent, RationalePresenter};
/// use permchain::PresentError;
/// use permchain_api::SurfaceAction;
///
/// struct GuiPresenter {
///     // GUI framework handle
/// }
///
/// #[async_trait]
/// impl RationalePresenter for GuiPresenter {
///     async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError> {
///         // Show a modal dialog; for now, always proceed
///         let _ = content;
///         Ok(SurfaceAction::Positive)
///     }
///
///     fn is_interactive(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait RationalePresenter: Send + Sync {
    /// Display the rationale and wait for one action
    async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError>;

    /// Whether a person is actually looking at the output
    fn is_interactive(&self) -> bool;
}

#[async_trait]
impl<T: RationalePresenter + ?Sized> RationalePresenter for std::sync::Arc<T> {
    async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError> {
        (**self).present(content).await
    }

    fn is_interactive(&self) -> bool {
        (**self).is_interactive()
    }
}

// ============================================================================
// Terminal Presenter
// ============================================================================

/// Terminal-based presenter
///
/// Prints the rationale and reads the answer from stdin.
#[derive(Debug)]
pub struct TerminalPresenter {
    /// List every permission under its group entry
    verbose: bool,
    /// Use the dark tint when coloring button labels
    dark_theme: bool,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            verbose: true,
            dark_theme: false,
        }
    }

    /// Only show group entries, not the permissions behind them
    pub fn minimal() -> Self {
        Self {
            verbose: false,
            dark_theme: false,
        }
    }

    pub fn with_dark_theme(mut self) -> Self {
        self.dark_theme = true;
        self
    }

    fn render(&self, content: &RationaleContent) -> String {
        let mut lines = Vec::new();

        let heading = match content.purpose {
            RationalePurpose::Explain => "Permission request",
            RationalePurpose::ForwardToSettings => "Open settings",
        };
        lines.push(format!("== {} ==", heading));
        lines.push(content.message.clone());
        lines.push(String::new());

        for item in &content.items {
            let marker = if item.special { " (special)" } else { "" };
            lines.push(format!("  - {}{}", item.key, marker));
            if self.verbose && item.permissions.as_slice() != [item.key.clone()] {
                for permission in &item.permissions {
                    lines.push(format!("      {}", permission));
                }
            }
        }

        lines.join("\n")
    }

    fn label(&self, content: &RationaleContent, text: &str) -> String {
        match content.tint.for_theme(self.dark_theme) {
            Some(argb) => {
                let (r, g, b) = ((argb >> 16) & 0xFF, (argb >> 8) & 0xFF, argb & 0xFF);
                format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, text)
            }
            None => text.to_string(),
        }
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RationalePresenter for TerminalPresenter {
    async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError> {
        if !atty_check() {
            return Err(PresentError::NonInteractive);
        }

        let body = self.render(content);
        let positive = self.label(content, &content.positive_text);
        let negative = content
            .negative_text
            .as_deref()
            .map(|text| self.label(content, text));

        tokio::task::spawn_blocking(move || ask(&body, &positive, negative.as_deref()))
            .await
            .map_err(|e| PresentError::Other(e.to_string()))?
    }

    fn is_interactive(&self) -> bool {
        atty_check()
    }
}

fn ask(body: &str, positive: &str, negative: Option<&str>) -> Result<SurfaceAction, PresentError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    writeln!(stdout)?;
    writeln!(stdout, "{}", body)?;
    writeln!(stdout)?;

    match negative {
        Some(negative) => write!(stdout, "[y] {} / [n] {}: ", positive, negative)?,
        None => write!(stdout, "[y] {}: ", positive)?,
    }
    stdout.flush()?;

    let mut input = String::new();
    stdin.lock().read_line(&mut input)?;

    // Mandatory rationales offer no way out
    if negative.is_none() {
        return Ok(SurfaceAction::Positive);
    }

    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(SurfaceAction::Positive),
        "n" | "no" | "" => Ok(SurfaceAction::Negative),
        _ => {
            writeln!(stdout, "Invalid input, treating as \"no\"")?;
            Ok(SurfaceAction::Negative)
        }
    }
}

// ============================================================================
// Auto Presenter
// ============================================================================

/// Presenter that answers every rationale the same way
///
/// An optional budget caps the number of positive answers; once it is
/// spent, rationales that offer a negative action are declined.
#[derive(Debug)]
pub struct AutoPresenter {
    action: SurfaceAction,
    positive_budget: Option<usize>,
    answered: AtomicUsize,
}

impl AutoPresenter {
    pub fn always_positive() -> Self {
        Self::with_action(SurfaceAction::Positive)
    }

    pub fn always_negative() -> Self {
        Self::with_action(SurfaceAction::Negative)
    }

    pub fn with_action(action: SurfaceAction) -> Self {
        Self {
            action,
            positive_budget: None,
            answered: AtomicUsize::new(0),
        }
    }

    /// Decline after `max` positive answers
    pub fn with_limit(mut self, max: usize) -> Self {
        self.positive_budget = Some(max);
        self
    }
}

#[async_trait]
impl RationalePresenter for AutoPresenter {
    async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError> {
        // A mandatory rationale cannot be declined
        if content.negative_text.is_none() {
            return Ok(SurfaceAction::Positive);
        }
        if self.action == SurfaceAction::Negative {
            return Ok(SurfaceAction::Negative);
        }
        let answered = self.answered.fetch_add(1, Ordering::SeqCst);
        match self.positive_budget {
            Some(max) if answered >= max => Ok(SurfaceAction::Negative),
            _ => Ok(SurfaceAction::Positive),
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

// ============================================================================
// Recording Presenter (for testing)
// ============================================================================

/// A rationale that was shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRationale {
    pub purpose: RationalePurpose,
    pub message: String,
    pub permissions: Vec<String>,
    pub item_keys: Vec<String>,
    pub has_negative: bool,
}

/// Presenter that records every rationale and replays scripted actions
#[derive(Debug)]
pub struct RecordingPresenter {
    shown: Mutex<Vec<RecordedRationale>>,
    /// Consumed one per rationale; the last one repeats
    script: Mutex<VecDeque<SurfaceAction>>,
}

impl RecordingPresenter {
    pub fn new(action: SurfaceAction) -> Self {
        Self::scripted([action])
    }

    pub fn scripted(actions: impl IntoIterator<Item = SurfaceAction>) -> Self {
        Self {
            shown: Mutex::new(Vec::new()),
            script: Mutex::new(actions.into_iter().collect()),
        }
    }

    fn shown_lock(&self) -> MutexGuard<'_, Vec<RecordedRationale>> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every rationale shown so far
    pub fn shown(&self) -> Vec<RecordedRationale> {
        self.shown_lock().clone()
    }

    pub fn shown_count(&self) -> usize {
        self.shown_lock().len()
    }

    fn next_action(&self) -> SurfaceAction {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        if script.len() > 1 {
            script.pop_front().unwrap_or(SurfaceAction::Positive)
        } else {
            script.front().copied().unwrap_or(SurfaceAction::Positive)
        }
    }
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new(SurfaceAction::Positive)
    }
}

#[async_trait]
impl RationalePresenter for RecordingPresenter {
    async fn present(&self, content: &RationaleContent) -> Result<SurfaceAction, PresentError> {
        self.shown_lock().push(RecordedRationale {
            purpose: content.purpose,
            message: content.message.clone(),
            permissions: content.permissions.clone(),
            item_keys: content.items.iter().map(|i| i.key.clone()).collect(),
            has_negative: content.negative_text.is_some(),
        });
        Ok(self.next_action())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if stdout is connected to a terminal
fn atty_check() -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: isatty accepts any file descriptor
        unsafe { libc::isatty(std::io::stdout().as_raw_fd()) != 0 }
    }

    #[cfg(windows)]
    {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::System::Console::{GetConsoleMode, CONSOLE_MODE};
        let handle = std::io::stdout().as_raw_handle();
        let mut mode: CONSOLE_MODE = 0;
        // SAFETY: GetConsoleMode only reads through a valid handle
        unsafe { GetConsoleMode(handle as _, &mut mode) != 0 }
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::env::var("TERM").is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rationale::RationaleItem;
    use permchain_api::DialogTint;

    fn content(negative: Option<&str>) -> RationaleContent {
        RationaleContent {
            purpose: RationalePurpose::Explain,
            permissions: vec!["fine".into(), "coarse".into(), "camera".into()],
            message: "We need these".into(),
            positive_text: "Allow".into(),
            negative_text: negative.map(String::from),
            tint: DialogTint::default(),
            items: vec![
                RationaleItem {
                    key: "LOCATION".into(),
                    special: false,
                    permissions: vec!["fine".into(), "coarse".into()],
                },
                RationaleItem {
                    key: "camera".into(),
                    special: false,
                    permissions: vec!["camera".into()],
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_auto_presenter() {
        let presenter = AutoPresenter::always_negative();
        assert_eq!(
            presenter.present(&content(Some("Deny"))).await.unwrap(),
            SurfaceAction::Negative
        );
        // no negative action offered
        assert_eq!(
            presenter.present(&content(None)).await.unwrap(),
            SurfaceAction::Positive
        );
        assert!(!presenter.is_interactive());
    }

    #[tokio::test]
    async fn test_auto_presenter_limit() {
        let presenter = AutoPresenter::always_positive().with_limit(1);
        let c = content(Some("Deny"));
        assert_eq!(presenter.present(&c).await.unwrap(), SurfaceAction::Positive);
        assert_eq!(presenter.present(&c).await.unwrap(), SurfaceAction::Negative);
        assert_eq!(
            presenter.present(&content(None)).await.unwrap(),
            SurfaceAction::Positive
        );
    }

    #[tokio::test]
    async fn test_recording_presenter_script() {
        let presenter =
            RecordingPresenter::scripted([SurfaceAction::Negative, SurfaceAction::Positive]);

        let c = content(Some("Deny"));
        assert_eq!(presenter.present(&c).await.unwrap(), SurfaceAction::Negative);
        assert_eq!(presenter.present(&c).await.unwrap(), SurfaceAction::Positive);
        assert_eq!(presenter.present(&c).await.unwrap(), SurfaceAction::Positive);

        assert_eq!(presenter.shown_count(), 3);
        let shown = presenter.shown();
        assert_eq!(shown[0].item_keys, vec!["LOCATION", "camera"]);
        assert!(shown[0].has_negative);
    }

    #[test]
    fn test_render() {
        let presenter = TerminalPresenter::new();
        let rendered = presenter.render(&content(Some("Deny")));
        assert!(rendered.contains("We need these"));
        assert!(rendered.contains("LOCATION"));
        assert!(rendered.contains("fine"));
        assert!(rendered.contains("coarse"));

        let rendered = TerminalPresenter::minimal().render(&content(None));
        assert!(rendered.contains("LOCATION"));
        assert!(!rendered.contains("coarse"));
    }

    #[test]
    fn test_label_tint() {
        let presenter = TerminalPresenter::new();
        let mut c = content(None);
        assert_eq!(presenter.label(&c, "Allow"), "Allow");

        c.tint = DialogTint::new(0xFF1972E8, 0xFF8AB6F5);
        let label = presenter.label(&c, "Allow");
        assert!(label.starts_with("\x1b[38;2;25;114;232m"));
        let label = TerminalPresenter::new().with_dark_theme().label(&c, "Allow");
        assert!(label.starts_with("\x1b[38;2;138;182;245m"));
    }
}
