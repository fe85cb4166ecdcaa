//! View-only switches.  None of these affect what is stored.

/// Presentation state for the chat pane and the history panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    show_context: bool,
    show_history_panel: bool,
}

impl Toggles {
    /// Creates toggles with everything hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with retrieved context visible or hidden.
    pub fn with_context(mut self, show: bool) -> Self {
        self.show_context = show;
        self
    }

    /// Whether bot messages render their retrieved context.
    pub fn show_context(&self) -> bool {
        self.show_context
    }

    /// Shows or hides retrieved context.
    pub fn set_show_context(&mut self, show: bool) {
        self.show_context = show;
    }

    /// Whether the history panel is visible.
    pub fn show_history_panel(&self) -> bool {
        self.show_history_panel
    }

    /// Makes the history panel visible, whatever it was before.
    pub fn open_history_panel(&mut self) {
        self.show_history_panel = true;
    }

    /// Hides the history panel.
    pub fn close_history_panel(&mut self) {
        self.show_history_panel = false;
    }
}
