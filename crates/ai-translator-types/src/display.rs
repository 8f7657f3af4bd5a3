// Display-side collaborators: the update callback payload and the sink.

/// One update for the result panel.
///
/// `Delta` appends streamed text; `Replace` swaps the whole panel content
/// (batch results and user-facing warnings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Delta(String),
    Replace(String),
}

impl Update {
    pub fn text(&self) -> &str {
        match self {
            Self::Delta(text) | Self::Replace(text) => text,
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Delta(_))
    }
}

/// The visible result panel.
///
/// `render` always receives the full committed text, never a delta, so the
/// sink can re-layout formatted output from scratch on every tick.
pub trait DisplaySink: Send + Sync {
    fn render(&self, committed: &str);

    /// Whether the panel is still shown. A hidden panel stops the drain loop.
    fn is_visible(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accessors() {
        let delta = Update::Delta("He".into());
        assert!(delta.is_incremental());
        assert_eq!(delta.text(), "He");

        let replace = Update::Replace("Done".into());
        assert!(!replace.is_incremental());
        assert_eq!(replace.text(), "Done");
    }
}
