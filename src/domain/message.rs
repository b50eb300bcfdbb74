use std::fmt;

/// Placed between a non-empty prefix and the generated summary.
pub const PREFIX_SEPARATOR: &str = " ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(pub String);

impl CommitMessage {
    /// Join `prefix` and `summary` as `"{prefix} {summary}"`.
    ///
    /// A blank prefix means no prefix at all, so the summary is used verbatim.
    pub fn compose(prefix: &str, summary: &str) -> Self {
        let prefix = prefix.trim_end();
        if prefix.trim().is_empty() {
            return Self(summary.to_string());
        }
        Self(format!("{prefix}{PREFIX_SEPARATOR}{summary}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
