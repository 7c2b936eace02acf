use std::fmt;

pub type SlideResult<T> = Result<T, SlideError>;

/// Position of one output image inside a generation run (all indices 1-based).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotContext {
    pub variation: Option<u32>,
    pub post: Option<usize>,
    pub column: Option<usize>,
}

impl SlotContext {
    pub fn new(variation: u32, post: usize, column: usize) -> Self {
        Self {
            variation: Some(variation),
            post: Some(post),
            column: Some(column),
        }
    }

    pub fn is_set(&self) -> bool {
        self.variation.is_some() || self.post.is_some() || self.column.is_some()
    }
}

impl fmt::Display for SlotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_set() {
            return Ok(());
        }
        f.write_str(" at")?;
        if let Some(v) = self.variation {
            write!(f, " variation {v}")?;
        }
        if let Some(p) = self.post {
            write!(f, " post {p}")?;
        }
        if let Some(c) = self.column {
            write!(f, " column {c}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SlideError {
    #[error("validation error: {0}")]
    Validation(String),

    /// `generate` was called before a content model was loaded.
    #[error("content model not loaded: call load() before generate()")]
    NotLoaded,

    #[error("exhausted pool: no image left in '{content_type}' for product '{selector}'{slot}")]
    ExhaustedPool {
        content_type: String,
        selector: String,
        slot: SlotContext,
    },

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlideError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn exhausted(content_type: impl Into<String>, selector: impl fmt::Display) -> Self {
        Self::ExhaustedPool {
            content_type: content_type.into(),
            selector: selector.to_string(),
            slot: SlotContext::default(),
        }
    }

    /// Attaches slot coordinates to an [`SlideError::ExhaustedPool`]; other variants pass through.
    pub fn at_slot(self, at: SlotContext) -> Self {
        match self {
            Self::ExhaustedPool {
                content_type,
                selector,
                ..
            } => Self::ExhaustedPool {
                content_type,
                selector,
                slot: at,
            },
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
