//! JSON-lines interaction script read from stdin.
//!
//! ```text
//! {"action":"navigate","path":"/products"}
//! {"action":"click","target":"add-2","x":120,"y":340}
//! {"action":"type","target":"search","value":"shoes"}
//! {"action":"scroll","y":450}
//! {"action":"pointer","x":10,"y":20}
//! ```

use serde::Deserialize;

use crate::storefront::Storefront;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid step: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown target: {0}")]
    UnknownTarget(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Click {
        target: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Type {
        target: String,
        value: String,
    },
    Scroll {
        y: f64,
    },
    Pointer {
        x: f64,
        y: f64,
    },
    Navigate {
        path: String,
    },
}

impl ScriptStep {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ScriptError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line)?))
    }

    /// Perform the step as a user action on the storefront.
    pub fn run(&self, store: &Storefront) -> Result<(), ScriptError> {
        let target = |name: &str| {
            store
                .target(name)
                .ok_or_else(|| ScriptError::UnknownTarget(name.to_string()))
        };
        match self {
            ScriptStep::Click { target: name, x, y } => {
                store.page.user_click(target(name)?, *x, *y);
            }
            ScriptStep::Type { target: name, value } => {
                store.page.user_type(target(name)?, value);
            }
            ScriptStep::Scroll { y } => store.page.user_scroll(*y),
            ScriptStep::Pointer { x, y } => store.page.user_pointer(*x, *y),
            ScriptStep::Navigate { path } => store.page.user_navigate(path),
        }
        Ok(())
    }
}
