//! MCP method dispatch.
//!
//! Incoming method names are parsed once into [`McpMethod`] so the server
//! matches on variants rather than strings.
//!
//! ```text
//! McpMethod (enum)
//!   ├── Initialize
//!   ├── ListTools
//!   ├── CallTool
//!   ├── ListResources
//!   ├── ListPrompts
//!   ├── Ping
//!   ├── Notification(String)
//!   └── Unknown(String)
//! ```

use std::fmt;

/// Prefix shared by every client notification.
const NOTIFICATION_PREFIX: &str = "notifications/";

/// MCP method identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// Initialize the MCP session.
    Initialize,
    /// List available tools.
    ListTools,
    /// Call a specific tool.
    CallTool,
    /// List resources (always empty).
    ListResources,
    /// List prompts (always empty).
    ListPrompts,
    /// Ping the server.
    Ping,
    /// A client notification such as `notifications/initialized`.
    Notification(String),
    /// Unknown method.
    Unknown(String),
}

impl McpMethod {
    /// Returns the MCP protocol method name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::ListResources => "resources/list",
            Self::ListPrompts => "prompts/list",
            Self::Ping => "ping",
            Self::Notification(s) | Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns true unless the method is [`McpMethod::Unknown`].
    ///
    /// Every `notifications/*` method counts as known, including ones this
    /// server does not act on: notifications are accepted and never answered,
    /// so none of them can produce a method-not-found error.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns true if the client expects no reply.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        matches!(self, Self::Notification(_))
    }

    /// Returns all known request methods.
    #[must_use]
    pub const fn known_methods() -> &'static [Self] {
        &[
            Self::Initialize,
            Self::ListTools,
            Self::CallTool,
            Self::ListResources,
            Self::ListPrompts,
            Self::Ping,
        ]
    }

    /// Label used for metrics, bounded to known names.
    #[must_use]
    pub const fn metric_label(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::ListResources => "resources/list",
            Self::ListPrompts => "prompts/list",
            Self::Ping => "ping",
            Self::Notification(_) => "notification",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            "resources/list" => Self::ListResources,
            "prompts/list" => Self::ListPrompts,
            "ping" => Self::Ping,
            other if other.starts_with(NOTIFICATION_PREFIX) => {
                Self::Notification(other.to_string())
            },
            unknown => Self::Unknown(unknown.to_string()),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
