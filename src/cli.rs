use clap::{ArgAction, Parser, Subcommand};

/// Command surface over the capture bridge.
#[derive(Parser)]
#[command(name = "recaster")]
#[command(about = "Search and replay HTTP traffic captured by an intercepting proxy.")]
#[command(version)]
pub struct Cli {
  /// Capture bridge base URL
  #[arg(long, global = true, default_value = "http://127.0.0.1:8090")]
  pub endpoint: String,

  /// Network timeout in seconds
  #[arg(long, global = true, default_value_t = 10)]
  pub timeout: u64,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Check the capture bridge is running
  Health,
  /// List unique hostnames in captured traffic
  Hosts,
  /// Show the bridge API reference
  Docs,
  /// Most recent Repeater send (full decoded content)
  Latest {
    /// Truncate response body to N chars (0 = unlimited)
    #[arg(long, default_value_t = 3000)]
    max_body: u32,
  },
  /// Search the capture history
  History {
    /// Filter by hostname (substring)
    #[arg(long)]
    host: Option<String>,
    /// Filter by HTTP method (GET, POST, ...)
    #[arg(long)]
    method: Option<String>,
    /// Filter by status code or prefix ('4' for all 4xx)
    #[arg(long)]
    status: Option<String>,
    /// Search text (case-insensitive)
    #[arg(long)]
    search: Option<String>,
    /// Limit search to parts (comma-separated): request, request_headers,
    /// request_body, response, response_headers, response_body
    #[arg(long)]
    search_in: Option<String>,
    /// Filter by tool: PROXY|REPEATER|SCANNER|INTRUDER|EXTENSION
    #[arg(long)]
    tool: Option<String>,
    /// Exclude URL extensions, e.g. js,css,png,gif,ico,woff2
    #[arg(long)]
    ext_exclude: Option<String>,
    /// Filter by Content-Type substring, e.g. json, html
    #[arg(long)]
    mime: Option<String>,
    /// asc = oldest first, desc = newest first (default)
    #[arg(long, value_parser = ["asc", "desc"])]
    order: Option<String>,
    /// Max results
    #[arg(long, default_value_t = 10)]
    limit: u32,
    /// Pagination offset
    #[arg(long, default_value_t = 0)]
    offset: u32,
    /// Comma-separated fields, e.g. url,status_code,method
    #[arg(long)]
    fields: Option<String>,
    /// Truncate body text to N chars (use with --fields including *_text)
    #[arg(long, default_value_t = 0)]
    max_body: u32,
    /// Only items sent by this tool (tagged with a provenance marker)
    #[arg(long, action = ArgAction::SetTrue)]
    agent_only: bool,
  },
  /// Get full request and response for an item
  Get {
    /// History item ID
    id: i64,
    /// Truncate response body to N chars (0 = unlimited)
    #[arg(long, default_value_t = 1000)]
    max_body: u32,
  },
  /// Send a history item to the Repeater
  Repeater {
    /// History item ID
    id: i64,
    /// Repeater tab label
    #[arg(long)]
    tab: Option<String>,
  },
  /// Resend a captured request through the proxy, with optional changes
  Repeat {
    /// History item ID to repeat
    id: i64,
    /// String substitution on the raw request (repeatable)
    #[arg(long, num_args = 2, value_names = ["OLD", "NEW"], action = ArgAction::Append)]
    replace: Vec<String>,
    /// Add or override a header (repeatable)
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    header: Vec<String>,
    /// Replace the request body entirely
    #[arg(long)]
    body: Option<String>,
    /// Forwarding proxy listener port
    #[arg(long, default_value_t = 8080)]
    proxy_port: u16,
    /// Truncate response body to N chars (0 = unlimited)
    #[arg(long, default_value_t = 4000)]
    max_body: u32,
  },
  /// Send a custom request through the proxy
  Send {
    /// HTTP method
    method: String,
    /// Full URL including scheme
    url: String,
    /// Add a header (repeatable)
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    header: Vec<String>,
    /// Request body
    #[arg(long)]
    body: Option<String>,
    /// Forwarding proxy listener port
    #[arg(long, default_value_t = 8080)]
    proxy_port: u16,
    /// Truncate response body to N chars (0 = unlimited)
    #[arg(long, default_value_t = 4000)]
    max_body: u32,
  },
  /// Check if a URL is in scope
  Scope {
    /// The URL to check
    url: String,
  },
}
