use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Main configuration structure for Promptdeck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Workspace identity for this deck
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry policy for outbound HTTP calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Prompt transformation service configuration
    #[serde(default)]
    pub transform: TransformConfig,

    /// Coding-agent service configuration
    #[serde(default)]
    pub cursor: CursorConfig,

    /// AI generation pipeline configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Workflow automation heuristics
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Background automation scheduler
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Change-feed event plumbing
    #[serde(default)]
    pub events: EventsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            retry: RetryConfig::default(),
            transform: TransformConfig::default(),
            cursor: CursorConfig::default(),
            generation: GenerationConfig::default(),
            automation: AutomationConfig::default(),
            scheduler: SchedulerConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

/// Workspace identity for this deck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// Workspace id, written by `promptdeck init`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    /// Display name for the workspace
    #[serde(default = "default_workspace_name")]
    pub name: String,
}

fn default_workspace_name() -> String {
    "default".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: default_workspace_name(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".promptdeck/promptdeck.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Prompt transformation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransformConfig {
    /// Base URL of the transformation endpoint
    #[serde(default = "default_transform_base_url")]
    pub base_url: String,

    /// Model provider identifier passed through to the service
    #[serde(default = "default_transform_provider")]
    pub provider: String,

    /// Model identifier passed through to the service
    #[serde(default = "default_transform_model")]
    pub model: String,

    /// API key (can also be set via PROMPTDECK__TRANSFORM__API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_transform_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_transform_provider() -> String {
    "openai".to_string()
}

fn default_transform_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            base_url: default_transform_base_url(),
            provider: default_transform_provider(),
            model: default_transform_model(),
            api_key: None,
        }
    }
}

/// Coding-agent service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CursorConfig {
    /// Base URL of the agent API
    #[serde(default = "default_cursor_base_url")]
    pub base_url: String,

    /// API key (can also be set via PROMPTDECK__CURSOR__API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Repository the agent works against, e.g. `acme/app`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Base branch for agent work
    #[serde(default = "default_cursor_branch")]
    pub base_branch: String,

    /// Model the agent runs with
    #[serde(default = "default_cursor_model")]
    pub model: String,

    /// Ask the agent to open a pull request when finished
    #[serde(default = "default_auto_create_pr")]
    pub auto_create_pr: bool,
}

fn default_cursor_base_url() -> String {
    "https://api.cursor.com".to_string()
}

fn default_cursor_branch() -> String {
    "main".to_string()
}

fn default_cursor_model() -> String {
    "claude-4-sonnet".to_string()
}

const fn default_auto_create_pr() -> bool {
    true
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            base_url: default_cursor_base_url(),
            api_key: None,
            repository: None,
            base_branch: default_cursor_branch(),
            model: default_cursor_model(),
            auto_create_pr: default_auto_create_pr(),
        }
    }
}

/// AI generation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Minimum stripped-description length that triggers generation
    #[serde(default = "default_min_description_chars")]
    pub min_description_chars: usize,

    /// Hard timeout for one generation attempt in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_min_description_chars() -> usize {
    15
}

const fn default_generation_timeout_secs() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_description_chars: default_min_description_chars(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// Workflow automation heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationConfig {
    /// Keywords that mark a prompt as urgent
    #[serde(default = "default_urgent_keywords")]
    pub urgent_keywords: Vec<String>,

    /// How far back a prompt counts as recently active, in hours
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: i64,

    /// Maximum in-progress prompts boosted per priority pass
    #[serde(default = "default_max_activity_boosts")]
    pub max_activity_boosts: usize,

    /// Similarity above which an epic is suggested
    #[serde(default = "default_suggest_threshold")]
    pub suggest_threshold: f64,

    /// Similarity above which an epic is auto-assigned
    #[serde(default = "default_auto_assign_threshold")]
    pub auto_assign_threshold: f64,

    /// Lookback window for pattern analysis, in days
    #[serde(default = "default_pattern_window_days")]
    pub pattern_window_days: i64,
}

fn default_urgent_keywords() -> Vec<String> {
    [
        "urgent", "critical", "asap", "important", "priority", "fix", "bug", "error", "broken",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

const fn default_recent_window_hours() -> i64 {
    24
}

const fn default_max_activity_boosts() -> usize {
    3
}

const fn default_suggest_threshold() -> f64 {
    0.3
}

const fn default_auto_assign_threshold() -> f64 {
    0.7
}

const fn default_pattern_window_days() -> i64 {
    7
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            urgent_keywords: default_urgent_keywords(),
            recent_window_hours: default_recent_window_hours(),
            max_activity_boosts: default_max_activity_boosts(),
            suggest_threshold: default_suggest_threshold(),
            auto_assign_threshold: default_auto_assign_threshold(),
            pattern_window_days: default_pattern_window_days(),
        }
    }
}

/// Background automation scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Seconds between automation passes
    #[serde(default = "default_scheduler_interval_secs")]
    pub interval_secs: u64,

    /// Hour of day (inclusive) when passes may start
    #[serde(default = "default_active_hours_start")]
    pub active_hours_start: u32,

    /// Hour of day (exclusive) when passes stop
    #[serde(default = "default_active_hours_end")]
    pub active_hours_end: u32,

    /// Run epic organization every N ticks
    #[serde(default = "default_epic_every_ticks")]
    pub epic_every_ticks: u64,

    /// Run pattern analysis every N ticks
    #[serde(default = "default_patterns_every_ticks")]
    pub patterns_every_ticks: u64,
}

const fn default_scheduler_interval_secs() -> u64 {
    1800
}

const fn default_active_hours_start() -> u32 {
    8
}

const fn default_active_hours_end() -> u32 {
    22
}

const fn default_epic_every_ticks() -> u64 {
    2
}

const fn default_patterns_every_ticks() -> u64 {
    336
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_scheduler_interval_secs(),
            active_hours_start: default_active_hours_start(),
            active_hours_end: default_active_hours_end(),
            epic_every_ticks: default_epic_every_ticks(),
            patterns_every_ticks: default_patterns_every_ticks(),
        }
    }
}

/// Change-feed event plumbing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventsConfig {
    /// Capacity of the bounded reconciler queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

const fn default_queue_capacity() -> usize {
    256
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}
