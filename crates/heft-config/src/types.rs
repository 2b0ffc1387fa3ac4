use serde::{Deserialize, Serialize};

/// Main configuration structure for heft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeftConfig {
    /// Schema version for migrations
    pub version: String,

    /// File patterns per analysis category
    #[serde(default)]
    pub patterns: ExtensionPatterns,

    /// Registry and API endpoints
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Sign-in flow settings
    #[serde(default)]
    pub auth: AuthSettings,

    /// Manifest watching settings
    #[serde(default)]
    pub watch: WatchSettings,
}

impl Default for HeftConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            patterns: ExtensionPatterns::default(),
            registry: RegistrySettings::default(),
            auth: AuthSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

/// Ordered regex patterns matched against document paths, per category.
///
/// A document matches a category when any of its patterns matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionPatterns {
    #[serde(default = "default_typescript")]
    pub typescript: Vec<String>,

    #[serde(default = "default_javascript")]
    pub javascript: Vec<String>,

    #[serde(default = "default_html")]
    pub html: Vec<String>,

    #[serde(default = "default_infrastructure")]
    pub infrastructure: Vec<String>,
}

impl Default for ExtensionPatterns {
    fn default() -> Self {
        Self {
            typescript: default_typescript(),
            javascript: default_javascript(),
            html: default_html(),
            infrastructure: default_infrastructure(),
        }
    }
}

impl ExtensionPatterns {
    /// All patterns with the category key they belong to.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let groups: [(&'static str, &Vec<String>); 4] = [
            ("typescript", &self.typescript),
            ("javascript", &self.javascript),
            ("html", &self.html),
            ("infrastructure", &self.infrastructure),
        ];
        groups
            .into_iter()
            .flat_map(|(key, patterns)| patterns.iter().map(move |p| (key, p.as_str())))
    }
}

/// Registry, vulnerability database and auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySettings {
    /// npm registry used for package sizes
    #[serde(default = "default_npm_url")]
    pub npm_url: String,

    /// Public vulnerability database pages (`/test/npm/<name>`)
    #[serde(default = "default_vuln_registry_url")]
    pub vuln_registry_url: String,

    /// Authenticated API (vulnerability lookups, sign-in callback)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Web app hosting the login page
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Client-side rate limit for registry lookups
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            npm_url: default_npm_url(),
            vuln_registry_url: default_vuln_registry_url(),
            api_url: default_api_url(),
            app_url: default_app_url(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Sign-in callback polling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Manifest watching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchSettings {
    /// Poll file metadata instead of using native change notifications
    #[serde(default)]
    pub poll: bool,

    /// Interval between polls, when polling
    #[serde(default = "default_watch_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_watch_poll_interval_ms(),
        }
    }
}

fn default_typescript() -> Vec<String> {
    vec![r"\.tsx?$".to_string(), r"\.mts$".to_string(), r"\.cts$".to_string()]
}

fn default_javascript() -> Vec<String> {
    vec![r"\.jsx?$".to_string(), r"\.mjs$".to_string(), r"\.cjs$".to_string()]
}

fn default_html() -> Vec<String> {
    vec![r"\.html?$".to_string()]
}

fn default_infrastructure() -> Vec<String> {
    vec![r"\.ya?ml$".to_string()]
}

fn default_npm_url() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_vuln_registry_url() -> String {
    "https://snyk.io".to_string()
}

fn default_api_url() -> String {
    "https://snyk.io/api".to_string()
}

fn default_app_url() -> String {
    "https://app.snyk.io".to_string()
}

fn default_requests_per_second() -> u32 {
    8
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_watch_poll_interval_ms() -> u64 {
    1000
}
