//! Configuration module
//!
//! Typed configuration for clients, uploaders and rules, parsed from TOML.
//! All three sections are arrays of tables so that declaration order is
//! preserved: rule order decides match precedence and uploader order breaks
//! priority ties.
//!
//! Configuration is layered with explicit precedence, lowest first:
//! built-in defaults < application config < user config. Later layers
//! replace a same-named entry in place; new entries append at the end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default uploader priority when the config omits one. Lower is preferred.
pub const DEFAULT_PRIORITY: i32 = 5;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// A client definition: a named binding of a backend capability plus
/// base constructor arguments shared by every uploader using it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub name: String,
    /// Backend capability this client resolves to (e.g. "github", "command").
    pub capability: String,
    #[serde(default)]
    pub args: BTreeMap<String, toml::Value>,
}

/// An uploader definition: a named, prioritized binding of a client with
/// the constructor arguments for one concrete destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploaderConfig {
    pub name: String,
    /// Client this uploader binds to. Defaults to the uploader's own name.
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub args: BTreeMap<String, toml::Value>,
}

impl UploaderConfig {
    pub fn client_name(&self) -> &str {
        self.client.as_deref().unwrap_or(&self.name)
    }
}

/// A rule definition: a file-name glob mapped to a target uploader and an
/// ordered plugin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub pattern: String,
    pub uploader: String,
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// The full configuration: the three mapping sections the engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, rename = "client")]
    pub clients: Vec<ClientConfig>,
    #[serde(default, rename = "uploader")]
    pub uploaders: Vec<UploaderConfig>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

impl Settings {
    /// Parse a TOML document into settings. Parse failures are fatal
    /// configuration errors.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config(format!("invalid config: {err}")))
    }

    /// Built-in defaults: one pre-declared client per built-in capability.
    /// Uploaders and rules only ever come from the config layers above.
    pub fn builtin_defaults() -> Self {
        let client = |name: &str| ClientConfig {
            name: name.to_string(),
            capability: name.to_string(),
            args: BTreeMap::new(),
        };
        Settings {
            clients: vec![
                client("local"),
                client("command"),
                client("github"),
                client("s3"),
            ],
            uploaders: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Overlay `over` onto `self`. Entries are keyed by name: a same-named
    /// entry replaces the lower-layer one in place (keeping its position),
    /// anything new appends in the order the upper layer declares it.
    pub fn merge(mut self, over: Settings) -> Settings {
        fn merge_section<T, F>(lower: &mut Vec<T>, upper: Vec<T>, name: F)
        where
            F: Fn(&T) -> &str,
        {
            for entry in upper {
                match lower.iter_mut().find(|e| name(e) == name(&entry)) {
                    Some(slot) => *slot = entry,
                    None => lower.push(entry),
                }
            }
        }
        merge_section(&mut self.clients, over.clients, |c: &ClientConfig| &c.name);
        merge_section(&mut self.uploaders, over.uploaders, |u: &UploaderConfig| {
            &u.name
        });
        merge_section(&mut self.rules, over.rules, |r: &RuleConfig| &r.name);
        self
    }

    /// The standard three-layer stack: defaults < app < user.
    pub fn layered(app: Settings, user: Settings) -> Settings {
        Settings::builtin_defaults().merge(app).merge(user)
    }
}

/// Starter application config written by `hoist init`.
pub const STARTER_CONFIG: &str = r#"# Hoist configuration.
#
# Uncomment and fill in one or more uploaders. Lower priority wins when no
# uploader is requested explicitly.

# [[uploader]]
# name = "github"
#
# [uploader.args]
# owner = "<YOUR USERNAME>"
# repo = "<YOUR REPO NAME>"
# token = "<YOUR GITHUB TOKEN>"

# [[uploader]]
# name = "bucket"
# client = "s3"
# priority = 1
#
# [uploader.args]
# bucket = "<YOUR BUCKET NAME>"
# endpoint = "s3.us-east-1.amazonaws.com"
# access_key = "<YOUR ACCESS KEY ID>"
# access_secret = "<YOUR ACCESS KEY SECRET>"

# [[uploader]]
# name = "ossutil"
# client = "command"
# priority = 2
#
# [uploader.args]
# cmd_template = "ossutil cp ${file_path} oss://my-bucket/ -f"
# url_template = "https://my-bucket.example.com/${name}"

# [[rule]]
# name = "images"
# pattern = "*.png"
# uploader = "bucket"
# plugins = ["markdown_link", "clipboard"]
"#;
