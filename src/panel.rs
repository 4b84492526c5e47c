//! Panel model: panel types, per-type configuration, geometry, and updates.
//!
//! A `Panel` is one draggable/resizable dashboard unit. Its content type is
//! carried by its `PanelConfig` variant, so the `type` written to storage and
//! the shape of `config` can never disagree. Configuration arrives as an open
//! JSON object (from storage or from a caller) and is checked against the
//! record for its type when the panel is built or updated; unknown keys are
//! kept in each record's `extra` map.
//!
//! `PanelUpdate` is the sparse update applied by the store's `update_panel`.
//! Only present fields are merged; `id` and `type` cannot change.

#[cfg(test)]
#[path = "panel_test.rs"]
mod panel_test;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::consts::{FALLBACK_PANEL_TITLE, NEW_PANEL_HEIGHT, NEW_PANEL_WIDTH};
use crate::error::ErrorCode;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("{kind} config must be a JSON object")]
    ConfigNotObject { kind: PanelType },
    #[error("invalid {kind} config: {source}")]
    InvalidConfig {
        kind: PanelType,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} config field `{field}` must be at least 1")]
    ZeroCount { kind: PanelType, field: &'static str },
    #[error("panel size must be positive, got {width}x{height}")]
    EmptySize { width: u32, height: u32 },
}

impl ErrorCode for PanelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigNotObject { .. } | Self::InvalidConfig { .. } | Self::ZeroCount { .. } => {
                "E_INVALID_CONFIG"
            }
            Self::EmptySize { .. } => "E_INVALID_SIZE",
        }
    }
}

// =============================================================================
// PANEL TYPE
// =============================================================================

/// Content type bound to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelType {
    VideoFeed,
    VideoPlayer,
    Search,
    List,
    Recommendations,
    WatchLater,
    Subscriptions,
    Trending,
    AiCurated,
    Custom,
}

impl PanelType {
    /// Every panel type, in declaration order.
    pub const ALL: [PanelType; 10] = [
        Self::VideoFeed,
        Self::VideoPlayer,
        Self::Search,
        Self::List,
        Self::Recommendations,
        Self::WatchLater,
        Self::Subscriptions,
        Self::Trending,
        Self::AiCurated,
        Self::Custom,
    ];

    /// Wire name, e.g. `"watch-later"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VideoFeed => "video-feed",
            Self::VideoPlayer => "video-player",
            Self::Search => "search",
            Self::List => "list",
            Self::Recommendations => "recommendations",
            Self::WatchLater => "watch-later",
            Self::Subscriptions => "subscriptions",
            Self::Trending => "trending",
            Self::AiCurated => "ai-curated",
            Self::Custom => "custom",
        }
    }

    /// Human-readable title given to new panels of this type.
    #[must_use]
    pub fn default_title(self) -> &'static str {
        match self {
            Self::VideoFeed => "Video Feed",
            Self::VideoPlayer => "Video Player",
            Self::Search => "Search",
            Self::List => "My List",
            Self::Recommendations => "Recommendations",
            Self::WatchLater => "Watch Later",
            Self::Subscriptions => "Subscriptions",
            Self::Trending => "Trending",
            Self::AiCurated => "AI Curated",
            Self::Custom => "Custom Panel",
        }
    }
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown panel type: {0}")]
pub struct UnknownPanelType(pub String);

impl FromStr for PanelType {
    type Err = UnknownPanelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPanelType(s.to_owned()))
    }
}

/// Default title for a raw type string. Strings naming no known type get
/// `"Panel"`.
#[must_use]
pub fn resolve_title(raw_type: &str) -> &'static str {
    match raw_type.parse::<PanelType>() {
        Ok(kind) => kind.default_title(),
        Err(_) => FALLBACK_PANEL_TITLE,
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Grid coordinates of a panel's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Panel extent in layout units. Both sides must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject zero-area sizes.
    ///
    /// # Errors
    ///
    /// Returns `EmptySize` if either side is zero.
    pub fn validate(self) -> Result<Self, PanelError> {
        if self.width == 0 || self.height == 0 {
            return Err(PanelError::EmptySize { width: self.width, height: self.height });
        }
        Ok(self)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self { width: NEW_PANEL_WIDTH, height: NEW_PANEL_HEIGHT }
    }
}

// =============================================================================
// PER-TYPE CONFIG RECORDS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlayerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_limit: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchLaterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCuratedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form configuration for user-defined panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomConfig {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// PANEL CONFIG
// =============================================================================

/// Configuration record for a panel. The variant is the panel's type.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelConfig {
    VideoFeed(VideoFeedConfig),
    VideoPlayer(VideoPlayerConfig),
    Search(SearchConfig),
    List(ListConfig),
    Recommendations(RecommendationsConfig),
    WatchLater(WatchLaterConfig),
    Subscriptions(SubscriptionsConfig),
    Trending(TrendingConfig),
    AiCurated(AiCuratedConfig),
    Custom(CustomConfig),
}

impl PanelConfig {
    /// The panel type this configuration belongs to.
    #[must_use]
    pub fn panel_type(&self) -> PanelType {
        match self {
            Self::VideoFeed(_) => PanelType::VideoFeed,
            Self::VideoPlayer(_) => PanelType::VideoPlayer,
            Self::Search(_) => PanelType::Search,
            Self::List(_) => PanelType::List,
            Self::Recommendations(_) => PanelType::Recommendations,
            Self::WatchLater(_) => PanelType::WatchLater,
            Self::Subscriptions(_) => PanelType::Subscriptions,
            Self::Trending(_) => PanelType::Trending,
            Self::AiCurated(_) => PanelType::AiCurated,
            Self::Custom(_) => PanelType::Custom,
        }
    }

    /// Starter configuration for a freshly added panel of `kind`.
    #[must_use]
    pub fn default_for(kind: PanelType) -> Self {
        match kind {
            PanelType::VideoFeed => Self::VideoFeed(VideoFeedConfig {
                platform: Some("youtube".into()),
                max_items: Some(20),
                ..VideoFeedConfig::default()
            }),
            PanelType::VideoPlayer => Self::VideoPlayer(VideoPlayerConfig {
                autoplay: Some(false),
                ..VideoPlayerConfig::default()
            }),
            PanelType::Search => Self::Search(SearchConfig {
                platforms: Some(vec!["youtube".into(), "twitch".into(), "vimeo".into()]),
                results_limit: Some(20),
                ..SearchConfig::default()
            }),
            PanelType::List => Self::List(ListConfig::default()),
            PanelType::Recommendations => Self::Recommendations(RecommendationsConfig {
                source: Some("ai".into()),
                max_items: Some(10),
                ..RecommendationsConfig::default()
            }),
            PanelType::WatchLater => Self::WatchLater(WatchLaterConfig {
                max_items: Some(50),
                ..WatchLaterConfig::default()
            }),
            PanelType::Subscriptions => Self::Subscriptions(SubscriptionsConfig::default()),
            PanelType::Trending => Self::Trending(TrendingConfig {
                max_items: Some(20),
                ..TrendingConfig::default()
            }),
            PanelType::AiCurated => Self::AiCurated(AiCuratedConfig {
                max_items: Some(10),
                ..AiCuratedConfig::default()
            }),
            PanelType::Custom => Self::Custom(CustomConfig::default()),
        }
    }

    /// Parse an open JSON config for `kind` and validate it. `null` yields an
    /// empty record.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotObject` for non-object JSON, `InvalidConfig` when a
    /// known field has the wrong type, and `ZeroCount` for zero limits.
    pub fn from_value(kind: PanelType, value: Value) -> Result<Self, PanelError> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => value,
            _ => return Err(PanelError::ConfigNotObject { kind }),
        };
        let config = match kind {
            PanelType::VideoFeed => Self::VideoFeed(parse(kind, value)?),
            PanelType::VideoPlayer => Self::VideoPlayer(parse(kind, value)?),
            PanelType::Search => Self::Search(parse(kind, value)?),
            PanelType::List => Self::List(parse(kind, value)?),
            PanelType::Recommendations => Self::Recommendations(parse(kind, value)?),
            PanelType::WatchLater => Self::WatchLater(parse(kind, value)?),
            PanelType::Subscriptions => Self::Subscriptions(parse(kind, value)?),
            PanelType::Trending => Self::Trending(parse(kind, value)?),
            PanelType::AiCurated => Self::AiCurated(parse(kind, value)?),
            PanelType::Custom => Self::Custom(parse(kind, value)?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check range constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ZeroCount` if a limit field is present and zero.
    pub fn validate(&self) -> Result<(), PanelError> {
        let (field, count) = match self {
            Self::Search(c) => ("resultsLimit", c.results_limit),
            Self::VideoFeed(c) => ("maxItems", c.max_items),
            Self::List(c) => ("maxItems", c.max_items),
            Self::Recommendations(c) => ("maxItems", c.max_items),
            Self::WatchLater(c) => ("maxItems", c.max_items),
            Self::Subscriptions(c) => ("maxItems", c.max_items),
            Self::Trending(c) => ("maxItems", c.max_items),
            Self::AiCurated(c) => ("maxItems", c.max_items),
            Self::VideoPlayer(_) | Self::Custom(_) => return Ok(()),
        };
        if count == Some(0) {
            return Err(PanelError::ZeroCount { kind: self.panel_type(), field });
        }
        Ok(())
    }

    /// Look up a config key by its wire name, including unknown keys.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }
}

fn parse<T: DeserializeOwned>(kind: PanelType, value: Value) -> Result<T, PanelError> {
    serde_json::from_value(value).map_err(|source| PanelError::InvalidConfig { kind, source })
}

impl Serialize for PanelConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::VideoFeed(c) => c.serialize(serializer),
            Self::VideoPlayer(c) => c.serialize(serializer),
            Self::Search(c) => c.serialize(serializer),
            Self::List(c) => c.serialize(serializer),
            Self::Recommendations(c) => c.serialize(serializer),
            Self::WatchLater(c) => c.serialize(serializer),
            Self::Subscriptions(c) => c.serialize(serializer),
            Self::Trending(c) => c.serialize(serializer),
            Self::AiCurated(c) => c.serialize(serializer),
            Self::Custom(c) => c.serialize(serializer),
        }
    }
}

// =============================================================================
// PANEL
// =============================================================================

/// A dashboard panel as held by the store and written to storage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPanel")]
pub struct Panel {
    /// Unique identifier, fixed at creation.
    pub id: String,
    /// Display label.
    pub title: String,
    /// Top-left grid coordinates.
    pub position: Position,
    /// Extent in layout units.
    pub size: Size,
    /// Type-specific configuration; its variant is the panel type.
    pub config: PanelConfig,
    /// Collapsed to its title bar.
    pub minimized: bool,
    /// Rendered at all.
    pub visible: bool,
}

impl Panel {
    /// Build a panel at the origin with the default size. `title` falls back
    /// to the type's default title.
    #[must_use]
    pub fn new(id: String, config: PanelConfig, title: Option<String>) -> Self {
        let title = title.unwrap_or_else(|| config.panel_type().default_title().to_owned());
        Self {
            id,
            title,
            position: Position::default(),
            size: Size::default(),
            config,
            minimized: false,
            visible: true,
        }
    }

    /// Move and resize, for building preset layouts.
    #[must_use]
    pub fn with_geometry(mut self, position: Position, size: Size) -> Self {
        self.position = position;
        self.size = size;
        self
    }

    #[must_use]
    pub fn panel_type(&self) -> PanelType {
        self.config.panel_type()
    }

    /// Run the checks a stored panel goes through when it is loaded back:
    /// a non-empty size, and a config whose wire form parses for its type.
    /// Keys held in a record's `extra` map count too.
    ///
    /// # Errors
    ///
    /// Returns the first `PanelError` found.
    pub fn validate(&self) -> Result<(), PanelError> {
        let kind = self.panel_type();
        self.size.validate()?;
        let wire = serde_json::to_value(&self.config).map_err(|source| PanelError::InvalidConfig { kind, source })?;
        PanelConfig::from_value(kind, wire).map(drop)
    }

    /// Shallow-merge an update. Nothing is applied unless the whole update
    /// validates.
    ///
    /// # Errors
    ///
    /// Returns a `PanelError` if the new size is empty or the new config
    /// doesn't fit this panel's type.
    pub fn apply(&mut self, update: &PanelUpdate) -> Result<(), PanelError> {
        let size = update.size.map(Size::validate).transpose()?;
        let config = match &update.config {
            Some(raw) => Some(PanelConfig::from_value(self.panel_type(), raw.clone())?),
            None => None,
        };

        if let Some(title) = &update.title {
            self.title.clone_from(title);
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(size) = size {
            self.size = size;
        }
        if let Some(config) = config {
            self.config = config;
        }
        if let Some(minimized) = update.minimized {
            self.minimized = minimized;
        }
        if let Some(visible) = update.visible {
            self.visible = visible;
        }
        Ok(())
    }
}

/// Borrowed wire shape used for serialization.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PanelRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: PanelType,
    title: &'a str,
    position: Position,
    size: Size,
    config: &'a PanelConfig,
    minimized: bool,
    visible: bool,
}

impl Serialize for Panel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PanelRef {
            id: &self.id,
            kind: self.panel_type(),
            title: &self.title,
            position: self.position,
            size: self.size,
            config: &self.config,
            minimized: self.minimized,
            visible: self.visible,
        }
        .serialize(serializer)
    }
}

/// Owned wire shape used for deserialization before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPanel {
    id: String,
    #[serde(rename = "type")]
    kind: PanelType,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    size: Size,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    minimized: bool,
    #[serde(default = "default_visible")]
    visible: bool,
}

fn default_visible() -> bool {
    true
}

impl TryFrom<RawPanel> for Panel {
    type Error = PanelError;

    fn try_from(raw: RawPanel) -> Result<Self, Self::Error> {
        let config = PanelConfig::from_value(raw.kind, raw.config)?;
        let size = raw.size.validate()?;
        Ok(Self {
            id: raw.id,
            title: raw.title.unwrap_or_else(|| raw.kind.default_title().to_owned()),
            position: raw.position,
            size,
            config,
            minimized: raw.minimized,
            visible: raw.visible,
        })
    }
}

// =============================================================================
// PANEL UPDATE
// =============================================================================

/// Sparse update for a panel. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PanelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Replaces the whole config; validated against the panel's type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}
