//! Topic routing
//!
//! Maps the four subscribed broker topics to the store operation each one
//! feeds.

use crate::config::TopicsConfig;
use crate::store::MetricKey;

/// Store operation a topic feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Numeric reading for one series
    Metric(MetricKey),
    /// Aggregate attributes, carrying the on/off state token
    State,
}

/// Subscribed topics and their routes
#[derive(Debug, Clone)]
pub struct TopicMap {
    attrs: String,
    temperature: String,
    humidity: String,
    light: String,
}

impl TopicMap {
    pub fn new(
        attrs: impl Into<String>,
        temperature: impl Into<String>,
        humidity: impl Into<String>,
        light: impl Into<String>,
    ) -> Self {
        Self {
            attrs: attrs.into(),
            temperature: temperature.into(),
            humidity: humidity.into(),
            light: light.into(),
        }
    }

    /// Resolve a topic, `None` for anything not subscribed
    pub fn route(&self, topic: &str) -> Option<Route> {
        if topic == self.temperature {
            Some(Route::Metric(MetricKey::Temperature))
        } else if topic == self.humidity {
            Some(Route::Metric(MetricKey::Humidity))
        } else if topic == self.light {
            Some(Route::Metric(MetricKey::Light))
        } else if topic == self.attrs {
            Some(Route::State)
        } else {
            None
        }
    }

    /// All topics to subscribe to
    pub fn subscriptions(&self) -> [&str; 4] {
        [
            self.attrs.as_str(),
            self.temperature.as_str(),
            self.humidity.as_str(),
            self.light.as_str(),
        ]
    }
}

impl Default for TopicMap {
    fn default() -> Self {
        Self::from(&TopicsConfig::default())
    }
}

impl From<&TopicsConfig> for TopicMap {
    fn from(config: &TopicsConfig) -> Self {
        Self::new(
            &config.attrs,
            &config.temperature,
            &config.humidity,
            &config.light,
        )
    }
}
