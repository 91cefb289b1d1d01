use super::registry::Tool;
use crate::cache::{CacheConfig, CacheKey, CacheManager, MemoryCache};
use crate::types::ToolDefinition;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_WEATHER_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Arguments of `get_weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// City name, e.g. "Paris" or "San Francisco, CA".
    pub location: String,
    #[serde(default)]
    pub unit: Option<TemperatureUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    /// Degrees Celsius.
    pub temperature: f64,
    pub condition: String,
    #[serde(default)]
    pub humidity: Option<u8>,
}

impl WeatherReport {
    fn in_unit(mut self, unit: TemperatureUnit) -> Value {
        let unit_label = match unit {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => {
                self.temperature = self.temperature * 9.0 / 5.0 + 32.0;
                "fahrenheit"
            }
        };
        serde_json::json!({
            "location": self.location,
            "temperature": self.temperature,
            "unit": unit_label,
            "condition": self.condition,
            "humidity": self.humidity,
        })
    }
}

/// Source of current conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport>;
}

/// `get_weather` tool. Reports are cached per location for
/// [`DEFAULT_WEATHER_TTL`] unless configured otherwise.
pub struct WeatherTool<P> {
    provider: P,
    cache: CacheManager,
}

impl<P: WeatherProvider> WeatherTool<P> {
    pub fn new(provider: P) -> Self {
        Self::with_ttl(provider, DEFAULT_WEATHER_TTL)
    }

    pub fn with_ttl(provider: P, ttl: Duration) -> Self {
        Self {
            provider,
            cache: CacheManager::new(
                CacheConfig::new().with_ttl(ttl).with_key_prefix("weather"),
                Box::new(MemoryCache::new()),
            ),
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Cached lookup; locations compare case-insensitively.
    pub async fn lookup(&self, location: &str) -> Result<WeatherReport> {
        let normalized = location.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::validation_with_context(
                "location must not be empty",
                ErrorContext::new()
                    .with_field_path("location")
                    .with_source("weather_tool"),
            ));
        }
        let key = CacheKey::from(normalized);
        if let Some(report) = self.cache.get::<WeatherReport>(&key).await? {
            return Ok(report);
        }
        debug!(location = %location, "fetching weather");
        let report = self.provider.current(location.trim()).await?;
        self.cache.set(&key, &report).await?;
        Ok(report)
    }
}

#[async_trait]
impl<P: WeatherProvider> Tool for WeatherTool<P> {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function("get_weather", "Get the current weather for a location")
            .parameters_from::<WeatherArgs>()
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let args: WeatherArgs = serde_json::from_value(args).map_err(|e| {
            Error::validation_with_context(
                format!("invalid get_weather arguments: {}", e),
                ErrorContext::new().with_source("weather_tool"),
            )
        })?;
        let report = self.lookup(&args.location).await?;
        Ok(report.in_unit(args.unit.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl WeatherProvider for Counting {
        async fn current(&self, location: &str) -> Result<WeatherReport> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherReport {
                location: location.to_string(),
                temperature: 20.0,
                condition: "clear".into(),
                humidity: Some(40),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_cached_until_ttl() {
        let provider = Counting::default();
        let calls = provider.0.clone();
        let tool = WeatherTool::new(provider);

        tool.lookup("Paris").await.unwrap();
        tool.lookup("  paris ").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(DEFAULT_WEATHER_TTL).await;
        tool.lookup("Paris").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_call_converts_units() {
        let tool = WeatherTool::new(Counting::default());
        let out = tool
            .call(json!({"location": "Austin", "unit": "fahrenheit"}))
            .await
            .unwrap();
        assert_eq!(out["temperature"], 68.0);
        assert_eq!(out["unit"], "fahrenheit");

        assert!(tool.call(json!({"unit": "celsius"})).await.is_err());
        assert!(tool.lookup("   ").await.is_err());
    }

    #[test]
    fn test_definition_schema() {
        let tool = WeatherTool::new(Counting::default());
        let def = tool.definition();
        assert_eq!(def.name(), "get_weather");
        let params = def.function.parameters.unwrap();
        assert_eq!(params["required"], json!(["location"]));
    }
}
