//! 工具调用模块：函数定义、调用分发与天气查询工具。
//!
//! # Function Calling
//!
//! Helpers for the tool-calling round trip: describe tools to the model,
//! reassemble the calls it streams back, run them and turn the results into
//! `tool` messages for the next request.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Tool`] | Async trait implemented by callable tools |
//! | [`ToolRegistry`] | Name → tool map; definitions and dispatch |
//! | [`WeatherTool`] | `get_weather` backed by a [`WeatherProvider`] and a TTL cache |
//! | [`ToolCallAssembler`] | Rebuilds calls from streamed argument fragments |
//! | [`json_schema_from_type`] | Parameter schema derived with `schemars` |

mod registry;
mod weather;

pub use crate::types::{FunctionDefinition, ToolCall, ToolCallDelta, ToolDefinition};
pub use crate::utils::ToolCallAssembler;
pub use registry::{Tool, ToolRegistry};
pub use weather::{
    TemperatureUnit, WeatherArgs, WeatherProvider, WeatherReport, WeatherTool,
    DEFAULT_WEATHER_TTL,
};

use serde_json::json;

/// JSON Schema for `T`, as sent in `function.parameters`.
pub fn json_schema_from_type<T: schemars::JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(&schema).unwrap_or_else(|_| json!({"type": "object"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Lookup {
        /// Ticker symbol.
        symbol: String,
        limit: Option<u32>,
    }

    #[test]
    fn test_schema_from_type() {
        let schema = json_schema_from_type::<Lookup>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["symbol"]["type"], "string");
        assert_eq!(schema["required"], json!(["symbol"]));

        let def = ToolDefinition::function("lookup", "Look up a quote").parameters_from::<Lookup>();
        assert_eq!(def.function.parameters.unwrap()["properties"]["symbol"]["description"], "Ticker symbol.");
    }
}
