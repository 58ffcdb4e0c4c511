//! A constant-data weather tool standing in for a real data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::function_calling::{FunctionError, ToolHandler};
use crate::models::FunctionDeclaration;

pub const GET_CURRENT_WEATHER: &str = "get_current_weather";

/// Arguments of `get_current_weather`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherArgs {
    pub location: String,
}

/// Result of `get_current_weather`. All values are strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: String,
    pub unit: String,
    pub forecast: String,
}

/// Returns the same sunny 72°F report for every location, echoing `location` verbatim.
#[must_use]
pub fn get_current_weather(location: &str) -> WeatherReport {
    WeatherReport {
        location: location.to_string(),
        temperature: "72".to_string(),
        unit: "fahrenheit".to_string(),
        forecast: "sunny".to_string(),
    }
}

/// The declaration offered to the model.
#[must_use]
pub fn weather_declaration() -> FunctionDeclaration {
    FunctionDeclaration::builder(GET_CURRENT_WEATHER)
        .description("Get the current weather in a given location")
        .parameter(
            "location",
            json!({
                "type": "STRING",
                "description": "The city and state, e.g. San Francisco, CA"
            }),
        )
        .required(["location"])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherTool;

#[async_trait]
impl ToolHandler for WeatherTool {
    type Args = WeatherArgs;
    type Output = WeatherReport;

    fn declaration(&self) -> FunctionDeclaration {
        weather_declaration()
    }

    async fn invoke(&self, args: WeatherArgs) -> Result<WeatherReport, FunctionError> {
        Ok(get_current_weather(&args.location))
    }
}
