//! Wire types for the Vertex AI `generateContent` endpoint.
//!
//! Only the subset of the schema used by function calling is modelled. Field
//! names follow the service's camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::VertexError;

/// The author of a [`Content`] turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    /// Turns carrying function responses back to the model.
    Function,
}

/// One turn of the conversation: a role and an ordered list of parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part::text(text)],
        }
    }

    /// A function turn holding a single function response part.
    #[must_use]
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Some(Role::Function),
            parts: vec![Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: name.into(),
                    response,
                },
            }],
        }
    }

    #[must_use]
    pub fn first_part(&self) -> Option<&Part> {
        self.parts.first()
    }

    /// Returns the first function call among this turn's parts, if any.
    #[must_use]
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(Part::as_function_call)
    }

    /// Returns the first function response among this turn's parts, if any.
    #[must_use]
    pub fn function_response_part(&self) -> Option<&FunctionResponse> {
        self.parts.iter().find_map(Part::as_function_response)
    }
}

/// The smallest unit of a turn.
///
/// Parts the crate does not understand (inline data, executable code, ...) are
/// captured as [`Part::Unknown`] instead of failing deserialization.
///
/// Model parts may carry a `thoughtSignature`. It is kept so the turn can be
/// sent back unchanged on the next request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
        #[serde(
            rename = "thoughtSignature",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        thought_signature: Option<String>,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    Text {
        text: String,
        #[serde(
            rename = "thoughtSignature",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        thought_signature: Option<String>,
    },
    Unknown(Value),
}

impl Part {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought_signature: None,
        }
    }

    #[must_use]
    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Part::FunctionCall {
            function_call: FunctionCall {
                name: name.into(),
                args,
            },
            thought_signature: None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall { function_call, .. } => Some(function_call),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function_response(&self) -> Option<&FunctionResponse> {
        match self {
            Part::FunctionResponse { function_response } => Some(function_response),
            _ => None,
        }
    }

    #[must_use]
    pub fn thought_signature(&self) -> Option<&str> {
        match self {
            Part::FunctionCall {
                thought_signature, ..
            }
            | Part::Text {
                thought_signature, ..
            } => thought_signature.as_deref(),
            _ => None,
        }
    }
}

fn empty_args() -> Value {
    Value::Object(Map::new())
}

/// Represents a function call made by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw arguments as sent by the model. The service omits the field when a
    /// call carries no arguments.
    #[serde(default = "empty_args")]
    pub args: Value,
}

/// Represents the response to a function call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// A group of function declarations offered to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Represents a function that can be called by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: FunctionParameters,
}

impl FunctionDeclaration {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: FunctionParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Starts a builder for a declaration with an `OBJECT` parameter schema.
    ///
    /// ```
    /// use vertex_genai::FunctionDeclaration;
    /// use serde_json::json;
    ///
    /// let decl = FunctionDeclaration::builder("get_current_weather")
    ///     .description("Get the current weather in a given location")
    ///     .parameter("location", json!({"type": "STRING"}))
    ///     .required(["location"])
    ///     .build();
    /// assert_eq!(decl.parameters().required(), ["location"]);
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FunctionDeclarationBuilder {
        FunctionDeclarationBuilder {
            name: name.into(),
            description: String::new(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn parameters(&self) -> &FunctionParameters {
        &self.parameters
    }

    /// Wraps this declaration in a single-function [`Tool`].
    #[must_use]
    pub fn into_tool(self) -> Tool {
        Tool {
            function_declarations: vec![self],
        }
    }
}

#[derive(Debug)]
pub struct FunctionDeclarationBuilder {
    name: String,
    description: String,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl FunctionDeclarationBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a property schema, e.g. `json!({"type": "STRING"})`.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn build(self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name,
            description: self.description,
            parameters: FunctionParameters::new(
                "OBJECT",
                Value::Object(self.properties),
                self.required,
            ),
        }
    }
}

/// Represents the parameters schema for a function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameters {
    #[serde(rename = "type")]
    type_: String,
    properties: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
}

impl FunctionParameters {
    #[must_use]
    pub fn new(type_: impl Into<String>, properties: Value, required: Vec<String>) -> Self {
        Self {
            type_: type_.into(),
            properties,
            required,
        }
    }

    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    #[must_use]
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }
}

/// Request body for `generateContent`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

/// Response body of `generateContent`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Returns the content of the first candidate, provided it has at least one part.
    ///
    /// # Errors
    ///
    /// Returns [`VertexError::MalformedResponse`] when there are no candidates,
    /// the first candidate carries no content, or the content has no parts.
    pub fn first_candidate_content(&self) -> Result<&Content, VertexError> {
        let candidate = self.candidates.first().ok_or_else(|| {
            VertexError::MalformedResponse("response contained no candidates".to_string())
        })?;
        let content = candidate.content.as_ref().ok_or_else(|| {
            VertexError::MalformedResponse(format!(
                "first candidate has no content (finish_reason: {:?})",
                candidate.finish_reason
            ))
        })?;
        if content.parts.is_empty() {
            return Err(VertexError::MalformedResponse(
                "first candidate content has no parts".to_string(),
            ));
        }
        Ok(content)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
}

/// Token accounting reported by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_user_content() {
        let content = Content::user_text("What is the weather like in Boston?");
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!({"role": "user", "parts": [{"text": "What is the weather like in Boston?"}]})
        );
    }

    #[test]
    fn test_serialize_function_response_content() {
        let content = Content::function_response("get_current_weather", json!({"forecast": "sunny"}));
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "function",
                "parts": [{
                    "functionResponse": {
                        "name": "get_current_weather",
                        "response": {"forecast": "sunny"}
                    }
                }]
            })
        );
    }

    #[test]
    fn test_deserialize_function_call_part() {
        let part: Part = serde_json::from_value(json!({
            "functionCall": {"name": "get_current_weather", "args": {"location": "Boston, MA"}}
        }))
        .unwrap();
        let call = part.as_function_call().expect("should be a function call");
        assert_eq!(call.name, "get_current_weather");
        assert_eq!(call.args, json!({"location": "Boston, MA"}));
    }

    #[test]
    fn test_deserialize_function_call_without_args() {
        let part: Part =
            serde_json::from_value(json!({"functionCall": {"name": "ping"}})).unwrap();
        assert_eq!(part.as_function_call().unwrap().args, json!({}));
    }

    #[test]
    fn test_deserialize_function_call_with_extra_fields() {
        let part: Part = serde_json::from_value(json!({
            "functionCall": {"name": "get_current_weather", "args": {}},
            "thoughtSignature": "abc"
        }))
        .unwrap();
        assert!(part.as_function_call().is_some());
        assert_eq!(part.thought_signature(), Some("abc"));
    }

    #[test]
    fn test_model_turn_echoes_unchanged() {
        let wire = json!({
            "role": "model",
            "parts": [
                {
                    "functionCall": {"name": "get_current_weather", "args": {"location": "Boston"}},
                    "thoughtSignature": "c2lnbmF0dXJl"
                },
                {"text": "Checking the weather.", "thoughtSignature": "dGV4dA=="}
            ]
        });
        let content: Content = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&content).unwrap(), wire);
    }

    #[test]
    fn test_unsigned_parts_serialize_without_signature() {
        let value = serde_json::to_value(Part::function_call("ping", json!({}))).unwrap();
        assert_eq!(value, json!({"functionCall": {"name": "ping", "args": {}}}));
    }

    #[test]
    fn test_deserialize_unknown_part() {
        let part: Part = serde_json::from_value(json!({
            "inlineData": {"mimeType": "image/png", "data": "AAAA"}
        }))
        .unwrap();
        assert!(matches!(part, Part::Unknown(_)));
        assert!(part.as_text().is_none());
        assert!(part.as_function_call().is_none());
    }

    #[test]
    fn test_serialize_function_declaration_tool() {
        let tool = FunctionDeclaration::builder("get_current_weather")
            .description("Get the current weather in a given location")
            .parameter("location", json!({"type": "STRING"}))
            .required(["location"])
            .build()
            .into_tool();
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(
            value,
            json!({
                "functionDeclarations": [{
                    "name": "get_current_weather",
                    "description": "Get the current weather in a given location",
                    "parameters": {
                        "type": "OBJECT",
                        "properties": {"location": {"type": "STRING"}},
                        "required": ["location"]
                    }
                }]
            })
        );
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text("hi")],
            tools: vec![],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_deserialize_response_with_usage() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Sunny."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2, "totalTokenCount": 12},
            "modelVersion": "gemini-1.5-flash-001"
        }))
        .unwrap();
        let content = response.first_candidate_content().unwrap();
        assert_eq!(content.role, Some(Role::Model));
        assert_eq!(content.first_part().unwrap().as_text(), Some("Sunny."));
        assert_eq!(response.usage_metadata.unwrap().total_token_count, Some(12));
    }

    #[test]
    fn test_first_candidate_content_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        let err = response.first_candidate_content().unwrap_err();
        assert!(matches!(err, VertexError::MalformedResponse(_)));
    }

    #[test]
    fn test_first_candidate_content_missing_content() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        let err = response.first_candidate_content().unwrap_err();
        assert!(format!("{}", err).contains("SAFETY"));
    }

    #[test]
    fn test_first_candidate_content_no_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": []}}]
        }))
        .unwrap();
        assert!(response.first_candidate_content().is_err());
    }
}
