//! Request and response messages of the completion service.
//!
//! Messages are JSON objects. A request names its `operation` and carries
//! operation specific `params`:
//!
//! ```json
//! {"id": 1, "operation": "suggestions", "params": {"content": "!$a = 1", "range": {...}}}
//! ```
//!
//! and is answered with either `{"id": 1, "result": ...}` or
//! `{"id": 1, "error": {"code": "...", "message": "..."}}`.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    DocumentRef,
    completion::{Range, SuggestionFilter},
    error::ServiceError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub operation: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(id: u64, operation: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            operation: operation.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: ServiceError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// The result, or the tagged error.
    ///
    /// A response carrying neither is treated as a `null` result.
    pub fn into_result(self) -> Result<Value, ServiceError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// The document part shared by the per-document operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl DocumentParams {
    pub fn document(&self) -> DocumentRef<'_> {
        DocumentRef::new(self.key.as_deref(), self.content.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsParams {
    #[serde(flatten)]
    pub document: DocumentParams,
    #[serde(default)]
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SuggestionFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentsParams {
    #[serde(flatten)]
    pub document: DocumentParams,
    pub name: String,
    #[serde(default)]
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableParams {
    #[serde(flatten)]
    pub document: DocumentParams,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdlibParams {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub range: Range,
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Suggestions(SuggestionsParams),
    Arguments(ArgumentsParams),
    Callable(CallableParams),
    StdlibPaths(StdlibParams),
    StdlibCompletions(StdlibParams),
}

impl Operation {
    pub const SUGGESTIONS: &'static str = "suggestions";
    pub const ARGUMENTS: &'static str = "arguments";
    pub const CALLABLE: &'static str = "callable";
    pub const STDLIB_PATHS: &'static str = "stdlibPaths";
    pub const STDLIB_COMPLETIONS: &'static str = "stdlibCompletions";

    /// Decode the operation named by `request`.
    ///
    /// # Errors
    ///
    /// Returns an `unknown_operation` error for an unrecognised name and an
    /// `invalid_params` error when the params do not fit the operation.
    pub fn from_request(request: &Request) -> Result<Self, ServiceError> {
        match request.operation.as_str() {
            Self::SUGGESTIONS => params(request).map(Operation::Suggestions),
            Self::ARGUMENTS => params(request).map(Operation::Arguments),
            Self::CALLABLE => params(request).map(Operation::Callable),
            Self::STDLIB_PATHS => params(request).map(Operation::StdlibPaths),
            Self::STDLIB_COMPLETIONS => params(request).map(Operation::StdlibCompletions),
            other => Err(ServiceError::unknown_operation(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Suggestions(_) => Self::SUGGESTIONS,
            Operation::Arguments(_) => Self::ARGUMENTS,
            Operation::Callable(_) => Self::CALLABLE,
            Operation::StdlibPaths(_) => Self::STDLIB_PATHS,
            Operation::StdlibCompletions(_) => Self::STDLIB_COMPLETIONS,
        }
    }
}

fn params<T: DeserializeOwned>(request: &Request) -> Result<T, ServiceError> {
    let params = match &request.params {
        Value::Null => Value::Object(serde_json::Map::new()),
        params => params.clone(),
    };
    serde_json::from_value(params).map_err(ServiceError::invalid_params)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ServiceErrorCode;

    #[test]
    fn test_decodes_flattened_document_params() {
        let request = Request::new(
            3,
            "arguments",
            json!({
                "key": "file:///a.puml",
                "name": "$f",
                "range": {"start": {"line": 1, "character": 2}, "end": {"line": 1, "character": 2}}
            }),
        );
        let Operation::Arguments(params) = Operation::from_request(&request).unwrap() else {
            panic!("expected arguments");
        };
        assert_eq!(params.document.key.as_deref(), Some("file:///a.puml"));
        assert_eq!(params.document.content, None);
        assert_eq!(params.range.start.character, 2);
    }

    #[test]
    fn test_decoded_operation_keeps_its_name() {
        let names = ["suggestions", "arguments", "callable", "stdlibPaths", "stdlibCompletions"];
        for name in names {
            let request = Request::new(1, name, json!({"name": "$f"}));
            assert_eq!(Operation::from_request(&request).unwrap().name(), name);
        }
    }

    #[test]
    fn test_missing_params_default_where_possible() {
        let request = Request::new(1, "stdlibPaths", Value::Null);
        assert_eq!(
            Operation::from_request(&request).unwrap(),
            Operation::StdlibPaths(StdlibParams {
                prefix: String::new(),
                range: Range::default(),
            })
        );

        let request = Request::new(2, "callable", json!({"content": "x"}));
        let err = Operation::from_request(&request).unwrap_err();
        assert_eq!(err.code, ServiceErrorCode::InvalidParams);
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_unknown_operation() {
        let err = Operation::from_request(&Request::new(9, "explode", Value::Null)).unwrap_err();
        assert_eq!(err.code, ServiceErrorCode::UnknownOperation);
    }

    #[test]
    fn test_response_shape() {
        let ok = serde_json::to_value(Response::success(1, json!([]))).unwrap();
        assert_eq!(ok, json!({"id": 1, "result": []}));

        let failed = Response::failure(2, ServiceError::internal("lost"));
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["error"]["code"], "internal");
        assert!(value.get("result").is_none());
        assert_eq!(failed.into_result().unwrap_err().message, "lost");
    }
}
