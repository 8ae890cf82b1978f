//! Per-scenario state
//!
//! Holds the outcome of the most recent API call and whatever fixtures the
//! scenario captured along the way. The outcome is a single enum, so a
//! "last response" and a "last error" can never coexist.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiResult, FailureKind};
use crate::error::{HarnessError, HarnessResult};
use crate::normalize::error_message;
use crate::schema::Validator;

/// Successful call, as recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedResponse {
    pub status: u16,
    /// Normalized body as the backend sent it; `None` for 204 / empty bodies
    pub body: Option<Value>,
}

/// Failed call, as recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedError {
    pub status: u16,
    pub message: String,
    pub kind: FailureKind,
    /// Whatever body came with the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Response(RecordedResponse),
    Error(RecordedError),
}

/// Named values a scenario carries between steps (ids, emails, ...)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixtures {
    values: IndexMap<String, Value>,
}

impl Fixtures {
    pub fn capture(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> HarnessResult<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| HarnessError::MissingFixture(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Scenario state, generic over the caller's fixture type
#[derive(Debug, Default)]
pub struct World<F = Fixtures> {
    outcome: Option<Outcome>,
    pub fixtures: F,
}

impl<F: Default> World<F> {
    pub fn new() -> Self {
        Self {
            outcome: None,
            fixtures: F::default(),
        }
    }

    /// Clear the outcome and the fixtures.
    pub fn reset(&mut self) {
        self.outcome = None;
        self.fixtures = F::default();
    }
}

impl<F> World<F> {
    /// Store a call result, replacing whatever was recorded before.
    ///
    /// Every `Failure` becomes the last error. A `Success` whose status is
    /// still >= 400 is treated as an error too. Bodies are kept as the
    /// backend sent them, not as the client decoded them.
    pub fn record<T: Serialize>(&mut self, result: &ApiResult<T>) {
        let outcome = match result {
            ApiResult::Failure { status, message, body } => Outcome::Error(RecordedError {
                status: *status,
                message: message.clone(),
                kind: FailureKind::from_status(*status),
                body: body.clone(),
            }),
            ApiResult::Success { status, .. } if *status >= 400 => {
                let body = result.payload();
                Outcome::Error(RecordedError {
                    status: *status,
                    message: error_message(body.as_ref()).unwrap_or_else(|| format!("HTTP {}", status)),
                    kind: FailureKind::from_status(*status),
                    body,
                })
            }
            ApiResult::Success { status, .. } => Outcome::Response(RecordedResponse {
                status: *status,
                body: result.payload(),
            }),
        };
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn last_response(&self) -> Option<&RecordedResponse> {
        match &self.outcome {
            Some(Outcome::Response(response)) => Some(response),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&RecordedError> {
        match &self.outcome {
            Some(Outcome::Error(error)) => Some(error),
            _ => None,
        }
    }

    pub fn last_status(&self) -> Option<u16> {
        match &self.outcome {
            Some(Outcome::Response(r)) => Some(r.status),
            Some(Outcome::Error(e)) => Some(e.status),
            None => None,
        }
    }

    /// "I should receive a {status} status code"
    pub fn assert_status(&self, expected: u16) -> HarnessResult<()> {
        let actual = self.last_status().ok_or(HarnessError::NothingRecorded)?;
        if actual == expected {
            Ok(())
        } else {
            Err(HarnessError::UnexpectedStatus { expected, actual })
        }
    }

    pub fn assert_success(&self) -> HarnessResult<&RecordedResponse> {
        match &self.outcome {
            Some(Outcome::Response(response)) => Ok(response),
            Some(Outcome::Error(error)) => Err(HarnessError::Api {
                status: error.status,
                message: error.message.clone(),
            }),
            None => Err(HarnessError::NothingRecorded),
        }
    }

    /// "I should receive a validation error" (400 or 422)
    pub fn assert_validation_error(&self) -> HarnessResult<&RecordedError> {
        self.assert_error_kind(FailureKind::Validation)
    }

    /// "I should receive a not found error"
    pub fn assert_not_found(&self) -> HarnessResult<&RecordedError> {
        self.assert_error_kind(FailureKind::NotFound)
    }

    fn assert_error_kind(&self, expected: FailureKind) -> HarnessResult<&RecordedError> {
        match &self.outcome {
            Some(Outcome::Error(error)) if error.kind == expected => Ok(error),
            Some(Outcome::Error(error)) => Err(HarnessError::AssertionFailed(format!(
                "expected a {} error, got {} ({}): {}",
                expected, error.kind, error.status, error.message
            ))),
            Some(Outcome::Response(response)) => Err(HarnessError::AssertionFailed(format!(
                "expected a {} error, got success ({})",
                expected, response.status
            ))),
            None => Err(HarnessError::NothingRecorded),
        }
    }

    /// Body of the last successful response
    pub fn response_body(&self) -> HarnessResult<&Value> {
        self.assert_success()?
            .body
            .as_ref()
            .ok_or_else(|| HarnessError::AssertionFailed("last response has no body".into()))
    }

    pub fn response_as<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        Ok(serde_json::from_value(self.response_body()?.clone())?)
    }

    /// Validate the last response body, reporting every violation.
    ///
    /// A 2xx body the client could not decode is validated too, so its
    /// violations are itemized instead of hidden behind the decode error.
    pub fn assert_schema(&self, validator: &Validator) -> HarnessResult<()> {
        match &self.outcome {
            Some(Outcome::Error(error)) if (200..300).contains(&error.status) => {
                if let Some(body) = &error.body {
                    validator.check(body)?;
                }
                Err(HarnessError::Api {
                    status: error.status,
                    message: error.message.clone(),
                })
            }
            _ => validator.check(self.response_body()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TRANSPORT_FAILURE_STATUS;
    use crate::schema::{Schema, Validator};
    use serde_json::json;

    fn exclusive(world: &World) -> bool {
        world.last_response().is_some() != world.last_error().is_some()
    }

    #[test]
    fn test_record_is_mutually_exclusive() {
        let mut world = World::<Fixtures>::new();
        assert!(world.outcome().is_none());

        let results: Vec<ApiResult<Value>> = vec![
            ApiResult::ok(201, json!({"id": "1"})),
            ApiResult::err(404, "missing"),
            ApiResult::ok(204, Value::Null),
            ApiResult::err(TRANSPORT_FAILURE_STATUS, "refused"),
            ApiResult::ok(500, json!({})),
            ApiResult::ok(200, json!([])),
        ];
        for result in &results {
            world.record(result);
            assert!(exclusive(&world), "both or neither set after {:?}", result);
        }
    }

    #[test]
    fn test_classification() {
        let mut world = World::<Fixtures>::new();

        world.record(&ApiResult::<()>::err(0, "timeout"));
        assert_eq!(world.last_error().unwrap().kind, FailureKind::Transport);

        world.record(&ApiResult::ok(503, ()));
        assert_eq!(world.last_error().unwrap().status, 503);
        assert_eq!(world.last_error().unwrap().message, "HTTP 503");

        world.record(&ApiResult::Success {
            status: 502,
            data: (),
            body: Some(json!({"message": "upstream down"})),
        });
        assert_eq!(world.last_error().unwrap().message, "upstream down");

        world.record(&ApiResult::ok(204, ()));
        let response = world.last_response().unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.body, None);
    }

    #[test]
    fn test_status_assertions() {
        let mut world = World::<Fixtures>::new();
        assert!(matches!(world.assert_status(200), Err(HarnessError::NothingRecorded)));

        world.record(&ApiResult::<()>::err(422, "bad"));
        assert!(world.assert_status(422).is_ok());
        assert!(world.assert_validation_error().is_ok());
        assert!(world.assert_not_found().is_err());
        assert!(matches!(
            world.assert_status(201),
            Err(HarnessError::UnexpectedStatus { expected: 201, actual: 422 })
        ));

        world.record(&ApiResult::<()>::err(404, "gone"));
        assert_eq!(world.assert_not_found().unwrap().message, "gone");
        assert!(world.assert_success().is_err());
    }

    #[test]
    fn test_schema_assertion() {
        let validator = Validator::new("Thing", Schema::object().required("id", Schema::string()));
        let mut world = World::<Fixtures>::new();

        world.record(&ApiResult::ok(200, json!({"id": "t-1"})));
        assert!(world.assert_schema(&validator).is_ok());

        world.record(&ApiResult::ok(200, json!({"id": 1})));
        let err = world.assert_schema(&validator).unwrap_err();
        assert!(err.to_string().contains("/id must be string"));
    }

    #[test]
    fn test_schema_checks_wire_body_not_decoded_value() {
        #[derive(Serialize)]
        struct Thing {
            id: String,
        }

        let validator = Validator::new("Thing", Schema::object().required("id", Schema::string()));
        let mut world = World::<Fixtures>::new();

        world.record(&ApiResult::Success {
            status: 200,
            data: Thing { id: "t-1".into() },
            body: Some(json!({"id": "t-1", "secret": true})),
        });
        let err = world.assert_schema(&validator).unwrap_err();
        assert!(err.to_string().contains("must NOT have additional property 'secret'"));
        assert_eq!(world.response_body().unwrap()["secret"], true);
    }

    #[test]
    fn test_schema_itemizes_undecodable_success() {
        let validator = Validator::new("Thing", Schema::object().required("id", Schema::string()));
        let mut world = World::<Fixtures>::new();

        world.record(&ApiResult::<()>::Failure {
            status: 200,
            message: "unexpected response body: invalid type".into(),
            body: Some(json!({"id": 7})),
        });
        let err = world.assert_schema(&validator).unwrap_err();
        assert!(matches!(err, HarnessError::SchemaViolation { .. }), "{:?}", err);
        assert!(err.to_string().contains("/id must be string"));

        world.record(&ApiResult::<()>::Failure {
            status: 200,
            message: "unexpected response body: missing field".into(),
            body: Some(json!({"id": "ok"})),
        });
        assert!(matches!(
            world.assert_schema(&validator),
            Err(HarnessError::Api { status: 200, .. })
        ));
    }

    #[test]
    fn test_reset_clears_fixtures() {
        let mut world = World::<Fixtures>::new();
        world.fixtures.capture("userId", "u-1");
        world.record(&ApiResult::ok(200, ()));
        assert_eq!(world.fixtures.get_str("userId").unwrap(), "u-1");

        world.reset();
        assert!(world.outcome().is_none());
        assert!(world.fixtures.is_empty());
        assert!(matches!(world.fixtures.get_str("userId"), Err(HarnessError::MissingFixture(_))));
    }

    #[test]
    fn test_custom_fixture_type() {
        #[derive(Default)]
        struct Ids {
            order: Option<String>,
        }

        let mut world = World::<Ids>::new();
        world.fixtures.order = Some("o-1".into());
        world.reset();
        assert!(world.fixtures.order.is_none());
    }
}
