//! The fixed table of test cases and the operations that can be checked against them.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// One of the read endpoints of the hashstore service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// `GET /info/{pid}`: paths and authorization status of an object.
    Info,
    /// `GET /meta/{pid}`: system metadata of an object.
    Meta,
    /// `GET /object/{pid}`: the object contents.
    Object,
}

impl Operation {
    /// All operations, in the order their task weights are configured.
    pub const ALL: [Operation; 3] = [Operation::Info, Operation::Meta, Operation::Object];

    /// The URL path segment of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Info => "info",
            Operation::Meta => "meta",
            Operation::Object => "object",
        }
    }

    /// Builds the request path for `pid`.
    ///
    /// The identifier is embedded verbatim, URN-style identifiers keep their colons.
    pub fn path(self, pid: &str) -> String {
        format!("/{}/{pid}", self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identifier together with the status codes each operation is expected to return for it.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// The persistent identifier requested from the service.
    pub pid: String,
    /// Expected status of `GET /info/{pid}`.
    #[serde(with = "status_code")]
    pub info: StatusCode,
    /// Expected status of `GET /meta/{pid}`.
    #[serde(with = "status_code")]
    pub meta: StatusCode,
    /// Expected status of `GET /object/{pid}`.
    #[serde(with = "status_code")]
    pub object: StatusCode,
}

impl TestCase {
    /// Creates a test case with the given expectations.
    pub fn new(
        pid: impl Into<String>,
        info: StatusCode,
        meta: StatusCode,
        object: StatusCode,
    ) -> Self {
        Self {
            pid: pid.into(),
            info,
            meta,
            object,
        }
    }

    /// The status code `op` is expected to return for this identifier.
    pub fn expected(&self, op: Operation) -> StatusCode {
        match op {
            Operation::Info => self.info,
            Operation::Meta => self.meta,
            Operation::Object => self.object,
        }
    }
}

/// The read-only table of test cases shared by all virtual users.
pub type Cases = Arc<[TestCase]>;

/// The cases checked when the configuration does not provide its own.
///
/// Objects stored without system metadata answer `meta` with `404`, which is the expected outcome.
pub fn default_cases() -> Vec<TestCase> {
    vec![
        TestCase::new(
            "index.parquet",
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::OK,
        ),
        TestCase::new(
            "BLE_LTER_leachate_DOM_composition.csv",
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::OK,
        ),
        TestCase::new(
            "urn:uuid:fc6798d4-9e79-4eb7-84d6-db05005cd356",
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
        ),
    ]
}

mod status_code {
    use reqwest::StatusCode;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code)
            .map_err(|_| D::Error::custom(format!("invalid status code `{code}`")))
    }
}
