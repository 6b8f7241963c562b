use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{future::Future, time::Duration};

use crate::{
    config::ServerConfig,
    modules::{
        coordinator::{outcome::ServerReply, request::SubmissionRequest},
        error::TransportError,
    },
};

// The single network exchange of a submission attempt
pub trait AttendanceTransport: Send + Sync {
    fn submit_attendance(
        &self,
        request: SubmissionRequest,
    ) -> impl Future<Output = Result<ServerReply, TransportError>> + Send;
}

// Face registration exchange
pub trait RegistrationTransport: Send + Sync {
    fn register_face(
        &self,
        request: RegistrationRequest,
    ) -> impl Future<Output = Result<RegistrationReply, TransportError>> + Send;
}

#[derive(Debug, Serialize)]
pub struct RegistrationRequest {
    // JPEG data URI of the face to enrol
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationReply {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReply {
    pub status: String,
    pub service: String,
}

// Talks to the attendance server over HTTP
#[derive(Clone)]
pub struct HttpTransport {

    // Reusable client with connection pooling
    http: reqwest::Client,

    attendance_url: String,
    registration_url: String,
    health_url: String,
}

impl HttpTransport {
    pub fn new(server: &ServerConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::RequestError(e.to_string()))?;

        Ok(Self {
            http,
            attendance_url: server.url_for(&server.attendance_path),
            registration_url: server.url_for(&server.registration_path),
            health_url: server.url_for(&server.health_path),
        })
    }

    async fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Vec<u8>, TransportError> {
        let json_string = serde_json::to_string(body)
            .map_err(|e| TransportError::JsonSerializationError(e.to_string()))?;

        let response = self.http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json_string)
            .send()
            .await
            .map_err(|e| TransportError::RequestError(e.to_string()))?;

        // Error pages with a well-formed body are still classified from the body
        let status = response.status();
        if !status.is_success() {
            warn!("Server answered {} for {}", status, url);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::RequestError(e.to_string()))?;
        debug!("Received {} byte reply from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    // Liveness check of the attendance server
    pub async fn health(&self) -> Result<HealthReply, TransportError> {
        let response = self.http
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| TransportError::RequestError(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::RequestError(e.to_string()))?;

        parse_reply(&bytes, &health_reply_schema())
    }
}

impl AttendanceTransport for HttpTransport {
    async fn submit_attendance(&self, request: SubmissionRequest) -> Result<ServerReply, TransportError> {
        let bytes = self.post_json(&self.attendance_url, &request).await?;
        parse_reply(&bytes, &attendance_reply_schema())
    }
}

impl RegistrationTransport for HttpTransport {
    async fn register_face(&self, request: RegistrationRequest) -> Result<RegistrationReply, TransportError> {
        let bytes = self.post_json(&self.registration_url, &request).await?;
        parse_reply(&bytes, &registration_reply_schema())
    }
}

fn attendance_reply_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string" },
            "message": { "type": "string" }
        },
        "required": ["status", "message"]
    })
}

fn registration_reply_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "message": { "type": "string" }
        },
        "required": ["success", "message"]
    })
}

fn health_reply_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string" },
            "service": { "type": "string" }
        },
        "required": ["status", "service"]
    })
}

// Checks a reply body against its schema before deserializing it
fn parse_reply<T: DeserializeOwned>(bytes: &[u8], schema: &serde_json::Value) -> Result<T, TransportError> {
    let json_data: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| TransportError::JsonDeserializationError(e.to_string()))?;

    if let Err(e) = jsonschema::validate(schema, &json_data) {
        return Err(TransportError::MalformedReply(e.to_string()));
    }

    serde_json::from_value(json_data).map_err(|e| TransportError::JsonDeserializationError(e.to_string()))
}
