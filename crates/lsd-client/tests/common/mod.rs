//! Shared fixtures for lsd-client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lsd_client::{
    ClientConfig, DeviceIdentity, HttpMethod, HttpResponse, Transport, TransportError,
};
use lsd_core::LicenseDocument;
use serde_json::{json, Value};

pub const STATUS_URL: &str = "http://lsd.test/status/1";
pub const LICENSE_URL: &str = "http://lsd.test/licenses/1";
pub const REGISTER_URL: &str = "http://lsd.test/licenses/1/register";
pub const RENEW_URL: &str = "http://lsd.test/licenses/1/renew";
pub const RETURN_URL: &str = "http://lsd.test/licenses/1/return";

pub const T0: &str = "2016-07-01T00:00:00Z";
pub const T1: &str = "2016-07-01T00:00:05Z";

/// A [`Transport`] that replays canned responses in order and records
/// every request it receives.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<(HttpMethod, String)>>>,
    sent_at: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body));
        self
    }

    pub fn respond_json(self, status: u16, body: &Value) -> Self {
        self.respond(status, body.to_string())
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// When each recorded request arrived, in request order.
    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent_at.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        self.sent_at.lock().unwrap().push(Instant::now());
        self.requests.lock().unwrap().push((method, url.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Connection {
                method,
                url: url.to_string(),
                reason: "no scripted response left".into(),
            })
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(DeviceIdentity::new("device-1", "Test Reader").unwrap())
        .with_mutation_delay(Duration::ZERO)
}

pub fn license_json(updated: &str, end: &str) -> Value {
    json!({
        "id": "lic-1",
        "issued": "2016-06-01T00:00:00Z",
        "updated": updated,
        "rights": {"start": "2016-06-01T00:00:00Z", "end": end},
        "links": {
            "status": {"href": STATUS_URL, "type": "application/vnd.readium.license.status.v1.0+json"}
        }
    })
}

pub fn license(updated: &str, end: &str) -> LicenseDocument {
    LicenseDocument::from_value(license_json(updated, end)).unwrap()
}

pub fn status_json(status: &str, license_updated: &str, status_updated: &str) -> Value {
    json!({
        "id": "status-1",
        "status": status,
        "updated": {"license": license_updated, "status": status_updated},
        "links": {
            "license": {"href": LICENSE_URL, "type": "application/vnd.readium.lcp.license-1.0+json"},
            "register": {"href": format!("{REGISTER_URL}{{?id,name}}"), "templated": true},
            "return": {"href": format!("{RETURN_URL}{{?id,name}}"), "templated": true},
            "renew": [
                {"href": "http://lsd.test/renew.html", "type": "text/html"},
                {
                    "href": format!("{RENEW_URL}{{?end,id,name}}"),
                    "type": "application/vnd.readium.lcp.license-1.0+json",
                    "templated": true
                }
            ]
        }
    })
}

pub fn error_json(error_type: &str, title: &str) -> Value {
    json!({"type": error_type, "title": title})
}
