//! Client registration records as produced by the registration engine.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Endpoint;

/// A LwM2M client registration, projected to JSON with camelCase keys.
///
/// Built by the registration engine and handed to listeners read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Client endpoint name.
    pub endpoint: Endpoint,
    /// Server-assigned registration id.
    pub registration_id: String,
    /// First registration time.
    pub registration_date: DateTime<Utc>,
    /// Time of the last registration update.
    pub last_update: DateTime<Utc>,
    /// Client source address.
    pub address: IpAddr,
    /// Client source port.
    pub port: u16,
    /// Registration lifetime in seconds.
    pub lifetime: u64,
    /// LwM2M enabler version (e.g. `"1.1"`).
    #[serde(rename = "lwM2mVersion")]
    pub lwm2m_version: String,
    /// Binding mode letters (e.g. `"UQ"`).
    pub binding_mode: String,
    /// Whether the client runs in queue mode.
    pub queue_mode: bool,
    /// SMS number, when the client registered one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,
    /// Alternate root path announced by the client.
    pub root_path: String,
    /// CoRE links of the objects the client exposes.
    pub object_links: Vec<String>,
    /// Whether the client connected over DTLS.
    pub secure: bool,
    /// Whether a queue-mode client is currently sleeping.
    pub sleeping: bool,
    /// Extra attributes sent at registration time.
    pub additional_registration_attributes: BTreeMap<String, String>,
}

/// Delta carried by a registration update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationUpdate {
    /// Id of the registration being updated.
    pub registration_id: String,
    /// New source address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,
    /// New source port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// New lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u64>,
    /// New SMS number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,
    /// New binding mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_mode: Option<String>,
    /// New object links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_links: Option<Vec<String>>,
    /// Extra attributes changed by the update.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_attributes: BTreeMap<String, String>,
}

impl RegistrationUpdate {
    /// Creates an update that changes nothing but refreshes the registration.
    #[must_use]
    pub fn refresh(registration_id: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            address: None,
            port: None,
            lifetime: None,
            sms_number: None,
            binding_mode: None,
            object_links: None,
            additional_attributes: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_registration(endpoint: &str) -> Registration {
    use std::net::Ipv4Addr;

    let now = Utc::now();
    Registration {
        endpoint: Endpoint::from(endpoint),
        registration_id: format!("reg-{endpoint}"),
        registration_date: now,
        last_update: now,
        address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
        port: 5683,
        lifetime: 300,
        lwm2m_version: "1.1".to_string(),
        binding_mode: "U".to_string(),
        queue_mode: false,
        sms_number: None,
        root_path: "/".to_string(),
        object_links: vec!["</1/0>".to_string(), "</3/0>".to_string()],
        secure: false,
        sleeping: false,
        additional_registration_attributes: BTreeMap::new(),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn registration_uses_camel_case_keys() {
        let reg = sample_registration("dev1");
        let Ok(value) = serde_json::to_value(&reg) else {
            panic!("serialization failed");
        };
        assert_eq!(value["endpoint"], "dev1");
        assert_eq!(value["registrationId"], "reg-dev1");
        assert_eq!(value["lwM2mVersion"], "1.1");
        assert_eq!(value["address"], "10.0.0.7");
        assert!(value.get("smsNumber").is_none());
    }

    #[test]
    fn refresh_update_omits_unchanged_fields() {
        let update = RegistrationUpdate::refresh("reg-dev1");
        let Ok(value) = serde_json::to_value(&update) else {
            panic!("serialization failed");
        };
        assert_eq!(value, serde_json::json!({"registrationId": "reg-dev1"}));
    }
}
