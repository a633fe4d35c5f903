use {
    crate::config::DISPLAY,
    crate::domain::Category,
    crate::error::{EngineError, Result},
    crate::utils::parse_alert_timestamp,
    chrono::{DateTime, Local},
    serde::{Deserialize, Serialize},
};

/// One message on the alert channel, exactly as the backend sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub alert: Option<String>,
    pub timestamp: Option<String>,
    pub description: Option<String>,
    pub picture_file_name: Option<String>,
    pub video_file_name: Option<String>,
}

impl AlertPayload {
    /// JSON shape only. Field contents are checked later.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A decoded alert that has not yet been through heartbeat suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingAlert {
    pub raw_message: Option<String>,
    pub timestamp: DateTime<Local>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub video_ref: Option<String>,
}

impl IncomingAlert {
    pub fn new(raw_message: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            raw_message: Some(raw_message.into()),
            timestamp,
            description: None,
            image_ref: None,
            video_ref: None,
        }
    }

    pub fn with_media(mut self, image_ref: Option<String>, video_ref: Option<String>) -> Self {
        self.image_ref = image_ref;
        self.video_ref = video_ref;
        self
    }

    /// Decode one alert-channel text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Self::try_from(AlertPayload::decode(text)?)
    }
}

impl TryFrom<AlertPayload> for IncomingAlert {
    type Error = EngineError;

    fn try_from(payload: AlertPayload) -> Result<Self> {
        let raw_ts = payload
            .timestamp
            .ok_or_else(|| EngineError::MalformedMessage("missing timestamp".to_string()))?;
        let timestamp = parse_alert_timestamp(&raw_ts).ok_or_else(|| {
            EngineError::MalformedMessage(format!("unparseable timestamp '{}'", raw_ts))
        })?;

        Ok(Self {
            raw_message: payload.alert,
            timestamp,
            description: payload.description,
            image_ref: payload.picture_file_name,
            video_ref: payload.video_file_name,
        })
    }
}

/// An accepted anomaly. Immutable once it enters the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Markup-bearing text as received.
    pub raw_message: String,
    /// `raw_message` with markup stripped.
    pub text: String,
    pub description: Option<String>,
    pub timestamp: DateTime<Local>,
    pub image_ref: Option<String>,
    pub video_ref: Option<String>,
    category: Category,
}

impl Alert {
    pub(crate) fn new(incoming: IncomingAlert, raw_message: String, text: String, category: Category) -> Self {
        Self {
            raw_message,
            text,
            description: incoming.description,
            timestamp: incoming.timestamp,
            image_ref: incoming.image_ref,
            video_ref: incoming.video_ref,
            category,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Backend URL path of the evidence still, if any.
    pub fn image_url(&self) -> Option<String> {
        self.image_ref.as_deref().map(evidence_url)
    }

    /// Backend URL path of the evidence clip, if any.
    pub fn video_url(&self) -> Option<String> {
        self.video_ref.as_deref().map(evidence_url)
    }
}

fn evidence_url(name: &str) -> String {
    format!("{}{}", DISPLAY.media.evidence_prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn decodes_backend_message() {
        let text = r#"{
            "timestamp": "2024-05-01T08:30:15.123456",
            "alert": "<b>检测到车辆违规行驶</b>",
            "description": "北门",
            "picture_file_name": "a.jpg",
            "video_file_name": "a.mp4"
        }"#;
        let incoming = IncomingAlert::decode(text).unwrap();
        assert_eq!(incoming.raw_message.as_deref(), Some("<b>检测到车辆违规行驶</b>"));
        assert_eq!(incoming.timestamp.year(), 2024);
        assert_eq!(incoming.timestamp.hour(), 8);
        assert_eq!(incoming.image_ref.as_deref(), Some("a.jpg"));
        assert_eq!(incoming.video_ref.as_deref(), Some("a.mp4"));
        assert_eq!(incoming.description.as_deref(), Some("北门"));
    }

    #[test]
    fn evidence_urls() {
        let incoming = IncomingAlert::new("x", chrono::Local::now())
            .with_media(Some("shot.jpg".to_string()), None);
        let alert = Alert::new(incoming, "x".to_string(), "x".to_string(), Category::Other);
        assert_eq!(alert.image_url().as_deref(), Some("/video_warning/shot.jpg"));
        assert_eq!(alert.video_url(), None);
    }

    #[test]
    fn missing_alert_field_still_decodes() {
        let incoming = IncomingAlert::decode(r#"{"timestamp":"2024-05-01T08:30:15"}"#).unwrap();
        assert!(incoming.raw_message.is_none());
    }

    #[test]
    fn payload_decodes_without_timestamp() {
        let payload = AlertPayload::decode(r#"{"alert":"无异常"}"#).unwrap();
        assert_eq!(payload.alert.as_deref(), Some("无异常"));
        assert!(payload.timestamp.is_none());
        assert!(IncomingAlert::try_from(payload).unwrap_err().is_malformed());
    }

    #[test]
    fn bad_shapes_are_malformed() {
        for text in [
            "not json",
            r#"{"alert": 42, "timestamp": "2024-05-01T08:30:15"}"#,
            r#"{"alert": "x"}"#,
            r#"{"alert": "x", "timestamp": "yesterday"}"#,
        ] {
            let err = IncomingAlert::decode(text).unwrap_err();
            assert!(err.is_malformed(), "{} -> {:?}", text, err);
        }
    }
}
