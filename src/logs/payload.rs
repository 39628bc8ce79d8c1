//! OTLP/JSON logs payload.
//!
//! Mirrors `ExportLogsServiceRequest` as encoded by the OTLP/HTTP JSON
//! mapping: camelCase keys, 64-bit integers as decimal strings, ids as
//! lowercase hex.

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::logs::record::{AttrValue, LogRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogsRequest {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeLogs {
    pub scope: InstrumentationScope,
    pub log_records: Vec<OtlpLogRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpLogRecord {
    pub time_unix_nano: String,
    pub observed_time_unix_nano: String,
    pub severity_number: i32,
    pub severity_text: String,
    pub body: AnyValue,
    pub attributes: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue::from(&value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnyValue {
    StringValue(String),
    IntValue(String),
    DoubleValue(f64),
    BoolValue(bool),
}

impl From<&AttrValue> for AnyValue {
    fn from(value: &AttrValue) -> Self {
        match value {
            AttrValue::String(s) => AnyValue::StringValue(s.clone()),
            AttrValue::Int(i) => AnyValue::IntValue(i.to_string()),
            // JSON has no NaN or infinity; OTLP/JSON spells them as strings.
            AttrValue::Double(d) if d.is_nan() => AnyValue::StringValue("NaN".into()),
            AttrValue::Double(d) if d.is_infinite() => AnyValue::StringValue(
                if d.is_sign_positive() { "Infinity" } else { "-Infinity" }.into(),
            ),
            AttrValue::Double(d) => AnyValue::DoubleValue(*d),
            AttrValue::Bool(b) => AnyValue::BoolValue(*b),
        }
    }
}

/// Resource attributes attached to every export.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
}

impl From<&ServiceConfig> for ResourceInfo {
    fn from(service: &ServiceConfig) -> Self {
        Self {
            service_name: service.name.clone(),
            service_version: service.version.clone(),
            environment: service.environment.clone(),
        }
    }
}

impl ResourceInfo {
    fn attributes(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("service.name", self.service_name.as_str()),
            KeyValue::new("service.version", self.service_version.as_str()),
            KeyValue::new("deployment.environment", self.environment.as_str()),
            KeyValue::new("telemetry.sdk.language", "rust"),
            KeyValue::new("telemetry.sdk.name", env!("CARGO_PKG_NAME")),
        ]
    }
}

/// Build one export request holding `records` in order.
pub fn build_payload(resource: &ResourceInfo, scope_name: &str, records: &[LogRecord]) -> ExportLogsRequest {
    let observed = crate::logs::record::now_unix_nano().to_string();

    let log_records = records
        .iter()
        .map(|record| OtlpLogRecord {
            time_unix_nano: record.time_unix_nano.to_string(),
            observed_time_unix_nano: observed.clone(),
            severity_number: record.severity.number(),
            severity_text: record.severity.text().to_string(),
            body: AnyValue::StringValue(record.body.clone()),
            attributes: record
                .attributes
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: AnyValue::from(value),
                })
                .collect(),
            trace_id: record.trace_id.clone(),
            span_id: record.span_id.clone(),
        })
        .collect();

    ExportLogsRequest {
        resource_logs: vec![ResourceLogs {
            resource: Resource {
                attributes: resource.attributes(),
            },
            scope_logs: vec![ScopeLogs {
                scope: InstrumentationScope {
                    name: scope_name.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                log_records,
            }],
        }],
    }
}
