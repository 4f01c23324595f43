//! @ai:module:intent Define the Sloth specification assembled from comment directives
//! @ai:module:layer domain
//! @ai:module:public_api Specification, ServiceDeclaration, SloDeclaration, Sli, Alerting, AlertRule
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version tag of the produced document.
pub const SPEC_VERSION: &str = "prometheus/v1";

/// Used when a service directive omits `version`.
pub const DEFAULT_SERVICE_VERSION: &str = "v1";

/// Used when an SLO entry omits `window`.
pub const DEFAULT_WINDOW: &str = "30d";

/// Top-level document label holding a non-default service version.
pub const SERVICE_VERSION_LABEL: &str = "service_version";

/// SLO label holding a non-default window.
pub const WINDOW_LABEL: &str = "window";

pub type Labels = BTreeMap<String, String>;

/// @ai:intent Identity of the service the SLOs belong to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDeclaration {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
}

/// @ai:intent The measurable signal an SLO is evaluated against
/// @ai:invariant serialized as a map with exactly one of raw, events, plugin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "SliDocument", try_from = "SliDocument")]
pub enum Sli {
    Raw {
        error_ratio_query: String,
    },
    Events {
        error_query: String,
        total_query: String,
    },
    Plugin {
        id: String,
        options: BTreeMap<String, String>,
    },
}

#[derive(Serialize, Deserialize)]
struct RawQuery {
    error_ratio_query: String,
}

#[derive(Serialize, Deserialize)]
struct EventQueries {
    error_query: String,
    total_query: String,
}

#[derive(Serialize, Deserialize)]
struct PluginRef {
    id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, String>,
}

/// Document shape of [`Sli`], the same in YAML and JSON.
#[derive(Serialize, Deserialize, Default)]
struct SliDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw: Option<RawQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    events: Option<EventQueries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plugin: Option<PluginRef>,
}

impl From<Sli> for SliDocument {
    fn from(sli: Sli) -> Self {
        match sli {
            Sli::Raw { error_ratio_query } => SliDocument {
                raw: Some(RawQuery { error_ratio_query }),
                ..Default::default()
            },
            Sli::Events {
                error_query,
                total_query,
            } => SliDocument {
                events: Some(EventQueries {
                    error_query,
                    total_query,
                }),
                ..Default::default()
            },
            Sli::Plugin { id, options } => SliDocument {
                plugin: Some(PluginRef { id, options }),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<SliDocument> for Sli {
    type Error = String;

    fn try_from(doc: SliDocument) -> Result<Self, Self::Error> {
        match (doc.raw, doc.events, doc.plugin) {
            (Some(raw), None, None) => Ok(Sli::Raw {
                error_ratio_query: raw.error_ratio_query,
            }),
            (None, Some(events), None) => Ok(Sli::Events {
                error_query: events.error_query,
                total_query: events.total_query,
            }),
            (None, None, Some(plugin)) => Ok(Sli::Plugin {
                id: plugin.id,
                options: plugin.options,
            }),
            _ => Err("sli must define exactly one of raw, events or plugin".to_string()),
        }
    }
}

/// @ai:intent Per-severity alert settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertRule {
    #[serde(default)]
    pub disable: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Labels,
}

/// @ai:intent Alerting block attached to an SLO
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Alerting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_alert: Option<AlertRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_alert: Option<AlertRule>,
}

/// @ai:intent A single service level objective
/// @ai:invariant labels never hold WINDOW_LABEL; the window travels there only in documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "SloDocument", from = "SloDocument")]
pub struct SloDeclaration {
    pub name: String,
    pub objective: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sli: Option<Sli>,
    pub window: String,
    pub labels: Labels,
    pub alerting: Option<Alerting>,
}

/// Sloth `prometheus/v1` SLO entry.
#[derive(Serialize, Deserialize)]
struct SloDocument {
    name: String,
    objective: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sli: Option<Sli>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alerting: Option<Alerting>,
}

impl From<SloDeclaration> for SloDocument {
    fn from(slo: SloDeclaration) -> Self {
        let mut labels = slo.labels;
        if slo.window != DEFAULT_WINDOW {
            labels.insert(WINDOW_LABEL.to_string(), slo.window);
        }
        SloDocument {
            name: slo.name,
            objective: slo.objective,
            description: slo.description,
            labels,
            sli: slo.sli,
            alerting: slo.alerting,
        }
    }
}

impl From<SloDocument> for SloDeclaration {
    fn from(doc: SloDocument) -> Self {
        let mut labels = doc.labels;
        let window = labels
            .remove(WINDOW_LABEL)
            .unwrap_or_else(|| DEFAULT_WINDOW.to_string());
        SloDeclaration {
            name: doc.name,
            objective: doc.objective,
            description: doc.description,
            sli: doc.sli,
            window,
            labels,
            alerting: doc.alerting,
        }
    }
}

/// @ai:intent Aggregate root handed to the writer
/// @ai:invariant slos only grows by append, in encounter order
/// @ai:invariant documents use the Sloth layout: version, service, labels, slos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "SlothDocument", try_from = "SlothDocument")]
pub struct Specification {
    pub spec_version: String,
    pub service: Option<ServiceDeclaration>,
    pub slos: Vec<SloDeclaration>,
}

/// Sloth `prometheus/v1` document. The service identity is flattened into
/// `service` and the top-level `labels`.
#[derive(Serialize, Deserialize)]
struct SlothDocument {
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    labels: Labels,
    #[serde(default)]
    slos: Vec<SloDeclaration>,
}

impl From<Specification> for SlothDocument {
    fn from(spec: Specification) -> Self {
        let (service, labels) = match spec.service {
            Some(service) => {
                let mut labels = service.labels;
                if service.version != DEFAULT_SERVICE_VERSION {
                    labels.insert(SERVICE_VERSION_LABEL.to_string(), service.version);
                }
                (Some(service.name), labels)
            }
            None => (None, Labels::new()),
        };
        SlothDocument {
            version: spec.spec_version,
            service,
            labels,
            slos: spec.slos,
        }
    }
}

impl TryFrom<SlothDocument> for Specification {
    type Error = String;

    fn try_from(doc: SlothDocument) -> Result<Self, Self::Error> {
        let mut labels = doc.labels;
        let service = match doc.service {
            Some(name) => Some(ServiceDeclaration {
                name,
                version: labels
                    .remove(SERVICE_VERSION_LABEL)
                    .unwrap_or_else(|| DEFAULT_SERVICE_VERSION.to_string()),
                labels,
            }),
            None if labels.is_empty() => None,
            None => return Err("labels are declared without a service".to_string()),
        };
        Ok(Specification {
            spec_version: doc.version,
            service,
            slos: doc.slos,
        })
    }
}

impl Default for Specification {
    fn default() -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            service: None,
            slos: Vec::new(),
        }
    }
}

impl Specification {
    /// @ai:intent Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Check whether no directive contributed anything
    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.slos.is_empty()
    }
}

impl ServiceDeclaration {
    /// @ai:intent Create a service declaration with the default version and no labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_SERVICE_VERSION.to_string(),
            labels: Labels::new(),
        }
    }
}

impl SloDeclaration {
    /// @ai:intent Create an SLO with the default window and no optional fields
    pub fn new(name: impl Into<String>, objective: f64) -> Self {
        Self {
            name: name.into(),
            objective,
            description: None,
            sli: None,
            window: DEFAULT_WINDOW.to_string(),
            labels: Labels::new(),
            alerting: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_specification_is_empty() {
        let spec = Specification::new();
        assert_eq!(spec.spec_version, SPEC_VERSION);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_sli_serializes_as_single_key_map() {
        let sli = Sli::Events {
            error_query: "errors".to_string(),
            total_query: "total".to_string(),
        };
        let json = serde_json::to_value(&sli).unwrap();
        assert_eq!(json["events"]["error_query"], "errors");
        assert_eq!(json["events"]["total_query"], "total");
    }

    #[test]
    fn test_sli_rejects_ambiguous_document() {
        let json = r#"{"raw": {"error_ratio_query": "a"}, "events": {"error_query": "e", "total_query": "t"}}"#;
        assert!(serde_json::from_str::<Sli>(json).is_err());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let slo = SloDeclaration::new("availability", 99.9);
        let json = serde_json::to_value(&slo).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("alerting").is_none());
        assert!(json.get("labels").is_none());
        assert!(json.get("window").is_none());
    }

    #[test]
    fn test_document_uses_sloth_layout() {
        let mut service = ServiceDeclaration::new("checkout");
        service.version = "1.2".to_string();
        service.labels.insert("team".to_string(), "payments".to_string());
        let mut latency = SloDeclaration::new("latency", 95.0);
        latency.window = "7d".to_string();
        let spec = Specification {
            service: Some(service),
            slos: vec![SloDeclaration::new("availability", 99.9), latency],
            ..Specification::new()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["version"], SPEC_VERSION);
        assert_eq!(json["service"], "checkout");
        assert_eq!(json["labels"]["team"], "payments");
        assert_eq!(json["labels"][SERVICE_VERSION_LABEL], "1.2");
        assert!(json.get("spec_version").is_none());
        assert!(json["slos"][0].get("labels").is_none());
        assert_eq!(json["slos"][1]["labels"][WINDOW_LABEL], "7d");

        let back: Specification = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_document_defaults_service_version_and_window() {
        let json = r#"{"version": "prometheus/v1", "service": "checkout", "slos": [{"name": "a", "objective": 99}]}"#;
        let spec: Specification = serde_json::from_str(json).unwrap();

        assert!(!spec.is_empty());
        assert_eq!(spec.service, Some(ServiceDeclaration::new("checkout")));
        assert_eq!(spec.slos, vec![SloDeclaration::new("a", 99.0)]);
    }

    #[test]
    fn test_document_rejects_labels_without_service() {
        let json = r#"{"version": "prometheus/v1", "labels": {"team": "payments"}}"#;
        assert!(serde_json::from_str::<Specification>(json).is_err());
    }
}
