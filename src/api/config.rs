//! Tracer selection and output shaping.

use crate::hooks::{replay, HookEvent, Tracer};
use crate::state::StateReader;
use crate::tracers::{CallParityTracer, StateDiffTracer};
use crate::utils::config::{
    CALL_TRACER_PARITY, CALL_TRACER_PARITY_ALIAS, NESTED_STATE_DIFF_KEY, NESTED_TRACE_KEY,
    STATE_DIFF_TRACER,
};
use crate::utils::error::TraceError;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Registered tracers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TracerKind {
    CallParity,
    StateDiff,
}

impl TracerKind {
    pub fn name(self) -> &'static str {
        match self {
            TracerKind::CallParity => CALL_TRACER_PARITY,
            TracerKind::StateDiff => STATE_DIFF_TRACER,
        }
    }

    /// Key this tracer's output lives under in nested responses
    pub fn nested_key(self) -> &'static str {
        match self {
            TracerKind::CallParity => NESTED_TRACE_KEY,
            TracerKind::StateDiff => NESTED_STATE_DIFF_KEY,
        }
    }
}

impl fmt::Display for TracerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TracerKind {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CALL_TRACER_PARITY | CALL_TRACER_PARITY_ALIAS => Ok(TracerKind::CallParity),
            STATE_DIFF_TRACER => Ok(TracerKind::StateDiff),
            other => Err(TraceError::UnknownTracer(other.to_string())),
        }
    }
}

impl TryFrom<String> for TracerKind {
    type Error = TraceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TracerKind> for String {
    fn from(kind: TracerKind) -> Self {
        kind.name().to_string()
    }
}

/// Tracer options as accepted by the `trace_*` methods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracer: Option<TracerKind>,

    /// Wrap the result as `{"trace": ...}` / `{"stateDiff": ...}`
    #[serde(default)]
    pub nested_trace_output: bool,
}

impl TraceConfig {
    /// Force the call tracer, keeping the caller's other options
    pub fn parity_default(config: Option<TraceConfig>) -> TraceConfig {
        let mut config = config.unwrap_or_default();
        config.tracer = Some(TracerKind::CallParity);
        config
    }

    /// Selected tracer; the call tracer when none was named
    pub fn kind(&self) -> TracerKind {
        self.tracer.unwrap_or(TracerKind::CallParity)
    }

    /// Apply nested output wrapping to a finalized result
    pub fn wrap(&self, kind: TracerKind, result: Value) -> Value {
        if self.nested_trace_output {
            json!({ kind.nested_key(): result })
        } else {
            result
        }
    }
}

/// Fresh tracer instance for one transaction
pub fn new_tracer(kind: TracerKind) -> Box<dyn Tracer> {
    match kind {
        TracerKind::CallParity => Box::new(CallParityTracer::new()),
        TracerKind::StateDiff => Box::new(StateDiffTracer::new()),
    }
}

/// Run the configured tracer over a recorded transaction
///
/// **Public** - single-transaction entry point
///
/// # Errors
/// * Any `TraceError` from replaying the stream or finalizing the tracer
pub fn trace_events(
    config: &TraceConfig,
    events: &[HookEvent],
    pre: &dyn StateReader,
    post: &dyn StateReader,
) -> Result<Value, TraceError> {
    let kind = config.kind();
    debug!("Tracing {} events with {}", events.len(), kind);

    let mut tracer = new_tracer(kind);
    replay(tracer.as_mut(), events, pre, post)?;
    let result = tracer.get_result()?;
    Ok(config.wrap(kind, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_names_and_alias() {
        assert_eq!("callTracerParity".parse::<TracerKind>().unwrap(), TracerKind::CallParity);
        assert_eq!("callParityTracer".parse::<TracerKind>().unwrap(), TracerKind::CallParity);
        assert_eq!("stateDiffTracer".parse::<TracerKind>().unwrap(), TracerKind::StateDiff);
        assert!(matches!(
            "prestateTracer".parse::<TracerKind>(),
            Err(TraceError::UnknownTracer(_))
        ));
    }

    #[test]
    fn test_config_parses_options_object() {
        let config: TraceConfig =
            serde_json::from_str(r#"{"tracer": "stateDiffTracer", "nestedTraceOutput": true}"#)
                .unwrap();
        assert_eq!(config.kind(), TracerKind::StateDiff);
        assert!(config.nested_trace_output);

        let wrapped = config.wrap(TracerKind::StateDiff, json!({}));
        assert_eq!(wrapped, json!({"stateDiff": {}}));
    }

    #[test]
    fn test_parity_default_forces_call_tracer() {
        let config = TraceConfig::parity_default(Some(TraceConfig {
            tracer: Some(TracerKind::StateDiff),
            nested_trace_output: true,
        }));
        assert_eq!(config.kind(), TracerKind::CallParity);
        assert!(config.nested_trace_output);

        let flat = TraceConfig::parity_default(None);
        assert_eq!(flat.wrap(TracerKind::CallParity, json!([])), json!([]));
    }
}
