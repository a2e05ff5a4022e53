use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::Phase;

/// A named system property, optionally scoped to one environment.
///
/// Environment-scoped rows take precedence over environment-agnostic rows
/// with the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemProperty {
    pub name: String,
    pub string_value: Option<String>,
    pub number_value: Option<f64>,
    pub boolean_value: Option<bool>,
    pub environment: Option<String>,
}

impl SystemProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            string_value: None,
            number_value: None,
            boolean_value: None,
            environment: None,
        }
    }

    pub fn string(mut self, value: impl Into<String>) -> Self {
        self.string_value = Some(value.into());
        self
    }

    pub fn number(mut self, value: f64) -> Self {
        self.number_value = Some(value);
        self
    }

    pub fn boolean(mut self, value: bool) -> Self {
        self.boolean_value = Some(value);
        self
    }

    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }
}

/// A named feature flag with an optional activation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub name: String,
    pub active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl FeatureFlag {
    pub fn new(name: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            active,
            start_time: None,
            end_time: None,
        }
    }

    pub fn starting(mut self, at: DateTime<Utc>) -> Self {
        self.start_time = Some(at);
        self
    }

    pub fn ending(mut self, at: DateTime<Utc>) -> Self {
        self.end_time = Some(at);
        self
    }

    /// Effective activation: the stored switch AND the window containing `now`.
    /// Open bounds are unbounded.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if let Some(start) = self.start_time {
            if now < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if now > end {
                return false;
            }
        }
        true
    }
}

/// Administrator-authored assignment of a handler to an (entity, phase) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub entity_type: String,
    pub phase: Phase,
    pub handler: String,
    pub execution_order: i32,
    pub active: bool,
}

impl HandlerConfig {
    pub fn new(
        entity_type: impl Into<String>,
        phase: Phase,
        handler: impl Into<String>,
        execution_order: i32,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            phase,
            handler: handler.into(),
            execution_order,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
