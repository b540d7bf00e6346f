//! Authentication rule records

use serde::{Deserialize, Serialize};

use crate::{
    Result, RuleId, UserKey,
    keys::key_problem,
    storage::{Domain, StorageError},
};

/// How a request proves who it is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMethod {
    /// Username and password posted as JSON
    Json,
    /// Identity taken from a header set by a trusted reverse proxy
    Proxy { header: String },
    /// Credentials checked by an external command
    Hook { command: String },
    /// No authentication; every request maps to the rule's subject
    #[serde(rename = "noauth")]
    NoAuth,
}

impl AuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::Json => "json",
            AuthMethod::Proxy { .. } => "proxy",
            AuthMethod::Hook { .. } => "hook",
            AuthMethod::NoAuth => "noauth",
        }
    }
}

/// A configured authentication method, optionally bound to a user or group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRule {
    pub id: RuleId,

    pub method: AuthMethod,

    /// User or group this rule applies to. `None` applies globally.
    #[serde(default)]
    pub subject: Option<UserKey>,
}

impl AuthRule {
    /// A global rule.
    pub fn new(id: impl Into<RuleId>, method: AuthMethod) -> Self {
        Self {
            id: id.into(),
            method,
            subject: None,
        }
    }

    /// Builder-style setter binding the rule to a user or group.
    pub fn for_subject(mut self, subject: impl Into<UserKey>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn is_global(&self) -> bool {
        self.subject.is_none()
    }

    pub fn references(&self, user: &UserKey) -> bool {
        self.subject.as_ref() == Some(user)
    }

    /// Degrade the rule to global.
    pub fn clear_subject(&mut self) {
        self.subject = None;
    }

    /// Check that all required attributes are present and well formed.
    pub fn validate(&self) -> Result<()> {
        if let Some(reason) = key_problem(self.id.as_str()) {
            return Err(StorageError::invalid(Domain::AuthRule, reason).into());
        }
        if let Some(subject) = &self.subject
            && subject.is_empty()
        {
            return Err(
                StorageError::invalid(Domain::AuthRule, "subject must not be empty").into(),
            );
        }
        match &self.method {
            AuthMethod::Proxy { header } if header.trim().is_empty() => Err(StorageError::invalid(
                Domain::AuthRule,
                "proxy header must not be empty",
            )
            .into()),
            AuthMethod::Hook { command } if command.trim().is_empty() => Err(
                StorageError::invalid(Domain::AuthRule, "hook command must not be empty").into(),
            ),
            _ => Ok(()),
        }
    }
}
