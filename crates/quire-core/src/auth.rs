//! Admin authorization
//!
//! Authentication happens elsewhere (a session provider, the shell user).
//! This module only receives the already-authenticated caller and decides
//! whether it is the single administrator allowed to mutate content.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    identity: String,
}

impl Caller {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)
    }
}

/// Who may mutate content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    admin: Option<String>,
}

impl AdminPolicy {
    /// Policy recognizing `admin`; a blank identity means nobody is admin
    pub fn new(admin: Option<&str>) -> Self {
        Self {
            admin: admin
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.admin_identity.as_deref())
    }

    pub fn admin(&self) -> Option<&str> {
        self.admin.as_deref()
    }

    /// True if the caller is the administrator
    ///
    /// Identities compare trimmed and case-insensitively, the way email
    /// addresses are matched in practice.
    pub fn is_admin(&self, caller: Option<&Caller>) -> bool {
        match (&self.admin, caller) {
            (Some(admin), Some(caller)) => admin.eq_ignore_ascii_case(caller.identity.trim()),
            _ => false,
        }
    }

    /// Fail with `Unauthorized` unless the caller is the administrator
    pub fn authorize(&self, caller: Option<&Caller>) -> StoreResult<()> {
        if self.is_admin(caller) {
            return Ok(());
        }

        let reason = match (&self.admin, caller) {
            (None, _) => "no admin identity is configured".to_string(),
            (_, None) => "no caller identity was provided".to_string(),
            (Some(_), Some(caller)) => format!("'{}' is not the admin", caller),
        };
        warn!(reason = %reason, "Rejected mutating call");
        Err(StoreError::Unauthorized(reason))
    }
}
