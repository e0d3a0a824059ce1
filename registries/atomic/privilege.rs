/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Boot-time scheme capability table.
//!
//! Embedders declare which scheme names are standard and which privileges
//! they carry before the network stack starts. The first consumption of the
//! process-wide table freezes it; the URL parser and CSP/CORS layers read the
//! frozen table for the rest of the process lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::registries::CHANNEL_PRIVILEGE_TABLE_FROZEN;
use crate::runtime::diagnostics::{DiagnosticEvent, emit_event};

/// Finalized privilege record for one scheme name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemePrivilege {
    pub scheme: String,
    pub standard: bool,
    pub secure: bool,
    pub bypass_csp: bool,
    pub allow_service_workers: bool,
    pub support_fetch_api: bool,
    pub cors_enabled: bool,
    pub stream: bool,
    pub code_cache: bool,
}

/// One declaration as supplied by the embedder. Unset options fall back to
/// the standard-scheme default matrix when merged into a [`SchemePrivilege`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScheme {
    pub scheme: String,
    #[serde(default)]
    pub standard: bool,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub bypass_csp: Option<bool>,
    #[serde(default)]
    pub allow_service_workers: Option<bool>,
    #[serde(default)]
    pub support_fetch_api: Option<bool>,
    #[serde(default)]
    pub cors_enabled: Option<bool>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub code_cache: Option<bool>,
}

impl CustomScheme {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..Self::default()
        }
    }

    pub fn standard(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            standard: true,
            ..Self::default()
        }
    }

    /// Merge unset options with the defaults implied by `standard`.
    ///
    /// A standard scheme is treated like `http`/`https` by the transport
    /// stack unless the declaration says otherwise, so `secure`,
    /// `allow_service_workers`, `support_fetch_api`, and `cors_enabled`
    /// default to the value of `standard`. `bypass_csp`, `stream`, and
    /// `code_cache` always default to false.
    fn into_privilege(self) -> SchemePrivilege {
        let standard = self.standard;
        SchemePrivilege {
            scheme: self.scheme.to_ascii_lowercase(),
            standard,
            secure: self.secure.unwrap_or(standard),
            bypass_csp: self.bypass_csp.unwrap_or(false),
            allow_service_workers: self.allow_service_workers.unwrap_or(standard),
            support_fetch_api: self.support_fetch_api.unwrap_or(standard),
            cors_enabled: self.cors_enabled.unwrap_or(standard),
            stream: self.stream.unwrap_or(false),
            code_cache: self.code_cache.unwrap_or(false),
        }
    }
}

/// Declarative boot manifest: a list of `[[scheme]]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomSchemeSet {
    #[serde(default, rename = "scheme")]
    pub schemes: Vec<CustomScheme>,
}

impl CustomSchemeSet {
    pub fn from_toml_str(text: &str) -> Result<Self, PrivilegeError> {
        toml::from_str(text).map_err(|error| PrivilegeError::Manifest(error.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeError {
    EmptyScheme,
    InvalidScheme(String),
    DuplicateScheme(String),
    Manifest(String),
}

impl fmt::Display for PrivilegeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScheme => f.write_str("scheme name must not be empty"),
            Self::InvalidScheme(scheme) => {
                write!(f, "scheme name '{scheme}' contains separator or whitespace characters")
            }
            Self::DuplicateScheme(scheme) => {
                write!(f, "scheme '{scheme}' is already declared in the privilege table")
            }
            Self::Manifest(reason) => write!(f, "scheme manifest rejected: {reason}"),
        }
    }
}

impl std::error::Error for PrivilegeError {}

fn validate_scheme_name(scheme: &str) -> Result<(), PrivilegeError> {
    if scheme.is_empty() {
        return Err(PrivilegeError::EmptyScheme);
    }
    if scheme
        .chars()
        .any(|c| c.is_whitespace() || c == ':' || c == '/')
    {
        return Err(PrivilegeError::InvalidScheme(scheme.to_string()));
    }
    Ok(())
}

/// Capability table instance. The process-wide copy lives behind
/// [`privilege_table`]; standalone instances exist for embedder boot code and
/// tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeRegistry {
    entries: HashMap<String, SchemePrivilege>,
}

impl PrivilegeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of declarations. The whole batch is validated before
    /// any entry lands, so a rejected call leaves prior declarations intact.
    pub fn declare(&mut self, declarations: Vec<CustomScheme>) -> Result<(), PrivilegeError> {
        let mut batch = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            validate_scheme_name(&declaration.scheme)?;
            let privilege = declaration.into_privilege();
            if self.entries.contains_key(&privilege.scheme)
                || batch
                    .iter()
                    .any(|staged: &SchemePrivilege| staged.scheme == privilege.scheme)
            {
                return Err(PrivilegeError::DuplicateScheme(privilege.scheme));
            }
            batch.push(privilege);
        }

        for privilege in batch {
            self.entries.insert(privilege.scheme.clone(), privilege);
        }
        Ok(())
    }

    pub fn is_standard(&self, scheme: &str) -> bool {
        self.entries
            .get(&scheme.to_ascii_lowercase())
            .is_some_and(|privilege| privilege.standard)
    }

    pub fn get(&self, scheme: &str) -> Option<&SchemePrivilege> {
        self.entries.get(&scheme.to_ascii_lowercase())
    }

    pub fn standard_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .entries
            .values()
            .filter(|privilege| privilege.standard)
            .map(|privilege| privilege.scheme.clone())
            .collect();
        schemes.sort();
        schemes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static STAGED_DECLARATIONS: Mutex<Vec<CustomScheme>> = Mutex::new(Vec::new());
static PRIVILEGE_TABLE: OnceLock<PrivilegeRegistry> = OnceLock::new();

/// Stage privileged scheme declarations for the process-wide table.
///
/// Callable any number of times for disjoint scheme sets before the network
/// stack consumes the table. Calling after the table is frozen is a
/// programming error and aborts: the parser and CORS/CSP layers have already
/// been configured from the frozen contents.
pub fn register_schemes_as_privileged(
    declarations: Vec<CustomScheme>,
) -> Result<(), PrivilegeError> {
    if PRIVILEGE_TABLE.get().is_some() {
        panic!(
            "privileged schemes must be declared before the network stack consumes the capability table"
        );
    }

    let mut staged = STAGED_DECLARATIONS.lock();
    let mut scratch = PrivilegeRegistry::new();
    scratch.declare((*staged).clone())?;
    scratch.declare(declarations.clone())?;

    log::debug!(
        "staged {} privileged scheme declaration(s) ({} total)",
        declarations.len(),
        staged.len() + declarations.len()
    );
    staged.extend(declarations);
    Ok(())
}

/// The frozen process-wide capability table. The first call consumes the
/// staged declarations; every later call returns the same frozen table.
pub fn privilege_table() -> &'static PrivilegeRegistry {
    PRIVILEGE_TABLE.get_or_init(|| {
        let staged = std::mem::take(&mut *STAGED_DECLARATIONS.lock());
        let mut table = PrivilegeRegistry::new();
        if let Err(error) = table.declare(staged) {
            // Staged batches were validated on the way in; a failure here
            // means the staging path itself regressed.
            log::error!("privilege table rejected staged declarations: {error}");
        }
        emit_event(DiagnosticEvent::MessageSent {
            channel_id: CHANNEL_PRIVILEGE_TABLE_FROZEN,
            byte_len: table.len(),
        });
        log::debug!("privilege table frozen with {} scheme(s)", table.len());
        table
    })
}

/// Non-freezing standard-scheme peek: consults the frozen table when present,
/// otherwise the staged declarations. Used by query paths that must not
/// trigger consumption as a side effect.
pub fn is_standard_scheme(scheme: &str) -> bool {
    if let Some(table) = PRIVILEGE_TABLE.get() {
        return table.is_standard(scheme);
    }
    STAGED_DECLARATIONS
        .lock()
        .iter()
        .any(|declaration| declaration.standard && declaration.scheme.eq_ignore_ascii_case(scheme))
}

/// Standard scheme names for URL-parser configuration. Consumes (freezes)
/// the process-wide table.
pub fn standard_schemes() -> Vec<String> {
    privilege_table().standard_schemes()
}
