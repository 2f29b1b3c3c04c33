//! Credential and retriever detection
//!
//! `detect_settings` matches a raw credential map against every
//! `CredentialKind`'s required-field set. `detect_retriever` maps the
//! resolved settings to a retriever through an explicit registry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::retriever::{AccountTokenRetriever, TokenRetriever};
use crate::settings::{CredentialKind, CredentialsSettings, RawCredentials, is_supplied};

/// Resolve raw credentials into typed settings.
///
/// - `None`, or a map where no field is supplied, means "no credentials" and
///   yields `Ok(None)`.
/// - Supplied fields equal to a kind's required set (and nothing left unset)
///   yield that kind's settings.
/// - A mix of supplied and unset fields, or supplied fields forming a strict
///   subset of a kind's required set, is `IncompleteCredentials`.
/// - Anything else is `InvalidCredentials`.
pub fn detect_settings(raw: Option<&RawCredentials>) -> Result<Option<CredentialsSettings>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let supplied: BTreeSet<&str> = raw
        .iter()
        .filter(|(_, value)| is_supplied(value))
        .map(|(key, _)| key.as_str())
        .collect();
    if supplied.is_empty() {
        return Ok(None);
    }

    let unset: BTreeSet<&str> = raw
        .iter()
        .filter(|(_, value)| !is_supplied(value))
        .map(|(key, _)| key.as_str())
        .collect();

    if unset.is_empty() {
        for kind in CredentialKind::ALL {
            let required: BTreeSet<&str> = kind.required_fields().iter().copied().collect();
            if supplied == required {
                debug!(kind = kind.label(), "detected credentials");
                return kind.build(raw).map(Some);
            }
        }
    }

    // Report the fields a partially supplied kind still needs, plus any
    // entries given without a value.
    let mut missing = unset;
    for kind in CredentialKind::ALL {
        let required: BTreeSet<&str> = kind.required_fields().iter().copied().collect();
        if supplied.is_subset(&required) {
            missing.extend(required.difference(&supplied).copied());
            break;
        }
    }

    if missing.is_empty() {
        let mut keys: Vec<&str> = raw.keys().map(String::as_str).collect();
        keys.sort_unstable();
        return Err(Error::InvalidCredentials(format!(
            "fields {keys:?} match no known credential type"
        )));
    }

    let missing: Vec<&str> = missing.into_iter().collect();
    Err(Error::IncompleteCredentials(format!(
        "missing values for {missing:?}"
    )))
}

/// Constructs a retriever for settings of one kind. Returns `None` when handed
/// settings of another kind.
pub type RetrieverFactory = fn(&CredentialsSettings) -> Option<Arc<dyn TokenRetriever>>;

fn account_retriever(settings: &CredentialsSettings) -> Option<Arc<dyn TokenRetriever>> {
    match settings {
        CredentialsSettings::Account(credentials) => {
            Some(Arc::new(AccountTokenRetriever::new(credentials.clone())))
        }
    }
}

/// Dispatch table from credential kind to retriever constructor.
pub struct RetrieverRegistry {
    factories: HashMap<CredentialKind, RetrieverFactory>,
}

impl RetrieverRegistry {
    /// A registry with no retrievers.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register(&mut self, kind: CredentialKind, factory: RetrieverFactory) -> &mut Self {
        self.factories.insert(kind, factory);
        self
    }

    /// Build the retriever registered for the settings' kind.
    pub fn detect(&self, settings: &CredentialsSettings) -> Result<Arc<dyn TokenRetriever>> {
        self.factories
            .get(&settings.kind())
            .and_then(|factory| factory(settings))
            .ok_or_else(|| {
                Error::UnsupportedSettings(format!("no token retriever for {settings}"))
            })
    }
}

impl Default for RetrieverRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(CredentialKind::Account, account_retriever);
        registry
    }
}

/// Pick the retriever for `settings` from the default registry.
pub fn detect_retriever(settings: &CredentialsSettings) -> Result<Arc<dyn TokenRetriever>> {
    RetrieverRegistry::default().detect(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AccountCredentialsSettings;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawCredentials {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn account_credentials() -> AccountCredentialsSettings {
        AccountCredentialsSettings::new("some-user", "some-pass").unwrap()
    }

    #[test]
    fn detects_account_credentials() {
        let expected = account_credentials();
        let detected = detect_settings(Some(&expected.to_raw())).unwrap();
        assert_eq!(detected, Some(CredentialsSettings::Account(expected)));
    }

    #[test]
    fn detection_ignores_key_order() {
        let a = raw(json!({"username": "some-user", "password": "some-pass"}));
        let b = raw(json!({"password": "some-pass", "username": "some-user"}));
        assert_eq!(detect_settings(Some(&a)).unwrap(), detect_settings(Some(&b)).unwrap());
    }

    #[test]
    fn accepts_empty_credentials() {
        let credentials = raw(json!({"username": null, "password": null}));
        assert!(detect_settings(Some(&credentials)).unwrap().is_none());

        let blank = raw(json!({"username": "", "password": ""}));
        assert!(detect_settings(Some(&blank)).unwrap().is_none());

        assert!(detect_settings(Some(&RawCredentials::new())).unwrap().is_none());
    }

    #[test]
    fn accepts_missing_credentials() {
        assert!(detect_settings(None).unwrap().is_none());
    }

    #[test]
    fn fails_if_credentials_are_incomplete() {
        let credentials = raw(json!({"key1": "value1", "key2": null}));
        let err = detect_settings(Some(&credentials)).unwrap_err();
        assert!(matches!(err, Error::IncompleteCredentials(_)), "got: {err:?}");
        assert!(err.to_string().contains("key2"), "got: {err}");
    }

    #[test]
    fn incomplete_account_names_missing_field() {
        let null_password = raw(json!({"username": "some-user", "password": null}));
        let err = detect_settings(Some(&null_password)).unwrap_err();
        assert!(matches!(err, Error::IncompleteCredentials(_)), "got: {err:?}");
        assert!(err.to_string().contains("password"), "got: {err}");

        let absent_password = raw(json!({"username": "some-user"}));
        let err = detect_settings(Some(&absent_password)).unwrap_err();
        assert!(matches!(err, Error::IncompleteCredentials(_)), "got: {err:?}");
        assert!(err.to_string().contains("password"), "got: {err}");
        assert!(!err.to_string().contains("\"username\""), "got: {err}");
    }

    #[test]
    fn fails_if_credentials_are_invalid() {
        let credentials = raw(json!({"key1": "value1", "key2": "value2"}));
        let err = detect_settings(Some(&credentials)).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)), "got: {err:?}");
    }

    #[test]
    fn extra_fields_are_invalid() {
        let credentials = raw(json!({
            "username": "some-user",
            "password": "some-pass",
            "project_id": "abc",
        }));
        let err = detect_settings(Some(&credentials)).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)), "got: {err:?}");
    }

    #[test]
    fn detects_account_retriever() {
        let settings = CredentialsSettings::Account(account_credentials());
        let retriever = detect_retriever(&settings).unwrap();
        assert_eq!(retriever.id(), "account");
        assert_eq!(retriever.kind(), CredentialKind::Account);
    }

    #[test]
    fn fails_if_settings_are_not_recognized() {
        let settings = CredentialsSettings::Account(account_credentials());
        let err = match RetrieverRegistry::empty().detect(&settings) {
            Ok(_) => panic!("empty registry must not produce a retriever"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::UnsupportedSettings(_)), "got: {err:?}");
        assert!(err.to_string().contains(&settings.to_string()), "got: {err}");
        assert!(!err.to_string().contains("some-pass"), "got: {err}");
    }

    #[test]
    fn registered_factory_replaces_default() {
        fn named(settings: &CredentialsSettings) -> Option<Arc<dyn TokenRetriever>> {
            match settings {
                CredentialsSettings::Account(credentials) => Some(Arc::new(
                    AccountTokenRetriever::new(AccountCredentialsSettings::new(
                        format!("{}-override", credentials.username),
                        "x",
                    )
                    .unwrap()),
                )),
            }
        }

        let mut registry = RetrieverRegistry::empty();
        registry.register(CredentialKind::Account, named);
        let settings = CredentialsSettings::Account(account_credentials());
        assert!(registry.detect(&settings).is_ok());
    }
}
