//! Environment variable expansion for configuration strings.

use std::env::VarError;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: match e.cause {
                VarError::NotPresent => format!("${{{}}} not set", e.var_name),
                VarError::NotUnicode(_) => format!("${{{}}} is not valid unicode", e.var_name),
            },
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_literal_is_unchanged() {
        assert_eq!(
            expand_env("sqlite://.docunit/elements.db", "store.database_url").unwrap(),
            "sqlite://.docunit/elements.db"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCUNIT_EXPAND_UNSET");
        }

        let value = expand_env("${DOCUNIT_EXPAND_UNSET:-fallback}", "source.dir").unwrap();

        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_set_variable_expands() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCUNIT_EXPAND_SET", "/data");
        }

        let value = expand_env("${DOCUNIT_EXPAND_SET}/documents", "source.dir").unwrap();

        assert_eq!(value, "/data/documents");

        unsafe {
            std::env::remove_var("DOCUNIT_EXPAND_SET");
        }
    }

    #[test]
    fn test_missing_variable_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCUNIT_EXPAND_MISSING");
        }

        let err = expand_env("${DOCUNIT_EXPAND_MISSING}", "store.database_url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("store.database_url"));
        assert!(msg.contains("${DOCUNIT_EXPAND_MISSING} not set"));
    }
}
