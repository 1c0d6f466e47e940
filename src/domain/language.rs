use std::fmt;
use std::hash::{Hash, Hasher};

use crate::language::LanguageError;

/// A resolved language.
///
/// Carries the ISO 639-3 code when the language has one, the ISO 639-1 code
/// when it has one, and an English display name. Two identities are equal when
/// their canonical codes are equal.
#[derive(Debug, Clone)]
pub struct LanguageIdentity {
    alpha3: Option<String>,
    alpha2: Option<String>,
    name: String,
}

impl LanguageIdentity {
    pub fn new(alpha3: Option<&str>, alpha2: Option<&str>, name: &str) -> Self {
        Self {
            alpha3: alpha3.map(str::to_string),
            alpha2: alpha2.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn alpha3(&self) -> Option<&str> {
        self.alpha3.as_deref()
    }

    pub fn alpha2(&self) -> Option<&str> {
        self.alpha2.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The preferred stable code: 3-letter form, else 2-letter form.
    pub fn canonical_code(&self) -> Result<&str, LanguageError> {
        self.alpha3
            .as_deref()
            .or(self.alpha2.as_deref())
            .ok_or_else(|| LanguageError::CodeResolution {
                name: self.name.clone(),
            })
    }

    fn identity_key(&self) -> Option<&str> {
        self.alpha3.as_deref().or(self.alpha2.as_deref())
    }
}

impl PartialEq for LanguageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for LanguageIdentity {}

impl Hash for LanguageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

impl fmt::Display for LanguageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity_key() {
            Some(code) => write!(f, "{} ({code})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_code_prefers_alpha3() {
        let identity = LanguageIdentity::new(Some("eng"), Some("en"), "English");
        assert_eq!(identity.canonical_code().unwrap(), "eng");
    }

    #[test]
    fn test_canonical_code_falls_back_to_alpha2() {
        let identity = LanguageIdentity::new(None, Some("en"), "English");
        assert_eq!(identity.canonical_code().unwrap(), "en");
    }

    #[test]
    fn test_canonical_code_without_codes_is_a_table_defect() {
        let identity = LanguageIdentity::new(None, None, "Nowhere");
        assert!(matches!(
            identity.canonical_code(),
            Err(LanguageError::CodeResolution { .. })
        ));
    }

    #[test]
    fn test_equality_is_by_code() {
        let a = LanguageIdentity::new(Some("ron"), Some("ro"), "Romanian");
        let b = LanguageIdentity::new(Some("ron"), None, "Moldavian");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Romanian (ron)");
    }
}
