use std::fmt;

/// Which manifest collection a key was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Cycle,
    Variable,
    Region,
    HourIndex,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::Cycle => "cycle",
            KeyKind::Variable => "variable",
            KeyKind::Region => "region",
            KeyKind::HourIndex => "hour index",
        };
        f.write_str(name)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// Neither the primary nor the fallback source produced a usable manifest.
    #[error("manifest unavailable: {}", .reasons.join("; "))]
    ManifestUnavailable { reasons: Vec<String> },

    #[error("manifest request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("manifest read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid manifest: {0}")]
    Invalid(String),

    #[error("unknown {kind} key: {key}")]
    UnknownKey { kind: KeyKind, key: String },
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn unknown_key(kind: KeyKind, key: impl Into<String>) -> Self {
        Self::UnknownKey {
            kind,
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_lists_every_reason() {
        let err = CatalogError::ManifestUnavailable {
            reasons: vec!["manifest.json: not found".into(), "embedded: bad json".into()],
        };
        let text = err.to_string();
        assert!(text.starts_with("manifest unavailable:"));
        assert!(text.contains("manifest.json: not found; embedded: bad json"));
    }

    #[test]
    fn unknown_key_names_the_collection() {
        let err = CatalogError::unknown_key(KeyKind::Region, "atlantis");
        assert_eq!(err.to_string(), "unknown region key: atlantis");
    }
}
