// ABOUTME: Workload manifests: locating files, variable substitution, parsing.
// ABOUTME: Marathon app JSON and Kubernetes multi-document YAML live in submodules.

pub mod kubernetes;
pub mod marathon;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use kubernetes::{
    ApplySummary, RemoteKubectl, Resource, ResourceApplier, ResourceKind, apply_resources,
    load_resources,
};
pub use marathon::{MarathonApp, parse_app};

/// Errors from reading, parsing, or applying manifests.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid Marathon app definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid Kubernetes manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Marathon app definition has no id")]
    MissingId,

    #[error("invalid Marathon app id: {0}")]
    InvalidId(#[from] crate::types::WorkloadNameError),

    #[error("Kubernetes document {index} has no kind")]
    MissingKind { index: usize },

    #[error("applying {resource} failed: {message}")]
    Apply { resource: String, message: String },

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Manifest paths split by whether they exist.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedManifests {
    pub found: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Resolve `paths` against `workspace`, keeping order.
///
/// Absolute paths are used as given.
pub fn resolve_paths<'a, I>(workspace: &Path, paths: I) -> ResolvedManifests
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut resolved = ResolvedManifests::default();
    for path in paths {
        let full = workspace.join(path);
        if full.is_file() {
            resolved.found.push(full);
        } else {
            resolved.missing.push(full);
        }
    }
    resolved
}

pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `$NAME` and `${NAME}` with values from `variables`.
///
/// References to unknown names are left untouched.
pub fn substitute(content: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if is_variable_name(&braced[..end]) => (&braced[..end], end + 2),
                _ => ("", 0),
            }
        } else {
            let len = after
                .char_indices()
                .find(|&(i, c)| !(c == '_' || c.is_ascii_alphanumeric()) || (i == 0 && c.is_ascii_digit()))
                .map(|(i, _)| i)
                .unwrap_or(after.len());
            (&after[..len], len)
        };

        match variables.get(name) {
            Some(value) if !name.is_empty() => {
                out.push_str(value);
                rest = &after[consumed..];
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_plain_and_braced_references() {
        let v = vars(&[("TAG", "1.2"), ("APP", "web")]);
        assert_eq!(
            substitute("image: nginx:$TAG name: ${APP}-svc", &v),
            "image: nginx:1.2 name: web-svc"
        );
    }

    #[test]
    fn unknown_references_are_kept() {
        let v = vars(&[("TAG", "1.2")]);
        assert_eq!(substitute("$MISSING ${ALSO} $", &v), "$MISSING ${ALSO} $");
    }

    #[test]
    fn plain_reference_stops_at_non_word_character() {
        let v = vars(&[("HOST", "example.com")]);
        assert_eq!(substitute("http://$HOST/path", &v), "http://example.com/path");
    }

    #[test]
    fn unterminated_brace_is_literal() {
        let v = vars(&[("A", "x")]);
        assert_eq!(substitute("${A", &v), "${A");
    }

    #[test]
    fn resolve_splits_found_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.json"), "{}").unwrap();

        let paths = vec![PathBuf::from("app.json"), PathBuf::from("gone.json")];
        let resolved = resolve_paths(dir.path(), &paths);

        assert_eq!(resolved.found, vec![dir.path().join("app.json")]);
        assert_eq!(resolved.missing, vec![dir.path().join("gone.json")]);
    }
}
