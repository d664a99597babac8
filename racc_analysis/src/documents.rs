use crate::validate::ValidationPolicy;
use crate::{analyze_with_policy, Analysis};
use log::debug;
use std::collections::HashMap;

/// The latest analysis of each open document, keyed by URI.
///
/// An editor calls `update` with the full text after every change.  The previous analysis is
/// thrown away; nothing is carried over from one version of a document to the next.
#[derive(Debug, Default)]
pub struct DocumentStore {
    policy: ValidationPolicy,
    documents: HashMap<String, Analysis>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self {
            policy,
            documents: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Analyzes `text` and stores the result for `uri`, replacing any earlier one.
    pub fn update(&mut self, uri: &str, text: &str) -> &Analysis {
        let analysis = analyze_with_policy(text, &self.policy);
        debug!(
            "{}: {} diagnostics",
            uri,
            analysis.diagnostics.len()
        );
        self.documents.insert(uri.to_string(), analysis);
        &self.documents[uri]
    }

    pub fn get(&self, uri: &str) -> Option<&Analysis> {
        self.documents.get(uri)
    }

    pub fn remove(&mut self, uri: &str) -> Option<Analysis> {
        self.documents.remove(uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> + '_ {
        self.documents.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
