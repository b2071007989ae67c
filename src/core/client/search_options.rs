/// Namespace and region filters applied to every fetch.
///
/// `None` means "not set". For list endpoints an unset namespace widens the
/// query to all namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub namespace: Option<String>,
    pub region: Option<String>,
}

const ALL_NAMESPACES: &str = "*";

impl SearchOptions {
    /// Query parameters for list endpoints (`/v1/jobs`, `/v1/allocations`, ...).
    pub fn list_query(&self) -> Vec<(&'static str, String)> {
        let namespace = self
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| ALL_NAMESPACES.to_string());

        let mut query = vec![("namespace", namespace)];
        query.extend(self.region_query());
        query
    }

    /// Query parameters for endpoints addressing a single job. Nomad rejects
    /// the wildcard there, so only a concrete namespace is sent.
    pub fn item_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(ns) = self.concrete_namespace() {
            query.push(("namespace", ns.to_string()));
        }
        query.extend(self.region_query());
        query
    }

    pub fn region_query(&self) -> Vec<(&'static str, String)> {
        self.region
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| ("region", r.clone()))
            .collect()
    }

    fn concrete_namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty() && *ns != ALL_NAMESPACES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_to_all_namespaces() {
        let opts = SearchOptions::default();
        assert_eq!(opts.list_query(), vec![("namespace", "*".to_string())]);
        assert!(opts.item_query().is_empty());
    }

    #[test]
    fn item_query_skips_wildcard_namespace() {
        let opts = SearchOptions {
            namespace: Some("*".into()),
            region: Some("eu-west".into()),
        };
        assert_eq!(opts.item_query(), vec![("region", "eu-west".to_string())]);

        let opts = SearchOptions {
            namespace: Some("billing".into()),
            region: None,
        };
        assert_eq!(opts.item_query(), vec![("namespace", "billing".to_string())]);
        assert_eq!(opts.list_query(), vec![("namespace", "billing".to_string())]);
    }
}
