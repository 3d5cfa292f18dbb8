use serde::Deserialize;

/// GET /v2/_catalog response
#[derive(Debug, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// GET /v2/<image>/tags/list response
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct TagList {
    #[serde(default)]
    pub name: String,
    pub tags: Option<Vec<String>>,
}

/// Result of deleting a single tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub tag: String,
    pub error: Option<String>,
}

impl DeletionOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a deletion batch, one per submitted tag, in completion order
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub image: String,
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.outcomes.iter().filter(|o| o.success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.outcomes.iter().filter(|o| !o.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list_null_tags() {
        let list: TagList = serde_json::from_str(r#"{"name":"app","tags":null}"#).unwrap();
        assert_eq!(list.name, "app");
        assert!(list.tags.is_none());
    }

    #[test]
    fn test_catalog_missing_repositories() {
        let catalog: Catalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.repositories.is_empty());
    }

    #[test]
    fn test_report_counts() {
        let report = DeletionReport {
            image: "app".to_string(),
            outcomes: vec![
                DeletionOutcome {
                    tag: "a".to_string(),
                    error: None,
                },
                DeletionOutcome {
                    tag: "b".to_string(),
                    error: Some("boom".to_string()),
                },
            ],
        };
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded().next().unwrap().tag, "a");
        assert_eq!(report.failures().next().unwrap().tag, "b");
    }
}
