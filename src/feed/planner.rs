//! Query planning: field of study to provider sub-queries.

use std::collections::BTreeMap;

/// Sub-queries for the named fields of study.
///
/// Each field expands to several diverse sub-queries so one narrow query
/// cannot starve the candidate pool. The table is explicit and
/// config-overridable rather than baked into the fetch path.
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    table: BTreeMap<String, Vec<String>>,
}

/// A planned set of sub-queries for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub sub_queries: Vec<String>,
}

impl QueryPlanner {
    /// Planner with the built-in field table
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        let mut insert = |field: &str, queries: &[&str]| {
            table.insert(
                field.to_string(),
                queries.iter().map(|q| q.to_string()).collect(),
            );
        };

        insert(
            "Computer Science",
            &["computer science", "machine learning", "artificial intelligence"],
        );
        insert("Physics", &["physics", "quantum mechanics", "astrophysics"]);
        insert("Mathematics", &["mathematics", "algebra", "topology"]);
        insert("Biology", &["biology", "genetics", "molecular biology"]);
        insert("Medicine", &["medicine", "clinical trial", "therapeutics"]);
        insert("Engineering", &["engineering", "mechanical", "electrical"]);
        insert("Chemistry", &["chemistry", "organic chemistry", "biochemistry"]);
        insert("Psychology", &["psychology", "cognitive", "behavioral"]);
        insert("Economics", &["economics", "econometrics", "finance"]);
        insert(
            "Environmental Science",
            &["environmental science", "climate", "sustainability"],
        );

        Self { table }
    }

    /// Planner with a custom field table
    pub fn with_table(table: BTreeMap<String, Vec<String>>) -> Self {
        Self { table }
    }

    /// Fields the planner knows about
    pub fn known_fields(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(|s| s.as_str())
    }

    /// Plan sub-queries for a request.
    ///
    /// `None` means "any field": the plan interleaves one sub-query from each
    /// field round-robin, so every field contributes before any repeats.
    /// Unknown fields fall back to using the field name itself as the query.
    pub fn plan(&self, field: Option<&str>) -> QueryPlan {
        match field {
            Some(field) => match self.table.get(field) {
                Some(queries) => QueryPlan {
                    sub_queries: queries.clone(),
                },
                None => {
                    tracing::warn!(field, "unknown field of study, using it as a raw query");
                    QueryPlan {
                        sub_queries: vec![field.to_string()],
                    }
                }
            },
            None => {
                let mut sub_queries = Vec::new();
                let max_len = self.table.values().map(Vec::len).max().unwrap_or(0);
                for i in 0..max_len {
                    for queries in self.table.values() {
                        if let Some(q) = queries.get(i) {
                            sub_queries.push(q.clone());
                        }
                    }
                }
                QueryPlan { sub_queries }
            }
        }
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new()
    }
}
