use serde_json::Value;

/// A single filter clause. All clauses in a [`FilterSpec`] must match
/// (boolean conjunction).
#[derive(Debug, Clone)]
pub enum Filter {
    /// Exact match on a field. Against an array field, matches when any
    /// element equals the value.
    Term { field: String, value: Value },
    /// Glob match on a string field: `*` matches any run of characters,
    /// `?` exactly one.
    Wildcard { field: String, pattern: String },
    /// Open or half-open numeric interval, exclusive on both ends.
    Range {
        field: String,
        gt: Option<f64>,
        lt: Option<f64>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    musts: Vec<Filter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.musts.push(Filter::Term {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn wildcard(mut self, field: &str, pattern: &str) -> Self {
        self.musts.push(Filter::Wildcard {
            field: field.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn range(mut self, field: &str, gt: Option<f64>, lt: Option<f64>) -> Self {
        self.musts.push(Filter::Range {
            field: field.to_string(),
            gt,
            lt,
        });
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.musts.iter().all(|f| f.matches(document))
    }
}

impl Filter {
    fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::Term { field, value } => match document.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| item == value),
                Some(found) => found == value,
                None => false,
            },
            Filter::Wildcard { field, pattern } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|text| glob_match(pattern, text)),
            Filter::Range { field, gt, lt } => {
                let Some(number) = document.get(field).and_then(Value::as_f64) else {
                    return false;
                };
                gt.is_none_or(|bound| number > bound) && lt.is_none_or(|bound| number < bound)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// Iterative glob matcher with backtracking on `*`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn glob_basics() {
        assert!(glob_match("hi", "hi"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("h*o", "hello"));
        assert!(glob_match("h?llo", "hello"));
        assert!(!glob_match("h?llo", "hllo"));
        assert!(!glob_match("hello", "hell"));
        assert!(glob_match("*trip*", "my trip plan"));
    }

    #[test]
    fn term_matches_scalar_and_array() {
        let doc = json!({ "kind": "group", "member_ids": ["a", "b"] });

        assert!(FilterSpec::new().term("kind", "group").matches(&doc));
        assert!(FilterSpec::new().term("member_ids", "b").matches(&doc));
        assert!(!FilterSpec::new().term("member_ids", "c").matches(&doc));
    }

    #[test]
    fn range_is_exclusive() {
        let doc = json!({ "sent_time": 100 });

        assert!(
            FilterSpec::new()
                .range("sent_time", Some(99.0), Some(101.0))
                .matches(&doc)
        );
        assert!(
            !FilterSpec::new()
                .range("sent_time", Some(100.0), None)
                .matches(&doc)
        );
        assert!(
            !FilterSpec::new()
                .range("sent_time", None, Some(100.0))
                .matches(&doc)
        );
    }

    #[test]
    fn conjunction_requires_all_clauses() {
        let doc = json!({ "kind": "group", "name": "hiking crew" });

        let spec = FilterSpec::new()
            .term("kind", "group")
            .wildcard("name", "*crew");
        assert!(spec.matches(&doc));

        let spec = FilterSpec::new()
            .term("kind", "private")
            .wildcard("name", "*crew");
        assert!(!spec.matches(&doc));
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = json!({ "name": "x" });

        assert!(!FilterSpec::new().term("kind", "group").matches(&doc));
        assert!(!FilterSpec::new().range("sent_time", Some(0.0), None).matches(&doc));
    }
}
