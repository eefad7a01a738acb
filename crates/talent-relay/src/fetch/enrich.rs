use serde_json::{Map, Value};

use super::RecordsAt;
use crate::connectors::endpoint_with_segments;
use crate::transform::fields::Fields;

/// Copies `from` in the detail payload onto `to` in the list record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCopy {
    pub from: &'static str,
    pub to: &'static str,
}

impl FieldCopy {
    pub const fn same(name: &'static str) -> Self {
        Self {
            from: name,
            to: name,
        }
    }
}

/// Per-record detail endpoint used to fill in fields the list view omits.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    /// Detail URL is `{base_url}/{id}`, with the id encoded as one segment.
    pub base_url: String,
    pub id_field: &'static str,
    /// Where the detail object sits in the response.
    pub record_at: RecordsAt,
    pub fields: &'static [FieldCopy],
    /// Set to null when the detail lookup fails.
    pub resume_field: &'static str,
}

impl DetailRequest {
    pub(crate) fn record_id(&self, record: &Value) -> Option<String> {
        Fields::new(record).text(self.id_field)
    }

    /// `None` for ids that cannot form a single path segment.
    pub(crate) fn url_for(&self, id: &str) -> Option<String> {
        endpoint_with_segments(&self.base_url, &[id])
    }

    pub(crate) fn merge(&self, record: &mut Value, body: &Value) {
        let detail = match self.record_at {
            RecordsAt::Root => Some(body),
            RecordsAt::Key(key) => body.get(key),
        };
        let empty = Map::new();
        let detail = detail.and_then(Value::as_object).unwrap_or(&empty);

        if let Value::Object(target) = record {
            for copy in self.fields {
                let value = detail.get(copy.from).cloned().unwrap_or(Value::Null);
                target.insert(copy.to.to_string(), value);
            }
        }
    }

    pub(crate) fn mark_missing(&self, record: &mut Value) {
        if let Value::Object(target) = record {
            target.insert(self.resume_field.to_string(), Value::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldCopy] = &[
        FieldCopy::same("resume_url"),
        FieldCopy {
            from: "education_entries",
            to: "education",
        },
    ];

    fn detail() -> DetailRequest {
        DetailRequest {
            base_url: "https://acme.workable.com/spi/v3/candidates/".to_string(),
            id_field: "id",
            record_at: RecordsAt::Key("candidate"),
            fields: FIELDS,
            resume_field: "resume_url",
        }
    }

    #[test]
    fn builds_detail_urls_without_double_slashes() {
        assert_eq!(
            detail().url_for("c1").as_deref(),
            Some("https://acme.workable.com/spi/v3/candidates/c1")
        );
    }

    #[test]
    fn ids_cannot_escape_the_detail_path() {
        assert_eq!(
            detail().url_for("../jobs?state=open").as_deref(),
            Some("https://acme.workable.com/spi/v3/candidates/..%2Fjobs%3Fstate=open")
        );
        assert!(detail().url_for("..").is_none());
    }

    #[test]
    fn numeric_ids_are_accepted() {
        assert_eq!(detail().record_id(&json!({ "id": 42 })).as_deref(), Some("42"));
        assert!(detail().record_id(&json!({ "name": "x" })).is_none());
    }

    #[test]
    fn merge_writes_null_for_fields_missing_from_detail() {
        let mut record = json!({ "id": "c1", "name": "Ada" });
        let body = json!({ "candidate": { "resume_url": "https://files/c1.pdf" } });
        detail().merge(&mut record, &body);

        assert_eq!(record["resume_url"], "https://files/c1.pdf");
        assert_eq!(record["education"], Value::Null);
        assert_eq!(record["name"], "Ada");
    }

    #[test]
    fn mark_missing_only_touches_resume_field() {
        let mut record = json!({ "id": "c1" });
        detail().mark_missing(&mut record);
        let object = record.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert_eq!(object["resume_url"], Value::Null);
    }
}
