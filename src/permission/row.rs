// Boundary adapter for backend program rows.
//
// The backend spells the same program fields differently depending on the
// endpoint. Every spelling is handled here; the rest of the crate only sees
// the normalized `AssignedRow`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::menu::normalize_url;

const KEY_FIELDS: &[&str] = &[
    "progrmSn",
    "progrmId",
    "progrmSno",
    "programSn",
    "programId",
    "programSno",
];

const URL_FIELDS: &[&str] = &[
    "progrmUri",
    "programUri",
    "progrmUrl",
    "programUrl",
    "progrmStrePath",
    "url",
    "uri",
];

const NAME_FIELDS: &[&str] = &[
    "progrmNm",
    "programNm",
    "progrmKoreanNm",
    "programKoreanNm",
    "menuNm",
    "name",
];

const ASSIGNMENT_FIELD: &str = "menuIndictYn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    Assigned,
    Unassigned,
}

impl Assignment {
    pub fn is_assigned(self) -> bool {
        self == Assignment::Assigned
    }

    /// Absent or unrecognized flags count as assigned: rows come from the
    /// role's assigned list unless explicitly marked otherwise.
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("n") => Assignment::Unassigned,
            Some(Value::Bool(false)) => Assignment::Unassigned,
            _ => Assignment::Assigned,
        }
    }
}

/// One backend program row in normalized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedRow {
    pub backend_key: Option<String>,
    /// Raw URL-like values in field-priority order
    pub urls: Vec<String>,
    pub name: Option<String>,
    pub assignment: Assignment,
}

impl AssignedRow {
    pub fn new(assignment: Assignment) -> Self {
        Self {
            backend_key: None,
            urls: Vec::new(),
            name: None,
            assignment,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.backend_key = Some(key.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Normalize a backend JSON object. Non-object values produce an empty
    /// assigned row, which the mapper will report as unmapped.
    pub fn from_json(value: &Value) -> Self {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);

        let backend_key = KEY_FIELDS.iter().find_map(|f| scalar_string(object.get(*f)));
        let name = NAME_FIELDS.iter().find_map(|f| scalar_string(object.get(*f)));

        let mut urls: Vec<String> = Vec::new();
        for field in URL_FIELDS {
            if let Some(url) = scalar_string(object.get(*field)) {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }

        Self {
            backend_key,
            urls,
            name,
            assignment: Assignment::from_value(object.get(ASSIGNMENT_FIELD)),
        }
    }

    /// Normalized, deduplicated URL candidates in field-priority order
    pub fn normalized_urls(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for url in self.urls.iter().filter_map(|u| normalize_url(u)) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
        out
    }

    pub fn shares_url_with(&self, other: &AssignedRow) -> bool {
        let theirs = other.normalized_urls();
        self.normalized_urls().iter().any(|u| theirs.contains(u))
    }

    pub fn shares_name_with(&self, other: &AssignedRow) -> bool {
        matches!((&self.name, &other.name), (Some(a), Some(b)) if a == b)
    }

    pub fn shares_key_with(&self, other: &AssignedRow) -> bool {
        matches!((&self.backend_key, &other.backend_key), (Some(a), Some(b)) if a == b)
    }
}

impl<'de> Deserialize<'de> for AssignedRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(AssignedRow::from_json(&value))
    }
}

/// Strings and numbers become trimmed strings; blanks and other types are absent
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progrm_spelling() {
        let row = AssignedRow::from_json(&json!({
            "progrmSn": "101",
            "progrmUri": "/user/mngr/retrievePagingList.do",
            "progrmNm": "사용자관리",
            "menuIndictYn": "Y"
        }));
        assert_eq!(row.backend_key.as_deref(), Some("101"));
        assert_eq!(row.urls, vec!["/user/mngr/retrievePagingList.do".to_string()]);
        assert_eq!(row.name.as_deref(), Some("사용자관리"));
        assert_eq!(row.assignment, Assignment::Assigned);
    }

    #[test]
    fn test_program_spelling_with_numeric_id() {
        let row = AssignedRow::from_json(&json!({
            "programId": 202,
            "programUrl": "/sr/rcept/retrievePagingList.do",
            "programNm": "SR접수",
            "menuIndictYn": "N"
        }));
        assert_eq!(row.backend_key.as_deref(), Some("202"));
        assert_eq!(row.urls, vec!["/sr/rcept/retrievePagingList.do".to_string()]);
        assert_eq!(row.name.as_deref(), Some("SR접수"));
        assert_eq!(row.assignment, Assignment::Unassigned);
    }

    #[test]
    fn test_sno_and_korean_name_spelling() {
        let row = AssignedRow::from_json(&json!({
            "progrmSno": "7",
            "progrmKoreanNm": "공지사항",
            "menuIndictYn": "y"
        }));
        assert_eq!(row.backend_key.as_deref(), Some("7"));
        assert_eq!(row.name.as_deref(), Some("공지사항"));
        assert!(row.urls.is_empty());
        assert!(row.assignment.is_assigned());
    }

    #[test]
    fn test_all_url_fields_collected_in_priority_order() {
        let row = AssignedRow::from_json(&json!({
            "programUri": "/b",
            "progrmUri": "/a",
            "url": "/a",
            "uri": "/c"
        }));
        assert_eq!(row.urls, vec!["/a".to_string(), "/b".to_string(), "/c".to_string()]);
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let row = AssignedRow::from_json(&json!({
            "progrmSn": "",
            "progrmId": "55",
            "progrmNm": "   ",
            "menuNm": "질의응답"
        }));
        assert_eq!(row.backend_key.as_deref(), Some("55"));
        assert_eq!(row.name.as_deref(), Some("질의응답"));
    }

    #[test]
    fn test_assignment_flag_variants() {
        let flag = |v: Value| AssignedRow::from_json(&json!({ "menuIndictYn": v })).assignment;
        assert_eq!(flag(json!("N")), Assignment::Unassigned);
        assert_eq!(flag(json!(" n ")), Assignment::Unassigned);
        assert_eq!(flag(json!(false)), Assignment::Unassigned);
        assert_eq!(flag(json!("Y")), Assignment::Assigned);
        assert_eq!(flag(json!(true)), Assignment::Assigned);
        assert_eq!(AssignedRow::from_json(&json!({})).assignment, Assignment::Assigned);
    }

    #[test]
    fn test_deserialize_goes_through_adapter() {
        let rows: Vec<AssignedRow> = serde_json::from_value(json!([
            { "progrmSn": "1", "menuIndictYn": "Y" },
            { "programSn": 2, "menuIndictYn": "N" }
        ]))
        .unwrap();
        assert_eq!(rows[0].backend_key.as_deref(), Some("1"));
        assert_eq!(rows[1].backend_key.as_deref(), Some("2"));
        assert_eq!(rows[1].assignment, Assignment::Unassigned);
    }

    #[test]
    fn test_url_comparison_uses_normalized_form() {
        let a = AssignedRow::new(Assignment::Assigned)
            .with_url("/sr/evl/retrievePagingList.do?x=1");
        let b = AssignedRow::new(Assignment::Assigned).with_url(" /sr/evl/retrievePagingList.do ");
        assert!(a.shares_url_with(&b));
    }
}
