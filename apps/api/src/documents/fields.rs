use chrono::NaiveDate;
use serde::Deserialize;

use crate::render::PlaceholderMap;

/// Synthetic token filled with the generation date.
pub const CURRENT_DATE_TOKEN: &str = "{CURRENT_DATE}";

/// Request body shared by all four generation endpoints.
///
/// Required fields must be present but may be blank. Optional fields accept a
/// missing key or `null`; both render as an empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeFields {
    pub employee_name: String,
    pub employee_address: String,
    pub designation: String,
    pub department: String,
    pub company_name: String,
    pub hr_name: String,

    #[serde(default)]
    pub work_location: Option<String>,
    #[serde(default)]
    pub reporting_manager: Option<String>,
    #[serde(default)]
    pub offer_date: Option<String>,
    #[serde(default)]
    pub joining_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub termination_date: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub ctc: Option<String>,
    #[serde(default)]
    pub probation_months: Option<String>,
    #[serde(default)]
    pub notice_period: Option<String>,
    #[serde(default)]
    pub working_hours: Option<String>,
}

impl EmployeeFields {
    fn required(&self) -> [(&'static str, &str); 6] {
        [
            ("employee_name", self.employee_name.as_str()),
            ("employee_address", self.employee_address.as_str()),
            ("designation", self.designation.as_str()),
            ("department", self.department.as_str()),
            ("company_name", self.company_name.as_str()),
            ("hr_name", self.hr_name.as_str()),
        ]
    }

    fn optional(&self) -> [(&'static str, &Option<String>); 11] {
        [
            ("work_location", &self.work_location),
            ("reporting_manager", &self.reporting_manager),
            ("offer_date", &self.offer_date),
            ("joining_date", &self.joining_date),
            ("end_date", &self.end_date),
            ("termination_date", &self.termination_date),
            ("reason", &self.reason),
            ("ctc", &self.ctc),
            ("probation_months", &self.probation_months),
            ("notice_period", &self.notice_period),
            ("working_hours", &self.working_hours),
        ]
    }

    /// Builds `{FIELD_NAME}` → value for every declared field plus `{CURRENT_DATE}`.
    pub fn placeholders(&self, today: NaiveDate) -> PlaceholderMap {
        let required = self
            .required()
            .into_iter()
            .map(|(name, value)| (token(name), value.to_string()));
        let optional = self
            .optional()
            .into_iter()
            .map(|(name, value)| (token(name), value.clone().unwrap_or_default()));

        let mut mapping: PlaceholderMap = required.chain(optional).collect();
        mapping.insert(
            CURRENT_DATE_TOKEN.to_string(),
            today.format("%Y-%m-%d").to_string(),
        );
        mapping
    }
}

fn token(field: &str) -> String {
    format!("{{{}}}", field.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jane_doe() -> EmployeeFields {
        serde_json::from_value(json!({
            "employee_name": "Jane Doe",
            "designation": "Engineer",
            "department": "R&D",
            "company_name": "Acme",
            "employee_address": "1 Main St",
            "hr_name": "HR Bot"
        }))
        .unwrap()
    }

    #[test]
    fn test_optional_fields_may_be_missing_or_null() {
        let fields: EmployeeFields = serde_json::from_value(json!({
            "employee_name": "A",
            "employee_address": "B",
            "designation": "C",
            "department": "D",
            "company_name": "E",
            "hr_name": "F",
            "ctc": null,
            "notice_period": "60 days"
        }))
        .unwrap();

        assert!(fields.ctc.is_none());
        assert!(fields.reason.is_none());
        assert_eq!(fields.notice_period.as_deref(), Some("60 days"));
    }

    #[test]
    fn test_missing_required_field_fails_deserialization() {
        let result: Result<EmployeeFields, _> = serde_json::from_value(json!({
            "employee_name": "Jane Doe"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholders_cover_every_field_and_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mapping = jane_doe().placeholders(today);

        assert_eq!(mapping.len(), 18);
        assert_eq!(mapping["{EMPLOYEE_NAME}"], "Jane Doe");
        assert_eq!(mapping["{DEPARTMENT}"], "R&D");
        assert_eq!(mapping["{HR_NAME}"], "HR Bot");
        assert_eq!(mapping["{WORK_LOCATION}"], "");
        assert_eq!(mapping["{TERMINATION_DATE}"], "");
        assert_eq!(mapping[CURRENT_DATE_TOKEN], "2026-10-19");
    }

    #[test]
    fn test_blank_required_field_renders_empty() {
        let mut fields = jane_doe();
        fields.designation = String::new();

        let mapping = fields.placeholders(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        assert_eq!(mapping["{DESIGNATION}"], "");
    }
}
