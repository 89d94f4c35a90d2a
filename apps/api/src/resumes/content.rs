//! The resume editor's content model and its validation rules.
//!
//! Two classes of problems:
//! - hard errors (malformed values) reject the save with 400
//! - missing required fields are reported so incomplete drafts can be saved

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::credentials::normalize_email;

pub const MAX_SKILLS: usize = 50;
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub portfolio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceItem {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContent {
    pub personal: PersonalInfo,
    pub summary: String,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub skills: Vec<String>,
}

/// A `YYYY-MM` month as produced by `<input type="month">`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(year, 4) || !digits(month, 2) {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn label(&self) -> String {
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        format!("{} {}", MONTHS[(self.month - 1) as usize], self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    pub missing_fields: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// One line per hard error, for a 400 body.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn error(&mut self, field: String, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    fn require(&mut self, field: String, value: &str) {
        if value.trim().is_empty() {
            self.missing_fields.push(field);
        }
    }
}

impl ResumeContent {
    /// Reads stored JSON leniently; malformed content yields an empty resume.
    pub fn from_stored(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Trims skills, drops blanks, and removes case-insensitive duplicates.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
            .collect();
        self
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let personal = &self.personal;
        report.require("personal.fullName".into(), &personal.full_name);
        report.require("personal.email".into(), &personal.email);
        report.require("personal.phone".into(), &personal.phone);
        if !personal.email.trim().is_empty() && normalize_email(&personal.email).is_none() {
            report.error("personal.email".into(), "must be a valid email address");
        }

        report.require("summary".into(), &self.summary);

        for (i, item) in self.experience.iter().enumerate() {
            let prefix = format!("experience[{i}]");
            report.require(format!("{prefix}.title"), &item.title);
            report.require(format!("{prefix}.company"), &item.company);
            report.require(format!("{prefix}.startDate"), &item.start_date);
            report.require(format!("{prefix}.description"), &item.description);
            check_date_range(&mut report, &prefix, &item.start_date, &item.end_date, item.current);
        }

        for (i, item) in self.education.iter().enumerate() {
            let prefix = format!("education[{i}]");
            report.require(format!("{prefix}.degree"), &item.degree);
            report.require(format!("{prefix}.institution"), &item.institution);
            check_date_range(&mut report, &prefix, &item.start_date, &item.end_date, item.current);
        }

        if self.skills.len() > MAX_SKILLS {
            report.error("skills".into(), "must list at most 50 skills");
        }

        report
    }
}

fn check_date_range(
    report: &mut ValidationReport,
    prefix: &str,
    start: &str,
    end: &str,
    current: bool,
) {
    let parse = |field: &str, raw: &str, report: &mut ValidationReport| {
        if raw.trim().is_empty() {
            return None;
        }
        let parsed = YearMonth::parse(raw);
        if parsed.is_none() {
            report.error(format!("{prefix}.{field}"), "must be a month in YYYY-MM format");
        }
        parsed
    };

    let start = parse("startDate", start, report);
    let end = parse("endDate", end, report);

    if current && end.is_some() {
        report.error(
            format!("{prefix}.endDate"),
            "must be empty when this is the current position",
        );
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            report.error(format!("{prefix}.endDate"), "must not be before the start date");
        }
    }
}

/// Trims a title; blank titles become "Untitled Resume".
pub fn clean_title(raw: Option<&str>) -> Result<String, String> {
    let title = raw.map(str::trim).unwrap_or_default();
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("Title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(if title.is_empty() {
        "Untitled Resume".to_string()
    } else {
        title.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> ResumeContent {
        ResumeContent {
            personal: PersonalInfo {
                full_name: "Alex Johnson".into(),
                email: "alex.johnson@example.com".into(),
                phone: "(555) 123-4567".into(),
                location: "San Francisco, CA".into(),
                ..Default::default()
            },
            summary: "Frontend developer with 5 years of experience.".into(),
            experience: vec![ExperienceItem {
                title: "Senior Developer".into(),
                company: "Tech Solutions Inc.".into(),
                start_date: "2020-01".into(),
                current: true,
                description: "Led a team of 5 developers.".into(),
                ..Default::default()
            }],
            education: vec![EducationItem {
                degree: "B.S. Computer Science".into(),
                institution: "University of Technology".into(),
                start_date: "2012-09".into(),
                end_date: "2016-05".into(),
                ..Default::default()
            }],
            skills: vec!["React".into(), "TypeScript".into()],
        }
    }

    #[test]
    fn test_complete_resume_is_clean() {
        let report = complete().validate();
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.missing_fields.is_empty(), "{:?}", report.missing_fields);
    }

    #[test]
    fn test_empty_resume_is_valid_but_incomplete() {
        let report = ResumeContent::default().validate();
        assert!(report.is_valid());
        assert_eq!(
            report.missing_fields,
            vec!["personal.fullName", "personal.email", "personal.phone", "summary"]
        );
    }

    #[test]
    fn test_deserializes_editor_camel_case() {
        let content: ResumeContent = serde_json::from_value(json!({
            "personal": { "fullName": "Ada", "email": "ada@example.com" },
            "experience": [{ "title": "Engineer", "startDate": "2021-03", "current": true }]
        }))
        .unwrap();
        assert_eq!(content.personal.full_name, "Ada");
        assert_eq!(content.experience[0].start_date, "2021-03");
        assert!(content.experience[0].current);
        assert!(content.skills.is_empty());
    }

    #[test]
    fn test_end_before_start_is_error() {
        let mut content = complete();
        content.education[0].end_date = "2011-01".into();
        let report = content.validate();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "education[0].endDate");
    }

    #[test]
    fn test_end_date_with_current_is_error() {
        let mut content = complete();
        content.experience[0].end_date = "2024-02".into();
        let report = content.validate();
        assert!(report
            .errors
            .iter()
            .any(|e| e.field == "experience[0].endDate" && e.message.contains("current")));
    }

    #[test]
    fn test_malformed_dates_and_email() {
        let mut content = complete();
        content.personal.email = "not-an-email".into();
        content.experience[0].start_date = "01/2020".into();
        let report = content.validate();
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["personal.email", "experience[0].startDate"]);

        content.experience[0].start_date = "2020-+1".into();
        let report = content.validate();
        assert!(report.errors.iter().any(|e| e.field == "experience[0].startDate"));
        assert!(report.error_summary().contains("YYYY-MM"));
    }

    #[test]
    fn test_missing_item_fields_are_indexed() {
        let mut content = complete();
        content.experience.push(ExperienceItem::default());
        let report = content.validate();
        assert!(report.missing_fields.contains(&"experience[1].title".to_string()));
        assert!(report.missing_fields.contains(&"experience[1].description".to_string()));
    }

    #[test]
    fn test_too_many_skills() {
        let mut content = complete();
        content.skills = (0..51).map(|i| format!("skill-{i}")).collect();
        assert!(!content.validate().is_valid());
    }

    #[test]
    fn test_normalized_dedupes_skills() {
        let mut content = complete();
        content.skills = vec![" React ".into(), "react".into(), "".into(), "Rust".into()];
        assert_eq!(content.normalized().skills, vec!["React", "Rust"]);
    }

    #[test]
    fn test_year_month() {
        assert_eq!(YearMonth::parse("2020-01"), Some(YearMonth { year: 2020, month: 1 }));
        assert_eq!(YearMonth::parse("2020-13"), None);
        assert_eq!(YearMonth::parse("20-01"), None);
        assert_eq!(YearMonth::parse("2020-1"), None);
        assert_eq!(YearMonth::parse("2020-+1"), None);
        assert_eq!(YearMonth::parse("+202-01"), None);
        assert_eq!(YearMonth::parse("2020--1"), None);
        assert_eq!(YearMonth { year: 2020, month: 1 }.label(), "Jan 2020");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title(Some("  My CV ")).unwrap(), "My CV");
        assert_eq!(clean_title(None).unwrap(), "Untitled Resume");
        assert!(clean_title(Some("x".repeat(201).as_str())).is_err());
    }
}
