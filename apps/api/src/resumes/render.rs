//! Markdown rendering for exports and snapshots.

use crate::resumes::content::{ResumeContent, YearMonth};

pub fn render_markdown(title: &str, content: &ResumeContent) -> String {
    let personal = &content.personal;
    let heading = match personal.full_name.trim() {
        "" => title.trim(),
        name => name,
    };
    let mut md = format!("# {heading}\n\n");

    let contact: Vec<&str> = [
        &personal.email,
        &personal.phone,
        &personal.location,
        &personal.linkedin,
        &personal.portfolio,
    ]
    .into_iter()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .collect();
    if !contact.is_empty() {
        md.push_str(&contact.join(" | "));
        md.push_str("\n\n");
    }

    if !content.summary.trim().is_empty() {
        md.push_str("## Summary\n\n");
        md.push_str(content.summary.trim());
        md.push_str("\n\n");
    }

    if !content.experience.is_empty() {
        md.push_str("## Experience\n\n");
        for item in &content.experience {
            md.push_str(&entry_heading(&item.title, &item.company));
            push_meta(&mut md, &item.location, &item.start_date, &item.end_date, item.current);
            push_description(&mut md, &item.description);
        }
    }

    if !content.education.is_empty() {
        md.push_str("## Education\n\n");
        for item in &content.education {
            md.push_str(&entry_heading(&item.degree, &item.institution));
            push_meta(&mut md, &item.location, &item.start_date, &item.end_date, item.current);
            push_description(&mut md, &item.description);
        }
    }

    if !content.skills.is_empty() {
        md.push_str("## Skills\n\n");
        md.push_str(&content.skills.join(", "));
        md.push('\n');
    }

    md.trim_end().to_string() + "\n"
}

fn entry_heading(primary: &str, secondary: &str) -> String {
    match (primary.trim(), secondary.trim()) {
        (p, "") => format!("### {p}\n"),
        ("", s) => format!("### {s}\n"),
        (p, s) => format!("### {p}, {s}\n"),
    }
}

fn push_meta(md: &mut String, location: &str, start: &str, end: &str, current: bool) {
    let mut parts = Vec::new();
    if let Some(range) = date_range(start, end, current) {
        parts.push(range);
    }
    if !location.trim().is_empty() {
        parts.push(location.trim().to_string());
    }
    if !parts.is_empty() {
        md.push_str(&format!("*{}*\n", parts.join(" · ")));
    }
}

fn push_description(md: &mut String, description: &str) {
    if !description.trim().is_empty() {
        md.push('\n');
        md.push_str(description.trim());
        md.push('\n');
    }
    md.push('\n');
}

/// "Jan 2020 – Present", "Sep 2012 – May 2016", or just the start month.
pub fn date_range(start: &str, end: &str, current: bool) -> Option<String> {
    let label = |raw: &str| {
        YearMonth::parse(raw)
            .map(|ym| ym.label())
            .unwrap_or_else(|| raw.trim().to_string())
    };
    let start = label(start);
    if start.is_empty() {
        return None;
    }
    let end = if current {
        "Present".to_string()
    } else {
        label(end)
    };
    Some(if end.is_empty() {
        start
    } else {
        format!("{start} – {end}")
    })
}

/// A filesystem-safe attachment name such as `senior-dev-resume-v3.md`.
pub fn download_filename(title: &str, version: i32) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "resume" } else { slug };
    format!("{slug}-v{version}.md")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resumes::content::{EducationItem, ExperienceItem, PersonalInfo};

    #[test]
    fn test_full_render() {
        let content = ResumeContent {
            personal: PersonalInfo {
                full_name: "Alex Johnson".into(),
                email: "alex@example.com".into(),
                phone: "555-1234".into(),
                ..Default::default()
            },
            summary: "Builds things.".into(),
            experience: vec![ExperienceItem {
                title: "Senior Developer".into(),
                company: "Tech Solutions".into(),
                location: "Remote".into(),
                start_date: "2020-01".into(),
                current: true,
                description: "Led the team.".into(),
                ..Default::default()
            }],
            education: vec![EducationItem {
                degree: "B.S.".into(),
                institution: "UoT".into(),
                start_date: "2012-09".into(),
                end_date: "2016-05".into(),
                ..Default::default()
            }],
            skills: vec!["Rust".into(), "SQL".into()],
        };
        let md = render_markdown("My CV", &content);
        assert!(md.starts_with("# Alex Johnson\n\nalex@example.com | 555-1234\n\n## Summary"));
        assert!(md.contains("### Senior Developer, Tech Solutions\n*Jan 2020 – Present · Remote*\n\nLed the team."));
        assert!(md.contains("*Sep 2012 – May 2016*"));
        assert!(md.ends_with("## Skills\n\nRust, SQL\n"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let md = render_markdown("Draft", &ResumeContent::default());
        assert_eq!(md, "# Draft\n");
    }

    #[test]
    fn test_date_range() {
        assert_eq!(date_range("", "2020-01", false), None);
        assert_eq!(date_range("2020-01", "", false).as_deref(), Some("Jan 2020"));
        assert_eq!(
            date_range("2019-11", "2021-02", false).as_deref(),
            Some("Nov 2019 – Feb 2021")
        );
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("Senior Dev Resume!", 3), "senior-dev-resume-v3.md");
        assert_eq!(download_filename("***", 1), "resume-v1.md");
    }
}
