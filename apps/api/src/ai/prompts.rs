//! Prompt templates for the AI features. Placeholders are `{name}` and are
//! filled with `str::replace` before sending.

/// Replace `{profile}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Create a globally optimized, ATS-friendly professional summary for the resume described below.

Write 3 to 4 sentences in the first person without using "I". Lead with the candidate's strongest qualification, mention concrete skills, and keep it under 90 words.

CANDIDATE:
{profile}"#;

/// Replace `{full_name}`, `{job_title}`, `{company_name}`, `{key_points}`, `{style}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter from {full_name} applying for the {job_title} position at {company_name}.

Points the applicant wants to highlight:
{key_points}

{style}

Address it "Dear Hiring Manager," and sign it with the applicant's name. Keep it under 350 words."#;

pub const STANDARD_STYLE: &str = "Use a formal, conventional structure: an opening paragraph naming the role, \
    one or two paragraphs connecting the applicant's experience to the role, and a short closing paragraph.";

pub const ALTERNATE_STYLE: &str = "Take a warmer, more personal approach: open with what draws the applicant \
    to the company, tell one short story that shows their strengths, and close with enthusiasm.";

/// Replace `{resume}` and `{job_description}`.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Compare the resume with the job description and explain how to tailor the resume.

Return a JSON object with this EXACT schema (no extra fields):
{
  "matched_keywords": ["React"],
  "missing_keywords": ["GraphQL"],
  "suggestions": ["Mention the GraphQL API you built at Tech Solutions in your experience section."]
}

Rules:
- Keywords are skills, tools, qualifications or domain terms that appear in the job description.
- matched_keywords appear in both documents; missing_keywords appear only in the job description.
- Give at most 8 suggestions. Each must be actionable and grounded in the resume's real content.

RESUME:
{resume}

JOB DESCRIPTION:
{job_description}"#;

/// Trims, turns newlines into spaces and drops carriage returns.
pub fn clean_input_text(text: &str) -> String {
    text.trim().replace('\n', " ").replace('\r', "")
}

/// Formats the suggestion inputs into the block embedded in the summary prompt.
pub fn combine_resume_fields(
    name: &str,
    education: &str,
    experience: &str,
    skills: &str,
    location: &str,
) -> String {
    format!(
        "Name: {}\nEducation: {}\nExperience: {}\nSkills: {}\nLocation: {}",
        clean_input_text(name),
        clean_input_text(education),
        clean_input_text(experience),
        clean_input_text(skills),
        clean_input_text(location),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_input_text() {
        assert_eq!(clean_input_text("  line one\r\nline two \n"), "line one line two");
        assert_eq!(clean_input_text(""), "");
    }

    #[test]
    fn test_combine_resume_fields() {
        let block = combine_resume_fields(" Ada ", "BSc\nMaths", "", "Rust, SQL", "London");
        assert_eq!(
            block,
            "Name: Ada\nEducation: BSc Maths\nExperience: \nSkills: Rust, SQL\nLocation: London"
        );
    }
}
