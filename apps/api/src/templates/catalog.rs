//! The resume template gallery. Static: templates ship with the front end.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: i32,
    pub name: &'static str,
    pub thumbnail: &'static str,
    pub region: &'static str,
    pub style: &'static str,
    pub premium: bool,
    pub rating: f32,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        id: 1,
        name: "Modern Professional",
        thumbnail: "/templates/modern-professional.png",
        region: "US",
        style: "modern",
        premium: true,
        rating: 4.8,
    },
    Template {
        id: 2,
        name: "Classic Corporate",
        thumbnail: "/templates/classic-corporate.png",
        region: "EU",
        style: "classic",
        premium: false,
        rating: 4.5,
    },
    Template {
        id: 3,
        name: "Creative Portfolio",
        thumbnail: "/templates/creative-portfolio.png",
        region: "US",
        style: "modern",
        premium: false,
        rating: 4.2,
    },
    Template {
        id: 4,
        name: "Academic CV",
        thumbnail: "/templates/academic-cv.png",
        region: "EU",
        style: "classic",
        premium: true,
        rating: 4.9,
    },
    Template {
        id: 5,
        name: "Minimalist Design",
        thumbnail: "/templates/minimalist-design.png",
        region: "Asia",
        style: "modern",
        premium: false,
        rating: 4.4,
    },
    Template {
        id: 6,
        name: "Executive Resume",
        thumbnail: "/templates/executive-resume.png",
        region: "US",
        style: "classic",
        premium: true,
        rating: 4.7,
    },
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub region: Option<String>,
    pub style: Option<String>,
    pub premium: Option<bool>,
    /// Only `rating` is recognized; anything else keeps catalog order.
    pub sort: Option<String>,
}

pub fn find_template(id: i32) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

pub fn list_templates(filter: &TemplateFilter) -> Vec<&'static Template> {
    let matches_text = |wanted: &Option<String>, actual: &str| {
        wanted
            .as_deref()
            .map(|w| w.trim().eq_ignore_ascii_case(actual))
            .unwrap_or(true)
    };

    let mut templates: Vec<_> = TEMPLATES
        .iter()
        .filter(|t| matches_text(&filter.region, t.region))
        .filter(|t| matches_text(&filter.style, t.style))
        .filter(|t| filter.premium.map(|p| p == t.premium).unwrap_or(true))
        .collect();

    if filter.sort.as_deref() == Some("rating") {
        templates.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(templates: &[&Template]) -> Vec<i32> {
        templates.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_unfiltered_returns_catalog_order() {
        assert_eq!(ids(&list_templates(&TemplateFilter::default())), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let filter = TemplateFilter {
            region: Some("us".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&list_templates(&filter)), vec![1, 3, 6]);
    }

    #[test]
    fn test_free_templates_only() {
        let filter = TemplateFilter {
            premium: Some(false),
            ..Default::default()
        };
        assert_eq!(ids(&list_templates(&filter)), vec![2, 3, 5]);
    }

    #[test]
    fn test_combined_filter_sorted_by_rating() {
        let filter = TemplateFilter {
            style: Some("Classic".to_string()),
            sort: Some("rating".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&list_templates(&filter)), vec![4, 6, 2]);
    }

    #[test]
    fn test_find_template() {
        assert_eq!(find_template(4).map(|t| t.name), Some("Academic CV"));
        assert!(find_template(99).is_none());
    }
}
