//! Subscription plans and what each one unlocks.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
    Max,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Max => "max",
        }
    }

    /// Stored tiers that no longer parse are treated as free.
    pub fn from_tier(tier: &str) -> Self {
        tier.parse().unwrap_or(Plan::Free)
    }

    pub fn entitlements(&self) -> Entitlements {
        match self {
            Plan::Free => Entitlements {
                premium_templates: false,
                exports_per_month: Some(2),
                ai_generations_per_month: Some(5),
                job_tailoring: false,
            },
            Plan::Pro => Entitlements {
                premium_templates: true,
                exports_per_month: None,
                ai_generations_per_month: Some(100),
                job_tailoring: true,
            },
            Plan::Max => Entitlements {
                premium_templates: true,
                exports_per_month: None,
                ai_generations_per_month: None,
                job_tailoring: true,
            },
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "max" => Ok(Plan::Max),
            other => Err(format!("Unknown plan '{other}'")),
        }
    }
}

/// `None` limits mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlements {
    pub premium_templates: bool,
    pub exports_per_month: Option<u32>,
    pub ai_generations_per_month: Option<u32>,
    pub job_tailoring: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetails {
    pub id: Plan,
    pub name: &'static str,
    pub price: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub entitlements: Entitlements,
}

#[derive(Debug, Clone, Serialize)]
pub struct Addon {
    pub name: &'static str,
    pub description: &'static str,
    pub price: &'static str,
}

pub fn plan_catalog() -> Vec<PlanDetails> {
    vec![
        PlanDetails {
            id: Plan::Free,
            name: "Free",
            price: "$0",
            description: "Basic resume building tools",
            features: &[
                "Basic resume templates (3)",
                "Limited exports (2/month)",
                "Standard ATS optimization",
                "Basic job matching",
                "Text-only cover letters",
            ],
            entitlements: Plan::Free.entitlements(),
        },
        PlanDetails {
            id: Plan::Pro,
            name: "Pro",
            price: "$9.99",
            description: "Advanced tools for serious job seekers",
            features: &[
                "All free features",
                "Unlimited exports",
                "Premium templates",
                "AI content suggestions",
                "Cover letter generator",
                "Job tailoring assistant",
                "Email support",
            ],
            entitlements: Plan::Pro.entitlements(),
        },
        PlanDetails {
            id: Plan::Max,
            name: "Max",
            price: "$19.99",
            description: "Complete career advancement solution",
            features: &[
                "All Pro features",
                "Priority support",
                "Global format optimization",
                "Unlimited AI content generation",
            ],
            entitlements: Plan::Max.entitlements(),
        },
    ]
}

pub fn addon_catalog() -> Vec<Addon> {
    vec![
        Addon {
            name: "Interview Coaching",
            description: "One-on-one mock interview with an industry coach",
            price: "$29.99",
        },
        Addon {
            name: "Portfolio Website",
            description: "Hosted portfolio generated from your resume",
            price: "$5.99/mo",
        },
        Addon {
            name: "Application Tracker",
            description: "Track every application and follow-up in one place",
            price: "$3.99/mo",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parsing() {
        assert_eq!("Pro".parse::<Plan>(), Ok(Plan::Pro));
        assert_eq!(" max ".parse::<Plan>(), Ok(Plan::Max));
        assert!("enterprise".parse::<Plan>().is_err());
        assert_eq!(Plan::from_tier("legacy-gold"), Plan::Free);
    }

    #[test]
    fn test_free_plan_is_limited() {
        let e = Plan::Free.entitlements();
        assert!(!e.premium_templates);
        assert!(!e.job_tailoring);
        assert_eq!(e.exports_per_month, Some(2));
        assert_eq!(e.ai_generations_per_month, Some(5));
    }

    #[test]
    fn test_max_plan_is_unlimited() {
        let e = Plan::Max.entitlements();
        assert_eq!(e.exports_per_month, None);
        assert_eq!(e.ai_generations_per_month, None);
    }

    #[test]
    fn test_catalog_matches_plans() {
        let catalog = plan_catalog();
        assert_eq!(catalog.len(), 3);
        for details in &catalog {
            assert_eq!(details.entitlements, details.id.entitlements());
        }
        assert_eq!(addon_catalog().len(), 3);
    }
}
