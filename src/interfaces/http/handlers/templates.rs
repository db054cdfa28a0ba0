//! Document template catalogue

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::interfaces::http::common::{ApiError, ErrorBody};

struct TemplateSpec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    features: &'static [&'static str],
    sections: &'static [&'static str],
    variables: &'static [&'static str],
}

const CATALOGUE: &[TemplateSpec] = &[
    TemplateSpec {
        id: "business-plan",
        name: "Business Plan",
        description: "Comprehensive business plan template with financial projections",
        category: "business",
        features: &["Executive Summary", "Market Analysis", "Financial Projections"],
        sections: &[
            "Executive Summary",
            "Company Description",
            "Market Analysis",
            "Organization & Management",
            "Products & Services",
            "Marketing & Sales",
            "Financial Projections",
        ],
        variables: &["company_name", "industry", "target_market", "funding_amount"],
    },
    TemplateSpec {
        id: "proposal",
        name: "Project Proposal",
        description: "Professional project proposal template",
        category: "project",
        features: &["Project Scope", "Timeline", "Budget"],
        sections: &["Overview", "Project Scope", "Timeline", "Budget", "Team"],
        variables: &["project_name", "client", "deadline", "budget"],
    },
    TemplateSpec {
        id: "report",
        name: "Technical Report",
        description: "Technical documentation and reporting template",
        category: "technical",
        features: &["Abstract", "Methodology", "Results"],
        sections: &["Abstract", "Introduction", "Methodology", "Results", "Conclusion"],
        variables: &["title", "authors", "date"],
    },
    TemplateSpec {
        id: "resume",
        name: "Professional Resume",
        description: "Modern professional resume template",
        category: "personal",
        features: &["Clean Design", "ATS Friendly", "Multiple Formats"],
        sections: &["Summary", "Experience", "Education", "Skills"],
        variables: &["full_name", "email", "phone"],
    },
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub features: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateStructure {
    pub sections: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub structure: TemplateStructure,
    pub variables: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl From<&TemplateSpec> for TemplateSummary {
    fn from(t: &TemplateSpec) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.to_string(),
            description: t.description.to_string(),
            category: t.category.to_string(),
            features: owned(t.features),
        }
    }
}

impl From<&TemplateSpec> for TemplateDetail {
    fn from(t: &TemplateSpec) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.to_string(),
            description: t.description.to_string(),
            category: t.category.to_string(),
            structure: TemplateStructure {
                sections: owned(t.sections),
            },
            variables: owned(t.variables),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/templates",
    tag = "Templates",
    responses(
        (status = 200, description = "Available templates", body = TemplateListResponse)
    )
)]
pub async fn list_templates() -> Json<TemplateListResponse> {
    let templates: Vec<TemplateSummary> = CATALOGUE.iter().map(TemplateSummary::from).collect();
    Json(TemplateListResponse {
        total: templates.len(),
        templates,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    params(("id" = String, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template details", body = TemplateDetail),
        (status = 404, description = "No such template", body = ErrorBody)
    )
)]
pub async fn get_template(Path(id): Path<String>) -> Result<Json<TemplateDetail>, ApiError> {
    CATALOGUE
        .iter()
        .find(|t| t.id == id)
        .map(|t| Json(TemplateDetail::from(t)))
        .ok_or_else(|| ApiError::not_found(format!("Template '{}' not found", id)))
}
