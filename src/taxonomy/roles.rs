/// Professional roles and the keywords that suggest a solution needs them.
pub const ROLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("Full-Stack Engineer", &["build", "app", "website", "platform", "software", "automation", "tool"]),
    ("Backend Engineer", &["api", "backend", "server", "database", "integration"]),
    ("Data/AI Engineer", &["data", "analytics", "model", "ai", "ml", "prediction"]),
    ("Product Manager", &["roadmap", "feature", "workflow", "prioritize", "product"]),
    ("Designer", &["ux", "ui", "design", "interface", "onboarding"]),
    ("Growth Marketer", &["marketing", "ads", "seo", "campaign", "funnel"]),
    ("Sales Lead", &["sales", "outbound", "pipeline", "prospect", "closing"]),
    ("Operations Lead", &["operations", "process", "manual", "sop", "fulfillment", "logistics"]),
    ("Finance/Compliance", &["compliance", "legal", "invoice", "payment", "accounting", "tax"]),
];

const SECTOR_DEFAULT_ROLES: &[(&str, [&str; 3])] = &[
    ("FinTech", ["Backend Engineer", "Finance/Compliance", "Product Manager"]),
    ("SaaS", ["Full-Stack Engineer", "Product Manager", "Designer"]),
    ("Commerce", ["Growth Marketer", "Sales Lead", "Operations Lead"]),
    ("Business", ["Product Manager", "Operations Lead", "Sales Lead"]),
    ("Mobility", ["Operations Lead", "Backend Engineer", "Product Manager"]),
    ("PropTech", ["Full-Stack Engineer", "Operations Lead", "Sales Lead"]),
    ("HealthTech", ["Backend Engineer", "Data/AI Engineer", "Finance/Compliance"]),
    ("Creator Economy", ["Designer", "Growth Marketer", "Full-Stack Engineer"]),
];

const GENERIC_DEFAULT_ROLES: [&str; 3] = ["Full-Stack Engineer", "Product Manager", "Growth Marketer"];

pub const MAX_ROLES: usize = 3;

pub fn sector_default_roles(sector: &str) -> &'static [&'static str] {
    SECTOR_DEFAULT_ROLES
        .iter()
        .find(|(name, _)| *name == sector)
        .map(|(_, roles)| roles.as_slice())
        .unwrap_or(GENERIC_DEFAULT_ROLES.as_slice())
}

/// Roles a solution calls for: keyword matches first, then the sector's defaults.
///
/// Keywords match as plain substrings of the lowercased text, so short keywords
/// like "ai" also fire inside longer words.
pub fn detect_roles(text: &str, sector: &str) -> Vec<String> {
    let body = text.to_lowercase();
    let mut roles: Vec<String> = ROLE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| body.contains(keyword)))
        .map(|(role, _)| role.to_string())
        .collect();

    if roles.len() >= MAX_ROLES {
        roles.truncate(MAX_ROLES);
        return roles;
    }

    for role in sector_default_roles(sector) {
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
        if roles.len() >= MAX_ROLES {
            break;
        }
    }

    roles
}
