//! Static recode tables for licenses and publication types.
//!
//! New categories are added by appending rows; the default branches live in
//! the lookup functions, not in the tables.

/// Label used when a record carries no license.
pub const NO_LICENSE: &str = "No license";

/// Substring marking a version-4.0 Creative Commons license.
pub const LICENSE_VERSION_MARKER: &str = "4.0";

/// Group label for every license containing [`LICENSE_VERSION_MARKER`].
pub const CC_BY_4_GROUP: &str = "CC BY 4.0";

/// Bucket for publication types not listed in [`TYPE_GROUPS`].
pub const OTHER_PUBLICATION: &str = "Other publication";

/// Full license text -> short code.
pub const LICENSE_SHORT_CODES: &[(&str, &str)] = &[
    ("Creative Commons Attribution 4.0 International", "CC BY 4.0"),
    (
        "Creative Commons Attribution-NonCommercial 4.0 International",
        "CC BY-NC 4.0",
    ),
    ("In Copyright - Non-Commercial Use Permitted", "Copyright"),
    (
        "Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International",
        "CC BY-NC-ND 4.0",
    ),
    (
        "Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International",
        "CC BY-NC-SA 4.0",
    ),
];

/// Publication type group -> member types.
pub const TYPE_GROUPS: &[(&str, &[&str])] = &[
    (
        "Student Paper",
        &["Student Paper", "Bachelor Thesis", "Master Thesis"],
    ),
    ("Dataset", &["Dataset", "Data Collection"]),
    (
        "Scientific Article",
        &["Journal Article", "Review Article", "Book Chapter"],
    ),
];

/// Exact-match license lookup; unknown licenses pass through unchanged.
pub fn license_short(license: &str) -> &str {
    LICENSE_SHORT_CODES
        .iter()
        .find(|(full, _)| *full == license)
        .map(|(_, short)| *short)
        .unwrap_or(license)
}

/// Collapse every 4.0 license into one bucket.
pub fn license_group(license_short: &str) -> &str {
    if license_short.contains(LICENSE_VERSION_MARKER) {
        CC_BY_4_GROUP
    } else {
        license_short
    }
}

pub fn publication_type_group(publication_type: Option<&str>) -> &'static str {
    let Some(publication_type) = publication_type else {
        return OTHER_PUBLICATION;
    };

    TYPE_GROUPS
        .iter()
        .find(|(_, members)| members.iter().any(|member| *member == publication_type))
        .map(|(group, _)| *group)
        .unwrap_or(OTHER_PUBLICATION)
}
