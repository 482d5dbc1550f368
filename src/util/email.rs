//! Natural-key normalization used for cross-store matching.

/// Domains of shared webmail providers, which say nothing about a user's institution.
const SHARED_MAIL_PROVIDERS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "yahoo.com",
    "icloud.com",
    "proton.me",
    "protonmail.com",
];

/// Email address in the form used as a map key: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Institution name in the form used as a map key: trimmed, lowercased, inner whitespace
/// collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lowercased part after the last `@`, if any.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim().to_lowercase();
    (!domain.is_empty()).then_some(domain)
}

pub fn is_shared_mail_provider(domain: &str) -> bool {
    SHARED_MAIL_PROVIDERS.contains(&domain)
}

/// Domain usable for institution matching: present and not a shared webmail provider.
pub fn institutional_domain(email: &str) -> Option<String> {
    email_domain(email).filter(|domain| !is_shared_mail_provider(domain))
}
