use crate::errors::DomainError;

pub fn validate_filter_name(name: &str) -> Result<(), DomainError> {
    if name.len() > 200 {
        return Err(DomainError::Validation(
            "name cannot exceed 200 characters".to_string(),
        ));
    }
    Ok(())
}

/// A filter source is an http(s) URL or an absolute filesystem path.
pub fn validate_filter_url(url: &str) -> Result<(), DomainError> {
    if url.is_empty() {
        return Err(DomainError::InvalidFilterUrl("empty URL".to_string()));
    }
    if url.len() > 2048 {
        return Err(DomainError::InvalidFilterUrl(
            "URL cannot exceed 2048 characters".to_string(),
        ));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    if std::path::Path::new(url).is_absolute() {
        return Ok(());
    }
    Err(DomainError::InvalidFilterUrl(format!(
        "{url}: must be an http(s) URL or an absolute path"
    )))
}

pub fn validate_rewrite_domain(domain: &str) -> Result<(), DomainError> {
    let bare = domain.strip_prefix("*.").unwrap_or(domain);
    if bare.is_empty() {
        return Err(DomainError::Validation("rewrite domain cannot be empty".to_string()));
    }
    if bare.contains('*') || bare.contains(char::is_whitespace) {
        return Err(DomainError::Validation(format!("invalid rewrite domain: {domain}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_forms() {
        assert!(validate_filter_url("https://filters.example/list.txt").is_ok());
        assert!(validate_filter_url("http://filters.example/list.txt").is_ok());
        assert!(validate_filter_url("/var/lib/filters/list.txt").is_ok());
        assert!(validate_filter_url("ftp://filters.example/list.txt").is_err());
        assert!(validate_filter_url("relative/path.txt").is_err());
        assert!(validate_filter_url("").is_err());
    }

    #[test]
    fn test_rewrite_domain_forms() {
        assert!(validate_rewrite_domain("host.example").is_ok());
        assert!(validate_rewrite_domain("*.example.org").is_ok());
        assert!(validate_rewrite_domain("*.").is_err());
        assert!(validate_rewrite_domain("a*b.example").is_err());
    }
}
