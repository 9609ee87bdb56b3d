use dnswarden_domain::DomainError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A fetched and scrubbed filter, parked in a temp file next to its final
/// location so the replace is a same-filesystem rename.
pub(crate) struct DownloadedFilter {
    pub rules_count: u32,
    pub checksum: u32,
    /// `! Title:` header value, when one preceded the first rule.
    pub title: Option<String>,
    pub temp: NamedTempFile,
}

fn is_forbidden_byte(b: u8) -> bool {
    (b < 0x20 && !matches!(b, b'\t' | b'\r' | b'\n')) || b == 0x7f
}

/// Scrub the raw list bytes line by line, writing them verbatim to `out`
/// while computing the running CRC32 and the rule count.
///
/// Rejects binary content and HTML error pages outright; the caller keeps
/// the previous list state in that case.
fn scrub_into(body: &[u8], out: &mut impl Write) -> Result<(u32, u32, Option<String>), DomainError> {
    let mut hasher = crc32fast::Hasher::new();
    let mut rules_count: u32 = 0;
    let mut title: Option<String> = None;
    let mut html_checked = false;

    for line in body.split_inclusive(|&b| b == b'\n') {
        if line.iter().copied().any(is_forbidden_byte) {
            return Err(DomainError::ContentRejected(
                "non-printable data".to_string(),
            ));
        }
        let text = std::str::from_utf8(line)
            .map_err(|_| DomainError::ContentRejected("invalid UTF-8".to_string()))?;
        let trimmed = text.trim();

        if trimmed.starts_with('#') {
            // Comment; never counted.
        } else if let Some(meta) = trimmed.strip_prefix('!') {
            if rules_count == 0 && title.is_none() {
                if let Some(value) = meta.trim_start().strip_prefix("Title:") {
                    let value = value.trim();
                    if !value.is_empty() {
                        title = Some(value.to_string());
                    }
                }
            }
        } else if !trimmed.is_empty() {
            if !html_checked {
                let lower = trimmed.to_ascii_lowercase();
                if lower.starts_with("<html") || lower.starts_with("<!doctype") {
                    return Err(DomainError::ContentRejected("looks like HTML".to_string()));
                }
                html_checked = true;
            }
            rules_count += 1;
        }

        hasher.update(line);
        out.write_all(line)
            .map_err(|e| DomainError::IoError(e.to_string()))?;
    }

    Ok((rules_count, hasher.finalize(), title))
}

/// Fetch one filter source into a temp file in `filters_dir`.
///
/// Absolute-path sources are read from disk; anything else goes through
/// the shared HTTP client, where a non-2xx status is a failure.
pub(crate) async fn download_filter(
    http: &reqwest::Client,
    url: &str,
    filters_dir: &Path,
) -> Result<DownloadedFilter, DomainError> {
    std::fs::create_dir_all(filters_dir).map_err(|e| DomainError::IoError(e.to_string()))?;

    let body: Vec<u8> = if Path::new(url).is_absolute() {
        tokio::fs::read(url)
            .await
            .map_err(|e| DomainError::IoError(format!("{url}: {e}")))?
    } else {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::NetworkError(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(DomainError::NetworkError(format!(
                "HTTP {} for {url}",
                response.status().as_u16()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| DomainError::NetworkError(format!("{url}: {e}")))?
            .to_vec()
    };

    let mut temp =
        NamedTempFile::new_in(filters_dir).map_err(|e| DomainError::IoError(e.to_string()))?;
    let (rules_count, checksum, title) = scrub_into(&body, temp.as_file_mut())?;

    debug!(url, rules_count, checksum, "Filter content downloaded");

    Ok(DownloadedFilter {
        rules_count,
        checksum,
        title,
        temp,
    })
}
