use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::job::is_build_number;
use crate::Job;

const API_SUFFIX: &str = "/api/json";
const JOB_SEGMENT: &str = "/job/";
const SCHEME_SEPARATOR: &str = "://";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty locator")]
    Empty,
    #[error("missing or non-numeric build identifier in {path:?}")]
    MissingBuildId { path: String },
}

/// Canonical form of a user-supplied job locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub path: String,
    pub build_id: String,
}

impl Locator {
    pub fn into_job(self, created: DateTime<Utc>) -> Job {
        Job::new(self.path, self.build_id, created)
    }
}

/// Parse free-form input into a new, not yet tracked job.
pub fn parse(raw: &str) -> Result<Job, ParseError> {
    parse_locator(raw).map(|locator| locator.into_job(Utc::now()))
}

/// Accepts bare paths, paths with an `/api/json` suffix, and full server URLs.
pub fn parse_locator(raw: &str) -> Result<Locator, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let path = match absolute_url(trimmed) {
        Some(url) => percent_decode_str(url.path()).decode_utf8_lossy().into_owned(),
        None => trimmed.to_string(),
    };

    let path = strip_api_suffix(&path);
    let path = from_first_job_segment(path);
    let path = collapse_slashes(path.trim_matches('/'));

    let last = path.rsplit('/').next().unwrap_or_default();
    if !is_build_number(last) {
        return Err(ParseError::MissingBuildId { path });
    }

    Ok(Locator {
        build_id: last.to_string(),
        path,
    })
}

/// Collapse runs of `/` into a single separator.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Only `scheme://host/...` input counts as a URL. Canonical paths never contain
/// `//`, so re-parsing one always takes the raw-path branch.
fn absolute_url(input: &str) -> Option<Url> {
    if !input.contains(SCHEME_SEPARATOR) {
        return None;
    }
    Url::parse(input).ok().filter(Url::has_host)
}

fn strip_api_suffix(path: &str) -> &str {
    path.trim_end_matches('/')
        .strip_suffix(API_SUFFIX)
        .unwrap_or(path)
}

fn from_first_job_segment(path: &str) -> &str {
    if path.starts_with(&JOB_SEGMENT[1..]) {
        return path;
    }
    match path.find(JOB_SEGMENT) {
        Some(idx) => &path[idx..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_suffix_tolerates_trailing_slash() {
        assert_eq!(strip_api_suffix("/job/a/1/api/json/"), "/job/a/1");
        assert_eq!(strip_api_suffix("/job/a/1/"), "/job/a/1/");
    }

    #[test]
    fn job_segment_at_start_is_kept() {
        assert_eq!(from_first_job_segment("job/a/job/b/1"), "job/a/job/b/1");
        assert_eq!(from_first_job_segment("/view/x/job/b/1"), "/job/b/1");
        assert_eq!(from_first_job_segment("/other/1"), "/other/1");
    }

    #[test]
    fn only_scheme_and_host_input_is_a_url() {
        assert!(absolute_url("https://ci.example.com/job/a/1").is_some());
        assert!(absolute_url("http:/evil/5").is_none());
        assert!(absolute_url("ci.internal:8080/job/app/6").is_none());
    }

    #[test]
    fn collapse_keeps_single_separators() {
        assert_eq!(collapse_slashes("a//b///c/d"), "a/b/c/d");
        assert_eq!(collapse_slashes(""), "");
    }
}
