use buildwatch_core::{parse, parse_locator, JobStatus, JobStore, MemoryStore, ParseError};
use pretty_assertions::assert_eq;

fn canonical(input: &str) -> (String, String) {
    let locator = parse_locator(input).expect("locator parses");
    (locator.path, locator.build_id)
}

#[test]
fn full_url_keeps_path_from_first_job_segment() {
    assert_eq!(
        canonical("https://ci.example.com/view/all/job/dev/job/app/123/api/json"),
        ("job/dev/job/app/123".to_string(), "123".to_string())
    );
}

#[test]
fn bare_path_trailing_slash_is_stripped() {
    assert_eq!(
        canonical("job/dev/job/app/123/"),
        ("job/dev/job/app/123".to_string(), "123".to_string())
    );
}

#[test]
fn double_slashes_collapse() {
    assert_eq!(
        canonical("job//dev///app/123"),
        ("job/dev/app/123".to_string(), "123".to_string())
    );
}

#[test]
fn bare_path_with_api_suffix_and_noise() {
    assert_eq!(
        canonical("  /job/dev/job/app/77/api/json  \n"),
        ("job/dev/job/app/77".to_string(), "77".to_string())
    );
}

#[test]
fn url_without_job_segment_uses_whole_path() {
    assert_eq!(
        canonical("http://ci.internal:8080/builds/nightly/42/"),
        ("builds/nightly/42".to_string(), "42".to_string())
    );
}

#[test]
fn url_query_and_fragment_are_ignored() {
    assert_eq!(
        canonical("https://ci.example.com/job/app/9/?foo=bar#console"),
        ("job/app/9".to_string(), "9".to_string())
    );
}

#[test]
fn missing_build_number_is_rejected() {
    assert!(matches!(
        parse_locator("job/dev/app"),
        Err(ParseError::MissingBuildId { .. })
    ));
    assert!(matches!(
        parse_locator("https://ci.example.com/job/dev/lastBuild"),
        Err(ParseError::MissingBuildId { .. })
    ));
    assert!(matches!(
        parse_locator("job/dev/-3"),
        Err(ParseError::MissingBuildId { .. })
    ));
}

#[test]
fn blank_input_is_rejected() {
    assert_eq!(parse_locator("   \n"), Err(ParseError::Empty));
    assert!(matches!(
        parse_locator("///"),
        Err(ParseError::MissingBuildId { .. })
    ));
}

#[test]
fn reparsing_canonical_path_is_stable() {
    let inputs = [
        "https://ci.example.com/view/all/job/dev/job/app/123/api/json",
        "job/dev/job/app/123/",
        "job//dev///app/123",
        "http://ci.internal:8080/builds/nightly/42/",
        "/view//x/job/a%20b/job/c/5/api/json/",
        "ci.internal:8080/job/app/6",
        "https://ci.example.com/http://evil/5",
        "https://ci.example.com/job/my%20app/5",
    ];
    for input in inputs {
        let first = parse_locator(input).expect("first parse");
        let second = parse_locator(&first.path).expect("reparse");
        assert_eq!(first, second, "input {input:?}");
    }
}

#[test]
fn url_inside_a_url_path_stays_a_path() {
    assert_eq!(
        canonical("https://ci.example.com/http://evil/5"),
        ("http:/evil/5".to_string(), "5".to_string())
    );
    assert_eq!(
        canonical("http:/evil/5"),
        ("http:/evil/5".to_string(), "5".to_string())
    );
}

#[test]
fn url_paths_are_percent_decoded() {
    assert_eq!(
        canonical("https://ci.example.com/job/my%20app/5/api/json"),
        ("job/my app/5".to_string(), "5".to_string())
    );
    assert_eq!(
        canonical("https://ci.example.com/job/my app/5"),
        canonical("job/my app/5")
    );
}

#[test]
fn encoded_url_and_bare_path_are_one_job() {
    let mut store = JobStore::load(Box::new(MemoryStore::new()));
    assert!(store.add(parse("https://ci.example.com/job/my%20app/5/").expect("url")));
    assert!(!store.add(parse("job/my app/5").expect("bare")));
    assert_eq!(store.len(), 1);
}

#[test]
fn parsed_job_starts_unknown() {
    let job = parse("job/dev/job/app/123").expect("job");
    assert_eq!(job.status, JobStatus::Unknown);
    assert_eq!(job.build_id, "123");
    assert_eq!(job.display_name(), "dev / app");

    let other = parse("job/dev/job/app/123").expect("job");
    assert_ne!(job.id, other.id);
}
