//! Unit tests for source precedence and version selection.

use super::*;
use crate::sources::{SourceError, VersionRequirement};
use crate::test_utils::test_config;
use rstest::rstest;

struct Fixed {
    kind: SourceKind,
    raw: Option<&'static str>,
}

impl VersionSource for Fixed {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn probe(&self, _config: &Config) -> crate::sources::Result<Option<VersionRequirement>> {
        Ok(self.raw.map(|raw| VersionRequirement::new(self.kind, raw)))
    }
}

struct Broken(SourceKind);

impl VersionSource for Broken {
    fn kind(&self) -> SourceKind {
        self.0
    }

    fn probe(&self, _config: &Config) -> crate::sources::Result<Option<VersionRequirement>> {
        Err(SourceError::Parse {
            origin: "broken".to_owned(),
            reason: "probed".to_owned(),
        })
    }
}

fn fixed(kind: SourceKind, raw: Option<&'static str>) -> Box<dyn VersionSource> {
    Box::new(Fixed { kind, raw })
}

fn request(raw: &str) -> RequestedVersion {
    raw.parse().expect("valid request")
}

fn candidates(tags: &[&str]) -> Vec<Candidate> {
    Candidate::parse_all(tags.iter().copied(), "v")
}

fn selected(request: &EffectiveRequest, tags: &[&str]) -> Option<String> {
    let candidates = candidates(tags);
    select(request, &candidates).map(|c| c.version.to_string())
}

#[test]
fn first_answering_source_short_circuits() {
    let (_temp, config) = test_config();
    let resolver = ConstraintResolver::new(vec![
        fixed(SourceKind::Environment, None),
        fixed(SourceKind::PinnedFile, Some("1.6.0")),
        Box::new(Broken(SourceKind::SwitchFile)),
        Box::new(Broken(SourceKind::Project)),
    ]);

    let effective = resolver.resolve(&config).expect("resolved");

    assert_eq!(effective.request, request("1.6.0"));
    assert_eq!(effective.origin, SourceKind::PinnedFile);
    assert!(effective.project.is_empty());
}

#[test]
fn failing_source_before_an_answer_is_an_error() {
    let (_temp, config) = test_config();
    let resolver = ConstraintResolver::new(vec![
        Box::new(Broken(SourceKind::PinnedFile)),
        fixed(SourceKind::SwitchFile, Some("1.6.0")),
    ]);
    let err = resolver.resolve(&config).expect_err("source failure");
    assert!(matches!(err, InstallerError::Source(_)));
}

#[test]
fn keyword_from_pinned_file_reads_project_constraints() {
    let (_temp, config) = test_config();
    let resolver = ConstraintResolver::new(vec![
        fixed(SourceKind::PinnedFile, Some("min-required")),
        fixed(SourceKind::Project, Some(">= 1.5.0, < 2.0.0")),
    ]);

    let effective = resolver.resolve(&config).expect("resolved");

    assert_eq!(effective.request, RequestedVersion::Keyword(Keyword::MinRequired));
    assert_eq!(effective.project.to_string(), ">= 1.5.0, < 2.0.0");
    assert_eq!(effective.to_string(), "min-required (>= 1.5.0, < 2.0.0)");
}

#[test]
fn exact_request_skips_project_constraints() {
    let (_temp, config) = test_config();
    let resolver = ConstraintResolver::new(vec![Box::new(Broken(SourceKind::Project))]);
    let effective = resolver
        .explicit(&config, request("1.6.0"))
        .expect("no project probe");
    assert_eq!(effective.origin, SourceKind::Explicit);
}

#[rstest]
#[case::latest_allowed(Some(Keyword::LatestAllowed), "latest-allowed")]
#[case::min_required(Some(Keyword::MinRequired), "min-required")]
#[case::latest_stable(Some(Keyword::LatestStable), ">= 1.5.0, < 2.0.0")]
#[case::no_fallback(None, ">= 1.5.0, < 2.0.0")]
fn project_constraints_combine_with_fallback(
    #[case] fallback: Option<Keyword>,
    #[case] expected: &str,
) {
    let (_temp, mut config) = test_config();
    config.fallback = fallback;
    let resolver = ConstraintResolver::new(vec![
        fixed(SourceKind::PinnedFile, None),
        fixed(SourceKind::Project, Some(">= 1.5.0, < 2.0.0")),
    ]);

    let effective = resolver.resolve(&config).expect("resolved");

    assert_eq!(effective.origin, SourceKind::Project);
    assert_eq!(effective.request.to_string(), expected);
    assert_eq!(effective.project.to_string(), ">= 1.5.0, < 2.0.0");
}

#[test]
fn fallback_keyword_applies_when_nothing_answers() {
    let (_temp, mut config) = test_config();
    config.fallback = Some(Keyword::LatestStable);
    let resolver = ConstraintResolver::new(vec![fixed(SourceKind::PinnedFile, None)]);
    let effective = resolver.resolve(&config).expect("resolved");
    assert_eq!(effective.origin, SourceKind::Fallback);
    assert_eq!(effective.request, RequestedVersion::Keyword(Keyword::LatestStable));
}

#[test]
fn no_source_and_no_fallback_is_no_version_found() {
    let (_temp, mut config) = test_config();
    config.fallback = None;
    let resolver = ConstraintResolver::new(vec![fixed(SourceKind::PinnedFile, None)]);
    let err = resolver.resolve(&config).expect_err("nothing found");
    assert!(matches!(err, InstallerError::NoVersionFound));
}

#[test]
fn constraint_selects_highest_satisfying_release() {
    let effective = EffectiveRequest::new(request(">=1.5.0,<2.0.0"), SourceKind::Explicit);
    assert_eq!(
        selected(&effective, &["1.4.9", "1.5.2", "1.9.9", "2.0.0"]).as_deref(),
        Some("1.9.9")
    );
}

const CATALOG: &[&str] = &[
    "v1.5.0",
    "v1.6.2",
    "v1.6.0",
    "v1.8.0-beta1",
    "nightly",
    "v1.7.1",
];

#[rstest]
#[case::latest(Keyword::Latest, "", "1.8.0-beta1")]
#[case::latest_stable(Keyword::LatestStable, ">= 1.5.0, < 1.7.0", "1.7.1")]
#[case::latest_allowed(Keyword::LatestAllowed, ">= 1.5.0, < 1.7.0", "1.6.2")]
#[case::latest_allowed_unconstrained(Keyword::LatestAllowed, "", "1.7.1")]
#[case::min_required(Keyword::MinRequired, "~> 1.6.0", "1.6.0")]
#[case::min_required_unconstrained(Keyword::MinRequired, "", "1.7.1")]
fn keywords_select_by_their_rule(
    #[case] keyword: Keyword,
    #[case] project: &str,
    #[case] expected: &str,
) {
    let effective = EffectiveRequest {
        request: RequestedVersion::Keyword(keyword),
        origin: SourceKind::Explicit,
        project: if project.is_empty() {
            ConstraintSet::default()
        } else {
            project.parse().expect("valid constraint")
        },
    };
    assert_eq!(selected(&effective, CATALOG).as_deref(), Some(expected));
}

#[test]
fn exact_request_finds_matching_tag() {
    let effective = EffectiveRequest::new(request("1.6.0"), SourceKind::Explicit);
    let candidates = candidates(CATALOG);
    let found = select(&effective, &candidates).expect("listed");
    assert_eq!(found.tag, "v1.6.0");
}

#[test]
fn unsatisfiable_constraint_selects_nothing() {
    let effective = EffectiveRequest::new(request(">= 9.0.0"), SourceKind::Explicit);
    assert_eq!(selected(&effective, CATALOG), None);
}

#[test]
fn malformed_names_are_skipped() {
    let parsed = candidates(CATALOG);
    assert_eq!(parsed.len(), CATALOG.len() - 1);
    assert!(parsed.iter().all(|c| c.tag != "nightly"));
}
