//! Source precedence and selection of a concrete version.
//!
//! [`ConstraintResolver`] polls its sources in order and stops at the first
//! one that answers. Project constraints are the exception: they are a
//! conjunction gathered from the whole tree, and they are also consulted
//! when a keyword such as `latest-allowed` arrives from a higher-priority
//! source. [`select`] then picks one [`Candidate`] for the effective request.

use crate::config::Config;
use crate::error::{InstallerError, Result};
use crate::sources::{SourceKind, VersionRequirement, VersionSource, standard_sources};
use std::fmt;
use tvm_version::{ConstraintSet, Keyword, RequestedVersion, Version};

/// The request to satisfy, with the project constraints it may depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRequest {
    /// What to select.
    pub request: RequestedVersion,
    /// Where the request came from.
    pub origin: SourceKind,
    /// Conjunction of project constraints; empty when none apply.
    pub project: ConstraintSet,
}

impl EffectiveRequest {
    /// A request with no project constraints attached.
    #[must_use]
    pub fn new(request: RequestedVersion, origin: SourceKind) -> Self {
        Self {
            request,
            origin,
            project: ConstraintSet::default(),
        }
    }

    /// The exact version requested, if any.
    #[must_use]
    pub const fn exact(&self) -> Option<&Version> {
        match &self.request {
            RequestedVersion::Exact(version) => Some(version),
            _ => None,
        }
    }
}

impl fmt::Display for EffectiveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.request {
            RequestedVersion::Keyword(keyword)
                if keyword.uses_project_constraints() && !self.project.is_empty() =>
            {
                write!(f, "{keyword} ({})", self.project)
            }
            request => write!(f, "{request}"),
        }
    }
}

/// Applies source precedence to produce an [`EffectiveRequest`].
pub struct ConstraintResolver {
    sources: Vec<Box<dyn VersionSource>>,
}

impl ConstraintResolver {
    /// A resolver over `sources`, highest priority first.
    #[must_use]
    pub fn new(sources: Vec<Box<dyn VersionSource>>) -> Self {
        Self { sources }
    }

    /// A resolver over [`standard_sources`].
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_sources())
    }

    /// Find the effective request for the project at
    /// [`Config::work_path`].
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoVersionFound`] when no source answers and
    /// no fallback keyword is configured, or the error of the first source
    /// that fails.
    pub fn resolve(&self, config: &Config) -> Result<EffectiveRequest> {
        for source in &self.sources {
            let Some(requirement) = source.probe(config)? else {
                continue;
            };
            log::debug!("using {requirement}");
            if requirement.origin() == SourceKind::Project {
                return Self::from_project(config, &requirement).map_err(Into::into);
            }
            return self.complete(config, requirement.parse()?, requirement.origin());
        }

        let keyword = config.fallback.ok_or(InstallerError::NoVersionFound)?;
        log::info!("no version requirement found, using default {keyword}");
        self.complete(config, RequestedVersion::Keyword(keyword), SourceKind::Fallback)
    }

    /// Attach project constraints to a request made directly by the caller.
    ///
    /// # Errors
    ///
    /// Returns the error of a project source that fails.
    pub fn explicit(&self, config: &Config, request: RequestedVersion) -> Result<EffectiveRequest> {
        self.complete(config, request, SourceKind::Explicit)
    }

    fn complete(
        &self,
        config: &Config,
        request: RequestedVersion,
        origin: SourceKind,
    ) -> Result<EffectiveRequest> {
        let project = match &request {
            RequestedVersion::Keyword(keyword) if keyword.uses_project_constraints() => {
                self.project_constraints(config)?
            }
            _ => ConstraintSet::default(),
        };
        Ok(EffectiveRequest {
            request,
            origin,
            project,
        })
    }

    fn project_constraints(&self, config: &Config) -> Result<ConstraintSet> {
        let mut combined = ConstraintSet::default();
        for source in self.sources.iter().filter(|s| s.kind() == SourceKind::Project) {
            if let Some(requirement) = source.probe(config)? {
                combined = combined.and(requirement.raw().parse()?);
            }
        }
        Ok(combined)
    }

    /// Project constraints alone: the fallback keyword selects among them
    /// when it reads project constraints, otherwise they are the request.
    fn from_project(
        config: &Config,
        requirement: &VersionRequirement,
    ) -> std::result::Result<EffectiveRequest, tvm_version::VersionError> {
        let project: ConstraintSet = requirement.raw().parse()?;
        let request = match config.fallback {
            Some(keyword) if keyword.uses_project_constraints() => RequestedVersion::Keyword(keyword),
            _ => RequestedVersion::Constraint(project.clone()),
        };
        Ok(EffectiveRequest {
            request,
            origin: SourceKind::Project,
            project,
        })
    }
}

/// A selectable version and the name it was found under: a release tag or
/// an install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The parsed version.
    pub version: Version,
    /// The tag or directory name, unchanged.
    pub tag: String,
}

impl Candidate {
    /// Parse every name after removing `tag_prefix`; malformed names are
    /// skipped with a warning.
    pub fn parse_all<I, S>(names: I, tag_prefix: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(Into::into)
            .filter_map(|tag| match crate::catalog::parse_tag(&tag, tag_prefix) {
                Ok(version) => Some(Self { version, tag }),
                Err(err) => {
                    log::warn!("skipping malformed version \"{tag}\": {err}");
                    None
                }
            })
            .collect()
    }
}

/// Pick the candidate satisfying `request`.
///
/// `latest` and `latest-stable` ignore project constraints. With no project
/// constraints `latest-allowed` and `min-required` behave like
/// `latest-stable`.
#[must_use]
pub fn select<'a>(request: &EffectiveRequest, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
    let highest = |accept: &dyn Fn(&Version) -> bool| {
        candidates
            .iter()
            .filter(|c| accept(&c.version))
            .max_by(|a, b| a.version.cmp(&b.version))
    };
    match &request.request {
        RequestedVersion::Exact(version) => candidates.iter().find(|c| &c.version == version),
        RequestedVersion::Keyword(Keyword::Latest) => highest(&|_| true),
        RequestedVersion::Keyword(Keyword::LatestStable) => highest(&|v| !v.is_prerelease()),
        RequestedVersion::Keyword(Keyword::LatestAllowed) => highest(&|v| request.project.matches(v)),
        RequestedVersion::Keyword(Keyword::MinRequired) if !request.project.is_empty() => candidates
            .iter()
            .filter(|c| request.project.matches(&c.version))
            .min_by(|a, b| a.version.cmp(&b.version)),
        RequestedVersion::Keyword(Keyword::MinRequired) => highest(&|v| !v.is_prerelease()),
        RequestedVersion::Constraint(set) => highest(&|v| set.matches(v)),
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
