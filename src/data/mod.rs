//! Upstream data access
//!
//! This module contains the GitHub API client, the models it decodes, and the
//! analyzer that aggregates per-repository language statistics.

pub mod analysis;
pub mod github;
pub mod models;

pub use analysis::{Analyzer, LanguageTally, TOP_LANGUAGES};
pub use github::{GitHubClient, GitHubError, UpstreamError, GITHUB_API_URL, REPOS_PAGE_SIZE};
pub use models::{AnalysisResult, LanguageBytes, ProfileSummary, RepoRef, TopLanguage};
