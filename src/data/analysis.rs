//! Per-user language statistics
//!
//! Looks up a profile, reads the first page of its repositories, fetches each
//! repository's language breakdown concurrently and ranks the summed totals.

use std::collections::HashMap;

use super::github::{GitHubClient, GitHubError};
use super::models::{AnalysisResult, LanguageBytes, TopLanguage};

/// Number of languages kept in the ranking
pub const TOP_LANGUAGES: usize = 5;

/// Running byte totals per language
///
/// Remembers the order in which languages were first seen so the final ranking
/// breaks ties deterministically.
#[derive(Debug, Clone, Default)]
pub struct LanguageTally {
    totals: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl LanguageTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one repository's breakdown to the totals
    pub fn add(&mut self, languages: &LanguageBytes) {
        for (lang, bytes) in &languages.0 {
            match self.index.get(lang) {
                Some(&i) => self.totals[i].1 = self.totals[i].1.saturating_add(*bytes),
                None => {
                    self.index.insert(lang.clone(), self.totals.len());
                    self.totals.push((lang.clone(), *bytes));
                }
            }
        }
    }

    /// Total bytes recorded for `lang`
    pub fn get(&self, lang: &str) -> Option<u64> {
        self.index.get(lang).map(|&i| self.totals[i].1)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Languages by descending byte count, first-seen order on ties, cut to `n`
    pub fn top(&self, n: usize) -> Vec<TopLanguage> {
        let mut ranked = self.totals.clone();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(lang, bytes)| TopLanguage { lang, bytes })
            .collect()
    }
}

impl<'a> FromIterator<&'a LanguageBytes> for LanguageTally {
    fn from_iter<I: IntoIterator<Item = &'a LanguageBytes>>(iter: I) -> Self {
        let mut tally = Self::new();
        for languages in iter {
            tally.add(languages);
        }
        tally
    }
}

/// Computes [`AnalysisResult`]s from the GitHub API
#[derive(Debug, Clone)]
pub struct Analyzer {
    client: GitHubClient,
}

impl Analyzer {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Builds the language ranking for `username`
    ///
    /// Profile and listing failures fail the analysis. A failed language
    /// fetch for a single repository only drops that repository's
    /// contribution.
    pub async fn analyze(&self, username: &str) -> Result<AnalysisResult, GitHubError> {
        let profile = self.client.fetch_user(username).await?;
        let repos = self.client.fetch_repos(&profile.repos_url).await?;

        let language_futures = repos.iter().map(|repo| async move {
            match self.client.fetch_languages(&repo.languages_url).await {
                Ok(languages) => languages,
                Err(e) => {
                    tracing::warn!(
                        url = %repo.languages_url,
                        error = %e,
                        "language fetch failed, skipping repository"
                    );
                    LanguageBytes::default()
                }
            }
        });

        // join_all yields results in listing order regardless of completion order.
        let per_repo: Vec<LanguageBytes> = futures::future::join_all(language_futures).await;
        let tally: LanguageTally = per_repo.iter().collect();

        tracing::debug!(
            login = %profile.login,
            repos = repos.len(),
            languages = tally.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            login: profile.login,
            public_repos: profile.public_repo_count,
            top_languages: tally.top(TOP_LANGUAGES),
        })
    }
}
