//! Upstream and response models

use serde::{Deserialize, Deserializer, Serialize};

/// The subset of a GitHub user profile the aggregator relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Account login (never empty for a real account)
    pub login: String,
    pub id: u64,
    /// Display name, if the user set one
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    #[serde(rename = "public_repos")]
    pub public_repo_count: u64,
    #[serde(rename = "followers")]
    pub follower_count: u64,
    /// Opaque locator for the user's repository listing
    pub repos_url: String,
}

/// A repository entry from a listing page; only the language locator matters
#[derive(Debug, Clone, Deserialize)]
pub struct RepoRef {
    pub languages_url: String,
}

/// Bytes of code per language for one repository, in upstream order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageBytes(pub Vec<(String, u64)>);

impl<'de> Deserialize<'de> for LanguageBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json's preserve_order keeps the object's key order here.
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self(
            map.into_iter()
                .filter_map(|(lang, bytes)| bytes.as_u64().map(|bytes| (lang, bytes)))
                .collect(),
        ))
    }
}

/// One entry of the ranked language list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLanguage {
    pub lang: String,
    pub bytes: u64,
}

/// Aggregate returned by `/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub login: String,
    pub public_repos: u64,
    /// At most five entries, by descending byte count
    pub top_languages: Vec<TopLanguage>,
}
