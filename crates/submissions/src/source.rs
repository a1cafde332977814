//! Where submissions and their files come from.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    operator_config::UpstreamConfig,
    reqwest::{Client, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, info},
    url::Url,
};

use crate::{
    Error, Result,
    types::{BranchRef, Label, Submission},
};

/// Hosting API surface the validator and catalog need.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Every open submission, across all pages.
    async fn list_open(&self) -> Result<Vec<Submission>>;

    /// Raw bytes at `url`. Non-success statuses are errors.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Whether `url` resolves. Never fails: any error reads as `false`.
    async fn exists(&self, url: &str) -> bool;
}

// ── GitHub REST ─────────────────────────────────────────────────────────────

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct PullRequestDto {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    diff_url: String,
    updated_at: DateTime<Utc>,
    user: Option<UserDto>,
    #[serde(default)]
    labels: Vec<LabelDto>,
    base: Option<BranchDto>,
    head: Option<BranchDto>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelDto {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: String,
}

#[derive(Debug, Deserialize)]
struct BranchDto {
    #[serde(rename = "ref", default)]
    git_ref: String,
    repo: Option<RepoDto>,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    full_name: String,
}

impl BranchDto {
    fn into_ref(self) -> Option<BranchRef> {
        let repo = self.repo?;
        if self.git_ref.is_empty() || repo.full_name.is_empty() {
            return None;
        }
        Some(BranchRef {
            repo_full_name: repo.full_name,
            git_ref: self.git_ref,
        })
    }
}

impl From<PullRequestDto> for Submission {
    fn from(pr: PullRequestDto) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            url: pr.html_url,
            diff_url: pr.diff_url,
            labels: pr
                .labels
                .into_iter()
                .map(|l| Label {
                    name: l.name,
                    color: l.color,
                })
                .collect(),
            submitter: pr.user.map(|u| u.login).unwrap_or_default(),
            updated_at: pr.updated_at,
            base: pr.base.and_then(BranchDto::into_ref),
            head: pr.head.and_then(BranchDto::into_ref),
        }
    }
}

/// Lists pull requests through the GitHub REST API and downloads files over
/// plain HTTP.
pub struct GitHubSource {
    client: Client,
    api_url: Url,
    owner: String,
    repo: String,
    token: Option<Secret<String>>,
    page_size: usize,
}

impl GitHubSource {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            api_url: Url::parse(&config.api_url)?,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token: config.token.clone(),
            page_size: PAGE_SIZE,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn pulls_url(&self, page: usize) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::message(format!("{} cannot be a base URL", self.api_url)))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "pulls"]);
        url.query_pairs_mut()
            .append_pair("state", "open")
            .append_pair("per_page", &self.page_size.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<PullRequestDto>> {
        let url = self.pulls_url(page)?;
        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SubmissionSource for GitHubSource {
    async fn list_open(&self) -> Result<Vec<Submission>> {
        let mut submissions = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.fetch_page(page).await?;
            let count = batch.len();
            debug!(page, count, "fetched pull request page");
            submissions.extend(batch.into_iter().map(Submission::from));
            if count < self.page_size {
                break;
            }
            page += 1;
        }
        info!(
            owner = %self.owner,
            repo = %self.repo,
            count = submissions.len(),
            "listed open submissions"
        );
        Ok(submissions)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            // Some hosts refuse HEAD outright.
            Ok(resp) if resp.status() == StatusCode::METHOD_NOT_ALLOWED => self
                .client
                .get(url)
                .send()
                .await
                .is_ok_and(|resp| resp.status().is_success()),
            Ok(resp) => {
                debug!(url, status = resp.status().as_u16(), "probe failed");
                false
            },
            Err(e) => {
                debug!(url, error = %e, "probe failed");
                false
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn pull(number: u64, updated: &str) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "title": format!("[Testing] Plugin {number}"),
            "html_url": format!("https://github.com/goatcorp/DalamudPlugins/pull/{number}"),
            "diff_url": format!("https://github.com/goatcorp/DalamudPlugins/pull/{number}.diff"),
            "updated_at": updated,
            "user": { "login": "someone" },
            "labels": [{ "name": "new plugin", "color": "0e8a16" }],
            "base": { "ref": "master", "repo": { "full_name": "goatcorp/DalamudPlugins" } },
            "head": { "ref": "foo", "repo": null }
        })
    }

    fn source(server: &mockito::Server) -> GitHubSource {
        GitHubSource::from_config(&UpstreamConfig {
            api_url: server.url(),
            ..Default::default()
        })
        .unwrap()
    }

    fn page_query(page: &str, per_page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "open".into()),
            Matcher::UrlEncoded("per_page".into(), per_page.into()),
            Matcher::UrlEncoded("page".into(), page.into()),
        ])
    }

    #[tokio::test]
    async fn maps_pull_request_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/goatcorp/DalamudPlugins/pulls")
            .match_query(page_query("1", "100"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!([pull(7, "2026-03-01T10:00:00Z")]).to_string())
            .create_async()
            .await;

        let submissions = source(&server).list_open().await.unwrap();
        mock.assert_async().await;

        assert_eq!(submissions.len(), 1);
        let s = &submissions[0];
        assert_eq!(s.number, 7);
        assert_eq!(s.submitter, "someone");
        assert_eq!(s.labels, [Label {
            name: "new plugin".into(),
            color: "0e8a16".into()
        }]);
        assert_eq!(s.base.as_ref().unwrap().git_ref, "master");
        assert!(s.head.is_none());
        assert_eq!(s.updated_at.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[tokio::test]
    async fn follows_pages_until_short_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/repos/goatcorp/DalamudPlugins/pulls")
            .match_query(page_query("1", "2"))
            .with_status(200)
            .with_body(
                serde_json::json!([pull(1, "2026-03-01T10:00:00Z"), pull(2, "2026-03-01T10:00:00Z")])
                    .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/goatcorp/DalamudPlugins/pulls")
            .match_query(page_query("2", "2"))
            .with_status(200)
            .with_body(serde_json::json!([pull(3, "2026-03-01T10:00:00Z")]).to_string())
            .create_async()
            .await;

        let submissions = source(&server).with_page_size(2).list_open().await.unwrap();
        first.assert_async().await;
        second.assert_async().await;
        let numbers: Vec<_> = submissions.iter().map(|s| s.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[tokio::test]
    async fn listing_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/goatcorp/DalamudPlugins/pulls")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = source(&server).list_open().await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 403, .. }));
    }

    #[tokio::test]
    async fn sends_token_when_configured() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/goatcorp/DalamudPlugins/pulls")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let source = GitHubSource::from_config(&UpstreamConfig {
            api_url: server.url(),
            token: Some(Secret::new("ghp_test".into())),
            ..Default::default()
        })
        .unwrap();
        assert!(source.list_open().await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_bytes_rejects_missing_file() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/a.json")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/b.json")
            .with_status(404)
            .create_async()
            .await;

        let source = source(&server);
        let ok = source
            .fetch_bytes(&format!("{}/a.json", server.url()))
            .await
            .unwrap();
        assert_eq!(ok, b"{}");
        let err = source
            .fetch_bytes(&format!("{}/b.json", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn exists_probes_with_head_then_get() {
        let mut server = mockito::Server::new_async().await;
        let _head_ok = server
            .mock("HEAD", "/icon.png")
            .with_status(200)
            .create_async()
            .await;
        let _head_refused = server
            .mock("HEAD", "/image.png")
            .with_status(405)
            .create_async()
            .await;
        let _get_ok = server
            .mock("GET", "/image.png")
            .with_status(200)
            .create_async()
            .await;
        let _gone = server
            .mock("HEAD", "/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let source = source(&server);
        assert!(source.exists(&format!("{}/icon.png", server.url())).await);
        assert!(source.exists(&format!("{}/image.png", server.url())).await);
        assert!(!source.exists(&format!("{}/gone.png", server.url())).await);
        assert!(!source.exists("http://127.0.0.1:1/unreachable.png").await);
    }
}
