use chrono::{DateTime, Utc};
use devpulse_core::PulseError;
use serde::de::DeserializeOwned;

/// GitHub REST client for the harvester's list endpoints.
///
/// # Examples
///
/// ```
/// use devpulse_harvest::client::parse_repo_reference;
///
/// let (owner, repo) = parse_repo_reference("rust-lang/rust").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if no token is available, or
    /// [`PulseError::GitHub`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use devpulse_harvest::client::GitHubClient;
    ///
    /// let client = GitHubClient::new(Some("ghp_xxxx")).unwrap();
    /// ```
    pub fn new(token: Option<&str>) -> Result<Self, PulseError> {
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                PulseError::Config(
                    "GITHUB_TOKEN not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
                )
            })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| PulseError::GitHub(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::new();

        Ok(Self {
            octocrab,
            http,
            token,
        })
    }

    /// Fetch one page of a list endpoint through the authenticated client.
    pub(crate) async fn get_page<T: DeserializeOwned + octocrab::FromResponse>(
        &self,
        route: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<T, PulseError> {
        let mut params = serde_json::Map::new();
        for (key, value) in query {
            params.insert((*key).into(), serde_json::Value::String(value.clone()));
        }
        params.insert("per_page".into(), serde_json::Value::String("100".into()));
        params.insert("page".into(), serde_json::Value::String(page.to_string()));

        self.octocrab
            .get(route, Some(&serde_json::Value::Object(params)))
            .await
            .map_err(|e| PulseError::GitHub(format!("GET {route} failed: {e}")))
    }

    /// Page through a created-descending list endpoint, keeping only records
    /// newer than `since`. Stops at the first record outside the window or
    /// at the page cap.
    pub(crate) async fn list_recent<T, F>(
        &self,
        route: &str,
        query: &[(&str, String)],
        since: DateTime<Utc>,
        max_pages: u32,
        created_at: F,
    ) -> Result<Vec<T>, PulseError>
    where
        T: DeserializeOwned,
        Vec<T>: octocrab::FromResponse,
        F: Fn(&T) -> DateTime<Utc>,
    {
        collect_recent(max_pages, since, created_at, |page| {
            self.get_page(route, query, page)
        })
        .await
    }

    /// Fetch the file listing for a pull request (first page, up to 100 files).
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on network or API errors.
    pub async fn get_pr_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<crate::records::PrFileRecord>, PulseError> {
        let url = format!(
            "https://api.github.com/repos/{owner}/{repo}/pulls/{pr_number}/files?per_page=100"
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "devpulse")
            .send()
            .await
            .map_err(|e| PulseError::GitHub(format!("failed to fetch PR files: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PulseError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PulseError::GitHub(format!("failed to parse PR files: {e}")))
    }
}

/// Drive a created-descending page fetcher, keeping records newer than
/// `since`. Stops at the first record outside the window, an empty page, or
/// the page cap.
pub(crate) async fn collect_recent<T, F, G, Fut>(
    max_pages: u32,
    since: DateTime<Utc>,
    created_at: F,
    mut fetch_page: G,
) -> Result<Vec<T>, PulseError>
where
    F: Fn(&T) -> DateTime<Utc>,
    G: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, PulseError>>,
{
    let mut all = Vec::new();
    for page in 1..=max_pages {
        let batch = fetch_page(page).await?;
        if batch.is_empty() {
            break;
        }
        let batch_len = batch.len();
        let recent: Vec<T> = batch
            .into_iter()
            .take_while(|item| created_at(item) > since)
            .collect();
        let done = recent.len() < batch_len;
        all.extend(recent);
        if done {
            break;
        }
    }
    Ok(all)
}

/// Parse a repository reference (`owner/repo`) into its components.
///
/// # Errors
///
/// Returns [`PulseError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use devpulse_harvest::client::parse_repo_reference;
///
/// let (owner, repo) = parse_repo_reference("octocat/hello-world").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// ```
pub fn parse_repo_reference(repo_ref: &str) -> Result<(String, String), PulseError> {
    let Some((owner, repo)) = repo_ref.split_once('/') else {
        return Err(PulseError::Config(format!(
            "invalid repository reference '{repo_ref}', expected owner/repo"
        )));
    };
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(PulseError::Config(format!(
            "invalid repository reference '{repo_ref}', expected owner/repo"
        )));
    }
    Ok((owner.to_string(), repo.to_string()))
}
