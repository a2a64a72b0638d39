//! Blocking WordPress REST client.
//!
//! Covers the three calls the pipeline needs (media upload, page content
//! fetch, page content update) plus page listing for the CLI. All requests
//! use application-password basic auth.

use std::path::Path;

use anyhow::Context as _;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};

use crate::error::{QuotepressError, QuotepressResult};

const MEDIA_ROUTE: &str = "/wp-json/wp/v2/media";
const PAGES_ROUTE: &str = "/wp-json/wp/v2/pages";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SiteCredentials {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

/// Load the credentials file: a JSON array of site entries.
pub fn load_credentials(path: &Path) -> QuotepressResult<Vec<SiteCredentials>> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open credentials '{}'", path.display()))?;
    let creds: Vec<SiteCredentials> =
        serde_json::from_reader(std::io::BufReader::new(f)).context("parse credentials JSON")?;
    Ok(creds)
}

pub fn find_site<'a>(creds: &'a [SiteCredentials], site_url: &str) -> Option<&'a SiteCredentials> {
    creds.iter().find(|c| c.site_url == site_url)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    pub id: u64,
    /// Site-relative link when the source URL contains `wp-content`,
    /// otherwise the absolute URL as returned.
    pub link: String,
}

#[derive(Clone, Debug)]
pub struct PageSummary {
    pub id: u64,
    pub title: String,
}

/// Remote operations the pipeline depends on; [`WpClient`] is the live
/// implementation, tests substitute their own.
pub trait ContentBackend {
    fn upload_media(
        &self,
        bytes: &[u8],
        file_name: &str,
        alt_text: &str,
    ) -> QuotepressResult<MediaUpload>;
    fn get_content(&self, page_id: &str) -> QuotepressResult<String>;
    fn update_content(&self, page_id: &str, html: &str) -> QuotepressResult<()>;
}

pub struct WpClient {
    site_url: String,
    username: String,
    app_password: String,
    http: Client,
}

#[derive(serde::Deserialize)]
struct Rendered {
    rendered: String,
}

#[derive(serde::Deserialize)]
struct MediaResponse {
    id: u64,
    guid: Rendered,
}

#[derive(serde::Deserialize)]
struct PageResponse {
    id: u64,
    title: Rendered,
}

#[derive(serde::Deserialize)]
struct PageContentResponse {
    content: Rendered,
}

impl WpClient {
    pub fn new(creds: &SiteCredentials) -> Self {
        Self {
            site_url: creds.site_url.trim_end_matches('/').to_string(),
            username: creds.username.clone(),
            app_password: creds.app_password.clone(),
            http: Client::new(),
        }
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// List page titles and ids, for picking a distribution target.
    pub fn list_pages(&self) -> QuotepressResult<Vec<PageSummary>> {
        let url = format!("{}{}", self.site_url, PAGES_ROUTE);
        let res = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .with_context(|| format!("GET {url}"))?;
        if !res.status().is_success() {
            return Err(QuotepressError::api(format!(
                "list pages failed with status {}",
                res.status()
            )));
        }
        let pages: Vec<PageResponse> = res.json().context("parse pages response")?;
        Ok(pages
            .into_iter()
            .map(|p| PageSummary {
                id: p.id,
                title: p.title.rendered,
            })
            .collect())
    }
}

impl ContentBackend for WpClient {
    fn upload_media(
        &self,
        bytes: &[u8],
        file_name: &str,
        alt_text: &str,
    ) -> QuotepressResult<MediaUpload> {
        let url = format!("{}{}", self.site_url, MEDIA_ROUTE);
        let res = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.app_password))
            .header(CONTENT_TYPE, "image/png")
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            )
            .body(bytes.to_vec())
            .send()
            .with_context(|| format!("POST {url}"))?;

        if res.status().as_u16() != 201 {
            return Err(QuotepressError::api(format!(
                "media upload of '{}' failed with status {}",
                file_name,
                res.status()
            )));
        }
        let media: MediaResponse = res.json().context("parse media response")?;

        // Alt text and caption are set in a follow-up update; a failure here
        // is not fatal to the upload itself.
        let meta_url = format!("{url}/{}", media.id);
        let meta = self
            .http
            .post(&meta_url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&serde_json::json!({ "alt_text": alt_text, "caption": alt_text }))
            .send();
        if let Err(e) = meta {
            tracing::warn!(media_id = media.id, error = %e, "setting alt text failed");
        }

        Ok(MediaUpload {
            id: media.id,
            link: relative_media_link(&media.guid.rendered),
        })
    }

    fn get_content(&self, page_id: &str) -> QuotepressResult<String> {
        let url = format!("{}{}/{}", self.site_url, PAGES_ROUTE, page_id);
        let res = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .with_context(|| format!("GET {url}"))?;
        if !res.status().is_success() {
            return Err(QuotepressError::api(format!(
                "fetch of page {} failed with status {}",
                page_id,
                res.status()
            )));
        }
        let page: PageContentResponse = res.json().context("parse page response")?;
        Ok(page.content.rendered)
    }

    fn update_content(&self, page_id: &str, html: &str) -> QuotepressResult<()> {
        let url = format!("{}{}/{}", self.site_url, PAGES_ROUTE, page_id);
        let res = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&serde_json::json!({ "content": html }))
            .send()
            .with_context(|| format!("POST {url}"))?;
        if !res.status().is_success() {
            return Err(QuotepressError::api(format!(
                "update of page {} failed with status {}",
                page_id,
                res.status()
            )));
        }
        Ok(())
    }
}

/// Strip the site origin from an uploaded media URL, keeping the
/// `/wp-content/...` path so page markup survives a domain change.
pub fn relative_media_link(link: &str) -> String {
    match link.split_once("wp-content") {
        Some((_, rest)) => format!("/wp-content{rest}"),
        None => link.to_string(),
    }
}
