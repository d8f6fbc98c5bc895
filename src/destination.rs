use url::Url;

use crate::error::UploadError;

/// Where an upload lands: the site-collection root plus the server-relative
/// folder path, derived once from the folder URL and immutable for the
/// lifetime of one upload call.
///
/// The input URL's path is expected to look like
/// `/{siteSlug}/{site}/{...folderSegments}`, e.g.
/// `https://company.sharepoint.com/sites/mysite/Shared Documents/Reports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    site_slug: String,
    site: String,
    folder: String,
    root_url: String,
}

impl Destination {
    /// Parse a folder URL into a destination. Pure, no network.
    pub fn resolve(url: &str) -> Result<Self, UploadError> {
        let parsed = Url::parse(url).map_err(|_| UploadError::InvalidDestination {
            url: url.to_string(),
        })?;

        let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(UploadError::InvalidDestination {
                url: url.to_string(),
            });
        }

        let site_slug = segments[0].to_string();
        let site = segments[1].to_string();
        let folder = format!("/{}", segments.join("/"));
        let origin = parsed.origin().ascii_serialization();
        let root_url = format!("{}/{}/{}", origin, site_slug, site);

        Ok(Destination {
            site_slug,
            site,
            folder,
            root_url,
        })
    }

    /// Replace the relative folder below `/{siteSlug}/{site}`, keeping the
    /// site itself fixed. Used for the per-call folder override.
    pub fn with_folder(&self, relative_folder: &str) -> Self {
        let trimmed = relative_folder.trim_matches('/');
        let folder = if trimmed.is_empty() {
            format!("/{}/{}", self.site_slug, self.site)
        } else {
            format!("/{}/{}/{}", self.site_slug, self.site, trimmed)
        };
        Destination {
            folder,
            ..self.clone()
        }
    }

    pub fn site_slug(&self) -> &str {
        &self.site_slug
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Server-relative folder path, always `/{siteSlug}/{site}{relative}`.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Absolute URL of the site root, `{origin}/{siteSlug}/{site}`.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }
}
