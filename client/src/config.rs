//! Build-time site configuration.
//!
//! SYSTEM CONTEXT
//! ==============
//! The site is a static bundle, so there is no runtime config source. Values
//! are baked in at compile time from environment variables and fall back to
//! the defaults below when unset or unparsable.
//!
//! | Variable                    | Meaning                                   |
//! |-----------------------------|-------------------------------------------|
//! | `PORTFOLIO_SITE_BASES`      | Comma-separated hosting base paths        |
//! | `PORTFOLIO_LOG_LEVEL`       | `error`, `warn`, `info`, `debug`, `trace` |
//! | `PORTFOLIO_GALLERY_IMAGES`  | Comma-separated image URLs for the grid   |

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Base path the site is published under when nothing else is configured.
pub const DEFAULT_SITE_BASE: &str = "/Sunika-Online-Portfolio";

pub const DEFAULT_LOG_LEVEL: log::Level = log::Level::Info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Hosting base paths, each with a leading `/` and no trailing `/`.
    pub site_bases: Vec<String>,
    pub log_level: log::Level,
    /// Image URLs shown in the media grid, in order.
    pub gallery_images: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_bases: vec![DEFAULT_SITE_BASE.to_owned()],
            log_level: DEFAULT_LOG_LEVEL,
            gallery_images: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Values captured from the build environment.
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("PORTFOLIO_SITE_BASES"),
            option_env!("PORTFOLIO_LOG_LEVEL"),
            option_env!("PORTFOLIO_GALLERY_IMAGES"),
        )
    }

    pub fn from_values(site_bases: Option<&str>, log_level: Option<&str>, gallery_images: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            site_bases: site_bases.map_or(defaults.site_bases, parse_bases),
            log_level: log_level.map_or(defaults.log_level, parse_level),
            gallery_images: gallery_images.map_or(defaults.gallery_images, parse_list),
        }
    }

    /// Borrowed view for [`viewstate::hash_route::hash_redirect`].
    pub fn bases(&self) -> Vec<&str> {
        self.site_bases.iter().map(String::as_str).collect()
    }
}

fn parse_bases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|base| base.trim().trim_end_matches('/'))
        .filter(|base| !base.is_empty())
        .map(|base| if base.starts_with('/') { base.to_owned() } else { format!("/{base}") })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty()).map(str::to_owned).collect()
}

fn parse_level(raw: &str) -> log::Level {
    match raw.trim().parse::<log::Level>() {
        Ok(level) => level,
        Err(_) => {
            log::warn!("unknown log level `{raw}`, using {DEFAULT_LOG_LEVEL}");
            DEFAULT_LOG_LEVEL
        }
    }
}
