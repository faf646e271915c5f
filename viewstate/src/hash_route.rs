//! Path-to-hash redirect for static hosting.
//!
//! Static hosts serve `index.html` only at known paths, while the router reads
//! the route from the fragment. A deep link like `/Site/gallery` is rewritten
//! to `/Site/#/gallery` before the app mounts.

#[cfg(test)]
#[path = "hash_route_test.rs"]
mod hash_route_test;

/// The parts of `window.location` the redirect looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    pub origin: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
    pub href: String,
}

/// URL to replace the current one with, if any.
///
/// Only applies while the fragment is empty. A path under one of `bases`
/// keeps its base and moves the remainder into the fragment; any other
/// non-root path moves wholesale into the fragment at the origin root.
#[must_use]
pub fn hash_redirect(location: &PageLocation, bases: &[&str]) -> Option<String> {
    if !(location.hash.is_empty() || location.hash == "#") {
        return None;
    }

    let PageLocation { origin, pathname, search, .. } = location;
    let target = if let Some(base) = bases.iter().find(|base| pathname.starts_with(**base)) {
        let rest = &pathname[base.len()..];
        let sub = if rest.is_empty() { "/" } else { rest };
        format!("{origin}{base}/#{sub}{search}")
    } else if pathname.is_empty() || pathname == "/" {
        return None;
    } else {
        format!("{origin}/#{pathname}{search}")
    };

    if target == location.href { None } else { Some(target) }
}
