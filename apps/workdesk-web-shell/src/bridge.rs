//! Browser-independent pieces of the JS bridge: link interception and filter
//! patch decoding. Kept outside the wasm module so they run under native tests.

use serde::Deserialize;
use workdesk_shell_core::{FilterPatch, Location, WorkspaceRegistry};

/// Root-relative `path?query` for an anchor href on our origin.
pub fn same_origin_path(href: &str, origin: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let relative = match href.strip_prefix(origin).filter(|_| !origin.is_empty()) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => rest,
        Some(_) => return None,
        None if href.starts_with('/') && !href.starts_with("//") => href,
        None => return None,
    };
    let without_fragment = relative.split('#').next().unwrap_or_default();
    if without_fragment.starts_with('/') {
        Some(without_fragment.to_string())
    } else {
        Some(format!("/{without_fragment}"))
    }
}

/// Location to navigate to in-app, or `None` when the browser should follow
/// the link itself.
pub fn routable_location(href: &str, origin: &str, registry: &WorkspaceRegistry) -> Option<Location> {
    let location = Location::parse(&same_origin_path(href, origin)?);
    registry.match_path(&location.path)?;
    Some(location)
}

/// Filter edits as sent from JS:
/// `{"set":[["status","open"]],"toggle":[["src",["email"]]],"reset":["range"]}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchRequest {
    set: Vec<(String, String)>,
    set_many: Vec<(String, Vec<String>)>,
    toggle: Vec<(String, Vec<String>)>,
    reset: Vec<String>,
}

impl PatchRequest {
    pub fn into_patch(self) -> FilterPatch {
        let mut patch = FilterPatch::new();
        for (key, value) in self.set {
            patch = patch.set(key, value);
        }
        for (key, values) in self.set_many {
            patch = patch.set_many(key, values);
        }
        for (key, values) in self.toggle {
            for value in values {
                patch = patch.toggle(key.clone(), value);
            }
        }
        for key in self.reset {
            patch = patch.reset(key);
        }
        patch
    }
}

pub fn parse_patch(raw: &str) -> Result<FilterPatch, serde_json::Error> {
    let request: PatchRequest = serde_json::from_str(raw)?;
    Ok(request.into_patch())
}

#[cfg(test)]
mod tests {
    use super::*;
    use workdesk_shell_core::FieldUpdate;

    const ORIGIN: &str = "https://desk.example.com";

    #[test]
    fn same_origin_links_become_root_relative() {
        assert_eq!(
            same_origin_path("https://desk.example.com/inbox?range=today#top", ORIGIN),
            Some("/inbox?range=today".to_string())
        );
        assert_eq!(
            same_origin_path("https://desk.example.com", ORIGIN),
            Some("/".to_string())
        );
        assert_eq!(same_origin_path("/customers", ORIGIN), Some("/customers".to_string()));
        assert_eq!(same_origin_path("https://elsewhere.example.com/inbox", ORIGIN), None);
        assert_eq!(same_origin_path("//cdn.example.com/app.js", ORIGIN), None);
        assert_eq!(same_origin_path("#section", ORIGIN), None);
        assert_eq!(
            same_origin_path("https://desk.example.com.evil.test/inbox", ORIGIN),
            None
        );
    }

    #[test]
    fn only_workspace_routes_are_intercepted() {
        let registry = WorkspaceRegistry::builtin();
        let location = routable_location("/actions?cat=review", ORIGIN, &registry)
            .expect("actions is a workspace route");
        assert_eq!(location.path, "/actions");
        assert_eq!(location.query.get("cat"), Some("review"));
        assert!(routable_location("/help/faq", ORIGIN, &registry).is_none());
    }

    #[test]
    fn patch_json_decodes_every_operation() {
        let patch = parse_patch(
            r#"{"set":[["status","open"]],"set_many":[["src",["email","chat"]]],"toggle":[["src",["sms"]]],"reset":["range"]}"#,
        )
        .expect("valid patch");
        let updates = patch.updates().collect::<Vec<_>>();
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0], ("status", &FieldUpdate::Set("open".to_string())));
        assert_eq!(updates[2], ("src", &FieldUpdate::Toggle("sms".to_string())));
        assert_eq!(updates[3], ("range", &FieldUpdate::Reset));
    }

    #[test]
    fn malformed_patch_is_rejected() {
        assert!(parse_patch(r#"{"bogus":true}"#).is_err());
        assert!(parse_patch("not json").is_err());
        assert!(parse_patch("{}").expect("empty patch").is_empty());
    }
}
