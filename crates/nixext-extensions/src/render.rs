//! Nix expressions for single extensions

use nixext_core::types::{Browser, ExtensionDescriptor};

/// Escape a value for interpolation into a double-quoted Nix string
///
/// Backslash is replaced first so the escapes added afterwards are not doubled.
pub fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('[', "[[")
        .replace(']', "]]")
}

/// Render one processed extension as a Nix attribute set
pub fn render_entry(
    descriptor: &ExtensionDescriptor,
    url: &str,
    hash: &str,
    version: &str,
    permissions: &[String],
    browser: Browser,
) -> String {
    let id = escape(&descriptor.id);
    let url = escape(url);
    let hash = escape(hash);
    let version = escape(version);

    match browser {
        Browser::Chromium => render_chromium(&id, &url, &hash, &version),
        Browser::Firefox => render_firefox(&id, &url, &hash, &version, permissions),
    }
}

fn render_chromium(id: &str, url: &str, hash: &str, version: &str) -> String {
    format!(
        r#"  {{
    id = "{id}";
    crxPath = pkgs.fetchurl {{
      url = "{url}";
      name = "{id}.crx";
      hash = "{hash}";
    }};
    version = "{version}";
  }}"#
    )
}

fn render_firefox(id: &str, url: &str, hash: &str, version: &str, permissions: &[String]) -> String {
    let mut meta = String::from("      platforms = platforms.all;");

    if !permissions.is_empty() {
        meta.push_str("\n      mozPermissions = [");
        for permission in permissions {
            meta.push_str(&format!("\n        \"{}\"", escape(permission)));
        }
        meta.push_str("\n      ];");
    }

    format!(
        r#"{{
      pname = "{id}";
      version = "{version}";
      addonId = "{id}";
      url = "{url}";
      sha256 = "{hash}";
      meta = with lib; {{
{meta}
      }};
    }}"#
    )
}
