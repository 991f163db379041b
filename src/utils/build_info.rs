//! Version banner assembled from values stamped in by `build.rs`.

const COMMIT: Option<&str> = option_env!("SUBTRACK_COMMIT");
const BUILD_DATE: Option<&str> = option_env!("SUBTRACK_BUILD_DATE");

/// `SubTrack 0.1.0 (3f2a9c1, built 2024-06-01)`; the parenthesised part is
/// omitted when the build carried no stamp.
pub fn version_line() -> String {
    banner(env!("CARGO_PKG_VERSION"), COMMIT, BUILD_DATE)
}

fn banner(version: &str, commit: Option<&str>, built_on: Option<&str>) -> String {
    let details: Vec<String> = [
        commit.filter(|c| !c.is_empty() && *c != "unknown").map(str::to_string),
        built_on.filter(|d| !d.is_empty()).map(|d| format!("built {d}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if details.is_empty() {
        format!("SubTrack {version}")
    } else {
        format!("SubTrack {version} ({})", details.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_includes_only_known_stamps() {
        assert_eq!(
            banner("0.1.0", Some("3f2a9c1+dirty"), Some("2024-06-01")),
            "SubTrack 0.1.0 (3f2a9c1+dirty, built 2024-06-01)"
        );
        assert_eq!(
            banner("0.1.0", Some("unknown"), Some("2024-06-01")),
            "SubTrack 0.1.0 (built 2024-06-01)"
        );
        assert_eq!(banner("0.1.0", None, None), "SubTrack 0.1.0");
    }

    #[test]
    fn version_line_names_the_package_version() {
        assert!(version_line().starts_with(&format!("SubTrack {}", env!("CARGO_PKG_VERSION"))));
    }
}
