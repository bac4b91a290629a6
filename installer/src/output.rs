//! Output formatting for the tvm CLI.
//!
//! Everything written to stdout by the binary is built here so the wording
//! can be tested without running a command.

use crate::manager::Detected;
use camino::Utf8Path;
use tvm_version::Version;

/// Describe the outcome of `detect` or `install`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use tvm_installer::manager::Detected;
/// use tvm_installer::output::detected_message;
///
/// let detected = Detected {
///     version: "1.6.0".parse().expect("valid version"),
///     path: Utf8PathBuf::from("/root/.tvm/OpenTofu/1.6.0"),
///     installed: true,
/// };
/// assert_eq!(
///     detected_message("OpenTofu", &detected),
///     "OpenTofu 1.6.0 is installed at /root/.tvm/OpenTofu/1.6.0"
/// );
/// ```
#[must_use]
pub fn detected_message(tool: &str, detected: &Detected) -> String {
    if detected.installed {
        format!("{tool} {} is installed at {}", detected.version, detected.path)
    } else {
        format!(
            "{tool} {} is not installed (would be installed at {})",
            detected.version, detected.path
        )
    }
}

/// Describe a pinned-version file that was written.
#[must_use]
pub fn pinned_message(path: &Utf8Path) -> String {
    format!("Written version to {path}")
}

/// Describe the outcome of `uninstall`.
#[must_use]
pub fn uninstall_message(tool: &str, version: &str, removed: bool) -> String {
    if removed {
        format!("Uninstalled {tool} {version}")
    } else {
        format!("{tool} {version} is not installed")
    }
}

/// Describe the outcome of `reset`.
#[must_use]
pub fn reset_message(path: &Utf8Path, removed: bool) -> String {
    if removed {
        format!("Removed {path}")
    } else {
        format!("No pinned version at {path}")
    }
}

/// One version per line, or a note when there are none.
#[must_use]
pub fn version_list(tool: &str, versions: &[Version], remote: bool) -> String {
    if versions.is_empty() {
        return if remote {
            format!("No {tool} releases found")
        } else {
            format!("No {tool} versions installed")
        };
    }
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn detected(installed: bool) -> Detected {
        Detected {
            version: Version::new(1, 7, 2),
            path: Utf8PathBuf::from("/opt/tvm/OpenTofu/1.7.2"),
            installed,
        }
    }

    #[test]
    fn absent_version_mentions_target_path() {
        assert_eq!(
            detected_message("OpenTofu", &detected(false)),
            "OpenTofu 1.7.2 is not installed (would be installed at /opt/tvm/OpenTofu/1.7.2)"
        );
    }

    #[rstest]
    #[case::removed(true, "Uninstalled OpenTofu 1.6.0")]
    #[case::absent(false, "OpenTofu 1.6.0 is not installed")]
    fn uninstall_message_reflects_outcome(#[case] removed: bool, #[case] expected: &str) {
        assert_eq!(uninstall_message("OpenTofu", "1.6.0", removed), expected);
    }

    #[rstest]
    #[case::removed(true, "Removed /opt/tvm/.opentofu-version")]
    #[case::absent(false, "No pinned version at /opt/tvm/.opentofu-version")]
    fn reset_message_reflects_outcome(#[case] removed: bool, #[case] expected: &str) {
        let path = Utf8PathBuf::from("/opt/tvm/.opentofu-version");
        assert_eq!(reset_message(&path, removed), expected);
    }

    #[test]
    fn version_list_is_one_per_line() {
        let versions = [Version::new(1, 6, 0), Version::new(1, 10, 1)];
        assert_eq!(version_list("OpenTofu", &versions, false), "1.6.0\n1.10.1");
    }

    #[rstest]
    #[case::local(false, "No OpenTofu versions installed")]
    #[case::remote(true, "No OpenTofu releases found")]
    fn empty_version_list_says_so(#[case] remote: bool, #[case] expected: &str) {
        assert_eq!(version_list("OpenTofu", &[], remote), expected);
    }

    #[test]
    fn pinned_message_names_file() {
        let path = Utf8PathBuf::from("/work/.opentofu-version");
        assert_eq!(pinned_message(&path), "Written version to /work/.opentofu-version");
    }
}
