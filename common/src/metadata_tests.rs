//! Unit tests for descriptor parsing and validation.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

fn descriptor(id: &str, version: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<addon id=\"{}\" version=\"{}\" name=\"Demo\" provider-name=\"tests\">\n",
            "  <extension point=\"xbmc.addon.metadata\"/>\n",
            "</addon>\n"
        ),
        id, version
    )
}

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

#[rstest]
#[case::plugin("plugin.video.demo")]
#[case::digits("script.module.six2")]
#[case::underscore_and_dash("repository.my_repo-1")]
#[case::single_char("a")]
#[case::leading_dot(".hidden")]
fn accepts_valid_ids(#[case] id: &str) {
    let metadata = parse_descriptor(&descriptor(id, "1.0.0")).expect("valid id");
    assert_eq!(metadata.id.as_str(), id);
}

#[rstest]
#[case::uppercase("Plugin.Video")]
#[case::space("plugin video")]
#[case::slash("plugin/video")]
#[case::non_ascii("plugin.vidéo")]
#[case::empty("")]
#[case::dot(".")]
#[case::dot_dot("..")]
fn rejects_invalid_ids(#[case] id: &str) {
    let err = parse_descriptor(&descriptor(id, "1.0.0")).expect_err("invalid id");
    assert!(
        matches!(err, ValidationError::InvalidId { ref value, .. } if value == id),
        "expected InvalidId, got {err:?}"
    );
}

#[rstest]
#[case::plain("1.2.3")]
#[case::tilde_suffix("1.2.3~beta1")]
#[case::plus_suffix("19.0.1+matrix.1")]
#[case::four_groups("1.2.3.4")]
#[case::multi_digit("10.20.300")]
fn accepts_versions_with_semver_prefix(#[case] version: &str) {
    let metadata = parse_descriptor(&descriptor("plugin.x", version)).expect("valid version");
    assert_eq!(metadata.version.as_str(), version);
}

#[rstest]
#[case::two_groups("1.2")]
#[case::letter_patch("1.2.x")]
#[case::empty("")]
#[case::prefixed("v1.2.3")]
#[case::trailing_dot("1.2.")]
#[case::dash_separated("1-2-3")]
fn rejects_versions_without_semver_prefix(#[case] version: &str) {
    let err = parse_descriptor(&descriptor("plugin.x", version)).expect_err("invalid version");
    assert!(
        matches!(err, ValidationError::InvalidVersion { .. }),
        "expected InvalidVersion, got {err:?}"
    );
}

#[test]
fn missing_id_is_reported() {
    let err = parse_descriptor(r#"<addon version="1.0.0"/>"#).expect_err("missing id");
    assert_eq!(err, ValidationError::MissingId);
}

#[test]
fn missing_version_is_reported() {
    let err = parse_descriptor(r#"<addon id="plugin.x"/>"#).expect_err("missing version");
    assert_eq!(err, ValidationError::MissingVersion);
}

#[test]
fn id_is_checked_before_version() {
    let err = parse_descriptor("<addon/>").expect_err("both missing");
    assert_eq!(err, ValidationError::MissingId);
}

#[test]
fn malformed_xml_is_reported() {
    let err = parse_descriptor("<addon id=\"x\"").expect_err("malformed");
    assert!(matches!(err, ValidationError::MalformedDescriptor { .. }));
}

#[test]
fn descriptor_keeps_root_element_verbatim() {
    let text = descriptor("plugin.x", "2.0.0");
    let metadata = parse_descriptor(&text).expect("valid descriptor");
    let root = metadata.descriptor.as_str();
    assert!(root.starts_with("<addon id=\"plugin.x\""));
    assert!(root.ends_with("</addon>"));
    assert!(root.contains("  <extension point=\"xbmc.addon.metadata\"/>"));
    assert!(!root.contains("<?xml"));
}

#[test]
fn byte_order_mark_is_ignored() {
    let text = format!("\u{feff}{}", descriptor("plugin.bom", "1.0.0"));
    let metadata = parse_descriptor(&text).expect("BOM tolerated");
    assert_eq!(metadata.id.as_str(), "plugin.bom");
}

#[rstest]
fn read_metadata_reads_descriptor_file(temp_dir: TempDir) {
    let root = Utf8Path::from_path(temp_dir.path()).expect("utf-8 temp dir");
    fs::write(root.join(DESCRIPTOR_FILE_NAME), descriptor("plugin.file", "3.1.4"))
        .expect("write descriptor");

    let metadata = read_metadata(root).expect("descriptor read");
    assert_eq!(metadata.id.as_str(), "plugin.file");
    assert_eq!(metadata.version.as_str(), "3.1.4");
}

#[rstest]
fn read_metadata_reports_missing_file(temp_dir: TempDir) {
    let root = Utf8Path::from_path(temp_dir.path()).expect("utf-8 temp dir");
    let err = read_metadata(root).expect_err("no descriptor");
    assert!(matches!(err, ValidationError::DescriptorUnreadable { ref path, .. }
        if path.ends_with(DESCRIPTOR_FILE_NAME)));
}
