//! Naming grammar and path model tests

use remote_storage::StoragePath;
use remote_storage::validation::{
    ValidationError, is_valid_container_name, is_valid_resource_name, validate_container_name,
    validate_resource_name,
};

fn resource(raw: &str) -> bool {
    is_valid_resource_name(&StoragePath::parse(raw))
}

mod path_model_tests {
    use super::*;

    #[test]
    fn test_normalization_idempotent() {
        let inputs = [
            "",
            "/",
            "//",
            "a",
            "a/",
            "a//b",
            "/a/b/c/",
            "a/./b/../c",
            "  spaced / name ",
            "trailing//",
        ];
        for raw in inputs {
            let parsed = StoragePath::parse(raw);
            assert_eq!(
                StoragePath::parse(&parsed.to_string()),
                parsed,
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_folder_path() {
        let path = StoragePath::parse("folder/");
        assert!(path.is_folder());
        assert_eq!(path.name(), "folder");
        assert!(resource("folder/"));
    }

    #[test]
    fn test_empty_name_is_root() {
        let path = StoragePath::parse_opt(None);
        assert!(path.is_folder());
        assert!(path.is_root());
        assert_eq!(StoragePath::parse(""), path);
    }
}

mod container_name_tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_container_name("abc"));
        assert!(is_valid_container_name("123"));
        assert!(is_valid_container_name("my-share-01"));
        assert!(is_valid_container_name("MyShare"));
        assert!(is_valid_container_name(&"a".repeat(63)));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_container_name(""));
        assert!(!is_valid_container_name("   "));
        assert!(!is_valid_container_name("ab"));
        assert!(!is_valid_container_name(&"a".repeat(64)));
        assert!(!is_valid_container_name("-abc"));
        assert!(!is_valid_container_name("abc-"));
        assert!(!is_valid_container_name("ab--c"));
        assert!(!is_valid_container_name("ab.c"));
        assert!(!is_valid_container_name("ab c"));
        assert!(!is_valid_container_name("abç"));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            validate_container_name(&"a".repeat(64)),
            Err(ValidationError::Length {
                actual: 64,
                max: 63,
                ..
            })
        ));
        assert!(matches!(
            validate_container_name("a--b"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }
}

mod resource_name_tests {
    use super::*;

    #[test]
    fn test_numbered_devices_reserved() {
        for digit in 1..=9 {
            assert!(!resource(&format!("LPT{digit}")));
            assert!(!resource(&format!("com{digit}")));
            assert!(!resource(&format!("dir/Lpt{digit}")));
        }
    }

    #[test]
    fn test_device_lookalikes_allowed() {
        for name in [
            "LPT0", "LPT10", "COM0", "COM10", "COMB", "CONE", "PRNT", "FAUX", "CLOCK",
        ] {
            assert!(resource(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_exact_devices_reserved() {
        for name in ["PRN", "AUX", "NUL", "CON", "CLOCK$", "clock$", "nul"] {
            assert!(
                matches!(
                    validate_resource_name(&StoragePath::parse(name)),
                    Err(ValidationError::Reserved { .. })
                ),
                "{name} should be reserved"
            );
        }
    }

    #[test]
    fn test_dots() {
        assert!(!resource("."));
        assert!(!resource(".."));
        assert!(!resource("file."));
        assert!(!resource("file.."));
        assert!(!resource("file..."));
        assert!(!resource("dir./"));
        assert!(resource("file"));
        assert!(resource("file.txt"));
    }

    #[test]
    fn test_reserved_characters() {
        for c in ['"', '\\', ':', '|', '<', '>', '*', '?'] {
            assert!(!resource(&format!("na{c}me")), "{c:?} should be rejected");
        }
    }

    #[test]
    fn test_control_characters() {
        assert!(!resource("bad\u{0}name"));
        assert!(!resource("bad\u{1f}name"));
        assert!(!resource("bad\u{7f}name"));
        assert!(!resource("bad\tname"));
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(!resource("Xสีน้ำเงิน"));
        assert!(!resource("café"));
        assert!(!resource("名前"));
    }

    #[test]
    fn test_length_limit() {
        assert!(resource(&"a".repeat(255)));
        assert!(!resource(&"a".repeat(256)));
    }

    #[test]
    fn test_blank_leaf() {
        assert!(!resource("   "));
        assert!(!resource("dir/ "));
        assert!(!is_valid_resource_name(&StoragePath::root()));
    }
}
