//! Property-based tests for the path algebra.
//!
//! These tests use proptest to generate random absolute paths made of plain
//! names, `.` and `..`, and check the invariants the rewriter relies on.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{classify, clean, is_under_any, manifest_token, relative, Containment};
    use proptest::prelude::*;
    use std::path::{Component, Path, PathBuf};

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,5}"
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            6 => name(),
            1 => Just(".".to_string()),
            2 => Just("..".to_string()),
        ]
    }

    fn absolute_path(segments: impl Strategy<Value = String>) -> impl Strategy<Value = PathBuf> {
        prop::collection::vec(segments, 0..8).prop_map(|parts| {
            let mut path = PathBuf::from("/");
            for part in parts {
                path.push(part);
            }
            path
        })
    }

    fn plain_relative() -> impl Strategy<Value = PathBuf> {
        prop::collection::vec(name(), 1..6).prop_map(|parts| parts.iter().collect())
    }

    // ============================================================================
    // clean
    // ============================================================================

    proptest! {
        /// Property: clean is idempotent
        #[test]
        fn clean_is_idempotent(path in absolute_path(segment())) {
            let once = clean(&path);
            prop_assert_eq!(clean(&once), once);
        }

        /// Property: a cleaned absolute path has no `.` or `..` components
        #[test]
        fn clean_absolute_has_no_dot_components(path in absolute_path(segment())) {
            let cleaned = clean(&path);
            prop_assert!(cleaned.is_absolute());
            prop_assert!(cleaned
                .components()
                .all(|c| !matches!(c, Component::CurDir | Component::ParentDir)));
        }
    }

    // ============================================================================
    // relative
    // ============================================================================

    proptest! {
        /// Property: joining base with relative(base, target) lands on target
        #[test]
        fn relative_round_trips(
            base in absolute_path(segment()),
            target in absolute_path(segment()),
        ) {
            let rel = relative(&base, &target).unwrap();
            prop_assert_eq!(clean(&clean(&base).join(rel)), clean(&target));
        }

        /// Property: relative of a path to itself is `.`
        #[test]
        fn relative_to_self_is_dot(path in absolute_path(segment())) {
            prop_assert_eq!(relative(&path, &path).unwrap(), PathBuf::from("."));
        }
    }

    // ============================================================================
    // classify / is_under_any
    // ============================================================================

    proptest! {
        /// Property: the root and anything below it are internal
        #[test]
        fn descendants_are_internal(
            root in absolute_path(name()),
            child in prop::collection::vec(name(), 0..5),
        ) {
            let mut candidate = root.clone();
            for part in &child {
                candidate.push(part);
            }
            prop_assert_eq!(classify(&candidate, &root).unwrap(), Containment::Internal);
            prop_assert!(is_under_any(&candidate, &vec![root]));
        }

        /// Property: a sibling sharing the root's name as a prefix is external
        #[test]
        fn prefixed_siblings_are_external(
            parent in absolute_path(name()),
            last in name(),
            suffix in name(),
        ) {
            let root = parent.join(&last);
            let sibling = parent.join(format!("{}{}", last, suffix));
            prop_assert_eq!(classify(&sibling, &root).unwrap(), Containment::External);
            prop_assert!(!is_under_any(&sibling, &vec![root]));
        }

        /// Property: classification is deterministic
        #[test]
        fn classify_is_idempotent(
            candidate in absolute_path(segment()),
            root in absolute_path(segment()),
        ) {
            let first = classify(&candidate, &root).unwrap();
            let second = classify(&candidate, &root).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: escaping the root with `..` is external
        #[test]
        fn parent_escape_is_external(root in absolute_path(name()), other in name()) {
            prop_assume!(root.parent().is_some());
            let root_name = root.file_name().unwrap().to_string_lossy().to_string();
            prop_assume!(root_name != other);
            let candidate = root.join("..").join(&other);
            prop_assert_eq!(classify(&candidate, &root).unwrap(), Containment::External);
        }
    }

    // ============================================================================
    // manifest_token
    // ============================================================================

    proptest! {
        /// Property: a plain relative path renders as `./`-prefixed and resolves back
        #[test]
        fn manifest_token_is_dot_prefixed(rel in plain_relative()) {
            let token = manifest_token(&rel);
            prop_assert!(token.starts_with("./"));
            prop_assert_eq!(clean(Path::new(&token)), rel);
        }

        /// Property: parent-relative paths are rendered unchanged
        #[test]
        fn manifest_token_keeps_parent_prefix(rel in plain_relative()) {
            let up = Path::new("..").join(&rel);
            let token = manifest_token(&up);
            prop_assert!(token.starts_with("../"));
            prop_assert_eq!(PathBuf::from(token), up);
        }
    }
}
