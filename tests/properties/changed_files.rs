use std::{collections::BTreeSet, path::PathBuf};

use proptest::prelude::*;

use gitdeploy::adapter::fs::ChangedFiles;

fn segment() -> impl Strategy<Value = String> {
    // No leading dot, so `.` and `..` never show up as components.
    proptest::string::string_regex("[A-Za-z0-9_-][A-Za-z0-9._ -]{0,15}").unwrap()
}

fn relative_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..=4).prop_map(|segments| segments.join("/"))
}

fn absolute_root() -> impl Strategy<Value = PathBuf> {
    proptest::collection::vec(segment(), 0..=3)
        .prop_map(|segments| PathBuf::from(format!("/{}", segments.join("/"))))
}

/// A diff listing with blank lines before entries and mixed line endings.
fn noisy_diff_output() -> impl Strategy<Value = (Vec<String>, String)> {
    proptest::collection::vec((relative_path(), 0..3usize, any::<bool>()), 0..24).prop_map(
        |entries| {
            let mut raw = String::new();
            for (path, blank_lines, crlf) in &entries {
                let ending = if *crlf { "\r\n" } else { "\n" };
                for _ in 0..*blank_lines {
                    raw.push_str(ending);
                }
                raw.push_str(path);
                raw.push_str(ending);
            }

            let paths = entries.into_iter().map(|(path, _, _)| path).collect();
            (paths, raw)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the list is strictly ascending, has no empty entries and
    /// holds exactly the listed paths.
    #[test]
    fn property_diff_output_is_sorted_and_clean(
        (paths, raw) in noisy_diff_output()
    ) {
        let files = ChangedFiles::from_diff_output(&raw);
        let listed: Vec<&str> = files.iter().collect();

        prop_assert!(listed.iter().all(|path| !path.is_empty()));
        prop_assert!(listed.windows(2).all(|pair| pair[0] < pair[1]));

        let expected: BTreeSet<&str> = paths.iter().map(String::as_str).collect();
        prop_assert_eq!(listed, expected.into_iter().collect::<Vec<_>>());
    }

    /// PROPERTY: the same holds for NUL-terminated output with stray
    /// empty entries.
    #[test]
    fn property_nul_separated_output_is_sorted_and_clean(
        paths in proptest::collection::vec(relative_path(), 0..24),
        empty_entries in 0..4usize,
    ) {
        let mut raw = "\0".repeat(empty_entries);
        for path in &paths {
            raw.push_str(path);
            raw.push('\0');
        }

        let files = ChangedFiles::from_nul_separated(&raw);
        let listed: Vec<&str> = files.iter().collect();

        prop_assert!(listed.iter().all(|path| !path.is_empty()));
        prop_assert!(listed.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(listed.len(), paths.iter().collect::<BTreeSet<_>>().len());
    }

    /// PROPERTY: every upload lands at the remote root joined with the
    /// file's path relative to the local root.
    #[test]
    fn property_remote_path_mirrors_local_path(
        paths in proptest::collection::vec(relative_path(), 0..16),
        local_root in absolute_root(),
        remote_root in absolute_root(),
    ) {
        let files: ChangedFiles = paths.iter().map(String::as_str).collect();
        let pairs = files.transfer_pairs(&local_root, &remote_root);

        prop_assert_eq!(pairs.len(), files.len());
        for pair in &pairs {
            let local_relative = pair.local_source.strip_prefix(&local_root).unwrap();
            let remote_relative = pair.remote_dest.strip_prefix(&remote_root).unwrap();

            prop_assert_eq!(local_relative, remote_relative);
            prop_assert_eq!(&pair.remote_dest, &remote_root.join(&pair.path_name));
        }
    }
}
