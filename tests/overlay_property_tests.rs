mod common;

use common::{list_names, read_string, write_string, MemOverlay};
use cowfs::{Backend, OpenFlags, PathStatus};
use proptest::prelude::*;
use std::collections::BTreeSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn test_append_never_touches_primary(
        filename in "[a-zA-Z0-9 _-]{1,50}",
        original in "[a-z ]{0,64}",
        appended in "[a-z ]{1,64}",
    ) {
        let path = format!("/{}", filename);
        let overlay = MemOverlay::with_primary_files(&[(path.as_str(), original.as_str())]);

        write_string(&overlay.fs, &path, &appended, OpenFlags::WRITE_ONLY | OpenFlags::APPEND);

        prop_assert_eq!(read_string(&*overlay.primary, &path), original.clone());
        prop_assert_eq!(read_string(&overlay.fs, &path), format!("{}{}", original, appended));
        prop_assert_eq!(overlay.fs.status_of(&path), PathStatus::Modified);
    }

    #[test]
    fn test_listing_is_deduplicated_union(
        primary_names in prop::collection::btree_set("[a-z]{1,8}", 0..12),
        secondary_names in prop::collection::btree_set("[a-z]{1,8}", 0..12),
        removed in prop::collection::btree_set("[a-z]{1,8}", 0..6),
    ) {
        let overlay = MemOverlay::new();
        overlay.primary.mkdir("/dir", 0o755).unwrap();
        for name in &primary_names {
            overlay.primary.write_file(&format!("/dir/{}", name), b"p", 0o644).unwrap();
        }
        for name in &secondary_names {
            write_string(
                &overlay.fs,
                &format!("/dir/{}", name),
                "s",
                OpenFlags::WRITE_ONLY | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            );
        }
        for name in &removed {
            overlay.fs.remove(&format!("/dir/{}", name)).unwrap();
        }

        let mut expected: Vec<String> = primary_names
            .iter()
            .filter(|name| !removed.contains(*name))
            .cloned()
            .collect();
        expected.extend(
            secondary_names
                .iter()
                .filter(|name| !primary_names.contains(*name) && !removed.contains(*name))
                .cloned(),
        );

        let names = list_names(&overlay.fs, "/dir");
        let unique: BTreeSet<&String> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());
        prop_assert_eq!(names, expected);
    }
}
