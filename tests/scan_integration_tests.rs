//! Integration tests exercising the Compiler Prober through the
//! Directory Scanner and Kit Aggregator (§8 scenarios 1 and 2, plus the
//! aggregator's ordering contract).

use kitprobe::aggregator::{scan, ScanOptions};
use kitprobe::paths::Host;

fn write_executable(path: &std::path::Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[tokio::test]
async fn scenario_1_path_with_only_gcc_yields_one_kit_with_cxx_sibling() {
    let dir = tempfile::tempdir().unwrap();
    write_executable(
        &dir.path().join("gcc-9"),
        "#!/bin/sh\necho 'gcc version 9.4.0 (Ubuntu 9.4.0-1ubuntu1~20.04.1) ' 1>&2\n",
    );
    write_executable(&dir.path().join("g++-9"), "#!/bin/sh\nexit 0\n");

    let opts = ScanOptions {
        host: Host::Unix,
        path_entries: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let kits = scan(&opts).await;

    assert_eq!(kits.len(), 1);
    assert_eq!(kits[0].name(), "GCC 9.4.0");
    let compilers = kits[0].compilers().unwrap();
    assert_eq!(compilers.get("C"), Some(&dir.path().join("gcc-9")));
    assert_eq!(compilers.get("CXX"), Some(&dir.path().join("g++-9")));
}

#[tokio::test]
async fn scenario_2_clang_targeting_msvc_is_not_emitted() {
    let dir = tempfile::tempdir().unwrap();
    write_executable(
        &dir.path().join("clang"),
        "#!/bin/sh\necho 'clang version 14.0.0' 1>&2\necho 'Target: x86_64-pc-windows-msvc' 1>&2\n",
    );

    let opts = ScanOptions {
        host: Host::Unix,
        path_entries: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let kits = scan(&opts).await;

    assert!(kits.is_empty());
}

#[tokio::test]
async fn aggregator_concatenates_scan_dirs_in_order() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    write_executable(
        &dir_a.path().join("gcc"),
        "#!/bin/sh\necho 'gcc version 9.4.0 (Ubuntu) ' 1>&2\n",
    );
    write_executable(
        &dir_b.path().join("clang"),
        "#!/bin/sh\necho 'clang version 14.0.0' 1>&2\n",
    );

    let opts = ScanOptions {
        host: Host::Unix,
        path_entries: vec![dir_a.path().to_path_buf(), dir_b.path().to_path_buf()],
        ..Default::default()
    };
    let kits = scan(&opts).await;

    assert_eq!(kits.len(), 2);
    assert_eq!(kits[0].name(), "GCC 9.4.0");
    assert_eq!(kits[1].name(), "Clang 14.0.0");
}

#[tokio::test]
async fn repeated_scans_of_unchanged_filesystem_are_equal_as_sets() {
    let dir = tempfile::tempdir().unwrap();
    write_executable(
        &dir.path().join("gcc"),
        "#!/bin/sh\necho 'gcc version 9.4.0 (Ubuntu) ' 1>&2\n",
    );
    let opts = ScanOptions {
        host: Host::Unix,
        path_entries: vec![dir.path().to_path_buf()],
        ..Default::default()
    };

    let first = scan(&opts).await;
    let second = scan(&opts).await;

    let first_names: std::collections::BTreeSet<_> = first.iter().map(|k| k.name()).collect();
    let second_names: std::collections::BTreeSet<_> = second.iter().map(|k| k.name()).collect();
    assert_eq!(first_names, second_names);
}
