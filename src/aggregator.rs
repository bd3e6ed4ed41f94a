//! Kit Aggregator (§4.F): compose the Path Resolver, Compiler Prober,
//! Directory Scanner, and Vendor Kit Builder into one `scan()` entry
//! point producing kits with bounded, cooperative fan-out.

use std::collections::BTreeSet;
use std::path::PathBuf;

use futures::stream::{self, StreamExt};

use crate::constants::DEFAULT_SCAN_CONCURRENCY;
use crate::kit::Kit;
use crate::paths::Host;
use crate::scanner::scan_directory;
use crate::vendor::kit_builder::{build_clang_cl_kits, build_kits_for_installation};
use crate::vendor::VendorInstallation;
use crate::{compiler, paths};

/// Everything `scan()` needs that the spec treats as external input: the
/// host, the directories carrying candidate compiler binaries, the
/// enumerated vendor installations, and the precomputed clang-cl search
/// set (§4.E's `LLVM_ROOT\bin`, `%ProgramFiles%\LLVM\bin`, every `PATH`
/// entry, every installation's `VC\Tools\Llvm\bin`).
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub host: Host,
    /// Entries of `PATH`, in order, already split on the host separator.
    pub path_entries: Vec<PathBuf>,
    /// Config-provided `minGWSearchDirs` (§1's "user-provided search
    /// hints"); each has `/bin` appended and is scanned only on Windows.
    pub min_gw_search_dirs: Vec<PathBuf>,
    pub vendor_installations: Vec<VendorInstallation>,
    pub tmp_dir: PathBuf,
    pub bundled_ninja_dir: Option<PathBuf>,
    pub clang_cl_search_dirs: Vec<PathBuf>,
    /// Config override of the fixed architecture list the Vendor Kit
    /// Builder iterates (§4.E/§6); empty means "use the spec's fixed list".
    pub architectures: Vec<String>,
}

/// `scan(opts) -> [Kit]` (§4.F). Concatenates, in order: compiler kits
/// (in the dedup-set insertion order of the scan directories), then
/// vendor kits, then clang-cl kits. No deduplication beyond that — §4.G
/// handles merging against persisted state.
pub async fn scan(opts: &ScanOptions) -> Vec<Kit> {
    let mut scan_dirs: Vec<PathBuf> = Vec::new();
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    for dir in &opts.path_entries {
        if seen.insert(dir.clone()) {
            scan_dirs.push(dir.clone());
        }
    }
    if opts.host == Host::Windows {
        for dir in &opts.min_gw_search_dirs {
            let bin_dir = dir.join("bin");
            if seen.insert(bin_dir.clone()) {
                scan_dirs.push(bin_dir);
            }
        }
    }

    // `buffered` (not `buffer_unordered`): §5 fixes cross-directory order to
    // the insertion order of the scan-dir dedup set, so results must come
    // back in submission order even though each directory scan overlaps.
    let compiler_kits: Vec<Kit> = stream::iter(scan_dirs)
        .map(|dir| async move { scan_directory(&dir, |bin| async move { compiler::probe(&bin).await }).await })
        .buffered(DEFAULT_SCAN_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    let mut vendor_kits = Vec::new();
    let mut clang_cl_kits = Vec::new();
    if opts.host == Host::Windows {
        // Same ordering requirement as above: installations must stay in
        // the order the enumerator returned them.
        let per_install: Vec<Vec<Kit>> = stream::iter(&opts.vendor_installations)
            .map(|install| {
                build_kits_for_installation(
                    opts.host,
                    install,
                    &opts.tmp_dir,
                    opts.bundled_ninja_dir.as_deref(),
                    &opts.architectures,
                )
            })
            .buffered(DEFAULT_SCAN_CONCURRENCY)
            .collect()
            .await;
        vendor_kits = per_install.into_iter().flatten().collect();

        clang_cl_kits =
            build_clang_cl_kits(&opts.clang_cl_search_dirs, &opts.vendor_installations).await;
    }

    let mut all = compiler_kits;
    all.extend(vendor_kits);
    all.extend(clang_cl_kits);
    all
}

/// Assembles the clang-cl search set (§4.E) from `PATH`, every
/// installation's bundled LLVM, and the fixed env-derived roots.
pub fn clang_cl_search_dirs(
    env: &dyn paths::Env,
    path_entries: &[PathBuf],
    installations: &[VendorInstallation],
) -> Vec<PathBuf> {
    let mut dirs = crate::vendor::kit_builder::clang_cl_fixed_search_dirs(env);
    dirs.extend(path_entries.iter().cloned());
    for install in installations {
        dirs.push(
            install
                .installation_path
                .join("VC")
                .join("Tools")
                .join("Llvm")
                .join("bin"),
        );
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_concatenates_compiler_kits_in_scan_dir_order() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let gcc_a = dir_a.path().join("gcc");
        let gcc_b = dir_b.path().join("gcc");
        let script = "#!/bin/sh\necho 'gcc version 9.4.0 (Ubuntu) ' 1>&2\n";
        std::fs::write(&gcc_a, script).unwrap();
        std::fs::write(&gcc_b, script).unwrap();
        #[cfg(unix)]
        for bin in [&gcc_a, &gcc_b] {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let opts = ScanOptions {
            host: Host::Unix,
            path_entries: vec![dir_a.path().to_path_buf(), dir_b.path().to_path_buf()],
            ..Default::default()
        };
        let kits = scan(&opts).await;
        assert_eq!(kits.len(), 2);
    }

    #[tokio::test]
    async fn scan_dedupes_repeated_path_entries() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ScanOptions {
            host: Host::Unix,
            path_entries: vec![dir.path().to_path_buf(), dir.path().to_path_buf()],
            ..Default::default()
        };
        // No compilers present, but this exercises the dedup path without panicking.
        let kits = scan(&opts).await;
        assert!(kits.is_empty());
    }

    #[tokio::test]
    async fn vendor_and_clang_cl_kits_are_skipped_on_non_windows() {
        let install = VendorInstallation {
            installation_path: PathBuf::from("/fake"),
            installation_version: "16.11.2".to_string(),
            instance_id: "abc".to_string(),
            display_name: None,
            channel_id: None,
            catalog: None,
        };
        let opts = ScanOptions {
            host: Host::Unix,
            vendor_installations: vec![install],
            tmp_dir: PathBuf::from("/tmp"),
            ..Default::default()
        };
        let kits = scan(&opts).await;
        assert!(kits.is_empty());
    }
}
