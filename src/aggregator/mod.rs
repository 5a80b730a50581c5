//! Module source aggregation.
//!
//! The aggregator walks each configured module in order and streams one
//! labeled block per file to a writer. Nothing is buffered beyond the
//! file currently being emitted.

pub mod block;

use crate::config::AggregatorConfig;
use crate::error::AggregateError;
use crate::models::{FileRecord, Policy, RunSummary};
use crate::scanner::{ModuleScanner, ScanConfig};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Streams the sources of a list of modules.
pub struct Aggregator {
    config: AggregatorConfig,
    scanner: ModuleScanner,
}

impl Aggregator {
    /// Create an aggregator for the given settings.
    pub fn new(config: AggregatorConfig) -> Self {
        let scanner = ModuleScanner::new(config.base_path.clone(), ScanConfig::from(&config));
        Self { config, scanner }
    }

    /// Write a block for every file of every module.
    ///
    /// A file's header is only written once its contents have been read
    /// and decoded, so a fatal error never leaves a partial block behind.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary, AggregateError> {
        self.visit(out, |out, path| {
            let record = read_record(path)?;
            block::write_block(out, &record)?;
            Ok(())
        })
    }

    /// Write the path of every file that `run` would emit, one per line.
    pub fn list<W: Write>(&self, out: &mut W) -> Result<RunSummary, AggregateError> {
        self.visit(out, |out, path| Ok(block::write_path(out, path)?))
    }

    fn visit<W, F>(&self, out: &mut W, mut emit: F) -> Result<RunSummary, AggregateError>
    where
        W: Write,
        F: FnMut(&mut W, &Path) -> Result<(), AggregateError>,
    {
        let mut summary = RunSummary::default();

        for module in &self.config.modules {
            let root = self.scanner.source_root(module);

            if !root.is_dir() {
                if self.config.on_missing_module == Policy::Fail {
                    return Err(AggregateError::MissingModule {
                        module: module.clone(),
                        path: root,
                    });
                }
                debug!("Skipping module {}: no {}", module, root.display());
                summary.modules_missing += 1;
                continue;
            }

            debug!("Aggregating module {} from {}", module, root.display());
            summary.modules_visited += 1;

            for entry in self.scanner.files(&root) {
                match entry.and_then(|path| emit(out, &path)) {
                    Ok(()) => summary.files_emitted += 1,
                    Err(e) => self.recover(e, &mut summary)?,
                }
            }
        }

        info!(
            "Aggregated {} files from {} of {} modules ({} skipped)",
            summary.files_emitted,
            summary.modules_visited,
            summary.modules_total(),
            summary.entries_skipped
        );

        Ok(summary)
    }

    /// Apply the unreadable-file policy to a failure.
    fn recover(&self, err: AggregateError, summary: &mut RunSummary) -> Result<(), AggregateError> {
        if err.is_skippable() && self.config.on_unreadable_file == Policy::Skip {
            match std::error::Error::source(&err) {
                Some(cause) => warn!("Skipping: {}: {}", err, cause),
                None => warn!("Skipping: {}", err),
            }
            summary.entries_skipped += 1;
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Read a file completely and decode it as UTF-8.
pub fn read_record(path: &Path) -> Result<FileRecord, AggregateError> {
    let bytes = fs::read(path).map_err(|source| AggregateError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let contents = String::from_utf8(bytes).map_err(|source| AggregateError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(FileRecord {
        path: path.to_path_buf(),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(base: &Path, modules: &[&str]) -> AggregatorConfig {
        AggregatorConfig {
            base_path: base.to_path_buf(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
            ..AggregatorConfig::default()
        }
    }

    fn run(config: AggregatorConfig) -> (Result<RunSummary, AggregateError>, String) {
        let mut out = Vec::new();
        let result = Aggregator::new(config).run(&mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn expected_block(path: PathBuf, contents: &str) -> String {
        format!("--- {} ---\n{}\n\n", path.display(), contents)
    }

    #[test]
    fn test_single_file_block() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/a.txt", b"hello");

        let (result, output) = run(config(dir.path(), &["m1"]));
        let summary = result.unwrap();

        let path = dir.path().join("m1").join("src").join("a.txt");
        assert_eq!(output, expected_block(path, "hello"));
        assert_eq!(summary.files_emitted, 1);
        assert_eq!(summary.modules_visited, 1);
    }

    #[test]
    fn test_missing_module_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/a.txt", b"hello");

        let (result, output) = run(config(dir.path(), &["m1", "m2"]));
        let summary = result.unwrap();

        assert_eq!(output.matches("--- ").count(), 1);
        assert!(!output.contains("/m2/"));
        assert_eq!(summary.modules_missing, 1);
        assert_eq!(summary.modules_total(), 2);
    }

    #[test]
    fn test_run_continues_after_missing_module() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m3/src/c.txt", b"third");

        let (result, output) = run(config(dir.path(), &["m1", "m2", "m3"]));
        assert!(result.is_ok());
        let path = dir.path().join("m3").join("src").join("c.txt");
        assert_eq!(output, expected_block(path, "third"));
    }

    #[test]
    fn test_missing_module_fail_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), &["absent"]);
        cfg.on_missing_module = Policy::Fail;

        let (result, output) = run(cfg);
        assert!(matches!(
            result,
            Err(AggregateError::MissingModule { ref module, .. }) if module == "absent"
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn test_modules_in_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "alpha/src/a.rs", b"alpha");
        write(dir.path(), "beta/src/b.rs", b"beta");

        let (result, output) = run(config(dir.path(), &["beta", "alpha"]));
        result.unwrap();

        let beta = output.find("/beta/src/").unwrap();
        let alpha = output.find("/alpha/src/").unwrap();
        assert!(beta < alpha);
    }

    #[test]
    fn test_every_file_exactly_once_and_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let files = [
            ("m1/src/main.rs", "fn main() {}\n"),
            ("m1/src/util/mod.rs", "pub mod strings;\r\n"),
            ("m1/src/util/strings.rs", "// ünïcödé\n\n"),
            ("m1/src/empty.txt", ""),
        ];
        for (rel, contents) in files {
            write(dir.path(), rel, contents.as_bytes());
        }

        let (result, output) = run(config(dir.path(), &["m1"]));
        assert_eq!(result.unwrap().files_emitted, files.len());

        for (rel, contents) in files {
            let path = dir.path().join(rel);
            let block = expected_block(path, contents);
            assert_eq!(output.matches(&block).count(), 1, "block for {}", rel);
        }
        assert_eq!(output.matches("\n--- ").count() + 1, files.len());
    }

    #[test]
    fn test_output_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/b.rs", b"b");
        write(dir.path(), "m1/src/a.rs", b"a");
        write(dir.path(), "m1/src/sub/c.rs", b"c");
        write(dir.path(), "m2/src/d.rs", b"d");

        let (first, first_output) = run(config(dir.path(), &["m1", "m2"]));
        let (second, second_output) = run(config(dir.path(), &["m1", "m2"]));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(first_output, second_output);
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/a.txt", b"first");
        write(dir.path(), "m1/src/b.bin", &[0x66, 0x6f, 0xff, 0x6f]);
        write(dir.path(), "m1/src/c.txt", b"after");
        write(dir.path(), "m2/src/d.txt", b"next module");

        let (result, output) = run(config(dir.path(), &["m1", "m2"]));

        match result {
            Err(AggregateError::Decode { path, .. }) => assert!(path.ends_with("b.bin")),
            other => panic!("expected decode error, got {:?}", other),
        }
        let first = dir.path().join("m1").join("src").join("a.txt");
        assert_eq!(output, expected_block(first, "first"));
    }

    #[test]
    fn test_invalid_utf8_skip_policy() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/a.txt", b"first");
        write(dir.path(), "m1/src/b.bin", &[0xc3, 0x28]);
        write(dir.path(), "m1/src/c.txt", b"after");

        let mut cfg = config(dir.path(), &["m1"]);
        cfg.on_unreadable_file = Policy::Skip;
        let (result, output) = run(cfg);
        let summary = result.unwrap();

        assert_eq!(summary.files_emitted, 2);
        assert_eq!(summary.entries_skipped, 1);
        assert!(!output.contains("b.bin"));
        assert!(output.ends_with("after\n\n"));
    }

    #[test]
    fn test_list_matches_run_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/z.rs", b"z");
        write(dir.path(), "m1/src/a/b.rs", b"b");
        write(dir.path(), "m1/src/c.rs", b"c");

        let aggregator = Aggregator::new(config(dir.path(), &["m1", "missing"]));
        let mut listed = Vec::new();
        let summary = aggregator.list(&mut listed).unwrap();
        assert_eq!(summary.files_emitted, 3);

        let src = dir.path().join("m1").join("src");
        let expected = [src.join("c.rs"), src.join("z.rs"), src.join("a").join("b.rs")]
            .iter()
            .map(|p| format!("{}\n", p.display()))
            .collect::<String>();
        assert_eq!(String::from_utf8(listed).unwrap(), expected);
    }

    #[test]
    fn test_read_record_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_record(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, AggregateError::Read { .. }));
    }

    #[cfg(unix)]
    fn broken_tree(base: &Path) {
        use std::os::unix::fs::symlink;

        write(base, "m1/src/a.txt", b"a");
        fs::create_dir_all(base.join("m1/src/d")).unwrap();
        symlink(base.join("m1/src"), base.join("m1/src/d/loop")).unwrap();
        symlink(base.join("m1/src/nowhere"), base.join("m1/src/broken")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        broken_tree(dir.path());

        let mut cfg = config(dir.path(), &["m1"]);
        cfg.follow_links = true;
        let (result, output) = run(cfg);

        match result {
            Err(AggregateError::Walk { path, .. }) => assert!(path.ends_with("broken")),
            other => panic!("expected walk error, got {:?}", other),
        }
        let first = dir.path().join("m1").join("src").join("a.txt");
        assert_eq!(output, expected_block(first, "a"));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_error_skip_policy() {
        let dir = tempfile::tempdir().unwrap();
        broken_tree(dir.path());

        let mut cfg = config(dir.path(), &["m1"]);
        cfg.follow_links = true;
        cfg.on_unreadable_file = Policy::Skip;
        let (result, output) = run(cfg);
        let summary = result.unwrap();

        assert_eq!(summary.files_emitted, 1);
        assert_eq!(summary.entries_skipped, 2);
        let first = dir.path().join("m1").join("src").join("a.txt");
        assert_eq!(output, expected_block(first, "a"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_failure_ignores_skip_policy() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m1/src/a.txt", b"hello");

        let mut cfg = config(dir.path(), &["m1"]);
        cfg.on_unreadable_file = Policy::Skip;
        let result = Aggregator::new(cfg).run(&mut FailingWriter);
        assert!(matches!(result, Err(AggregateError::Output(_))));
    }
}
