//! # Database Workflow Driver
//!
//! Builds and runs the `docker compose` / PostgreSQL client invocations
//! behind the `db` command group: create, drop, dump, restore, listing
//! databases and installed module versions.
//!
//! Commands execute inside the project's `db` compose service with the
//! fixed credential convention (`user=odoo password=odoo`) passed through
//! the environment. Every invocation is a typed argv list; tests assert on
//! the literal token sequences.

use std::path::Path;

use crate::error::{Error, Result};
use crate::process::{CommandLine, Runner};

/// Compose service running PostgreSQL.
const DB_SERVICE: &str = "db";
/// Fixed database credential convention.
const DB_USER: &str = "odoo";
const DB_PASSWORD: &str = "odoo";

/// Driver for database chores of one project.
pub struct DbDriver<'a> {
    runner: &'a dyn Runner,
    project_dir: &'a Path,
}

impl<'a> DbDriver<'a> {
    pub fn new(runner: &'a dyn Runner, project_dir: &'a Path) -> Self {
        DbDriver {
            runner,
            project_dir,
        }
    }

    /// `docker compose exec -T db <tool> <args...>` with the credential
    /// environment injected into the container.
    fn compose_exec<I, S>(&self, tool: &str, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::new("docker")
            .args(["compose", "exec", "-T"])
            .arg("-e")
            .arg(format!("PGUSER={}", DB_USER))
            .arg("-e")
            .arg(format!("PGPASSWORD={}", DB_PASSWORD))
            .arg(DB_SERVICE)
            .arg(tool)
            .args(args)
            .current_dir(self.project_dir)
    }

    fn psql_query(&self, database: &str, sql: &str) -> CommandLine {
        self.compose_exec("psql", ["-A", "-t", "-d", database, "-c", sql])
    }

    /// Names of all non-template databases.
    pub fn list(&self) -> Result<Vec<String>> {
        let out = self.runner.run_captured(&self.psql_query(
            "postgres",
            "SELECT datname FROM pg_database WHERE NOT datistemplate AND datname <> 'postgres' ORDER BY datname",
        ))?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Whether `name` exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM pg_database WHERE datname = '{}'",
            name.replace('\'', "''")
        );
        let out = self.runner.run_captured(&self.psql_query("postgres", &sql))?;
        Ok(out.stdout.trim() == "1")
    }

    /// Create an empty database owned by the conventional user.
    pub fn create(&self, name: &str) -> Result<()> {
        self.runner
            .run(&self.compose_exec("createdb", ["-O", DB_USER, name]))
    }

    /// Drop a database if it exists.
    pub fn drop(&self, name: &str) -> Result<()> {
        self.runner
            .run(&self.compose_exec("dropdb", ["--if-exists", name]))
    }

    /// Dump `name` in custom format to a local file.
    pub fn dump(&self, name: &str, dump_file: &Path) -> Result<()> {
        if let Some(parent) = dump_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.runner.run_to_file(
            &self.compose_exec("pg_dump", ["-Fc", "-d", name]),
            dump_file,
        )
    }

    /// Restore a custom-format dump into a freshly created database.
    pub fn restore(&self, name: &str, dump_file: &Path) -> Result<()> {
        if !dump_file.is_file() {
            return Err(Error::precondition(format!(
                "dump file {} does not exist",
                dump_file.display()
            )));
        }
        if self.exists(name)? {
            return Err(Error::Precondition {
                message: format!("database {} already exists", name),
                hint: Some(format!("drop it first with 'odoo-toolbox db drop {}'", name)),
            });
        }
        self.create(name)?;
        self.runner.run_from_file(
            &self.compose_exec("pg_restore", ["--no-owner", "-d", name]),
            dump_file,
        )
    }

    /// Installed module name/version pairs, ordered by module name.
    pub fn list_versions(&self, name: &str) -> Result<Vec<(String, String)>> {
        let out = self.runner.run_captured(&self.psql_query(
            name,
            "SELECT name || '|' || latest_version FROM ir_module_module WHERE state = 'installed' ORDER BY name",
        ))?;
        Ok(out
            .stdout
            .lines()
            .filter_map(|line| {
                let (module, version) = line.trim().split_once('|')?;
                Some((module.to_string(), version.to_string()))
            })
            .collect())
    }

    /// Read one `ir_config_parameter` value, e.g. the contract number.
    pub fn config_parameter(&self, name: &str, key: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT value FROM ir_config_parameter WHERE key = '{}'",
            key.replace('\'', "''")
        );
        let out = self.runner.run_captured(&self.psql_query(name, &sql))?;
        let value = out.stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::process::CapturedOutput;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Runner that records every invocation and replies from a script.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<Vec<String>>>,
        pub stdout: RefCell<Vec<String>>,
    }

    impl RecordingRunner {
        pub fn with_stdout(lines: impl IntoIterator<Item = &'static str>) -> Self {
            RecordingRunner {
                calls: RefCell::new(Vec::new()),
                stdout: RefCell::new(lines.into_iter().map(String::from).collect()),
            }
        }

        fn record(&self, cmd: &CommandLine) -> CapturedOutput {
            self.calls
                .borrow_mut()
                .push(cmd.argv().iter().map(|s| s.to_string()).collect());
            let stdout = {
                let mut scripted = self.stdout.borrow_mut();
                if scripted.is_empty() {
                    String::new()
                } else {
                    scripted.remove(0)
                }
            };
            CapturedOutput {
                status: 0,
                stdout,
                stderr: String::new(),
            }
        }
    }

    impl Runner for RecordingRunner {
        fn run_captured(&self, cmd: &CommandLine) -> crate::error::Result<CapturedOutput> {
            Ok(self.record(cmd))
        }

        fn run(&self, cmd: &CommandLine) -> crate::error::Result<()> {
            self.record(cmd);
            Ok(())
        }

        fn run_to_file(&self, cmd: &CommandLine, _path: &Path) -> crate::error::Result<()> {
            self.record(cmd);
            Ok(())
        }

        fn run_from_file(&self, cmd: &CommandLine, path: &Path) -> crate::error::Result<()> {
            // The file must exist, as it would for a real restore.
            assert!(path.exists());
            self.record(cmd);
            Ok(())
        }
    }

    fn flat(calls: &[Vec<String>], index: usize) -> Vec<&str> {
        calls[index].iter().map(String::as_str).collect()
    }

    #[test]
    fn test_create_argv() {
        let runner = RecordingRunner::default();
        let dir = PathBuf::from("/proj");
        let driver = DbDriver::new(&runner, &dir);
        driver.create("acme_14").unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(
            flat(&calls, 0),
            vec![
                "docker", "compose", "exec", "-T", "-e", "PGUSER=odoo", "-e", "PGPASSWORD=odoo",
                "db", "createdb", "-O", "odoo", "acme_14",
            ]
        );
    }

    #[test]
    fn test_drop_argv() {
        let runner = RecordingRunner::default();
        let dir = PathBuf::from("/proj");
        let driver = DbDriver::new(&runner, &dir);
        driver.drop("acme_14").unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(
            flat(&calls, 0)[9..],
            ["dropdb", "--if-exists", "acme_14"]
        );
    }

    #[test]
    fn test_dump_argv() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        let driver = DbDriver::new(&runner, temp.path());
        driver.dump("acme_14", &temp.path().join("dumps/acme.pg")).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(flat(&calls, 0)[9..], ["pg_dump", "-Fc", "-d", "acme_14"]);
        assert!(temp.path().join("dumps").is_dir());
    }

    #[test]
    fn test_restore_creates_then_feeds_dump() {
        let temp = tempfile::TempDir::new().unwrap();
        let dump = temp.path().join("acme.pg");
        std::fs::write(&dump, b"fake dump").unwrap();

        // exists() query answers empty: the database is absent.
        let runner = RecordingRunner::with_stdout([""]);
        let driver = DbDriver::new(&runner, temp.path());
        driver.restore("acme_14", &dump).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 3); // exists, createdb, pg_restore
        assert_eq!(flat(&calls, 1)[9..], ["createdb", "-O", "odoo", "acme_14"]);
        assert_eq!(
            flat(&calls, 2)[9..],
            ["pg_restore", "--no-owner", "-d", "acme_14"]
        );
    }

    #[test]
    fn test_restore_rejects_existing_database() {
        let temp = tempfile::TempDir::new().unwrap();
        let dump = temp.path().join("acme.pg");
        std::fs::write(&dump, b"fake dump").unwrap();

        let runner = RecordingRunner::with_stdout(["1\n"]);
        let driver = DbDriver::new(&runner, temp.path());
        let err = driver.restore("acme_14", &dump).unwrap_err();
        assert!(format!("{}", err).contains("already exists"));
    }

    #[test]
    fn test_restore_rejects_missing_dump() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        let driver = DbDriver::new(&runner, temp.path());
        let err = driver
            .restore("acme_14", &temp.path().join("missing.pg"))
            .unwrap_err();
        assert!(format!("{}", err).contains("does not exist"));
    }

    #[test]
    fn test_list_parses_lines() {
        let runner = RecordingRunner::with_stdout(["acme_14\nacme_14_test\n"]);
        let dir = PathBuf::from("/proj");
        let driver = DbDriver::new(&runner, &dir);
        assert_eq!(driver.list().unwrap(), vec!["acme_14", "acme_14_test"]);
    }

    #[test]
    fn test_list_versions_parses_pairs() {
        let runner = RecordingRunner::with_stdout(["base|14.0.3.0.0\nedi_oca|14.0.1.9.0\n"]);
        let dir = PathBuf::from("/proj");
        let driver = DbDriver::new(&runner, &dir);
        let versions = driver.list_versions("acme_14").unwrap();
        assert_eq!(
            versions,
            vec![
                ("base".to_string(), "14.0.3.0.0".to_string()),
                ("edi_oca".to_string(), "14.0.1.9.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_parameter() {
        let runner = RecordingRunner::with_stdout(["C-12345\n", ""]);
        let dir = PathBuf::from("/proj");
        let driver = DbDriver::new(&runner, &dir);
        assert_eq!(
            driver
                .config_parameter("acme_14", "database.contract")
                .unwrap(),
            Some("C-12345".to_string())
        );
        assert_eq!(
            driver.config_parameter("acme_14", "missing.key").unwrap(),
            None
        );
    }
}
