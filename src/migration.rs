//! # Production Migration Pipeline
//!
//! Sequences the long-running "migrate production to a new major version"
//! workflow as an explicit ordered list of idempotent steps.
//!
//! Each step declares its output artifact (a database or a dump file)
//! and is skipped when that artifact already exists, unless `--restart`
//! names it. Resumability is therefore existence-based: there is no
//! separate status ledger, and re-invoking the pipeline after a failure is
//! always safe.
//!
//! A non-zero exit from any external command aborts the whole pipeline
//! immediately with the offending step's log file path surfaced; a human
//! inspects the log and re-invokes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::database::DbDriver;
use crate::error::{Error, Result};
use crate::process::{CommandLine, Runner};
use crate::project::Project;

/// The output artifact a step is responsible for producing.
#[derive(Debug, Clone)]
pub enum Artifact {
    Database(String),
    DumpFile(PathBuf),
}

impl Artifact {
    fn exists(&self, db: &DbDriver) -> Result<bool> {
        match self {
            Artifact::Database(name) => db.exists(name),
            Artifact::DumpFile(path) => Ok(path.is_file()),
        }
    }

    /// Remove the artifact so a forced step starts from scratch.
    fn discard(&self, db: &DbDriver) -> Result<()> {
        match self {
            Artifact::Database(name) => db.drop(name),
            Artifact::DumpFile(path) => {
                if path.is_file() {
                    fs::remove_file(path)?;
                }
                Ok(())
            }
        }
    }
}

/// What a step does once its artifact is found missing.
pub enum StepAction {
    /// Run external commands, capturing their output into the step log.
    Commands(Vec<CommandLine>),
    /// Restore a dump into a database.
    Restore { database: String, dump: PathBuf },
    /// Dump a database to a file.
    Dump { database: String, dump: PathBuf },
    /// Send a dump through the external upgrade service.
    UpgradeService {
        service: UpgradeService,
        input: PathBuf,
        output: PathBuf,
        target_version: String,
        contract: String,
    },
}

/// One idempotent pipeline step.
pub struct MigrationStep {
    pub name: String,
    pub artifact: Artifact,
    pub action: StepAction,
}

/// Result of driving one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed(String),
    Skipped(String),
}

/// Client for the external upgrade-as-a-service endpoint.
#[derive(Debug, Clone)]
pub struct UpgradeService {
    pub endpoint: String,
}

impl UpgradeService {
    /// Upload a dump and write the upgraded dump returned by the service.
    ///
    /// One blocking request, no retry; cross-major upgrades run for a long
    /// time so the client timeout is generous.
    pub fn upgrade(
        &self,
        input: &Path,
        target_version: &str,
        contract: &str,
        output: &Path,
    ) -> Result<()> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(6 * 3600))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        let body = fs::read(input)?;
        let response = http
            .post(&self.endpoint)
            .query(&[("target", target_version), ("contract", contract)])
            .body(body)
            .send()
            .map_err(|e| Error::Network {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| Error::Network {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        let upgraded = response.bytes().map_err(|e| Error::Network {
            url: self.endpoint.clone(),
            message: e.to_string(),
        })?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, upgraded)?;
        Ok(())
    }
}

/// The values the pipeline resolves once, up front.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub production_dump: PathBuf,
    pub contract: String,
    pub target_version: String,
    pub upgrade_endpoint: String,
}

impl MigrationContext {
    /// Resolve contract and target version from CLI flags, falling back to
    /// the restored production database (contract) and the project marker
    /// (target version).
    pub fn resolve(
        project: &Project,
        db: &DbDriver,
        production_dump: PathBuf,
        contract_flag: Option<String>,
        target_flag: Option<String>,
        upgrade_endpoint: String,
    ) -> Result<Self> {
        let target_version = target_flag.unwrap_or_else(|| project.marker.odoo_version.clone());
        let contract = match contract_flag {
            Some(contract) => contract,
            None => {
                let prod_db = production_db_name(project);
                if !db.exists(&prod_db)? {
                    return Err(Error::Precondition {
                        message: "cannot resolve the contract number".to_string(),
                        hint: Some(
                            "pass --contract, or restore the production dump first".to_string(),
                        ),
                    });
                }
                db.config_parameter(&prod_db, "database.contract")?
                    .ok_or_else(|| Error::Precondition {
                        message: "production database has no database.contract parameter"
                            .to_string(),
                        hint: Some("pass --contract explicitly".to_string()),
                    })?
            }
        };
        Ok(MigrationContext {
            production_dump,
            contract,
            target_version,
            upgrade_endpoint,
        })
    }
}

fn production_db_name(project: &Project) -> String {
    format!("{}_prod", project.marker.project_id)
}

fn migrated_db_name(project: &Project) -> String {
    format!("{}_migrated", project.marker.project_id)
}

/// Build the ordered step list for a full production migration.
pub fn build_pipeline(project: &Project, ctx: &MigrationContext) -> Vec<MigrationStep> {
    let work = project.root.join("work");
    let prod_db = production_db_name(project);
    let migrated_db = migrated_db_name(project);
    let sanitized = work.join("sanitized.pg");
    let upgraded = work.join("upgraded.pg");
    let migrated_dump = work.join("migrated.pg");

    vec![
        MigrationStep {
            name: "restore-production".to_string(),
            artifact: Artifact::Database(prod_db.clone()),
            action: StepAction::Restore {
                database: prod_db.clone(),
                dump: ctx.production_dump.clone(),
            },
        },
        MigrationStep {
            name: "sanitize".to_string(),
            artifact: Artifact::DumpFile(sanitized.clone()),
            action: StepAction::Commands(vec![
                CommandLine::new("docker")
                    .args(["compose", "exec", "-T", "db", "psql", "-d"])
                    .arg(prod_db.as_str())
                    .args(["-c", "DELETE FROM ir_mail_server; UPDATE ir_cron SET active = false"])
                    .current_dir(&project.root),
            ]),
        },
        // The sanitize dump is produced by a dedicated step so a failed
        // service upload can restart from the file.
        MigrationStep {
            name: "dump-sanitized".to_string(),
            artifact: Artifact::DumpFile(sanitized.clone()),
            action: StepAction::Dump {
                database: prod_db,
                dump: sanitized.clone(),
            },
        },
        MigrationStep {
            name: "upgrade-service".to_string(),
            artifact: Artifact::DumpFile(upgraded.clone()),
            action: StepAction::UpgradeService {
                service: UpgradeService {
                    endpoint: ctx.upgrade_endpoint.clone(),
                },
                input: sanitized,
                output: upgraded.clone(),
                target_version: ctx.target_version.clone(),
                contract: ctx.contract.clone(),
            },
        },
        MigrationStep {
            name: "restore-upgraded".to_string(),
            artifact: Artifact::Database(migrated_db.clone()),
            action: StepAction::Restore {
                database: migrated_db.clone(),
                dump: upgraded,
            },
        },
        MigrationStep {
            name: "post-migration".to_string(),
            artifact: Artifact::DumpFile(migrated_dump.clone()),
            action: StepAction::Commands(vec![CommandLine::new("docker")
                .args(["compose", "run", "--rm", "odoo", "odoo", "-d"])
                .arg(migrated_db.as_str())
                .args(["-u", "all", "--stop-after-init"])
                .current_dir(&project.root)]),
        },
        MigrationStep {
            name: "dump-migrated".to_string(),
            artifact: Artifact::DumpFile(migrated_dump.clone()),
            action: StepAction::Dump {
                database: migrated_db,
                dump: migrated_dump,
            },
        },
    ]
}

/// Drives the ordered steps against the database driver.
pub struct Pipeline<'a> {
    project: &'a Project,
    runner: &'a dyn Runner,
}

impl<'a> Pipeline<'a> {
    pub fn new(project: &'a Project, runner: &'a dyn Runner) -> Self {
        Pipeline { project, runner }
    }

    fn log_path(&self, step: &MigrationStep) -> PathBuf {
        self.project
            .root
            .join("logs/migrate")
            .join(format!("{}.log", step.name))
    }

    /// Run every step in order, skipping those whose artifact already
    /// exists. `restart` forces the named step by discarding its artifact
    /// first.
    pub fn run(
        &self,
        db: &DbDriver,
        steps: Vec<MigrationStep>,
        restart: Option<&str>,
    ) -> Result<Vec<StepOutcome>> {
        if let Some(name) = restart {
            if !steps.iter().any(|s| s.name == name) {
                return Err(Error::Precondition {
                    message: format!("unknown migration step {:?}", name),
                    hint: Some(format!(
                        "known steps: {}",
                        steps
                            .iter()
                            .map(|s| s.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )),
                });
            }
        }

        let mut outcomes = Vec::new();
        for step in steps {
            let forced = restart == Some(step.name.as_str());
            if forced && step.artifact.exists(db)? {
                step.artifact.discard(db)?;
            }
            if step.artifact.exists(db)? {
                println!("⏭  {} skipped (artifact exists)", step.name);
                outcomes.push(StepOutcome::Skipped(step.name.clone()));
                continue;
            }

            println!("▶  {}", step.name);
            info!("running migration step {}", step.name);
            self.run_step(db, &step).map_err(|e| {
                let log = self.log_path(&step);
                Error::Precondition {
                    message: format!("migration step {} failed: {}", step.name, e),
                    hint: Some(format!("see {}", log.display())),
                }
            })?;
            outcomes.push(StepOutcome::Completed(step.name.clone()));
        }
        Ok(outcomes)
    }

    fn run_step(&self, db: &DbDriver, step: &MigrationStep) -> Result<()> {
        match &step.action {
            StepAction::Commands(commands) => {
                let log = self.log_path(step);
                if let Some(parent) = log.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut transcript = String::new();
                for cmd in commands {
                    let out = self.runner.run_captured(cmd).inspect_err(|_| {
                        let _ = fs::write(&log, &transcript);
                    })?;
                    transcript.push_str(&out.stdout);
                    transcript.push_str(&out.stderr);
                }
                fs::write(&log, transcript)?;
                Ok(())
            }
            StepAction::Restore { database, dump } => db.restore(database, dump),
            StepAction::Dump { database, dump } => db.dump(database, dump),
            StepAction::UpgradeService {
                service,
                input,
                output,
                target_version,
                contract,
            } => service.upgrade(input, target_version, contract, output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::RecordingRunner;
    use crate::project::{CONFIG_FILE, DEFAULT_MARKER};
    use tempfile::TempDir;

    fn fixture_project() -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(DEFAULT_MARKER),
            "project_id: acme_corp\nodoo_version: \"14.0\"\n",
        )
        .unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[paths]\n\
             odoo_src = odoo/src\n\
             ext_src = odoo/external-src\n\
             local_src = odoo/local-src\n\
             pending_merge = pending-merge.d\n\
             version_file = odoo/VERSION\n\
             [remotes]\n\
             company = camptocamp\n",
        )
        .unwrap();
        let project = Project::load(temp.path()).unwrap();
        (temp, project)
    }

    fn file_step(name: &str, artifact: &Path) -> MigrationStep {
        MigrationStep {
            name: name.to_string(),
            artifact: Artifact::DumpFile(artifact.to_path_buf()),
            action: StepAction::Commands(vec![CommandLine::new("true")]),
        }
    }

    #[test]
    fn test_completed_step_is_skipped_without_restart() {
        let (temp, project) = fixture_project();
        let artifact = temp.path().join("work/out.pg");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, b"done").unwrap();

        let runner = RecordingRunner::default();
        let db = DbDriver::new(&runner, &project.root);
        let pipeline = Pipeline::new(&project, &runner);

        let outcomes = pipeline
            .run(&db, vec![file_step("one", &artifact)], None)
            .unwrap();
        assert_eq!(outcomes, vec![StepOutcome::Skipped("one".to_string())]);
        // No external command ran.
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_artifact_runs_step() {
        let (temp, project) = fixture_project();
        let artifact = temp.path().join("work/out.pg");

        let runner = RecordingRunner::default();
        let db = DbDriver::new(&runner, &project.root);
        let pipeline = Pipeline::new(&project, &runner);

        let outcomes = pipeline
            .run(&db, vec![file_step("one", &artifact)], None)
            .unwrap();
        assert_eq!(outcomes, vec![StepOutcome::Completed("one".to_string())]);
        assert_eq!(runner.calls.borrow().len(), 1);
        // The step transcript was written.
        assert!(temp.path().join("logs/migrate/one.log").is_file());
    }

    #[test]
    fn test_restart_discards_artifact_and_reruns() {
        let (temp, project) = fixture_project();
        let artifact = temp.path().join("work/out.pg");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, b"stale").unwrap();

        let runner = RecordingRunner::default();
        let db = DbDriver::new(&runner, &project.root);
        let pipeline = Pipeline::new(&project, &runner);

        let outcomes = pipeline
            .run(&db, vec![file_step("one", &artifact)], Some("one"))
            .unwrap();
        assert_eq!(outcomes, vec![StepOutcome::Completed("one".to_string())]);
        assert!(!artifact.exists());
    }

    #[test]
    fn test_unknown_restart_step_rejected() {
        let (temp, project) = fixture_project();
        let artifact = temp.path().join("work/out.pg");
        let runner = RecordingRunner::default();
        let db = DbDriver::new(&runner, &project.root);
        let pipeline = Pipeline::new(&project, &runner);

        let err = pipeline
            .run(&db, vec![file_step("one", &artifact)], Some("bogus"))
            .unwrap_err();
        assert!(format!("{}", err).contains("unknown migration step"));
        assert!(format!("{}", err).contains("known steps: one"));
    }

    #[test]
    fn test_build_pipeline_step_order() {
        let (_temp, project) = fixture_project();
        let ctx = MigrationContext {
            production_dump: PathBuf::from("/dumps/prod.pg"),
            contract: "C-12345".to_string(),
            target_version: "14.0".to_string(),
            upgrade_endpoint: "https://upgrade.example.com/v1".to_string(),
        };
        let steps = build_pipeline(&project, &ctx);
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "restore-production",
                "sanitize",
                "dump-sanitized",
                "upgrade-service",
                "restore-upgraded",
                "post-migration",
                "dump-migrated",
            ]
        );
    }
}
