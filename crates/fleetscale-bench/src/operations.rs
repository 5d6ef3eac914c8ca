//! Benchmark operation registry
//!
//! Each operation names the playbook the baseline runs and performs the
//! equivalent work through the engine.

use async_trait::async_trait;
use fleetscale_engine::{Automation, FileState, PackageState, Result};

#[async_trait]
pub trait BenchOperation: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Playbook file run by the baseline
    fn playbook(&self) -> String {
        format!("{}.yml", self.name())
    }

    /// The same work through the candidate engine
    async fn run_candidate(&self, engine: &dyn Automation) -> Result<()>;
}

/// All operations in execution order
pub fn registry() -> Vec<Box<dyn BenchOperation>> {
    vec![
        Box::new(GatherFacts),
        Box::new(FileOperations),
        Box::new(InstallPackage),
        Box::new(CopyAndTemplate),
    ]
}

pub struct GatherFacts;

#[async_trait]
impl BenchOperation for GatherFacts {
    fn name(&self) -> &str {
        "gather_facts"
    }

    fn description(&self) -> &str {
        "Gather facts from all hosts"
    }

    async fn run_candidate(&self, engine: &dyn Automation) -> Result<()> {
        let facts = engine.gather_facts().await?;
        for (host, facts) in &facts {
            tracing::debug!(
                "{}: {} {} ({} cpu, {} MB)",
                host,
                facts.os_name.as_deref().unwrap_or(&facts.system),
                facts.kernel,
                facts.processor_count,
                facts.memtotal_mb
            );
        }
        Ok(())
    }
}

const FILE_COUNT: usize = 5;

pub fn scratch_path(i: usize) -> String {
    format!("/tmp/ftl2_scale_{}", i)
}

pub struct FileOperations;

#[async_trait]
impl BenchOperation for FileOperations {
    fn name(&self) -> &str {
        "file_operations"
    }

    fn description(&self) -> &str {
        "5x file create/stat/remove on all hosts (15 tasks)"
    }

    async fn run_candidate(&self, engine: &dyn Automation) -> Result<()> {
        for i in 0..FILE_COUNT {
            engine.file(&scratch_path(i), FileState::Touch).await?;
        }
        for i in 0..FILE_COUNT {
            engine.stat(&scratch_path(i)).await?;
        }
        for i in 0..FILE_COUNT {
            engine.file(&scratch_path(i), FileState::Absent).await?;
        }
        Ok(())
    }
}

pub struct InstallPackage;

#[async_trait]
impl BenchOperation for InstallPackage {
    fn name(&self) -> &str {
        "install_package"
    }

    fn description(&self) -> &str {
        "Install and remove a package on all hosts"
    }

    async fn run_candidate(&self, engine: &dyn Automation) -> Result<()> {
        engine.command("dnf install -y python3-dnf").await?;
        engine.package("tree", PackageState::Present).await?;
        engine.package("tree", PackageState::Absent).await?;
        Ok(())
    }
}

const CONFIG_COUNT: usize = 3;

pub fn config_path(i: usize) -> String {
    format!("/tmp/ftl2_scale_config_{}.conf", i)
}

pub fn config_content(i: usize) -> String {
    format!("# Config {}\nworkers = {}\nport = {}\n", i, i * 2, 8080 + i)
}

pub struct CopyAndTemplate;

#[async_trait]
impl BenchOperation for CopyAndTemplate {
    fn name(&self) -> &str {
        "copy_and_template"
    }

    fn description(&self) -> &str {
        "Copy 3 config files to all hosts, then clean up"
    }

    async fn run_candidate(&self, engine: &dyn Automation) -> Result<()> {
        for i in 0..CONFIG_COUNT {
            engine
                .copy(&config_path(i), &config_content(i), "0644")
                .await?;
        }
        for i in 0..CONFIG_COUNT {
            engine.file(&config_path(i), FileState::Absent).await?;
        }
        Ok(())
    }
}
