use std::path::Path;

use chronos_client::{Client, Job, JobType};

use crate::Format;

pub async fn list(client: &Client, format: Format) -> anyhow::Result<()> {
    let jobs = client.jobs().await?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&jobs)?),
        Format::Text => {
            println!(
                "{:<32} {:<11} {:>8} {:>8}  SCHEDULE / PARENTS",
                "NAME", "TYPE", "SUCCESS", "ERRORS"
            );
            for job in &jobs {
                println!(
                    "{:<32} {:<11} {:>8} {:>8}  {}",
                    job.name,
                    type_label(job),
                    job.success_count,
                    job.error_count,
                    trigger(job),
                );
            }
        }
    }
    Ok(())
}

pub async fn show(client: &Client, name: &str, format: Format) -> anyhow::Result<()> {
    let job = client.job(name).await?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&job)?),
        Format::Text => {
            println!("name:        {}", job.name);
            println!("type:        {}", type_label(&job));
            println!("trigger:     {}", trigger(&job));
            println!("command:     {}", job.command);
            println!("owner:       {}", job.owner);
            println!("disabled:    {}", job.disabled);
            println!("resources:   cpus={} mem={} disk={}", job.cpus, job.memory, job.disk);
            println!("successes:   {} (last {})", job.success_count, job.last_success);
            println!("errors:      {} (last {})", job.error_count, job.last_error);
        }
    }
    Ok(())
}

pub async fn create(client: &Client, file: &Path) -> anyhow::Result<()> {
    let job = read_job(file)?;
    client.create_job(&job).await?;
    println!("✓ Created job {}", job.name);
    Ok(())
}

pub async fn update(client: &Client, file: &Path) -> anyhow::Result<()> {
    let job = read_job(file)?;
    client.update_job(&job).await?;
    println!("✓ Updated job {}", job.name);
    Ok(())
}

pub async fn run(client: &Client, name: &str) -> anyhow::Result<()> {
    client.run_job(name).await?;
    println!("✓ Triggered job {name}");
    Ok(())
}

pub async fn delete(client: &Client, name: &str) -> anyhow::Result<()> {
    client.delete_job(name).await?;
    println!("✓ Deleted job {name}");
    Ok(())
}

pub async fn kill(client: &Client, name: &str) -> anyhow::Result<()> {
    client.kill_job(name).await?;
    println!("✓ Killed tasks of job {name}");
    Ok(())
}

/// Read and validate a job definition.
fn read_job(file: &Path) -> anyhow::Result<Job> {
    let content = std::fs::read_to_string(file)?;
    let job: Job = serde_json::from_str(&content)?;
    job.sanity_check()?;
    Ok(job)
}

fn type_label(job: &Job) -> &'static str {
    match job.job_type() {
        JobType::ScheduleBased => "schedule",
        JobType::DependencyBased => "dependency",
        JobType::Unknown => "unknown",
    }
}

fn trigger(job: &Job) -> String {
    match job.job_type() {
        JobType::ScheduleBased => job.schedule.clone(),
        JobType::DependencyBased => job.parents.join(","),
        JobType::Unknown => "-".to_string(),
    }
}
