use chronos_client::Client;

use crate::Format;

pub async fn show(client: &Client, name: &str, format: Format) -> anyhow::Result<()> {
    let stat = client.job_stat(name).await?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&stat)?),
        Format::Text => {
            let h = &stat.histogram;
            println!("runs:    {}", h.count);
            println!("mean:    {:.1}", h.mean);
            println!("median:  {:.1}", h.median);
            println!("p75:     {:.1}", h.percentile_75th);
            println!("p95:     {:.1}", h.percentile_95th);
            println!("p98:     {:.1}", h.percentile_98th);
            println!("p99:     {:.1}", h.percentile_99th);
            for task in &stat.task_stat_history {
                println!(
                    "{}  {:<10} {}  {}",
                    task.start_time, task.status, task.slave_id, task.task_id
                );
            }
        }
    }
    Ok(())
}

/// Print the cluster members without contacting the scheduler.
pub fn members(client: &Client, format: Format) -> anyhow::Result<()> {
    let cluster = client.cluster();
    let current = cluster.current_host();

    match format {
        Format::Json => {
            let members: Vec<_> = cluster
                .members()
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "host": m.host(),
                        "active": m.is_active(),
                        "current": current.as_deref() == Some(m.host()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&members)?);
        }
        Format::Text => {
            for member in cluster.members() {
                let marker = if current.as_deref() == Some(member.host()) { "*" } else { " " };
                let state = if member.is_active() { "active" } else { "inactive" };
                println!("{marker} {}://{}  {state}", cluster.protocol(), member.host());
            }
        }
    }
    Ok(())
}
