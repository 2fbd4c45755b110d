use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use fleet_sheet::{ReportConfig, ReportService};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: fleetsheet <config.toml> list\n       fleetsheet <config.toml> update <server-name> <comment> <YYYY-MM-DD>";

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().with_context(|| USAGE.to_owned())?;
    let command = args.next().with_context(|| USAGE.to_owned())?;

    let config = ReportConfig::from_file(&config_path)?;
    info!(workbook = %config.workbook_path.display(), "using inventory document");
    let service = ReportService::new(config);

    match command.as_str() {
        "list" => {
            let records = service.list_all_records()?;
            info!(records = records.len(), "loaded inventory");
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        "update" => {
            let server_name = args.next().context("missing server name")?;
            let comment = args.next().context("missing comment")?;
            let proposed_date = args.next().context("missing proposed date")?;
            let proposed_date = NaiveDate::parse_from_str(&proposed_date, "%Y-%m-%d")
                .context("proposed date must be YYYY-MM-DD")?;
            let record = service.update_record(&server_name, &comment, proposed_date)?;
            println!("{}", serde_json::to_string(&record)?);
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
    Ok(())
}
