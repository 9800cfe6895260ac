use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "relay-test-client")]
#[command(about = "End-to-end checks against a running site relay")]
struct Cli {
    /// Base URL of the relay (e.g., http://localhost:9010)
    #[arg(long, default_value = "http://localhost:9010")]
    base_url: String,

    /// Shared secret configured on the relay (BUTTON_SECRET)
    #[arg(long, env = "BUTTON_SECRET")]
    secret: String,

    /// Origin header sent by the admin panels (omitted when unset)
    #[arg(long)]
    origin: Option<String>,

    /// Origin that the relay is expected to reject (origin-rejection scenario only)
    #[arg(long, default_value = "https://relay-test-client.invalid")]
    foreign_origin: String,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, PartialEq)]
enum ScenarioChoice {
    /// Open two admin panels and check their greetings
    ConnectionTest,
    /// Post an event and verify both panels receive it verbatim
    Broadcast,
    /// Post an event without type/who and verify the defaults
    Defaults,
    /// Post with a wrong or missing secret and verify nothing is broadcast
    Unauthorized,
    /// Verify a panel that connects after a broadcast does not receive it
    LateJoiner,
    /// Verify a foreign origin is rejected on both ingress and stream
    /// (requires ALLOWED_ORIGINS to be set on the relay)
    OriginRejection,
    /// Run every scenario except origin-rejection
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());

    println!("{} Connecting admin panels...", "→".blue());
    let origin = cli.origin.as_deref();
    let mut panel1 = Connection::establish(&cli.base_url, origin, "Panel 1".to_string()).await?;
    let mut panel2 = Connection::establish(&cli.base_url, origin, "Panel 2".to_string()).await?;
    println!("{} Panel 1 connected", "✓".green());
    println!("{} Panel 2 connected", "✓".green());

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();
    let run = |choice: ScenarioChoice| cli.scenario == choice || cli.scenario == ScenarioChoice::All;

    if run(ScenarioChoice::ConnectionTest) {
        results.push(scenarios::test_connection(&panel1, &panel2).await?);
    }
    if run(ScenarioChoice::Broadcast) {
        results.push(
            scenarios::test_broadcast(&api_client, &cli.secret, &mut panel1, &mut panel2).await?,
        );
    }
    if run(ScenarioChoice::Defaults) {
        results.push(scenarios::test_defaults(&api_client, &cli.secret, &mut panel1).await?);
    }
    if run(ScenarioChoice::Unauthorized) {
        results.push(scenarios::test_unauthorized(&api_client, &mut panel1).await?);
    }
    if run(ScenarioChoice::LateJoiner) {
        results.push(scenarios::test_late_joiner(&api_client, &cli.base_url, &cli.secret).await?);
    }
    if cli.scenario == ScenarioChoice::OriginRejection {
        results.push(
            scenarios::test_origin_rejection(
                &api_client,
                &cli.secret,
                &cli.foreign_origin,
                &mut panel1,
            )
            .await?,
        );
    }

    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
