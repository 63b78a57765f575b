use portfolio_advisor::{
    advisor::{Advisor, ResponseType},
    config::AdvisorConfig,
    models::AllocationPlan,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn print_plan(plan: &AllocationPlan) {
    println!(
        "\n=== {} RISK PLAN ({}) ===",
        plan.risk_profile.as_str().to_uppercase(),
        plan.projected_return_estimate
    );

    for (title, lines) in [("Lump sum", &plan.lump_sum), ("Monthly SIP", &plan.recurring)] {
        if lines.is_empty() {
            continue;
        }
        println!("\n{}:", title);
        for line in lines.iter() {
            println!(
                "  {:<18} ₹{:>10}  ({:.1}%)",
                line.asset_class.display_name(),
                line.amount,
                line.percentage * 100.0
            );
            for instrument in &line.recommendations {
                println!("      - {}: {}", instrument.name, instrument.details);
            }
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they do not interleave with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = AdvisorConfig::from_env()?;
    let advisor = Advisor::from_config(&config)?;
    let session_id = Uuid::new_v4().to_string();
    info!(session_id = %session_id, "CLI session started");

    println!("Portfolio Advisor. Tell me about your investment goals (Ctrl-D to quit).");

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "exit" | "quit") {
            break;
        }

        match advisor.handle_turn(&session_id, message).await {
            Ok(reply) => {
                println!("{}", reply.content);
                if let (ResponseType::Portfolio, Some(plan)) = (reply.response_type, &reply.portfolio_data) {
                    print_plan(plan);
                }
            }
            Err(e) if e.is_client_error() => println!("Sorry, I couldn't use that: {}", e),
            Err(e) => eprintln!("Turn failed: {}", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}
