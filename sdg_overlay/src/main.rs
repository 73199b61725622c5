use std::{io, time::Duration};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sdg_engine::donation_objects::DonationIntent;
use sdg_overlay::{
    client::DonationServerClient,
    renderer::TerminalRenderer,
    watch::{watch, WatchOptions},
};
use url::Url;

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Plays donation alerts from a Stream Donation Gateway server")]
pub struct Arguments {
    /// The donation server to connect to
    #[arg(short, long, env = "SDG_SERVER_URL", default_value = "http://127.0.0.1:8360")]
    server: Url,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "watch", about = "Follow the alert stream and play every donation alert in the terminal")]
    Watch(WatchParams),
    #[clap(name = "test", about = "Send a test alert to every connected overlay")]
    TestAlert,
    #[clap(name = "settings", about = "Print the streamer's alert settings")]
    Settings,
    #[clap(name = "health", about = "Check that the donation server is up")]
    Health,
    #[clap(name = "donations", about = "List the most recent donations")]
    Donations {
        /// How many donations to list
        #[arg(short, long)]
        limit: Option<u32>,
    },
    #[clap(name = "donate", about = "Submit a donation and print the checkout link")]
    Donate(DonateParams),
}

#[derive(Debug, Args)]
pub struct WatchParams {
    /// Seconds to wait before reconnecting after the stream drops
    #[arg(short = 'r', long = "retry", default_value = "5")]
    retry_secs: u64,
    /// Exit when the stream drops instead of reconnecting
    #[arg(long = "once")]
    once: bool,
    /// Give up after this many failed connection attempts in a row
    #[arg(long = "max-failures")]
    max_failures: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DonateParams {
    #[arg(short = 'n', long = "name")]
    name: String,
    /// The amount, in whole NT$
    #[arg(short = 'a', long = "amount")]
    amount: i64,
    /// ECPAY or OPAY
    #[arg(short = 'p', long = "method", default_value = "ECPAY")]
    method: String,
    #[arg(short = 'm', long = "message")]
    message: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    let client = match DonationServerClient::new(args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    };
    let result = match args.command {
        Command::Watch(params) => watch_alerts(&client, params).await,
        Command::TestAlert => test_alert(&client).await,
        Command::Settings => print_settings(&client).await,
        Command::Health => health(&client).await,
        Command::Donations { limit } => print_donations(&client, limit).await,
        Command::Donate(params) => donate(&client, params).await,
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn watch_alerts(client: &DonationServerClient, params: WatchParams) -> Result<()> {
    let mut renderer = TerminalRenderer::new(io::stdout());
    let options = WatchOptions {
        retry: Duration::from_secs(params.retry_secs),
        once: params.once,
        max_failures: params.max_failures,
    };
    println!("Watching for donations on {}", client.server());
    watch(client, &mut renderer, options).await
}

async fn test_alert(client: &DonationServerClient) -> Result<()> {
    let event = client.send_test_alert().await?;
    println!("Test alert {} sent", event.id);
    Ok(())
}

async fn print_settings(client: &DonationServerClient) -> Result<()> {
    let settings = client.alert_settings().await?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

async fn health(client: &DonationServerClient) -> Result<()> {
    let response = client.health().await?;
    println!("{}: {response}", client.server());
    Ok(())
}

async fn print_donations(client: &DonationServerClient, limit: Option<u32>) -> Result<()> {
    let donations = client.recent_donations(limit).await?;
    if donations.is_empty() {
        println!("No donations yet");
    }
    for d in donations {
        println!(
            "{}  {:>8}  {:<7}  {:<5}  {}{}",
            d.created_at.format("%Y-%m-%d %H:%M:%S"),
            d.amount.to_string(),
            d.status.to_string(),
            d.payment_method.to_string(),
            d.donor_name,
            d.message.map(|m| format!(": {m}")).unwrap_or_default()
        );
    }
    Ok(())
}

async fn donate(client: &DonationServerClient, params: DonateParams) -> Result<()> {
    let intent = DonationIntent {
        amount: params.amount,
        donor_name: params.name,
        message: params.message,
        payment_method: params.method.to_uppercase(),
    };
    let checkout = client.submit_donation(&intent).await?;
    println!("Donation {} is pending payment", checkout.donation_id);
    println!("Gateway: {}", checkout.action_url);
    println!("Pay at:  {}", client.checkout_link(&checkout.donation_id)?);
    Ok(())
}
