// keylock CLI - check and manage hardware-bound licenses

mod client;
mod machine;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::{ApiClient, LicenseView};
use colored::Colorize;
use keylock_core::Verdict;

/// Exit status when a license check is refused.
const EXIT_REJECTED: i32 = 2;

/// keylock - hardware-bound license keys
#[derive(Parser)]
#[command(name = "keylock")]
#[command(version, about, long_about = None)]
struct Cli {
    /// License server base URL
    #[arg(
        long,
        global = true,
        env = "KEYLOCK_SERVER",
        default_value = "http://127.0.0.1:8080"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print this machine's hardware id
    Hwid,
    /// Check a license key, binding it to this machine on first use
    Check {
        /// License key to check
        key: String,

        /// Hardware id to check against (defaults to this machine's)
        #[arg(long)]
        hwid: Option<String>,
    },
    /// Issue a new license (admin)
    Issue {
        /// Validity in days
        #[arg(short, long, allow_negative_numbers = true)]
        days: i32,
    },
    /// List licenses, newest first (admin)
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,

        #[arg(long, default_value_t = 50)]
        page_size: i64,
    },
    /// Show one license (admin)
    Show { key: String },
    /// Re-enable a license (admin)
    Activate { key: String },
    /// Disable a license without deleting it (admin)
    Deactivate { key: String },
    /// Clear the hardware binding so another machine can claim the key (admin)
    ResetHwid { key: String },
    /// Delete a license (admin)
    Delete { key: String },
}

fn main() {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server);

    let result = match cli.command {
        Commands::Hwid => {
            println!("{}", machine::machine_hwid());
            Ok(())
        }
        Commands::Check { key, hwid } => match cmd_check(&client, &key, hwid) {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(EXIT_REJECTED),
            Err(e) => Err(e),
        },
        Commands::Issue { days } => with_admin(client).and_then(|c| cmd_issue(&c, days)),
        Commands::List { page, page_size } => {
            with_admin(client).and_then(|c| cmd_list(&c, page, page_size))
        }
        Commands::Show { key } => with_admin(client).and_then(|c| {
            print_license(&c.show(&key)?);
            Ok(())
        }),
        Commands::Activate { key } => with_admin(client).and_then(|c| {
            let view = c.set_active(&key, true)?;
            println!("{} License activated", "✓".green().bold());
            print_license(&view);
            Ok(())
        }),
        Commands::Deactivate { key } => with_admin(client).and_then(|c| {
            let view = c.set_active(&key, false)?;
            println!("{} License deactivated", "✓".green().bold());
            print_license(&view);
            Ok(())
        }),
        Commands::ResetHwid { key } => with_admin(client).and_then(|c| {
            let view = c.reset_hwid(&key)?;
            println!("{} Hardware binding cleared", "✓".green().bold());
            print_license(&view);
            Ok(())
        }),
        Commands::Delete { key } => with_admin(client).and_then(|c| {
            c.delete(&key)?;
            println!("{} License deleted", "✓".green().bold());
            Ok(())
        }),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn with_admin(client: ApiClient) -> Result<ApiClient> {
    Ok(client.with_admin_password(client::admin_password()?))
}

/// Returns whether the license was accepted.
fn cmd_check(client: &ApiClient, key: &str, hwid: Option<String>) -> Result<bool> {
    let hwid = hwid.unwrap_or_else(machine::machine_hwid);
    let verdict = client.check(key, &hwid)?;
    print_verdict(&verdict);
    Ok(verdict.is_valid())
}

fn print_verdict(verdict: &Verdict) {
    if verdict.is_valid() {
        println!("{} {}", "✓".green().bold(), "License valid".green());
        if let Some(valid_until) = verdict.valid_until {
            println!(
                "  Valid until: {}",
                keylock_core::format_timestamp(valid_until)
            );
        }
        if let Some(hwid) = &verdict.hwid {
            println!("  Bound to:    {}", hwid);
        }
    } else {
        eprintln!(
            "{} {} ({})",
            "✗".red().bold(),
            "License refused".red(),
            verdict.reason
        );
    }
}

fn cmd_issue(client: &ApiClient, days: i32) -> Result<()> {
    let issued = client.issue(days)?;
    println!("{} License issued", "✓".green().bold());
    println!();
    println!("  Key:         {}", issued.key.bold());
    println!("  Duration:    {} days", issued.duration_days);
    println!("  Created:     {}", issued.created_at);
    println!("  Valid until: {}", issued.valid_until);
    Ok(())
}

fn cmd_list(client: &ApiClient, page: i64, page_size: i64) -> Result<()> {
    let listing = client.list(page, page_size)?;
    if listing.licenses.is_empty() {
        println!("No licenses on page {}", listing.page);
        return Ok(());
    }

    for view in &listing.licenses {
        println!(
            "{}  {}  {}  {}",
            view.key,
            view.valid_until,
            state_label(view),
            view.hwid.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!(
        "Page {} ({} per page), {} licenses total",
        listing.page, listing.page_size, listing.total
    );
    Ok(())
}

fn state_label(view: &LicenseView) -> colored::ColoredString {
    if !view.active {
        "inactive".yellow()
    } else if view.expired {
        "expired".red()
    } else {
        "active".green()
    }
}

fn print_license(view: &LicenseView) {
    println!("  Key:         {}", view.key.bold());
    println!("  State:       {}", state_label(view));
    println!("  Duration:    {} days", view.duration_days);
    println!("  Created:     {}", view.created_at);
    println!("  Valid until: {}", view.valid_until);
    println!("  Hardware id: {}", view.hwid.as_deref().unwrap_or("(unbound)"));
}
