use std::io::{self, Read};
use std::time::Duration;

use anyhow::{anyhow, Result};
use ax_architect::client::ArchitectClient;
use ax_architect::extract::split_sections;
use ax_architect::idea::Idea;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ax-architect-cli")]
#[command(about = "CLI client for the AX architect service")]
struct Cli {
    /// Service base URL
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "120")]
    timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Markdown / idea cards
    Pretty,
    /// Raw JSON reply
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Architecture analysis for a role and workflow
    Analyze {
        /// Your role (1-200 characters)
        #[arg(short, long)]
        role: String,

        /// Workflow description (10-2000 characters), "-" reads stdin
        #[arg(short, long)]
        workflow: String,

        /// Print the four report sections separately
        #[arg(long)]
        sections: bool,
    },
    /// Three AX ideas: one Assistant, one Advisor, one Agent
    Ideas {
        #[arg(short, long)]
        business_area: String,

        #[arg(short, long)]
        pain_points: String,

        #[arg(short, long)]
        expectations: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ArchitectClient::new(cli.server.clone(), Duration::from_secs(cli.timeout));

    match cli.command {
        Command::Analyze {
            role,
            workflow,
            sections,
        } => {
            let workflow = if workflow == "-" {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(|e| anyhow!("Failed to read from stdin: {e}"))?;
                buffer
            } else {
                workflow
            };

            eprintln!("분석 중...");
            let reply = client.analyze(&role, &workflow)?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&reply)?),
                Format::Pretty if sections => {
                    // Prefer server-side sections; split locally when the
                    // service runs in raw mode.
                    let sections = reply
                        .sections
                        .unwrap_or_else(|| split_sections(&reply.analysis).sections);
                    for section in sections {
                        println!("[{}. {}]\n{}\n", section.number, section.title, section.content);
                    }
                }
                Format::Pretty => println!("{}", reply.analysis),
            }
        }
        Command::Ideas {
            business_area,
            pain_points,
            expectations,
        } => {
            eprintln!("아이디어 생성 중...");
            let reply = client.generate_ideas(&business_area, &pain_points, &expectations)?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&reply)?),
                Format::Pretty => match reply.cards() {
                    Ok(cards) => cards.iter().for_each(print_card),
                    // Shapes the card layout cannot show are printed as JSON.
                    Err(_) => println!("{}", serde_json::to_string_pretty(&reply)?),
                },
            }
        }
    }

    Ok(())
}

fn print_card(idea: &Idea) {
    println!("── {} · {}", idea.category.as_str(), idea.title);
    println!("{}", idea.description);
    println!("사람의 역할: {}", idea.user_role);
    println!("기대 효과: {}", idea.expected_effect);
    for detail in &idea.effect_details {
        println!("  - {detail}");
    }
    println!("키워드: {}", idea.keywords.join(", "));
    println!("기술: {}", idea.technologies.join(", "));
    println!();
}
