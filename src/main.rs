//! covsteer - coverage-steered test selection for GPU shader-core
//! verification
//!
//! Thin command-line dispatcher over the analysis and suggestion engine in
//! `covsteer-coverage` and `covsteer-ml`. All logic lives in those crates.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use covsteer_coverage::{DomainConfig, TestSpec};
use covsteer_ml::TestOptimizer;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;

/// Coverage-steered test selection
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List coverage gaps by domain
    Gaps {
        /// Coverage snapshot file
        data: PathBuf,
    },

    /// Show the coverage summary
    Summary {
        /// Coverage snapshot file
        data: PathBuf,
    },

    /// Show the cumulative coverage trend over the test history
    Trend {
        /// Coverage snapshot file
        data: PathBuf,
    },

    /// Suggest gap-targeted tests (no ranking)
    Suggest {
        /// Coverage snapshot file
        data: PathBuf,
    },

    /// Train the scoring model from the test history
    Train {
        /// Coverage snapshot file
        data: PathBuf,
    },

    /// Suggest the next test, ranked by predicted coverage increase
    Next {
        /// Coverage snapshot file
        data: PathBuf,

        /// Seed for the exploratory candidate RNG
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Record an executed test result and save the history
    Add {
        /// Coverage snapshot file
        data: PathBuf,

        /// Test specification as JSON
        test: String,

        /// Coverage increase mapping as JSON
        increase: String,
    },

    /// Report per-test effectiveness over the history
    Effectiveness {
        /// Coverage snapshot file
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = Arc::new(DomainConfig::default());

    match cli.command {
        Commands::Gaps { data } => {
            let optimizer = TestOptimizer::open(data, config);
            let gaps = optimizer.identify_gaps();
            if gaps.is_empty() {
                println!("No coverage gaps");
                return Ok(());
            }
            println!("Coverage Gaps");
            println!("{}", "=".repeat(60));
            for (domain, items) in &gaps {
                println!("\n{} ({} gaps):", domain.to_uppercase(), items.len());
                for item in items.iter().take(10) {
                    println!("  - {item}");
                }
                if items.len() > 10 {
                    println!("  ... and {} more", items.len() - 10);
                }
            }
        }

        Commands::Summary { data } => {
            let optimizer = TestOptimizer::open(data, config);
            print!("{}", optimizer.coverage_summary());
        }

        Commands::Trend { data } => {
            let optimizer = TestOptimizer::open(data, config);
            match optimizer.analyze_trend() {
                Some(trend) => {
                    println!("Coverage Trend");
                    println!("{}", "=".repeat(60));
                    println!("  Tests run:  {}", trend.len());
                    println!("  Final cumulative coverage:");
                    if let Some(last) = trend.overall.last() {
                        println!("    {:<11} {:6.2}%", "overall:", last);
                    }
                    for (domain, series) in &trend.domains {
                        if let Some(last) = series.last() {
                            println!("    {:<11} {:6.2}%", format!("{domain}:"), last);
                        }
                    }
                }
                None => println!("No trend data available"),
            }
        }

        Commands::Suggest { data } => {
            let optimizer = TestOptimizer::open(data, config);
            let tests = optimizer.suggest_for_gaps();
            println!("Suggested Tests ({} total)", tests.len());
            println!("{}", "=".repeat(60));
            for (index, test) in tests.iter().take(10).enumerate() {
                println!(
                    "  #{} {} targeting {}",
                    index + 1,
                    test.type_tag(),
                    test.target()
                );
            }
            if tests.len() > 10 {
                println!("  ... and {} more tests", tests.len() - 10);
            }
        }

        Commands::Train { data } => {
            let mut optimizer = TestOptimizer::open(data, config);
            optimizer.train().context("training failed")?;
            println!("Model trained and saved");
        }

        Commands::Next { data, seed } => {
            let optimizer = TestOptimizer::open(data, config);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            match optimizer.suggest_next(&mut rng) {
                Some(test) => {
                    println!("Suggested Next Test");
                    println!("{}", "=".repeat(60));
                    println!("{}", serde_json::to_string_pretty(&test)?);
                }
                None => println!("Could not generate a test suggestion"),
            }
        }

        Commands::Add {
            data,
            test,
            increase,
        } => {
            let test: TestSpec =
                serde_json::from_str(&test).context("invalid test specification JSON")?;
            let increase: IndexMap<String, f64> =
                serde_json::from_str(&increase).context("invalid coverage increase JSON")?;

            let mut optimizer = TestOptimizer::open(data, config);
            optimizer.add_test_result(test, increase);
            optimizer.save().context("failed to save coverage data")?;
            println!(
                "Test result added, history now has {} entries",
                optimizer.history().len()
            );
        }

        Commands::Effectiveness { data } => {
            let optimizer = TestOptimizer::open(data, config);
            match optimizer.analyze_effectiveness() {
                Some(mut report) => {
                    // Most effective tests first
                    report.sort_by(|a, b| b.new_points.cmp(&a.new_points));
                    println!("Test Effectiveness");
                    println!("{}", "=".repeat(60));
                    for test in &report {
                        println!("\n{} ({})", test.name, test.kind);
                        println!("  New coverage points:     {}", test.new_points);
                        println!("  Total coverage increase: {:.2}", test.total_increase);
                        for (domain, count) in &test.domains_covered {
                            println!("    - {domain}: {count} points");
                        }
                    }
                }
                None => println!("No test effectiveness data available"),
            }
        }
    }

    Ok(())
}
