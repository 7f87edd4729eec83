//! QUBO portfolio selection CLI
//!
//! Loads a TOML configuration, builds the QUBO matrix and solves it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use qubo_portfolio::{
    config::{Backend, PortfolioConfig},
    problem::{ConstraintMode, ProblemParameters},
    qubo::build_qubo,
    Pipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qubo-portfolio")]
#[command(about = "Select k assets by solving a mean-variance QUBO")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "portfolio.toml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the selection problem
    Solve {
        /// Override the solver backend (exhaustive, branch_and_bound, annealing)
        #[arg(long)]
        backend: Option<Backend>,
        /// Override the constraint mode (penalty, constrained)
        #[arg(long)]
        mode: Option<ConstraintMode>,
    },
    /// Print the inputs and the QUBO matrix without solving
    Matrix,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = PortfolioConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config))?;

    match cli.command {
        Commands::Solve { backend, mode } => {
            if let Some(backend) = backend {
                config.solver.backend = backend;
            }
            if let Some(mode) = mode {
                config.mode = mode;
            }
            solve(&config)
        }
        Commands::Matrix => show_matrix(&config),
    }
}

fn solve(config: &PortfolioConfig) -> anyhow::Result<()> {
    let params = config.parameters().context("invalid problem parameters")?;
    print_inputs(&params);

    tracing::info!(backend = %config.solver.backend, mode = %config.mode, "solving");
    let pipeline = Pipeline::from_config(config)?;
    let result = pipeline.run(&params).context("selection failed")?;

    println!("\n=== Optimal Portfolio Solution ===");
    println!("Bitstring:          {}", result.bitstring());
    println!("Selected assets:    {:?}", result.selected);
    println!("Objective (x'Qx):   {:.6}", result.objective);
    if let Some(reported) = result.solver_objective {
        println!("Solver objective:   {:.6}", reported);
    }
    if let Some(summary) = result.summary {
        println!(
            "Solver:             {} ({:?}, {} iterations, {:.3}s)",
            summary.backend, summary.status, summary.iterations, summary.solve_time
        );
    }
    Ok(())
}

fn show_matrix(config: &PortfolioConfig) -> anyhow::Result<()> {
    let params = config.parameters().context("invalid problem parameters")?;
    print_inputs(&params);

    let q = build_qubo(&params)?;
    println!("\n=== QUBO Matrix (Q) ===");
    print!("{}", q);
    Ok(())
}

fn print_inputs(params: &ProblemParameters) {
    let assets = params.assets();

    println!("=== Annualised Expected Returns (mu) ===");
    for (symbol, mu) in assets.iter().zip(params.mu().iter()) {
        println!("{:<8} {:>10.4}", symbol, mu);
    }

    println!("\n=== Annualised Covariance Matrix (Sigma) ===");
    let sigma = params.sigma();
    for (i, symbol) in assets.iter().enumerate() {
        let row: Vec<String> = (0..assets.len())
            .map(|j| format!("{:>10.6}", sigma[(i, j)]))
            .collect();
        println!("{:<8} {}", symbol, row.join(" "));
    }

    println!(
        "\nrisk_aversion = {}, cardinality = {}, penalty = {}",
        params.risk_aversion(),
        params.cardinality(),
        params.penalty()
    );
}
