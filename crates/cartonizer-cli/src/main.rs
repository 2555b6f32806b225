use anyhow::Result;
use cartonizer_core::{
    CartonizationRequest, CartonizationResult, Cartonizer, MultiPackageResult,
    OptimizationObjective, Recommendation, SingleResult, SplittingStrategy,
};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cartonizer")]
#[command(about = "Cartonizer - Recommend shipping containers for an order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a container, splitting into several packages when needed
    Recommend {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split the items across several packages
    Split {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Splitting strategy: weight, volume, hybrid, category or fragility (default: try all)
        #[arg(short, long)]
        strategy: Option<SplittingStrategy>,

        /// Objective used to pick among strategies: minimize-packages, minimize-cost or balanced
        #[arg(long)]
        objective: Option<OptimizationObjective>,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend { input, output } => {
            recommend_command(input, output)?;
        }
        Commands::Split {
            input,
            strategy,
            objective,
            output,
        } => {
            split_command(input, strategy, objective, output)?;
        }
    }

    Ok(())
}

fn load_request(input: &Path) -> Result<CartonizationRequest> {
    println!("{}", "🔍 Loading input...".bright_blue());

    let content = std::fs::read_to_string(input)?;
    let request: CartonizationRequest = match input.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };

    let units = unit_count(request.items.iter().map(|item| item.quantity));
    println!(
        "  {} items ({} units) to ship",
        request.items.len().to_string().bright_white().bold(),
        units
    );
    println!(
        "  {} container types available",
        request.containers.len().to_string().bright_white().bold()
    );
    println!();

    Ok(request)
}

fn recommend_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let request = load_request(&input)?;

    println!("{}", "🚀 Running cartonization...".bright_blue());

    let cartonizer = Cartonizer::new(request)?;
    let Some(result) = cartonizer.recommend() else {
        println!();
        println!(
            "{}",
            "⚠️  No suitable container found, manual packing required"
                .bright_red()
                .bold()
        );
        return Ok(());
    };

    println!();
    println!("{}", "✅ Cartonization complete!".bright_green().bold());
    println!();

    print_result(&result);
    write_output(&result, output)
}

fn split_command(
    input: PathBuf,
    strategy: Option<SplittingStrategy>,
    objective: Option<OptimizationObjective>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut request = load_request(&input)?;
    if let Some(objective) = objective {
        request.parameters.optimization_objective = objective;
    }
    // The flag wins over a strategy pinned in the input file.
    let strategy = strategy.or(request.parameters.splitting_strategy);

    match strategy {
        Some(strategy) => println!(
            "{} {}",
            "✂️  Splitting with strategy".bright_blue(),
            strategy.to_string().bright_white()
        ),
        None => println!("{}", "✂️  Trying every splitting strategy...".bright_blue()),
    }

    let cartonizer = Cartonizer::new(request)?;
    let Some(plan) = cartonizer.split(strategy) else {
        println!();
        println!(
            "{}",
            "⚠️  No strategy produced a valid multi-package plan"
                .bright_red()
                .bold()
        );
        return Ok(());
    };

    println!();
    println!("{}", "✅ Split complete!".bright_green().bold());
    println!();

    print_multi(&plan);
    write_output(&plan, output)
}

fn print_result(result: &CartonizationResult) {
    println!("{}", "📊 Results:".bright_yellow().bold());
    match &result.detail {
        Recommendation::Single(single) => print_single(single),
        Recommendation::Multi(multi) => print_multi(multi),
    }
}

fn print_single(result: &SingleResult) {
    println!(
        "  Recommended container: {} ({})",
        result.recommended_container.id.bright_white().bold(),
        result.recommended_container.name
    );
    println!("  Utilization: {:.1}%", result.utilization);
    println!("  Confidence: {}", confidence_label(result.confidence));
    println!(
        "  Billable weight: {:.2} (actual {:.2}, dimensional {:.2})",
        result.billable_weight, result.total_weight, result.dimensional_weight
    );
    println!(
        "  Cost: {}",
        format!("{:.2}", result.recommended_container.cost).bright_white()
    );

    if !result.alternatives.is_empty() {
        println!();
        println!("  Alternatives:");
        for alt in &result.alternatives {
            println!(
                "    • {}: {:.1}% full, cost {:.2}, confidence {:.1}",
                alt.container.id.bright_cyan(),
                alt.utilization,
                alt.cost,
                alt.confidence
            );
        }
    }
    println!();
}

fn print_multi(result: &MultiPackageResult) {
    println!(
        "  Packages: {} (strategy {}, objective {})",
        result.total_packages.to_string().bright_white().bold(),
        result.splitting_strategy,
        result.optimization_objective
    );
    for (index, package) in result.packages.iter().enumerate() {
        let units = unit_count(package.assigned_items.iter().map(|a| a.quantity));
        println!(
            "    {}. {}: {} units, {:.2} weight, {:.1}% full",
            index + 1,
            package.container.id.bright_white(),
            units,
            package.package_weight,
            package.utilization
        );
    }
    println!("  Total cost: {:.2}", result.total_cost);
    println!("  Total billable weight: {:.2}", result.total_billable_weight);
    println!("  Confidence: {}", confidence_label(result.confidence));
    println!();
}

/// Sums quantities without overflowing on very large orders.
fn unit_count(quantities: impl Iterator<Item = u32>) -> u64 {
    quantities.map(u64::from).sum()
}

fn confidence_label(confidence: f64) -> ColoredString {
    let label = format!("{:.1}", confidence);
    if confidence >= 80.0 {
        label.bright_green()
    } else if confidence >= 60.0 {
        label.bright_yellow()
    } else {
        label.bright_red()
    }
}

fn write_output<T: Serialize>(value: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_count_does_not_overflow() {
        let quantities = [u32::MAX, u32::MAX, 2];
        assert_eq!(
            unit_count(quantities.into_iter()),
            2 * u64::from(u32::MAX) + 2
        );
    }

    #[test]
    fn test_split_uses_strategy_pinned_in_input() {
        let dir = std::env::temp_dir().join(format!("cartonizer-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("pinned.yaml");
        let output = dir.join("plan.json");
        std::fs::write(
            &input,
            r#"
items:
  - id: kettlebell
    length: 6.0
    width: 6.0
    height: 6.0
    weight: 8.0
    quantity: 12
containers:
  - id: half-crate
    name: Half Crate
    length: 12.0
    width: 6.0
    height: 6.0
    max_weight: 45.0
    cost: 1.5
    in_stock: 30
  - id: crate
    name: Crate
    length: 12.0
    width: 12.0
    height: 9.0
    max_weight: 45.0
    cost: 3.0
    in_stock: 30
parameters:
  max_package_weight: 45
  splitting_strategy: hybrid
"#,
        )
        .unwrap();

        split_command(input.clone(), None, None, Some(output.clone())).unwrap();
        let plan: MultiPackageResult =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(plan.splitting_strategy, SplittingStrategy::Hybrid);

        split_command(input, Some(SplittingStrategy::Weight), None, Some(output.clone())).unwrap();
        let plan: MultiPackageResult =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(plan.splitting_strategy, SplittingStrategy::Weight);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
