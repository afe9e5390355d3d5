//! beltools CLI: analysis toolkit for BEL knowledge graphs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use beltools_core::analysis::causalr::{get_observations, rank_causalr_hypothesis, Hypothesis};
use beltools_core::assembler::ideogram;
use beltools_core::config::{Analysis, AnalysisConfig, AnalysisResult};
use beltools_core::graph::io::{load_input, read_expression_data, write_graph};
use beltools_core::graph::parse_node;
use beltools_core::graph::summary::summarize;
use beltools_core::mutation::overlay_data;
use beltools_core::output::write_output;
use beltools_core::pipeline::{self, Pipeline};
use beltools_core::{BelError, Result};

#[derive(Parser)]
#[command(name = "beltools", version, about = "Analysis toolkit for BEL knowledge graphs")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print node, edge and stability counts for a graph
    Summarize {
        /// Graph JSON file or directory of graphs
        graph: PathBuf,
    },

    /// Run the configured analyses and write a JSON report
    Analyze {
        /// Graph JSON file or directory of graphs
        graph: PathBuf,

        /// Expression data JSON to overlay
        #[arg(long)]
        data: Option<String>,

        /// Node data key holding the experimental values
        #[arg(long)]
        key: Option<String>,

        /// Comma-separated analyses to run
        #[arg(long)]
        analyses: Option<String>,

        /// Heat diffusion runs per candidate mechanism
        #[arg(long)]
        runs: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// TOML config file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<String>,

        /// Suppress all output except errors
        #[arg(long)]
        quiet: bool,
    },

    /// Score the up and down hypotheses of one regulator
    Causalr {
        graph: PathBuf,

        #[arg(long)]
        data: PathBuf,

        /// Regulator node, e.g. "p(HGNC:TNF)"
        #[arg(long)]
        regulator: String,

        #[arg(long, default_value = "weight")]
        key: String,

        #[arg(long, default_value = "0.0")]
        cutoff: f64,
    },

    /// Apply a transformation protocol and write the resulting graph
    Pipeline {
        graph: PathBuf,

        /// Protocol JSON file
        #[arg(long)]
        protocol: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render an ideogram HTML page of the graph's genes
    Ideogram {
        graph: PathBuf,

        /// Gene location JSON keyed by symbol
        #[arg(long)]
        locations: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Summarize { graph } => run_summarize(&graph),
        Commands::Analyze {
            graph,
            data,
            key,
            analyses,
            runs,
            seed,
            config,
            output,
            quiet,
        } => {
            let overrides = AnalyzeArgs {
                graph,
                data,
                key,
                analyses,
                runs,
                seed,
                output,
                quiet,
            };
            build_config(config.as_deref(), overrides, cli.verbose > 0).and_then(|(config, output_path)| {
                if config.quiet {
                    run_quiet(&config, &output_path)
                } else {
                    run_with_progress(&config, &output_path)
                }
            })
        }
        Commands::Causalr {
            graph,
            data,
            regulator,
            key,
            cutoff,
        } => run_causalr(&graph, &data, &regulator, &key, cutoff),
        Commands::Pipeline {
            graph,
            protocol,
            output,
        } => run_protocol(&graph, &protocol, &output),
        Commands::Ideogram {
            graph,
            locations,
            output,
        } => run_ideogram(&graph, &locations, &output),
    };

    if let Err(e) = outcome {
        eprintln!("{} {e}", style("error:").red().bold());
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("BELTOOLS_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct AnalyzeArgs {
    graph: PathBuf,
    data: Option<String>,
    key: Option<String>,
    analyses: Option<String>,
    runs: Option<usize>,
    seed: Option<u64>,
    output: Option<String>,
    quiet: bool,
}

fn build_config(path: Option<&Path>, args: AnalyzeArgs, verbose: bool) -> Result<(AnalysisConfig, String)> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_toml_file(path)?,
        None => AnalysisConfig::default(),
    };

    let input = args.graph.canonicalize().unwrap_or(args.graph);
    config.input_path = input.to_string_lossy().to_string();
    if args.data.is_some() {
        config.data_path = args.data;
    }
    if let Some(key) = args.key {
        config.key = key;
    }
    if let Some(analyses) = args.analyses {
        config.analyses = analyses
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| Analysis::from_str_value(s).ok_or_else(|| BelError::InvalidArgument(format!("unknown analysis '{s}'"))))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(runs) = args.runs {
        config.heat_runs = runs;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.verbose |= verbose;
    config.quiet |= args.quiet;

    let output_path = args
        .output
        .or_else(|| config.output_path.clone())
        .unwrap_or_else(|| format!("{}.beltools.json", graph_name(&input)));
    config.output_path = Some(output_path.clone());

    Ok((config, output_path))
}

fn graph_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "graph".to_string())
}

fn run_quiet(config: &AnalysisConfig, output_path: &str) -> Result<()> {
    let result = pipeline::run_pipeline(config, None)?;
    write_output(&result, output_path)
}

fn run_with_progress(config: &AnalysisConfig, output_path: &str) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message("Initialising...");
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let progress: pipeline::ProgressCallback = {
        let pb = pb.clone();
        Box::new(move |_name, label| {
            pb.set_message(label.to_string());
        })
    };

    let start = Instant::now();
    let result = pipeline::run_pipeline(config, Some(progress));
    pb.finish_and_clear();
    let result = result?;

    println!(
        "\n{}  BEL Analysis: {}",
        style("✓").green().bold(),
        style(graph_name(Path::new(&config.input_path))).bold()
    );
    print_stat(&result, "Nodes:", "nodes");
    print_stat(&result, "Edges:", "edges");
    print_stat(&result, "Overlaid:", "overlaid_values");
    if let Some(rcr) = &result.rcr {
        println!("  {:<14} {}", "RCR rows:", rcr.len());
    }
    if let Some(concordance) = &result.concordance {
        println!(
            "  {:<14} {:.3} (p = {:.3})",
            "Concordance:", concordance.score, concordance.p_value
        );
    }

    println!(
        "  {:<14} {:.1}ms",
        "Duration:",
        start.elapsed().as_secs_f64() * 1000.0
    );

    if config.verbose {
        if let Some(serde_json::Value::Object(timings)) = result.metadata.get("phase_timings") {
            println!("\n  Phase Timings:");
            for (phase, secs) in timings {
                if let Some(val) = secs.as_f64() {
                    println!("    {:<14} {:.1}ms", phase, val * 1000.0);
                }
            }
        }
    }

    write_output(&result, output_path)?;
    println!("\n  {} {}", style("Output written to:").green(), output_path);
    Ok(())
}

fn print_stat(result: &AnalysisResult, label: &str, key: &str) {
    println!(
        "  {:<14} {}",
        label,
        result.stats.get(key).unwrap_or(&serde_json::json!(0))
    );
}

fn run_summarize(path: &Path) -> Result<()> {
    let graph = load_input(path)?;
    let summary = summarize(&graph);

    println!(
        "{}  {}",
        style("✓").green().bold(),
        style(summary.name.clone().unwrap_or_else(|| graph_name(path))).bold()
    );
    println!("  {:<14} {}", "Nodes:", summary.nodes);
    println!("  {:<14} {}", "Edges:", summary.edges);
    println!("  {:<14} {}", "Contradictions:", summary.contradictions);

    for (title, counts) in [
        ("Functions", &summary.functions),
        ("Relations", &summary.relations),
        ("Namespaces", &summary.namespaces),
        ("Stability", &summary.stability),
    ] {
        println!("\n  {}", style(title).cyan());
        for (name, count) in counts {
            println!("    {name:<28} {count}");
        }
    }
    Ok(())
}

fn run_causalr(graph_path: &Path, data: &Path, regulator: &str, key: &str, cutoff: f64) -> Result<()> {
    let mut graph = load_input(graph_path)?;
    let data = read_expression_data(data)?;
    overlay_data(&mut graph, &data, key);

    let regulator = parse_node(regulator)?;
    if !graph.has_node(&regulator) {
        return Err(BelError::NodeNotFound(regulator.to_string()));
    }
    let observations = get_observations(&graph, key, cutoff);
    let (up, down) = rank_causalr_hypothesis(&graph, &observations, &regulator);

    println!("{}  {}", style("✓").green().bold(), style(&regulator).bold());
    print_hypothesis("Up:", &up);
    print_hypothesis("Down:", &down);
    Ok(())
}

fn print_hypothesis(label: &str, h: &Hypothesis) {
    println!(
        "  {:<6} score {:>4}  correct {:>4}  incorrect {:>4}  ambiguous {:>4}",
        label, h.score, h.correct, h.incorrect, h.ambiguous
    );
}

fn run_protocol(graph_path: &Path, protocol: &Path, output: &Path) -> Result<()> {
    let graph = load_input(graph_path)?;
    let pipeline = Pipeline::from_json_file(protocol)?;
    let result = pipeline.run(&graph)?;
    write_graph(&result, output)?;

    println!(
        "{}  {} nodes, {} edges",
        style("✓").green().bold(),
        result.node_count(),
        result.edge_count()
    );
    println!("  {} {}", style("Output written to:").green(), output.display());
    Ok(())
}

fn run_ideogram(graph_path: &Path, locations: &Path, output: &Path) -> Result<()> {
    let graph = load_input(graph_path)?;
    let locations = ideogram::read_gene_locations(locations)?;
    let html = ideogram::render(&graph, &locations)?;
    std::fs::write(output, html)?;

    println!("  {} {}", style("Output written to:").green(), output.display());
    Ok(())
}
