mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use skill_check::analyze::analyze_with;
use skill_check::config::{self, Config};
use skill_check::finding::{Report, Severity, Signal};
use skill_check::layers;
use skill_check::output::{self, OutputFormat};
use skill_check::source::{self, Target};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Check {
            target,
            format,
            output: output_path,
            strict,
            config: config_path,
        } => {
            let config = load_config(config_path.as_deref(), strict);

            let target = Target::parse(&target).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            if let Target::Local(path) = &target {
                if path.is_dir() {
                    eprintln!("Error: '{}' is a directory.", path.display());
                    eprintln!();
                    eprintln!("To check every SKILL.md inside it:");
                    eprintln!("  skill-check check-all {}", path.display());
                    std::process::exit(2);
                }
            }

            let report = run_check(&target, &config).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });
            let formatted = render(&report, format);

            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            std::process::exit(if report.fails(config.strict.enabled) { 1 } else { 0 });
        }

        Commands::CheckAll {
            path,
            format,
            strict,
            config: config_path,
        } => {
            if !path.is_dir() {
                eprintln!("Error: not a directory: {}", path.display());
                std::process::exit(2);
            }

            let files = source::find_skill_files(&path);
            if files.is_empty() {
                eprintln!("Error: no SKILL.md files found under '{}'", path.display());
                std::process::exit(2);
            }

            let config = load_config(config_path.as_deref(), strict);

            let mut reports: Vec<Report> = Vec::new();
            let mut errors: Vec<PathBuf> = Vec::new();
            for file in files {
                let target = Target::Local(file.clone());
                match run_check(&target, &config) {
                    Ok(report) => {
                        print!("{}", render(&report, format));
                        reports.push(report);
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        errors.push(file);
                    }
                }
            }

            if format == OutputFormat::Markdown {
                print!(
                    "{}",
                    format_collection_summary(&path, &reports, config.strict.enabled)
                );
            }

            if !errors.is_empty() {
                std::process::exit(2);
            }
            let any_failed = reports.iter().any(|r| r.fails(config.strict.enabled));
            std::process::exit(if any_failed { 1 } else { 0 });
        }

        Commands::ListRules => {
            let rules = layers::all_rules();
            println!("{}", "Built-in Rules".bold().underline());
            println!();

            let mut current_layer = None;
            for rule in &rules {
                if current_layer != Some(rule.layer) {
                    if current_layer.is_some() {
                        println!();
                    }
                    println!("  {}", rule.layer.as_str().bold());
                    current_layer = Some(rule.layer);
                }

                println!(
                    "    [{severity}] {id:<32} {message}",
                    severity = colored_severity(rule.severity),
                    id = rule.id,
                    message = rule.message,
                );
            }

            println!();
            println!("  Total: {} rules", rules.len());
        }

        Commands::Explain { rule_id } => match layers::find_rule(&rule_id) {
            Some(rule) => {
                println!("{}", rule.id.bold());
                println!();
                println!("  Layer:        {}", rule.layer);
                println!("  Severity:     {}", rule.severity);
                println!("  Description:  {}", rule.message);
                println!("  Remediation:  {}", rule.remediation);
            }
            None => {
                eprintln!("Unknown rule: {rule_id}");
                eprintln!("Use 'skill-check list-rules' to see all available rules.");
                std::process::exit(2);
            }
        },
    }
}

fn load_config(path: Option<&Path>, strict: bool) -> Config {
    let mut config = Config::load(path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });
    if strict {
        config.strict.enabled = true;
    }
    config
}

fn run_check(target: &Target, config: &Config) -> Result<Report, source::SourceError> {
    let content = target.load(config.limits.max_bytes)?;
    let suppressions = target
        .suppression_dir()
        .map(config::load_suppressions)
        .unwrap_or_default();
    Ok(analyze_with(&content, &target.label(), config, &suppressions))
}

fn render(report: &Report, format: OutputFormat) -> String {
    output::format_report(report, format).unwrap_or_else(|e| {
        eprintln!("Error formatting report: {e}");
        std::process::exit(2);
    })
}

fn colored_severity(severity: Severity) -> String {
    match severity {
        Severity::High => "  HIGH".red().bold().to_string(),
        Severity::Medium => "MEDIUM".yellow().bold().to_string(),
        Severity::Low => "   LOW".cyan().to_string(),
        Severity::Info => "  INFO".blue().to_string(),
    }
}

/// Renders a compact table after all individual reports have been printed.
fn format_collection_summary(root: &Path, reports: &[Report], strict: bool) -> String {
    let mut out = String::new();
    let separator = "─".repeat(60);

    out.push('\n');
    out.push_str(&format!(
        "{}\n",
        format!(
            "  Collection Summary: {}  ({} files)",
            root.display(),
            reports.len()
        )
        .bold()
        .underline()
    ));
    out.push_str(&format!("{}\n", separator.dimmed()));

    let mut n_dangerous = 0usize;
    let mut n_suspicious = 0usize;
    let mut n_safe = 0usize;

    for report in reports {
        let (icon, signal) = match report.signal {
            Signal::Dangerous => {
                n_dangerous += 1;
                ("✗".red().to_string(), "DANGEROUS ".red().bold().to_string())
            }
            Signal::Suspicious => {
                n_suspicious += 1;
                let icon = if strict {
                    "✗".red().to_string()
                } else {
                    "⚠".yellow().to_string()
                };
                (icon, "SUSPICIOUS".yellow().bold().to_string())
            }
            Signal::Safe => {
                n_safe += 1;
                ("✓".green().to_string(), "SAFE      ".green().bold().to_string())
            }
        };

        let (high, medium, low, info) = report.count_by_severity();
        let name = report
            .file
            .strip_prefix(&format!("{}/", root.display()))
            .unwrap_or(&report.file);
        out.push_str(&format!(
            "  {icon}  {name:<30} {signal}  {high}H {medium}M {low}L {info}I\n"
        ));
    }

    out.push_str(&format!("{}\n", separator.dimmed()));
    out.push_str(&format!(
        "  Total: {}  {}  {}\n",
        format!("{n_dangerous} dangerous").red().bold(),
        format!("{n_suspicious} suspicious").yellow().bold(),
        format!("{n_safe} safe").green().bold(),
    ));

    out
}
