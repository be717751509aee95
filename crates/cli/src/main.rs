use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, warn};

use gcs_optimizer_core::apply::{plan_apply, ApplyPlan};
use gcs_optimizer_core::config::{Config, CONFIG_FILE_NAME};
use gcs_optimizer_core::report::Report;
use gcs_optimizer_core::types::Action;
use gcs_optimizer_core::{analyze_path, AnalyzeOptions};

#[derive(Parser, Debug)]
#[command(
    name = "gcs-optimizer",
    version,
    about = "Cloud Storage cost optimizer (estimated)"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(visible_alias = "analyse")]
    Analyze {
        /// Inventory JSON file, or a directory of them
        #[arg(long)]
        inventory: PathBuf,

        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Service account key used by the generated apply script
        #[arg(long, short = 'c')]
        credentials: Option<PathBuf>,

        #[arg(long, short = 'a')]
        apply: bool,

        #[arg(long)]
        auto_approve: bool,

        #[arg(long, short = 'e')]
        export: Option<PathBuf>,

        #[arg(long)]
        markdown: Option<PathBuf>,

        #[arg(long)]
        baseline: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Analysis time (RFC 3339); defaults to the current UTC time
        #[arg(long)]
        now: Option<String>,

        #[arg(long)]
        strict: bool,

        #[arg(long, default_value = "gcs-optimizer-out")]
        out: PathBuf,
    },
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    blue: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    blue: "\x1b[38;5;33m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    blue: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

struct RunArgs {
    inventory: PathBuf,
    project: Option<String>,
    credentials: Option<PathBuf>,
    apply: bool,
    auto_approve: bool,
    export: Option<PathBuf>,
    markdown: Option<PathBuf>,
    baseline: Option<PathBuf>,
    strict: bool,
    out: PathBuf,
}

fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let res = match cli.cmd {
        Commands::Analyze {
            inventory,
            project,
            credentials,
            apply,
            auto_approve,
            export,
            markdown,
            baseline,
            config,
            now,
            strict,
            out,
        } => {
            let cfg = load_config(config.as_deref());
            let args = RunArgs {
                inventory,
                project: project.or_else(|| cfg.project_id.clone()),
                credentials: resolve_credentials(credentials),
                apply,
                auto_approve,
                export,
                markdown,
                baseline,
                strict: strict || cfg.strict.unwrap_or(false),
                out,
            };
            parse_now(now.as_deref()).and_then(|now| run_analyze(args, &cfg, now))
        }
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}gcs{reset}{blue}|{reset}{dim}optimizer{reset}  {dim}storage cost report{reset}\n",
        bold = s.bold,
        blue = s.blue,
        dim = s.dim,
        reset = s.reset,
    );
}

fn savings_color(percent: f64) -> &'static str {
    let s = style();
    if percent >= 30.0 {
        s.green
    } else if percent > 0.0 {
        s.yellow
    } else {
        s.dim
    }
}

fn commas(n: u64) -> String {
    let s = n.to_string();
    let bytes = s.as_bytes();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(b as char);
    }
    result
}

fn parse_now(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(r) => DateTime::parse_from_rfc3339(r)
            .map(|t| t.with_timezone(&Utc))
            .with_context(|| format!("invalid --now `{r}`, expected RFC 3339")),
        None => Ok(Utc::now()),
    }
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| {
            eprintln!(
                "{}{}warning:{} failed to load config {}: {:#}",
                style().bold,
                style().yellow,
                style().reset,
                p.display(),
                e
            );
            Config::default()
        }),
        None => match Config::discover() {
            Some(Ok(cfg)) => {
                debug!("using ./{CONFIG_FILE_NAME}");
                cfg
            }
            Some(Err(e)) => {
                warn!("ignoring ./{CONFIG_FILE_NAME}: {e:#}");
                Config::default()
            }
            None => Config::default(),
        },
    }
}

fn resolve_credentials(cli: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from))
}

fn table_lines(report: &Report) -> Vec<String> {
    let header = [
        "Bucket",
        "Storage Class",
        "Size",
        "Objects",
        "Current Cost",
        "Optimized Cost",
        "Savings",
        "Savings %",
    ];
    let mut rows: Vec<[String; 8]> = vec![header.map(str::to_string)];
    for r in report.rows() {
        rows.push([
            r.bucket.to_string(),
            r.storage_class.to_string(),
            format!("{:.2} GB", r.size_gb()),
            commas(r.objects),
            r.current_monthly_cost.to_string(),
            r.optimized_monthly_cost.to_string(),
            r.savings.to_string(),
            format!("{:.1}%", r.savings_percent),
        ]);
    }

    let mut widths = [0usize; 8];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(widths.iter())
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i < 2 {
                        format!("{cell:<w$}")
                    } else {
                        format!("{cell:>w$}")
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect()
}

fn print_report(report: &Report) {
    let s = style();

    let lines = table_lines(report);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            eprintln!("  {bold}{line}{reset}", bold = s.bold, reset = s.reset);
        } else {
            let pct = report.buckets[i - 1].cost.savings_percent;
            eprintln!(
                "  {c}{line}{reset}",
                c = savings_color(pct),
                reset = s.reset
            );
        }
    }

    let t = &report.totals;
    eprintln!();
    eprintln!(
        "  {dim}current   {reset}{bold}{}{reset}",
        t.current_monthly_cost,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}optimized {reset}{bold}{}{reset}",
        t.optimized_monthly_cost,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}savings   {reset}{c}{bold}{} ({:.1}%){reset}",
        t.savings,
        t.savings_percent,
        dim = s.dim,
        c = savings_color(t.savings_percent),
        bold = s.bold,
        reset = s.reset
    );

    for (bucket, actions) in report.detailed() {
        if actions.is_empty() {
            continue;
        }
        eprintln!();
        eprintln!("  {bold}{bucket}{reset}", bold = s.bold, reset = s.reset);
        for (i, a) in actions.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, a.description);
            eprintln!("       {dim}{}{reset}", a.details, dim = s.dim, reset = s.reset);
        }
    }
    eprintln!();
}

/// Asks once per action; anything but `y`/`yes` declines.
fn prompt_approval<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    bucket: &str,
    action: &Action,
) -> bool {
    let _ = write!(
        output,
        "  {bucket}: {}\n    Apply this recommendation? (y/n): ",
        action.description
    );
    let _ = output.flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}

fn write_plan(plan: &ApplyPlan, out: &Path, credentials: Option<&Path>) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("create out dir {}", out.display()))?;

    let plan_path = out.join("apply-plan.json");
    let json = serde_json::to_vec_pretty(plan).context("serialize apply plan")?;
    std::fs::write(&plan_path, json).with_context(|| format!("write {}", plan_path.display()))?;

    for c in &plan.changes {
        if let Some(doc) = &c.lifecycle {
            let path = out.join(c.lifecycle_file_name());
            let json = serde_json::to_vec_pretty(doc).context("serialize lifecycle document")?;
            std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        }
    }

    let script_path = out.join("apply.sh");
    std::fs::write(&script_path, plan.to_shell_script(credentials))
        .with_context(|| format!("write {}", script_path.display()))?;
    Ok(())
}

fn run_analyze(
    args: RunArgs,
    cfg: &Config,
    now: DateTime<Utc>,
) -> anyhow::Result<std::process::ExitCode> {
    let s = style();

    print_banner();

    if let Some(p) = &args.credentials {
        if !p.is_file() {
            anyhow::bail!("credentials file {} not found", p.display());
        }
    }

    let opts = AnalyzeOptions {
        strict: args.strict,
        baseline_path: args.baseline.clone(),
        project_id: args.project.clone(),
        engine: cfg.engine_config().context("invalid config")?,
        ..AnalyzeOptions::default()
    };

    debug!("analyzing {} at {}", args.inventory.display(), now.to_rfc3339());
    let report = analyze_path(&args.inventory, now, opts)?;

    if let Some(path) = &args.export {
        let json = report.to_json().context("serialize report json")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    }

    if let Some(path) = &args.markdown {
        std::fs::write(path, report.to_markdown())
            .with_context(|| format!("write {}", path.display()))?;
    }

    // Machine-parseable line on stdout
    println!(
        "buckets={} current_monthly_cost={:.2} optimized_monthly_cost={:.2} savings_percent={:.1}",
        report.totals.bucket_count,
        report.totals.current_monthly_cost.dollars(),
        report.totals.optimized_monthly_cost.dollars(),
        report.totals.savings_percent
    );

    // Human-readable output on stderr
    print_report(&report);

    if let Some(path) = &args.export {
        eprintln!(
            "  {dim}\u{2192} {}{reset}",
            path.display(),
            dim = s.dim,
            reset = s.reset
        );
    }

    if args.apply {
        let plan = if args.auto_approve {
            plan_apply(&report, |_, _| true)
        } else {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut stderr = std::io::stderr();
            plan_apply(&report, |bucket, action| {
                prompt_approval(&mut input, &mut stderr, bucket, action)
            })
        };

        if plan.is_empty() {
            eprintln!("  {dim}no changes approved{reset}", dim = s.dim, reset = s.reset);
        } else {
            write_plan(&plan, &args.out, args.credentials.as_deref())?;
            eprintln!(
                "  {green}{bold}{} bucket(s) planned{reset}  {dim}run {}{reset}",
                plan.changes.len(),
                args.out.join("apply.sh").display(),
                green = s.green,
                bold = s.bold,
                dim = s.dim,
                reset = s.reset,
            );
        }
    }

    eprintln!();

    Ok(std::process::ExitCode::from(0))
}
