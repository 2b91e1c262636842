use anyhow::{bail, Context};
use bank_gate::{GateConfig, InputGate, RuleOutcome};
use bank_sdk::{AuditReport, Bank, BankConfig, Transaction};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::script::{self, Output, Runner};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => BankConfig::load(path)?,
        None => BankConfig::default(),
    };
    match cli.command {
        Command::Run(args) => cmd_run(args, config, cli.format),
        Command::Check(args) => cmd_check(args),
        Command::Config => cmd_config(&config),
    }
}

fn cmd_run(args: RunArgs, config: BankConfig, format: OutputFormat) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let lines = script::parse(&source)?;
    debug!(script = %args.script.display(), steps = lines.len(), "script parsed");

    let bank = Bank::in_memory(config);
    let mut runner = Runner::new(&bank);
    let mut failed = 0usize;

    for line in &lines {
        match runner.execute(&line.step) {
            Ok(output) => match format {
                OutputFormat::Text => print_text(&output),
                OutputFormat::Json => println!("{}", to_json(line.number, &output)),
            },
            Err(e) => {
                failed += 1;
                match format {
                    OutputFormat::Text => {
                        println!("{} line {}: {}", "✗".red().bold(), line.number, e)
                    }
                    OutputFormat::Json => println!(
                        "{}",
                        json!({ "line": line.number, "error": e.to_string() })
                    ),
                }
                if !args.keep_going {
                    return Err(e.context(format!("line {}", line.number)));
                }
            }
        }
    }

    if format == OutputFormat::Text {
        println!(
            "\n{} commands, {} failed",
            lines.len().to_string().bold(),
            if failed == 0 { "0".green() } else { failed.to_string().red() }
        );
    }
    if failed > 0 {
        bail!("{failed} command(s) failed");
    }
    Ok(())
}

fn print_text(output: &Output) {
    match output {
        Output::Registered(account) => println!(
            "{} Registered {} ({}) for {}",
            "✓".green().bold(),
            account.id.to_string().yellow(),
            account.kind,
            account.owner
        ),
        Output::Opened(account) => println!(
            "{} Opened {} ({})",
            "✓".green().bold(),
            account.id.to_string().yellow(),
            account.kind
        ),
        Output::LoggedIn(session) => println!(
            "{} Logged in to {}  {}",
            "✓".green().bold(),
            session.account.to_string().yellow(),
            session.short_id().dimmed()
        ),
        Output::LoggedOut => println!("Logged out."),
        Output::Committed(tx) => println!("{} {}", "✓".green().bold(), describe(tx)),
        Output::Balance { account, balance } => {
            println!("Balance of {}: {}", account.to_string().yellow(), balance.to_string().bold())
        }
        Output::Statement {
            account,
            transactions,
        } => {
            println!("Statement for {}", account.to_string().yellow().bold());
            if transactions.is_empty() {
                println!("  No transactions.");
            }
            for tx in transactions {
                println!(
                    "  {}  {}  {}",
                    tx.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                    tx.id.to_string().cyan(),
                    describe(tx)
                );
            }
        }
        Output::Audit(report) => print_audit(report),
    }
}

fn describe(tx: &Transaction) -> String {
    let route = match (tx.sender, tx.receiver) {
        (Some(from), Some(to)) => format!("{from} -> {to}"),
        (Some(from), None) => format!("from {from}"),
        (None, Some(to)) => format!("to {to}"),
        (None, None) => String::new(),
    };
    format!("{} {} {}", tx.kind, tx.amount, route)
}

fn print_audit(report: &AuditReport) {
    if report.is_consistent() {
        println!(
            "{} Ledger consistent: {} transactions, {} accounts, total {}",
            "✓".green().bold(),
            report.transaction_count,
            report.account_count,
            report.stored_total
        );
    } else {
        println!("{} {} violation(s)", "✗".red().bold(), report.violations.len());
        for v in &report.violations {
            println!("  {:?}: {}", v.kind, v.description);
        }
    }
}

fn to_json(line: usize, output: &Output) -> serde_json::Value {
    let body = match output {
        Output::Registered(account) | Output::Opened(account) => json!({
            "account": account.id,
            "owner": account.owner,
            "kind": account.kind,
            "balance": account.balance,
        }),
        Output::LoggedIn(session) => json!({ "session": session }),
        Output::LoggedOut => json!({ "session": null }),
        Output::Committed(tx) => json!({ "transaction": tx }),
        Output::Balance { account, balance } => json!({ "account": account, "balance": balance }),
        Output::Statement {
            account,
            transactions,
        } => json!({ "account": account, "transactions": transactions }),
        Output::Audit(report) => json!({
            "consistent": report.is_consistent(),
            "transactions": report.transaction_count,
            "accounts": report.account_count,
            "total": report.stored_total,
            "violations": report
                .violations
                .iter()
                .map(|v| format!("{:?}: {}", v.kind, v.description))
                .collect::<Vec<_>>(),
        }),
    };
    json!({ "line": line, "ok": body })
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let gate = InputGate::with_default_rules(GateConfig::default());
    match gate.check(&args.rule, &args.value)? {
        RuleOutcome::Pass => {
            println!("{} {} accepted", "✓".green().bold(), args.rule.bold());
            Ok(())
        }
        RuleOutcome::Fail { reason } => {
            println!("{} {} rejected: {}", "✗".red().bold(), args.rule.bold(), reason);
            bail!("input rejected");
        }
    }
}

fn cmd_config(config: &BankConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
