//! Line-oriented banking scripts.
//!
//! One command per line; blank lines and lines starting with `#` are
//! skipped. Arguments are separated by whitespace, and double quotes group
//! an argument that contains spaces.
//!
//! ```text
//! register 123.456.789-09 "+55 (11) 91234-5678" checking s3cretpass Ana Souza
//! login acct:1 s3cretpass
//! deposit 100.00
//! transfer acct:2 25.50
//! statement
//! ```

use anyhow::{anyhow, bail, Context};
use bank_sdk::{Account, AccountId, AccountKind, AuditReport, Bank, Money, Registration, Session, Transaction};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Register {
        tax_id: String,
        phone: String,
        kind: AccountKind,
        credential: String,
        name: String,
    },
    Login {
        account: AccountId,
        credential: String,
    },
    Logout,
    Open {
        kind: AccountKind,
        credential: String,
    },
    Deposit(Money),
    Withdraw(Money),
    Transfer {
        to: AccountId,
        amount: Money,
    },
    Balance,
    Statement,
    Audit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub step: Step,
}

/// Result of one executed step.
#[derive(Debug)]
pub enum Output {
    Registered(Account),
    Opened(Account),
    LoggedIn(Session),
    LoggedOut,
    Committed(Transaction),
    Balance { account: AccountId, balance: Money },
    Statement { account: AccountId, transactions: Vec<Transaction> },
    Audit(AuditReport),
}

pub fn parse(source: &str) -> anyhow::Result<Vec<Line>> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = tokenize(trimmed).with_context(|| format!("line {number}"))?;
        let step = parse_step(&tokens).with_context(|| format!("line {number}"))?;
        lines.push(Line { number, step });
    }
    Ok(lines)
}

fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if quoted {
        bail!("unterminated quote");
    }
    if pending {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_step(tokens: &[String]) -> anyhow::Result<Step> {
    let (command, args) = tokens.split_first().ok_or_else(|| anyhow!("empty command"))?;
    let arity = |n: usize| -> anyhow::Result<()> {
        if args.len() == n {
            Ok(())
        } else {
            bail!("{command} takes {n} argument(s), got {}", args.len())
        }
    };

    let step = match command.to_ascii_lowercase().as_str() {
        "register" => {
            if args.len() < 5 {
                bail!("usage: register <tax_id> <phone> <kind> <credential> <name...>");
            }
            Step::Register {
                tax_id: args[0].clone(),
                phone: args[1].clone(),
                kind: args[2].parse()?,
                credential: args[3].clone(),
                name: args[4..].join(" "),
            }
        }
        "login" => {
            arity(2)?;
            Step::Login {
                account: account_id(&args[0])?,
                credential: args[1].clone(),
            }
        }
        "logout" => {
            arity(0)?;
            Step::Logout
        }
        "open" => {
            arity(2)?;
            Step::Open {
                kind: args[0].parse()?,
                credential: args[1].clone(),
            }
        }
        "deposit" => {
            arity(1)?;
            Step::Deposit(args[0].parse()?)
        }
        "withdraw" => {
            arity(1)?;
            Step::Withdraw(args[0].parse()?)
        }
        "transfer" => {
            arity(2)?;
            Step::Transfer {
                to: account_id(&args[0])?,
                amount: args[1].parse()?,
            }
        }
        "balance" => {
            arity(0)?;
            Step::Balance
        }
        "statement" => {
            arity(0)?;
            Step::Statement
        }
        "audit" => {
            arity(0)?;
            Step::Audit
        }
        other => bail!("unknown command `{other}`"),
    };
    Ok(step)
}

fn account_id(token: &str) -> anyhow::Result<AccountId> {
    token
        .parse()
        .with_context(|| format!("invalid account id `{token}`"))
}

/// Executes steps against a bank, tracking the session opened by `login`.
pub struct Runner<'a> {
    bank: &'a Bank,
    session: Option<Session>,
}

impl<'a> Runner<'a> {
    pub fn new(bank: &'a Bank) -> Self {
        Self {
            bank,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn active(&self) -> anyhow::Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| anyhow!("no active session; use `login` first"))
    }

    pub fn execute(&mut self, step: &Step) -> anyhow::Result<Output> {
        let output = match step {
            Step::Register {
                tax_id,
                phone,
                kind,
                credential,
                name,
            } => Output::Registered(self.bank.register(&Registration::new(
                tax_id.as_str(),
                phone.as_str(),
                name.as_str(),
                *kind,
                credential.as_str(),
            ))?),
            Step::Login {
                account,
                credential,
            } => {
                let session = self.bank.authenticate(*account, credential)?;
                self.session = Some(session.clone());
                Output::LoggedIn(session)
            }
            Step::Logout => {
                self.session = None;
                Output::LoggedOut
            }
            Step::Open { kind, credential } => {
                Output::Opened(self.bank.open_account(self.active()?, *kind, credential)?)
            }
            Step::Deposit(amount) => Output::Committed(self.bank.deposit(self.active()?, *amount)?),
            Step::Withdraw(amount) => Output::Committed(self.bank.withdraw(self.active()?, *amount)?),
            Step::Transfer { to, amount } => {
                Output::Committed(self.bank.transfer(self.active()?, *to, *amount)?)
            }
            Step::Balance => {
                let session = self.active()?;
                Output::Balance {
                    account: session.account,
                    balance: self.bank.balance(session)?,
                }
            }
            Step::Statement => {
                let session = self.active()?;
                Output::Statement {
                    account: session.account,
                    transactions: self.bank.statement(session)?,
                }
            }
            Step::Audit => Output::Audit(self.bank.audit()?),
        };
        Ok(output)
    }
}
