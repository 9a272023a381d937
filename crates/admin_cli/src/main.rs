use std::{error::Error, io::Write};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{
    Category, DateWindow, Engine, EngineError, ExpenseSearch, Money, SignupInput,
    normalize_username, parse_form_date, password_policy_errors,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "tracker_admin")]
#[command(about = "Admin utilities for the expense tracker (accounts, expenses, sessions)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./tracker.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Expense(Expense),
    Session(Session),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Lists expenses of every user, newest first.
    List(ExpenseListArgs),
    Delete(ExpenseDeleteArgs),
}

#[derive(Args, Debug)]
struct ExpenseListArgs {
    /// Only expenses owned by this user.
    #[arg(long)]
    user: Option<String>,
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    /// Matches description or category, ignoring case.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct ExpenseDeleteArgs {
    #[arg(long)]
    id: i32,
}

#[derive(Args, Debug)]
struct Session {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Deletes expired login sessions.
    Clear,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::try_from(raw)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_form_date(raw).ok_or_else(|| format!("invalid date: {raw}"))
}

impl ExpenseListArgs {
    fn search(self) -> ExpenseSearch {
        let window = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some(DateWindow::new(
                from.unwrap_or(NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)),
                to.unwrap_or(NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)),
            )),
        };
        ExpenseSearch {
            user_id: self.user,
            category: self.category,
            text: self.search,
            window,
        }
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

/// Prints `line` on its own terminal line.
fn notice(line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )?;
    Ok(())
}

/// Asks for a password and its confirmation until both match and the
/// password passes the signup policy for `username`.
fn prompt_new_password(username: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    for _ in 0..3 {
        let password = prompt_password("Password: ")?;
        if password.is_empty() {
            notice("Password must not be empty.")?;
            continue;
        }

        let confirmation = prompt_password("Confirm password: ")?;
        if password != confirmation {
            notice("Passwords do not match. Try again.")?;
            continue;
        }

        let problems = password_policy_errors(&password, Some(&normalize_username(username)));
        if problems.is_empty() {
            return Ok(password);
        }
        for problem in &problems {
            notice(problem)?;
        }
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_new_password(&args.username)?;
            let input = SignupInput {
                username: &args.username,
                password1: &password,
                password2: &password,
            };

            match engine.signup(input).await {
                Ok(user) => println!("created user: {}", user.username),
                Err(EngineError::Validation(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{field}: {message}");
                    }
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Expense(Expense {
            command: ExpenseCommand::List(args),
        }) => {
            let expenses = engine.search_expenses(&args.search()).await?;
            for expense in &expenses {
                println!(
                    "{:>6}  {}  {:<16} {:<18} {:>12}  {}",
                    expense.id,
                    expense.date,
                    expense.user_id,
                    expense.category.label(),
                    expense.amount,
                    expense.description
                );
            }
            let total: Money = expenses.iter().map(|e| e.amount).sum();
            println!("{} expenses, total {total}", expenses.len());
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Delete(args),
        }) => match engine.admin_delete_expense(args.id).await {
            Ok(()) => println!("deleted expense {}", args.id),
            Err(EngineError::KeyNotFound(_)) => {
                eprintln!("expense not found: {}", args.id);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Session(Session {
            command: SessionCommand::Clear,
        }) => {
            let cleared = engine.clear_expired_sessions(Utc::now()).await?;
            println!("cleared {cleared} expired sessions");
        }
    }

    Ok(())
}
