use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "lotbook", version)]
#[command(about = "Track a used-car lot: purchases, expenses, sales and profit")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the backend project URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override the backend anon key.
    #[arg(long, global = true)]
    pub anon_key: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Work against an in-memory demo lot instead of the backend.
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account.
    Signup(AuthArgs),
    /// Sign in and remember the session.
    Login(AuthArgs),
    /// Forget the session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List vehicles, newest first.
    List(ListArgs),
    /// Show one vehicle with its expenses.
    Show(ShowArgs),
    /// Add a vehicle to the inventory.
    Add(AddArgs),
    /// Edit fields of a vehicle.
    Edit(EditArgs),
    /// Delete a vehicle and its expenses.
    Delete(IdArgs),
    /// Mark a vehicle as sold now.
    Sell(SellArgs),
    /// Manage the expenses of a vehicle.
    Expense(ExpenseArgs),
    /// Inventory statistics.
    Stats(JsonArgs),
    /// Export the inventory as CSV.
    Export(ExportArgs),
    /// Upload a photo or an invoice for a vehicle.
    Attach(AttachArgs),
    /// Print where the photo or invoice of a vehicle can be opened.
    Open(OpenArgs),
    /// Show or change the dark mode preference.
    Theme(ThemeArgs),
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[arg(long)]
    pub email: Option<String>,
    /// Read from the environment; prompted for when absent.
    #[arg(long, env = "LOTBOOK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive match on make, model or year.
    #[arg(long, short)]
    pub query: Option<String>,
    #[command(flatten)]
    pub output: JsonArgs,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: String,
    #[command(flatten)]
    pub output: JsonArgs,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub make: String,
    #[arg(long)]
    pub model: String,
    #[arg(long)]
    pub year: String,
    #[arg(long)]
    pub miles: String,
    /// Purchase price, e.g. 9500 or 9500.50.
    #[arg(long)]
    pub price: String,
    /// Inventory value; defaults to the purchase price.
    #[arg(long)]
    pub book_value: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Photo to upload after the vehicle is created.
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Invoice PDF to upload after the vehicle is created.
    #[arg(long)]
    pub invoice: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub make: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    #[arg(long)]
    pub miles: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    /// Blank resets it to the purchase price when `--price` is given too.
    #[arg(long)]
    pub book_value: Option<String>,
    /// Blank clears it.
    #[arg(long)]
    pub color: Option<String>,
    /// Blank clears them.
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct SellArgs {
    pub id: String,
    /// Selling price.
    #[arg(long)]
    pub price: String,
}

#[derive(Args, Debug)]
pub struct ExpenseArgs {
    #[command(subcommand)]
    pub command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// List the expenses of a vehicle, newest first.
    List(ExpenseListArgs),
    Add(ExpenseAddArgs),
    Edit(ExpenseEditArgs),
    Delete(ExpenseDeleteArgs),
}

#[derive(Args, Debug)]
pub struct ExpenseListArgs {
    pub vehicle: String,
    #[command(flatten)]
    pub output: JsonArgs,
}

#[derive(Args, Debug)]
pub struct ExpenseAddArgs {
    pub vehicle: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub amount: String,
    /// YYYY-MM-DD or RFC 3339; defaults to now.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExpenseEditArgs {
    pub vehicle: String,
    pub expense: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExpenseDeleteArgs {
    pub vehicle: String,
    pub expense: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file, `-` for stdout.
    #[arg(long, short, default_value = engine::export::DEFAULT_FILE_NAME)]
    pub out: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AttachmentKind {
    Image,
    Invoice,
}

impl From<AttachmentKind> for engine::BlobKind {
    fn from(value: AttachmentKind) -> Self {
        match value {
            AttachmentKind::Image => Self::Image,
            AttachmentKind::Invoice => Self::Invoice,
        }
    }
}

#[derive(Args, Debug)]
pub struct AttachArgs {
    pub kind: AttachmentKind,
    pub id: String,
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    pub kind: AttachmentKind,
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ThemeArgs {
    #[arg(value_enum, default_value_t = ThemeAction::Show)]
    pub action: ThemeAction,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ThemeAction {
    #[default]
    Show,
    Toggle,
    Dark,
    Light,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_expense_commands() {
        let cli = Cli::try_parse_from([
            "lotbook",
            "expense",
            "add",
            "car-1",
            "--description",
            "Tyres",
            "--amount",
            "320.40",
        ])
        .unwrap();
        let Command::Expense(ExpenseArgs {
            command: ExpenseCommand::Add(args),
        }) = cli.command
        else {
            panic!("expected expense add");
        };
        assert_eq!(args.vehicle, "car-1");
        assert!(args.date.is_none());
    }

    #[test]
    fn export_defaults_to_the_inventory_file() {
        let cli = Cli::try_parse_from(["lotbook", "--offline", "export"]).unwrap();
        assert!(cli.global.offline);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.out, "car_inventory.csv");
    }
}
