//! objformat CLI - Compile object formatters to SQL
//!
//! Usage:
//!   objformat format --table <table> [--formatter <name>] [--dialect <dialect>]
//!   objformat aggregate --from <table> --relationship <name> [--aggregator <name>]
//!   objformat check
//!
//! Examples:
//!   objformat format --config objformat.toml --table CollectionObject --dialect mysql
//!   objformat aggregate --from CollectionObject --relationship collectors
//!   objformat format --table Agent --dialect sqlite --execute specify.sqlite

use clap::{Args, Parser, Subcommand, ValueEnum};
use objformat::config::{Configuration, Settings};
use objformat::execute::{open_readonly, run_query};
use objformat::sql::{validate_sql, Dialect, Query};
use objformat::ObjectFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "objformat")]
#[command(about = "objformat - Compile declarative object formatters to multi-dialect SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the formatter of a table into a SELECT over all its rows
    Format {
        /// Table to format
        #[arg(short, long)]
        table: String,

        /// Formatter name (defaults to the scope's, then the class default)
        #[arg(short, long)]
        formatter: Option<String>,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compile the aggregation of a to-many relationship
    Aggregate {
        /// Owning table
        #[arg(long)]
        from: String,

        /// To-many relationship of the owning table
        #[arg(short, long)]
        relationship: String,

        /// Aggregator name (defaults to the related class default)
        #[arg(short, long)]
        aggregator: Option<String>,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Load the configuration and compile every class formatter
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Settings file (defaults to $OBJFORMAT_CONFIG, then ./objformat.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQL dialect to generate (defaults to the settings file)
    #[arg(short, long)]
    dialect: Option<DialectArg>,
}

#[derive(Args)]
struct OutputArgs {
    /// Check the generated SQL with sqlparser
    #[arg(long)]
    validate: bool,

    /// Run the query against a SQLite database and print the rows
    #[arg(long, value_name = "DB")]
    execute: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Mysql,
    Sqlite,
    Postgres,
    Duckdb,
    Tsql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Tsql => Dialect::TSql,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            table,
            formatter,
            common,
            output,
        } => cmd_format(&table, formatter.as_deref(), common, output),
        Commands::Aggregate {
            from,
            relationship,
            aggregator,
            common,
            output,
        } => cmd_aggregate(&from, &relationship, aggregator.as_deref(), common, output),
        Commands::Check { common } => cmd_check(common),
    }
}

/// Load settings and every document they name.
fn load_config(common: &CommonArgs) -> Result<(Configuration, Dialect), ExitCode> {
    let settings = match &common.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = settings.map_err(|e| {
        eprintln!("Error loading settings: {}", e);
        ExitCode::FAILURE
    })?;

    let dialect = common.dialect.map(Dialect::from).unwrap_or(settings.dialect);
    let config = Configuration::load(settings).map_err(|e| {
        eprintln!("Error loading configuration: {}", e);
        ExitCode::FAILURE
    })?;

    Ok((config, dialect))
}

fn cmd_format(
    table: &str,
    formatter: Option<&str>,
    common: CommonArgs,
    output: OutputArgs,
) -> ExitCode {
    let (config, dialect) = match load_config(&common) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    match ObjectFormatter::from_config(&config).format_query(table, formatter) {
        Ok(query) => emit(&query, dialect, &output),
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_aggregate(
    from: &str,
    relationship: &str,
    aggregator: Option<&str>,
    common: CommonArgs,
    output: OutputArgs,
) -> ExitCode {
    let (config, dialect) = match load_config(&common) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    match ObjectFormatter::from_config(&config).aggregate_query(from, relationship, aggregator) {
        Ok(query) => emit(&query, dialect, &output),
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check(common: CommonArgs) -> ExitCode {
    let (config, dialect) = match load_config(&common) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let mut problems = config.check();

    let formatter = ObjectFormatter::from_config(&config);
    for table in config.catalog.tables() {
        if config.definitions.format_for_class(&table.name).is_none() {
            continue;
        }
        match formatter.format_query(&table.name, None) {
            Ok(query) => {
                if let Err(e) = validate_sql(&query.to_sql(dialect), dialect) {
                    problems.push(e.to_string());
                }
            }
            Err(e) => problems.push(format!("{}: {}", table.name, e)),
        }
    }

    if problems.is_empty() {
        println!(
            "OK: {} tables, {} formatters, {} aggregators",
            config.catalog.len(),
            config.definitions.formats.len(),
            config.definitions.aggregators.len()
        );
        ExitCode::SUCCESS
    } else {
        eprintln!("Configuration problems:");
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        ExitCode::FAILURE
    }
}

/// Print the SQL and its parameters, then optionally validate and execute it.
fn emit(query: &Query, dialect: Dialect, output: &OutputArgs) -> ExitCode {
    let rendered = query.render(dialect);
    println!("{}", rendered.sql);
    if !rendered.params.is_empty() {
        println!();
        println!("-- Parameters:");
        for (i, param) in rendered.params.iter().enumerate() {
            println!("--   {}: {:?}", i + 1, param);
        }
    }

    if output.validate {
        if let Err(e) = validate_sql(&rendered.sql, dialect) {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
        eprintln!("OK: SQL is valid for {}", dialect);
    }

    if let Some(db) = &output.execute {
        let result = open_readonly(db).and_then(|conn| run_query(&conn, query));
        match result {
            Ok(rows) => {
                println!();
                println!("{}", rows.columns.join("\t"));
                for row in &rows.rows {
                    let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
                    println!("{}", cells.join("\t"));
                }
            }
            Err(e) => {
                eprintln!("Execution error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
