use clap::{Args, Parser, Subcommand};
use formulon::bindings;
use formulon::plot::{self, PlotSettings};
use formulon::stdlib::context_with_options;
use formulon::{EvaluationContext, LanguageOptions, Result, Value};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "formulon", version, about = "Evaluate and plot formulon expressions")]
struct Cli {
    #[command(flatten)]
    language: LanguageArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct LanguageArgs {
    /// JSON file with language options; missing fields keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Allow `.Member` reads such as `"text".Length`.
    #[arg(long, global = true)]
    member_read: bool,

    /// Ignore the case of keywords, variables and function names.
    #[arg(long, global = true)]
    ignore_case: bool,

    /// Bind a variable; the value is an expression.
    #[arg(long = "var", global = true, value_name = "NAME=VALUE")]
    variables: Vec<String>,

    /// Bind a constant that is frozen into compiled expressions.
    #[arg(long = "const", global = true, value_name = "NAME=VALUE")]
    constants: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an expression and print its value.
    Eval(EvalArgs),
    /// Sample f(x, y) over a grid and print an ASCII shade map.
    Plot(PlotArgs),
}

#[derive(Args, Debug)]
struct EvalArgs {
    expression: String,

    /// Compile the expression instead of interpreting the tree.
    #[arg(long, default_value_t = false)]
    compiled: bool,

    /// Print the result as a JSON object.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct PlotArgs {
    expression: String,

    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    x_min: f64,

    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    x_max: f64,

    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    y_min: f64,

    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    y_max: f64,

    #[arg(long, default_value_t = 64)]
    columns: usize,

    #[arg(long, default_value_t = 24)]
    rows: usize,
}

#[derive(Serialize, Debug)]
struct EvalOutput<'a> {
    expression: &'a str,
    #[serde(rename = "type")]
    value_type: String,
    value: String,
    is_null: bool,
}

impl LanguageArgs {
    fn language_options(&self) -> Result<LanguageOptions> {
        let base = match &self.options {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => LanguageOptions::default(),
        };
        let mut builder = base.derive();
        if self.member_read {
            builder = builder.with_member_read();
        }
        if self.ignore_case {
            builder = builder.ignore_case();
        }
        Ok(builder.build())
    }

    fn context(&self) -> Result<EvaluationContext> {
        let ctx = context_with_options(self.language_options()?)?;
        bindings::apply_all(&ctx, &self.variables, &self.constants)?;
        Ok(ctx)
    }
}

fn eval(ctx: &EvaluationContext, args: &EvalArgs) -> Result<()> {
    let value = if args.compiled {
        ctx.compile_dynamic(&args.expression)?.call(&[])?
    } else {
        ctx.interpret(&args.expression, &[])?
    };
    if args.json {
        let output = EvalOutput {
            expression: &args.expression,
            value_type: value.type_name(),
            value: value.to_string(),
            is_null: value.is_null(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Value::Null = value {
        println!("null");
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn plot(mut ctx: EvaluationContext, args: &PlotArgs) -> Result<()> {
    let settings = PlotSettings {
        x_min: args.x_min,
        x_max: args.x_max,
        y_min: args.y_min,
        y_max: args.y_max,
        columns: args.columns,
        rows: args.rows,
    };
    let surface = plot::compile_surface(&mut ctx, &args.expression)?;
    let grid = plot::sample(&surface, &settings)?;
    print!("{}", grid.render());
    match grid.range() {
        Some((lo, hi)) => println!("range {} .. {}", lo, hi),
        None => println!("no finite values"),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let ctx = cli.language.context()?;
    match cli.cmd {
        Command::Eval(args) => eval(&ctx, &args),
        Command::Plot(args) => plot(ctx, &args),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
