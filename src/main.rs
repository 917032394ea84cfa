use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use tracing_subscriber::{fmt, EnvFilter};

use litescan::exec::QueryOutput;
use litescan::pager::Pager;

mod cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = if args.trace {
        EnvFilter::new("trace")
    } else if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout carries only the command's output.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let pager = Pager::open(&args.file)?;
    match &args.command {
        cli::Command::DbInfo => {
            let info = litescan::db_info(&pager)?;
            println!("database page size: {}", info.page_size);
            println!("number of tables: {}", info.num_tables);
        }
        cli::Command::Tables => {
            let names = litescan::list_tables(&pager)?;
            if !names.is_empty() {
                println!("{}", names.join(" "));
            }
        }
        cli::Command::Query(query) => match litescan::run_query(&pager, query)? {
            QueryOutput::Count(n) => println!("{}", n),
            QueryOutput::Rows(rows) => {
                for row in rows {
                    println!("{}", row.items.iter().join("|"));
                }
            }
        },
    }

    Ok(())
}
