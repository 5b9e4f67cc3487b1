use clap::{Parser, ValueEnum};
use qtrans::query::{self, elastic, rest, Query};
use qtrans::{source, usage};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Dialect {
    /// Search-engine `source` document
    Elastic,
    /// REST `where`/`sort` parameters
    Rest,
}

#[derive(Parser)]
#[command(
    name = "qtrans",
    about = "Translate generic filter queries into search-engine and REST query documents"
)]
struct Cli {
    #[arg(long, value_enum, env = "QTRANS_DIALECT", default_value_t = Dialect::Elastic)]
    dialect: Dialect,

    #[arg(long, help = "List the fields referenced by the filter instead of translating")]
    fields: bool,

    #[arg(long, help = "Show how many documents reference each field (use with --fields)")]
    count: bool,

    #[arg(long, env = "QTRANS_DIR", help = "Translate every saved query under a directory")]
    dir: Option<PathBuf>,

    #[arg(long, help = "Read the query document from stdin")]
    stdin: bool,

    #[arg(long, help = "Print single-line JSON")]
    compact: bool,

    #[arg(help = "Query document (JSON or YAML)")]
    query: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let documents = match load_documents(&cli) {
        Ok(docs) => docs,
        Err(code) => return code,
    };

    if documents.is_empty() {
        eprintln!("No query documents found");
        return ExitCode::from(1);
    }

    let mut queries = Vec::with_capacity(documents.len());
    for (label, doc) in documents {
        match query::parse_query(&doc) {
            Ok(q) => queries.push((label, q)),
            Err(e) => {
                eprintln!("{}: {}", label, e);
                return ExitCode::from(2);
            }
        }
    }

    if cli.fields {
        return run_fields_mode(&queries, cli.count);
    }

    run_translate_mode(&queries, cli.dialect, cli.compact)
}

fn load_documents(cli: &Cli) -> Result<Vec<(String, Value)>, ExitCode> {
    if let Some(dir) = &cli.dir {
        let paths = match source::collect_query_files(dir) {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("{}: {}", dir.display(), e);
                return Err(ExitCode::from(2));
            }
        };

        let mut documents = Vec::new();
        for path in paths {
            let label = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            match source::load_document(&path) {
                Ok(doc) => documents.push((label, doc)),
                Err(e) => {
                    eprintln!("{}: {}", label, e);
                    return Err(ExitCode::from(2));
                }
            }
        }
        log::debug!("found {} query documents in {}", documents.len(), dir.display());
        return Ok(documents);
    }

    let (label, loaded) = if cli.stdin {
        ("<stdin>", source::read_document_from_stdin())
    } else if let Some(text) = &cli.query {
        ("<query>", source::parse_document(text))
    } else {
        eprintln!("Error: No query provided. Pass a document, --stdin or --dir");
        return Err(ExitCode::from(2));
    };

    match loaded {
        Ok(doc) => Ok(vec![(label.to_string(), doc)]),
        Err(e) => {
            eprintln!("{}: {}", label, e);
            Err(ExitCode::from(2))
        }
    }
}

fn run_fields_mode(queries: &[(String, Query)], show_count: bool) -> ExitCode {
    let usage: usage::FieldUsage = queries.iter().map(|(_, q)| q.filter.as_ref()).collect();

    if usage.is_empty() {
        return ExitCode::from(1);
    }

    for line in usage.lines(show_count) {
        println!("{}", line);
    }

    ExitCode::from(0)
}

fn translate(query: &Query, dialect: Dialect) -> Result<Value, serde_json::Error> {
    match dialect {
        Dialect::Elastic => serde_json::to_value(elastic::build_query(query)),
        Dialect::Rest => serde_json::to_value(rest::build_query(query.filter.as_ref(), &query.sort)),
    }
}

fn run_translate_mode(queries: &[(String, Query)], dialect: Dialect, compact: bool) -> ExitCode {
    let output = match queries {
        [(_, single)] => translate(single, dialect),
        _ => queries
            .iter()
            .map(|(label, q)| Ok((label.clone(), translate(q, dialect)?)))
            .collect::<Result<Map<String, Value>, serde_json::Error>>()
            .map(Value::Object),
    };

    let rendered = output.and_then(|value| {
        if compact {
            serde_json::to_string(&value)
        } else {
            serde_json::to_string_pretty(&value)
        }
    });

    match rendered {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(0)
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::from(2)
        }
    }
}
