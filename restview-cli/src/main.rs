use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use restview::{Config, Dispatch, Registry, Response, Summary};
use serde_json::{json, Value as JsonValue};

#[derive(Parser, Debug)]
#[clap(name = "restview", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file (JSON or YAML). Skipped if it does not exist.
    #[clap(short, long, default_value = "restview.yml")]
    config: PathBuf,

    /// Print results as JSON instead of text.
    #[clap(long)]
    json: bool,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a response body stored in a file.
    Render {
        /// File containing the response body.
        body: PathBuf,

        /// Content type of the response.
        #[clap(long)]
        content_type: String,

        #[clap(long, default_value_t = 200)]
        status: u16,

        #[clap(long, default_value = "OK")]
        reason: String,

        /// Text encoding of the body, overriding the content type's charset.
        #[clap(long)]
        encoding: Option<String>,
    },
    /// Render responses recorded in cassette files.
    Replay {
        /// Cassette file(s), as glob patterns.
        #[clap(required = true)]
        cassettes: Vec<String>,

        #[clap(long, default_value = "GET")]
        method: String,

        /// Only replay the interaction recorded for this URI.
        #[clap(long)]
        uri: Option<String>,
    },
    /// List the available views and their MIME type patterns.
    Views,
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    if let Err(e) = run(&args) {
        log::error!("Failed: {:?}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load_or_default(&args.config)?;
    let registry = Registry::builtin(&config)?;
    let summary = Summary::from_config(&config)?;
    let printer = Printer {
        summary,
        json: args.json,
        json_indent: config.json_indent,
    };

    match &args.cmd {
        Command::Render {
            body,
            content_type,
            status,
            reason,
            encoding,
        } => {
            let response = load_response(body, content_type, *status, reason, encoding.as_deref())?;
            printer.print(&registry, &response, false)
        }
        Command::Replay {
            cassettes,
            method,
            uri,
        } => {
            let library = restview::CassetteLibrary::load(cassettes)?;
            log::debug!("Loaded {} cassette(s)", library.len());
            match uri {
                Some(uri) => {
                    let response = library.replay(method, uri)?;
                    printer.print(&registry, &response, true)
                }
                None => {
                    for (path, cassette) in library.iter() {
                        for interaction in cassette.iter() {
                            log::info!(
                                "{} {} ({})",
                                interaction.request.method,
                                interaction.request.uri,
                                path.display()
                            );
                            printer.print(&registry, &interaction.response.to_response(), true)?;
                        }
                    }
                    Ok(())
                }
            }
        }
        Command::Views => {
            for view in registry.iter() {
                println!("{}\t{}", view.name(), view.patterns().join(" "));
            }
            Ok(())
        }
    }
}

fn load_response(
    body: &Path,
    content_type: &str,
    status: u16,
    reason: &str,
    encoding: Option<&str>,
) -> Result<Response> {
    let content = fs::read(body)
        .wrap_err_with(|| format!("failed to read response body from {}", body.display()))?;
    let response = Response::new(status)
        .with_reason(reason)
        .with_content_type(content_type)
        .with_header("Content-Length", content.len().to_string())
        .with_body(content);
    Ok(match encoding {
        Some(encoding) => response.with_encoding(encoding),
        None => response,
    })
}

struct Printer {
    summary: Summary,
    json: bool,
    json_indent: usize,
}

impl Printer {
    fn print(&self, registry: &Registry, response: &Response, cached: bool) -> Result<()> {
        let status = self.summary.render(response, cached)?;
        let dispatch = registry.dispatch(response);
        if self.json {
            let value = to_json(&status, response, &dispatch)?;
            println!("{}", restview::views::to_pretty_string(&value, self.json_indent)?);
            return Ok(());
        }
        println!("{}", status);
        println!("{}", restview::headers_json(response, self.json_indent)?);
        if !response.cookies().is_empty() {
            println!("Cookies: {}", restview::cookies_json(response, self.json_indent)?);
        }
        if let Err(e) = dispatch.essence() {
            println!("No content type to match views against: {}", e);
        }
        for outcome in dispatch.outcomes() {
            println!();
            match &outcome.result {
                Ok(artifact) => {
                    println!("== {} ({}) ==", outcome.view, artifact.kind());
                    println!("{}", artifact);
                }
                Err(e) => println!("== {} (failed) ==\n{}", outcome.view, e),
            }
        }
        if let Some(selected) = dispatch.selected() {
            log::debug!("Selected view: {}", selected);
        }
        Ok(())
    }
}

fn to_json(status: &str, response: &Response, dispatch: &Dispatch) -> Result<JsonValue> {
    let cookies = response
        .cookies()
        .into_iter()
        .map(|(name, value)| (name.to_string(), JsonValue::from(value)))
        .collect::<serde_json::Map<String, JsonValue>>();
    let views = dispatch
        .outcomes()
        .iter()
        .map(|outcome| {
            Ok(match &outcome.result {
                Ok(artifact) => json!({
                    "name": outcome.view,
                    "artifact": serde_json::to_value(artifact)?,
                }),
                Err(e) => json!({
                    "name": outcome.view,
                    "error": e.to_string(),
                }),
            })
        })
        .collect::<Result<Vec<JsonValue>>>()?;
    Ok(json!({
        "status": status,
        "essence": dispatch.essence().ok().map(ToString::to_string),
        "cookies": cookies,
        "selected": dispatch.selected(),
        "views": views,
    }))
}
