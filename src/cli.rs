//! Minimal CLI: shape file + documents → (check | normalize)
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

use json_keyed::manifest::{Manifest, Registry};
use json_keyed::{TypeSpec, decode, encode};

use crate::jq_exec::JqFilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode JSON/NDJSON documents against a declarative shape file
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode every document and report which ones fail
    Check(CheckCmd),
    /// decode then re-encode every document in canonical form
    Normalize(NormalizeCmd),
}

#[derive(Args, Debug, Clone)]
struct ShapeSettings {
    /// shape file describing the types (JSON)
    #[arg(long, short)]
    schema: PathBuf,

    /// type to decode as (defaults to the shape file's root)
    #[arg(long = "type", short = 't')]
    type_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    shape: ShapeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// only print failures
    #[arg(long, short)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct NormalizeCmd {
    #[command(flatten)]
    shape: ShapeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// pretty-print each output document
    #[arg(long)]
    pretty: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document and where it came from.
#[derive(Debug)]
struct Sample {
    origin: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ShapeSettings {
    fn load(&self) -> Result<Arc<TypeSpec>> {
        let registry: Registry = Manifest::load(&self.schema)
            .and_then(|m| m.build())
            .with_context(|| format!("invalid shape file {}", self.schema.display()))?;
        let spec = match &self.type_name {
            Some(name) => registry.get(name).ok_or_else(|| {
                let known = registry.names().collect::<Vec<_>>().join(", ");
                anyhow!("no type `{name}` in {} (known: {known})", self.schema.display())
            })?,
            None => registry
                .root()
                .ok_or_else(|| anyhow!("{} has no root type; pass --type", self.schema.display()))?,
        };
        debug!(shape = spec.name(), "shape loaded");
        Ok(spec.clone())
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Sample>> {
        let jq = self.jq_expr.as_deref().map(JqFilter::compile).transpose()?;
        let mut out = Vec::new();
        for (origin, source) in self.read_sources()? {
            let documents = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        serde_json::from_str::<Value>(line)
                            .map(|v| (format!("{origin}:{}", i + 1), v))
                            .with_context(|| format!("failed to parse JSON ({origin}:{})", i + 1))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let v = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({origin})"))?;
                vec![(origin.clone(), v)]
            };
            for (origin, value) in documents {
                let value = match &self.json_pointer {
                    None => value,
                    Some(ptr) => value
                        .pointer(ptr)
                        .cloned()
                        .ok_or_else(|| anyhow!("JSON pointer {ptr} selects nothing in {origin}"))?,
                };
                match &jq {
                    None => out.push(Sample { origin, value }),
                    Some(filter) => {
                        let results = filter
                            .run(&value)
                            .with_context(|| format!("failed to apply jq expression ({origin})"))?;
                        for (i, value) in results.into_iter().enumerate() {
                            out.push(Sample { origin: format!("{origin}#{i}"), value });
                        }
                    }
                }
            }
        }
        debug!(count = out.len(), "documents loaded");
        Ok(out)
    }

    fn read_sources(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for raw in &self.input {
            if raw == "-" {
                let mut source = String::new();
                std::io::stdin().read_to_string(&mut source).context("failed to read stdin")?;
                out.push(("<stdin>".to_string(), source));
                continue;
            }
            for path in resolve_file_path_patterns([raw])? {
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read source file {}", path.display()))?;
                out.push((path.to_string_lossy().to_string(), source));
            }
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Check(target) => {
                let spec = target.shape.load()?;
                let samples = target.input_settings.load()?;
                let results = samples
                    .par_iter()
                    .map(|s| (s, decode(&s.value, &spec)))
                    .collect::<Vec<_>>();
                let mut failed = 0usize;
                for (sample, result) in &results {
                    match result {
                        Ok(_) if target.quiet => {}
                        Ok(_) => println!("{} {}", "✅".green(), sample.origin),
                        Err(error) => {
                            failed += 1;
                            let error = error.to_string();
                            println!("{} {}: {}", "❌".red(), sample.origin, error.red());
                        }
                    }
                }
                if failed > 0 {
                    bail!(
                        "{failed} of {} documents failed to decode as {}",
                        results.len(),
                        spec.name()
                    );
                }
                Ok(())
            }
            Command::Normalize(target) => {
                let spec = target.shape.load()?;
                let samples = target.input_settings.load()?;
                let lines = samples
                    .par_iter()
                    .map(|s| -> Result<String> {
                        let value = decode(&s.value, &spec).with_context(|| s.origin.clone())?;
                        let doc = encode(&value, &spec);
                        let text = if target.pretty {
                            serde_json::to_string_pretty(&doc)?
                        } else {
                            serde_json::to_string(&doc)?
                        };
                        Ok(text)
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut output = lines.join("\n");
                output.push('\n');
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &output)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    print!("{output}");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
