///
/// This module implements the CLI interface for wasm-stage: command parsing, argument
/// validation and the async entrypoint.
///
/// All pipeline logic (classification, staging, mode selection, compilation and artifact
/// assembly) lives in the [`wasm-stage-core`] crate. This module only reads files from
/// disk, drives a [`Session`], and writes what comes back.
///
/// ## How To Use
/// - From the shell: `wasm-stage --help`.
/// - Programmatically or from tests: call [`run`] with a constructed [`Cli`].
///
/// [`wasm-stage-core`]: ../../wasm-stage-core/
/// [`Session`]: wasm_stage_core::Session
use crate::load_config::load_config;
use crate::output::{write_compiled, write_local};
use crate::stage::{collect_files, DiskFile};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wasm_stage_core::{
    select_mode, BuiltinConverter, FileInfo, FileStore, HttpCompiler, ProcessOutcome, Session,
};

/// CLI for wasm-stage: stage project files and build them into a WebAssembly preview.
#[derive(Parser)]
#[clap(
    name = "wasm-stage",
    version,
    about = "Stage C/C++ projects and assets, compile them remotely to WebAssembly, and write a previewable bundle"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage the given files and directories, process them, and write the results
    Process {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Output directory; overrides `output.dir` from the config
        #[clap(long)]
        output: Option<PathBuf>,
        /// Files or directories to stage
        #[clap(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Stage the given files and print how each one is classified
    List {
        /// Files or directories to stage
        #[clap(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Process {
            config,
            output,
            paths,
        } => process(config, output, paths).await,
        Commands::List { paths } => list(&paths),
    }
}

async fn process(config: PathBuf, output: Option<PathBuf>, paths: Vec<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let out_dir = output.unwrap_or(config.output.dir);
    tracing::info!(command = "process", out_dir = %out_dir.display(), "Starting process");

    let compiler = HttpCompiler::new(config.compiler.endpoint.as_str(), config.compiler.timeout())
        .context("Failed to construct HTTP compiler client")?;
    let mut session = Session::new(BuiltinConverter::new(), compiler);
    session.initialize().await;

    for DiskFile { name, bytes } in collect_files(&paths)? {
        session.add(&name, bytes);
    }

    let outcome = session.process().await.map_err(|e| {
        tracing::error!(command = "process", error = %e, "Process request rejected");
        anyhow::Error::new(e)
    })?;

    match outcome {
        ProcessOutcome::Local(local) => {
            let written = write_local(&out_dir, &local)?;
            println!(
                "Processed {} files ({} bytes) in local mode",
                local.files.len(),
                session.store().total_size()
            );
            print_files(&local.files);
            print_written(&written);
            Ok(())
        }
        ProcessOutcome::Compiled(compiled) => {
            let artifacts = session
                .artifacts()
                .current()
                .context("Compilation succeeded but no artifacts are held")?;
            let written = write_compiled(&out_dir, &compiled, artifacts)?;
            println!(
                "Compiled {} files ({} bytes) into {} + {}",
                compiled.request_files,
                compiled.manifest.total_size(),
                compiled.js_ref.name(),
                compiled.wasm_ref.name()
            );
            print_files(&compiled.manifest.file_infos());
            for unit in &compiled.analysis {
                println!(
                    "  {}: {} lines{}",
                    unit.file,
                    unit.lines,
                    if unit.has_main { ", defines main" } else { "" }
                );
            }
            if let Some(log) = &compiled.log {
                println!("Compiler output:\n{log}");
            }
            print_written(&written);
            Ok(())
        }
        ProcessOutcome::Failed(failure) => {
            tracing::error!(command = "process", error = %failure, "Compilation did not succeed");
            if let Some(diagnostic) = &failure.diagnostic {
                eprintln!("{diagnostic}");
            }
            Err(anyhow::Error::new(failure))
        }
    }
}

fn list(paths: &[PathBuf]) -> Result<()> {
    let mut store = FileStore::new();
    for DiskFile { name, bytes } in collect_files(paths)? {
        store.add(&name, bytes);
    }
    let snapshot = store.snapshot();
    tracing::info!(command = "list", files = snapshot.len(), "Classified staged files");

    for file in &snapshot {
        println!(
            "{:<40} {:<16} {:>10} {}",
            file.path,
            file.kind.label(),
            file.size_bytes,
            if file.is_binary { "binary" } else { "text" }
        );
    }
    println!(
        "{} files, {} bytes, mode: {:?}",
        store.len(),
        store.total_size(),
        select_mode(&snapshot)
    );
    Ok(())
}

fn print_files(files: &[FileInfo]) {
    for file in files {
        println!("  {} ({}, {} bytes)", file.name, file.kind, file.size);
    }
}

fn print_written(written: &[PathBuf]) {
    for path in written {
        println!("wrote {}", path.display());
    }
}
