use anyhow::{anyhow, Context, Result};
use clap::Parser;
use master_index::{logging, save_with_fallback, IndexBuilder, ProgressEvent, Summary};
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

/// Exit code when the index was built but could not be written anywhere
const EXIT_OUTPUT_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "master-index")]
#[command(version)]
#[command(about = "Build a master index of every sheet in a folder of Excel workbooks", long_about = None)]
struct Cli {
    /// Folder containing the workbooks to index
    directory: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = logging::init() {
        eprintln!("Logging disabled: {error}");
    }

    match run(&cli.directory) {
        Ok(code) => code,
        Err(error) => {
            report_failure(&mut std::io::stderr(), format_args!("{error:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(directory: &Path) -> Result<ExitCode> {
    let (sender, receiver) = mpsc::channel::<ProgressEvent>();
    let builder = IndexBuilder::new();
    let output_file_name = builder.options().output_file_name.clone();
    let worker_directory = directory.to_path_buf();
    let worker = thread::Builder::new()
        .name("index-builder".to_owned())
        .spawn(move || {
            builder.build_with_progress(&worker_directory, |event| {
                // The receiver only goes away when the main thread is exiting
                let _ = sender.send(event);
            })
        })
        .context("Failed to start the indexing thread")?;

    for event in receiver {
        render(&event);
    }
    let run = worker
        .join()
        .map_err(|_| anyhow!("The indexing thread panicked"))??;

    println!();
    match save_with_fallback(&run.index, directory, &std::env::temp_dir(), &output_file_name) {
        Ok(saved) => {
            if saved.used_fallback {
                println!("⚠️  '{}' is not writable, index saved to the temporary directory", directory.display());
            }
            println!("{}", Summary { report: &run.report, output: Some(&saved.path) });
            Ok(ExitCode::SUCCESS)
        }
        Err(save_error) => {
            println!("{}", Summary { report: &run.report, output: None });
            report_failure(&mut std::io::stderr(), &save_error);
            Ok(ExitCode::from(EXIT_OUTPUT_FAILED))
        }
    }
}

fn render(event: &ProgressEvent) {
    match event {
        ProgressEvent::Started { total } => println!("Found {total} spreadsheet file(s)"),
        ProgressEvent::FileStarted { position, total, file_name } => {
            print!("[{position}/{total}] Processing {file_name} ... ");
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::FileFinished { status, .. } => {
            let outcome = if status.is_success() { "✅ Done" } else { "❌ Failed" };
            println!("{outcome} ({:.0}%)", event.fraction() * 100.0);
        }
        ProgressEvent::Finished { .. } => {}
    }
}

/// Writes a hard failure as a single `Error:` line; the library has already logged the details
fn report_failure(out: &mut impl Write, error: impl Display) {
    let _ = writeln!(out, "Error: {error}");
}
