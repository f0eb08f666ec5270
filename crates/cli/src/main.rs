//! `upload_benchmarks` entry point.

fn main() {
    if let Err(e) = codespeed_upload_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
