//! Host-side helper: `cargo run` compiles the wasm package into `static/pkg`
//! and serves `static/` on a local HTTP server.

use std::io;
use std::process::{Command, ExitCode, Stdio};

const PORT: &str = "8000";

fn build_package() -> io::Result<bool> {
    println!("Building WASM pkg …");
    let status = Command::new("wasm-pack")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "static/pkg",
        ])
        .env("BACKDROP_VIZ_NESTED", "1")
        .status()?;
    Ok(status.success())
}

fn serve() -> io::Result<()> {
    println!("Serving backgrounds at http://127.0.0.1:{} …", PORT);
    let mut server = Command::new("python3")
        .args(["-m", "http.server", PORT, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()?;
    let status = server.wait()?;
    if !status.success() {
        eprintln!("http server exited with {}", status);
    }
    Ok(())
}

fn main() -> ExitCode {
    match build_package() {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("wasm-pack finished with errors.");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH (https://rustwasm.github.io/wasm-pack/); serving existing artifacts.");
        }
    }
    match serve() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("failed to start http server: {}", err);
            ExitCode::FAILURE
        }
    }
}
