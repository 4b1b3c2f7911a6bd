// Build script that publishes the demo page: copies static/ to dist/ and, for
// wasm32 builds, produces the JS bindings with wasm-pack.
use fs_extra::dir::{self, CopyOptions};
use std::path::Path;
use std::process::Command;
use std::env;

/// Set on the nested wasm-pack invocation so it does not recurse.
const NESTED: &str = "BACKDROP_VIZ_NESTED";

fn main() {
    println!("cargo:rerun-if-changed=static");
    println!("cargo:rerun-if-env-changed={}", NESTED);

    let target = env::var("TARGET").unwrap_or_default();
    if target == "wasm32-unknown-unknown" && env::var_os(NESTED).is_none() {
        let status = Command::new("wasm-pack")
            .args(["build", "--release", "--target", "web", "--out-dir", "dist/pkg"])
            .env(NESTED, "1")
            // The outer cargo holds the lock on the default target dir.
            .env("CARGO_TARGET_DIR", "target/wasm-pack")
            .status();

        match status {
            Ok(st) if st.success() => {}
            Ok(_) => println!("cargo:warning=wasm-pack build failed"),
            Err(_) => println!("cargo:warning=wasm-pack not installed, skipping"),
        }
    }

    if let Err(err) = publish(Path::new("static"), Path::new("dist")) {
        println!("cargo:warning=copying static assets failed: {}", err);
    }
}

fn publish(static_dir: &Path, out_dir: &Path) -> Result<(), fs_extra::error::Error> {
    if !static_dir.exists() {
        return Ok(());
    }
    dir::create_all(out_dir, false)?;
    let options = CopyOptions::new().overwrite(true).content_only(true);
    dir::copy(static_dir, out_dir, &options)?;
    Ok(())
}
