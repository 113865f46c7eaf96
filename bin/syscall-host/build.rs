/// This build script is used to link the syscall-host firmware.
///
/// Hosted builds run the simulation and need no linker setup.
use std::{env, fs, path::PathBuf};

const MEMORY_LAYOUT: &str = "memory.x";

fn main() {
    println!("cargo:rerun-if-changed={}", MEMORY_LAYOUT);
    println!("cargo:rerun-if-changed=build.rs");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    // cortex-m-rt's link.x includes memory.x from the linker search path.
    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::copy(MEMORY_LAYOUT, out.join(MEMORY_LAYOUT)).expect("memory.x is readable");
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
}
