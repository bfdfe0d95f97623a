//! Build Script for Stream RPC
//!
//! Emits the `coverage` cfg used to exclude process bootstrap from
//! coverage runs.
//!
//! Protobuf stubs are not generated here: they are produced by `buf generate`
//! from `packages/proto` and checked in under `packages/schema-gen/rust`, so
//! building the crate does not require `protoc` or `buf` in PATH.

use std::env;

fn main() {
    // Rerun build script if it changes
    println!("cargo:rerun-if-changed=build.rs");

    // Regenerated stubs land here; rebuild when they change.
    println!("cargo:rerun-if-changed=../../packages/schema-gen/rust/");

    // Emit cfg for coverage detection
    if env::var("CARGO_LLVM_COV").is_ok()
        || env::var("LLVM_PROFILE_FILE").is_ok()
        || env::var("RUSTFLAGS")
            .map(|f| f.contains("instrument-coverage"))
            .unwrap_or(false)
    {
        println!("cargo:rustc-cfg=coverage");
    }
}
