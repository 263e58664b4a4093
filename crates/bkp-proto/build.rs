//! Build script for bkp-proto
//!
//! Generates gRPC/protobuf bindings during `cargo build`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Server stubs are generated as well so that tests can stand up a fake
    // bookkeeping server in-process.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/bookkeeping.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/bookkeeping.proto");

    Ok(())
}
