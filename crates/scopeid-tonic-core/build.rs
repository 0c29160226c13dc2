/// Builds the gRPC client and server code for the `scopeid.proto` definition
/// using `tonic-prost-build`.
///
/// This code generation step processes the Protocol Buffer definitions located
/// in the `proto` directory and emits Rust modules with gRPC bindings into the
/// crate's `OUT_DIR`, along with an encoded file descriptor set used by the
/// server's reflection service.
///
/// # Files and Paths
///
/// - Proto file: `proto/scopeid.proto`
/// - Includes: `proto/`
/// - Descriptor: `$OUT_DIR/scopeid_descriptor.bin`
///
/// # Panics
///
/// This function will `panic!` if code generation fails, which aborts the
/// build with the generator's diagnostic.
///
/// # Output
///
/// Generated code will be accessible in Rust via:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("scopeid");
/// }
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("scopeid_descriptor.bin");

    println!("cargo:rerun-if-changed=proto/scopeid.proto");

    tonic_prost_build::configure()
        .file_descriptor_set_path(&descriptor_path)
        .compile_protos(&["proto/scopeid.proto"], &["proto"])
        .unwrap();
}
