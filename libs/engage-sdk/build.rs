const PROTOS: &[&str] = &[
    "proto/engage/v1/common.proto",
    "proto/engage/v1/messaging.proto",
    "proto/engage/v1/payment.proto",
    "proto/engage/v1/voice.proto",
    "proto/engage/v1/notification.proto",
    "proto/engage/v1/service.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto");
    for proto in PROTOS {
        println!("cargo:rerun-if-changed={proto}");
    }

    // The vendored protoc ships the google/protobuf well-known types as well.
    let mut config = prost_build::Config::new();
    config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);
    let well_known = protoc_bin_vendored::include_path()?;

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(false)
        .compile_with_config(
            config,
            &PROTOS
                .iter()
                .map(std::path::PathBuf::from)
                .collect::<Vec<_>>(),
            &[std::path::PathBuf::from("proto"), well_known],
        )?;

    Ok(())
}
