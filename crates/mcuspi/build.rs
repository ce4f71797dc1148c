//! Records where the binary was built for `mcuspi version --extended`.

fn main() {
    for (source, exported) in [
        ("TARGET", "MCUSPI_BUILD_TARGET"),
        ("PROFILE", "MCUSPI_BUILD_PROFILE"),
    ] {
        let value = std::env::var(source).unwrap_or_else(|_| "unknown".to_string());
        println!("cargo:rustc-env={exported}={value}");
        println!("cargo:rerun-if-env-changed={source}");
    }
}
