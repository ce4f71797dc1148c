use mcuspi_frame::{FRAME_SIZE, MAX_PAYLOAD};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("mcuspi {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: mcuspi");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("build_target: {}", env!("MCUSPI_BUILD_TARGET"));
    println!("build_profile: {}", env!("MCUSPI_BUILD_PROFILE"));
    println!("frame_size: {FRAME_SIZE}");
    println!("max_payload: {MAX_PAYLOAD}");
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
