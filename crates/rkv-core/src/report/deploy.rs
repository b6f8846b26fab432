//! Deployment guidance printed after a passing run

use crate::layout::InstallationLayout;
use crate::VerifyConfig;

/// Where the guidance assumes the tree is unpacked on the board
pub const TARGET_PREFIX: &str = "/opt/ffmpeg-rk";

/// Archive name for a build targeting the configured architecture
pub fn archive_name(config: &VerifyConfig) -> String {
    format!("{}-rk-{}.tar.gz", config.primary_binary, config.expected_arch)
}

/// Shell lines for packaging, transferring and smoke-testing the build
pub fn guidance(config: &VerifyConfig, layout: &InstallationLayout) -> Vec<String> {
    let archive = archive_name(config);
    let bin = &config.primary_binary;

    vec![
        "# package the install tree".to_string(),
        format!("tar -czf {} -C {} .", archive, layout.root().display()),
        "# copy it to the board".to_string(),
        format!("scp {} <user>@<board>:/tmp/", archive),
        "# on the board".to_string(),
        format!(
            "sudo mkdir -p {prefix} && sudo tar -xzf /tmp/{archive} -C {prefix}",
            prefix = TARGET_PREFIX,
            archive = archive
        ),
        format!("export PATH={}/bin:$PATH", TARGET_PREFIX),
        format!("export LD_LIBRARY_PATH={}/lib:$LD_LIBRARY_PATH", TARGET_PREFIX),
        format!("sha256sum {}/bin/{}", TARGET_PREFIX, bin),
        format!("{} -hide_banner -decoders | grep rkmpp", bin),
        format!("{} -hide_banner -filters | grep rkrga", bin),
    ]
}
