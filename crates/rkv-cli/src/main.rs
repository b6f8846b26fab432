//! Cross-build verifier CLI

use clap::{Args, Parser, Subcommand};
use rkv_core::config::INSTALL_DIR_ENV;
use rkv_core::report::{self, ReportFormat};
use rkv_core::sdk::{SdkEnvironment, SdkOptions, SDK_PATH_ENV};
use rkv_core::{CoreError, CoreResult, CpuArchitecture, Verifier, VerifyConfig};
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "rkv")]
#[command(about = "Verify a cross-compiled FFmpeg build with Rockchip MPP/RGA acceleration")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verification options when no subcommand is given
    #[command(flatten)]
    verify: VerifyArgs,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an install tree (the default)
    Verify(VerifyArgs),

    /// Print cross-compilation exports for a vendor SDK
    Env(EnvArgs),
}

#[derive(Args, Debug, Default)]
struct VerifyArgs {
    /// Install prefix produced by `make install`
    #[arg(short, long, env = INSTALL_DIR_ENV)]
    install_dir: Option<PathBuf>,

    /// Executable that must be present
    #[arg(long)]
    primary: Option<String>,

    /// Executable whose absence is only a warning
    #[arg(long)]
    secondary: Option<String>,

    /// Expected target architecture (aarch64, arm, x86_64, ...)
    #[arg(long)]
    arch: Option<CpuArchitecture>,

    /// Cross toolchain prefix used to find readelf and strings
    #[arg(long, env = "CROSS_COMPILE")]
    cross_prefix: Option<String>,
}

impl VerifyArgs {
    /// Layer command-line and environment values over the loaded config
    fn apply(self, config: &mut VerifyConfig) {
        if let Some(dir) = self.install_dir {
            config.install_dir = dir;
        }
        if let Some(primary) = self.primary {
            config.primary_binary = primary;
        }
        if let Some(secondary) = self.secondary {
            config.secondary_binary = Some(secondary).filter(|s| !s.is_empty());
        }
        if let Some(arch) = self.arch {
            config.expected_arch = arch;
        }
        if let Some(prefix) = self.cross_prefix.filter(|p| !p.is_empty()) {
            config.tools.cross_prefix = Some(prefix);
        }
    }
}

#[derive(Args, Debug)]
struct EnvArgs {
    /// SDK root directory
    #[arg(long, env = SDK_PATH_ENV)]
    sdk: Option<PathBuf>,

    /// Sysroot (defaults to <sdk>/sysroot)
    #[arg(long)]
    sysroot: Option<PathBuf>,

    /// Toolchain bin directory (defaults to <sdk>/bin)
    #[arg(long)]
    toolchain_bin: Option<PathBuf>,

    /// Target architecture
    #[arg(long, default_value = "aarch64")]
    arch: CpuArchitecture,
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so the report and exports stay clean on stdout
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    let result = match cli.command {
        Some(Commands::Verify(args)) => cmd_verify(args, cli.config, cli.json),
        Some(Commands::Env(args)) => cmd_env(args, cli.json),
        None => cmd_verify(cli.verify, cli.config, cli.json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&PathBuf>, args: VerifyArgs) -> CoreResult<VerifyConfig> {
    let mut config = match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            VerifyConfig::from_file(path)?
        }
        None => VerifyConfig::default(),
    };
    args.apply(&mut config);
    Ok(config)
}

fn cmd_verify(args: VerifyArgs, config_path: Option<PathBuf>, json: bool) -> CoreResult<i32> {
    let config = load_config(config_path.as_ref(), args)?;
    info!("Verifying install tree: {}", config.install_dir.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(Verifier::new(config).run())?;

    let format = if json { ReportFormat::Json } else { ReportFormat::Text };
    let content = report::generate_report(&result, format)?;
    println!("{}", content.trim_end());

    Ok(result.exit_code())
}

fn cmd_env(args: EnvArgs, json: bool) -> CoreResult<i32> {
    let sdk = args.sdk.ok_or_else(|| {
        CoreError::Config(format!("no SDK directory; pass --sdk or set {}", SDK_PATH_ENV))
    })?;

    let env = SdkEnvironment::resolve(&SdkOptions {
        sdk,
        sysroot: args.sysroot,
        toolchain_bin: args.toolchain_bin,
        arch: args.arch,
    });

    if json {
        let content = serde_json::to_string_pretty(&env)
            .map_err(|e| CoreError::Report(format!("JSON serialization failed: {}", e)))?;
        println!("{}", content);
    } else if env.is_complete() {
        for line in env.exports() {
            println!("{}", line);
        }
    }

    for problem in &env.problems {
        error!("{}", problem);
    }
    Ok(if env.is_complete() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rkv.json");
        std::fs::write(&path, r#"{ "install_dir": "/from/file", "primary_binary": "ffplay" }"#).unwrap();

        let args = VerifyArgs {
            install_dir: Some(PathBuf::from("/from/flag")),
            arch: Some(CpuArchitecture::Arm),
            cross_prefix: Some(String::new()),
            ..Default::default()
        };
        let config = load_config(Some(&path), args).unwrap();

        assert_eq!(config.install_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.primary_binary, "ffplay");
        assert_eq!(config.expected_arch, CpuArchitecture::Arm);
        assert!(config.tools.cross_prefix.is_none());
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::try_parse_from(["rkv", "verify", "--arch", "arm64", "--primary", "ffmpeg"]).unwrap();
        match cli.command {
            Some(Commands::Verify(args)) => {
                assert_eq!(args.arch, Some(CpuArchitecture::Arm64));
                assert_eq!(args.primary.as_deref(), Some("ffmpeg"));
            }
            _ => panic!("expected verify"),
        }

        let cli = Cli::try_parse_from(["rkv", "env", "--sdk", "/opt/sdk", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Env(_))));
    }

    #[test]
    fn test_empty_secondary_disables_it() {
        let mut config = VerifyConfig::default();
        VerifyArgs {
            secondary: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut config);
        assert!(config.secondary_binary.is_none());
    }
}
