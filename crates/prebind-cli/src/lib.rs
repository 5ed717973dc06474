//! prebind - install prebuilt native addons without compiling
//!
//! Walks an installed `node_modules` tree, finds every package that loads a
//! native addon, picks the prebuild shipped in its `prebuilds/` folder that
//! fits this machine, and rewires the package to load that file directly.
//!
//! # Layout of a prebuilds folder
//!
//! ```text
//! prebuilds/
//! ├── linux-x64/
//! │   ├── node.napi.glibc.node
//! │   └── node.napi.musl.node
//! └── darwin-x64+arm64/
//!     └── node.napi.node
//! ```

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cmd;
pub mod ops;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use prebind_schema::{EnvironmentOverrides, Libc, Runtime};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "prebind")]
#[command(author, version, about = "prebind - use prebuilt native addons instead of compiling")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub env: EnvArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Environment values that replace detected and configured ones.
#[derive(Debug, Clone, Default, Args)]
pub struct EnvArgs {
    /// Target CPU architecture (x64, arm64, ia32, ...)
    #[arg(long, global = true)]
    pub arch: Option<String>,

    /// Target platform (linux, darwin, win32, ...)
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Target C library (glibc, musl)
    #[arg(long, global = true)]
    pub libc: Option<Libc>,

    /// Target runtime (node, electron, node-webkit)
    #[arg(long, global = true)]
    pub runtime: Option<Runtime>,

    /// Native module ABI version (process.versions.modules)
    #[arg(long, global = true)]
    pub abi: Option<String>,

    /// libuv major version; empty to unset
    #[arg(long, global = true)]
    pub uv: Option<String>,

    /// ARM version (6, 7, 8); empty to unset
    #[arg(long, global = true)]
    pub armv: Option<String>,
}

impl EnvArgs {
    pub fn overrides(&self) -> EnvironmentOverrides {
        EnvironmentOverrides {
            arch: self.arch.clone(),
            platform: self.platform.clone(),
            libc: self.libc,
            runtime: self.runtime,
            abi: self.abi.clone(),
            uv: self.uv.clone(),
            armv: self.armv.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rewire every native addon of a project to its matching prebuild
    Install {
        /// Project root (the directory holding node_modules)
        #[arg(long, env = "PREBIND_PROJECT", default_value = ".")]
        project: PathBuf,
    },
    /// Print the prebuild that would be used for one package
    Locate {
        /// Package directory (the one holding prebuilds/)
        dir: PathBuf,
    },
    /// Print the resolved environment as JSON
    Env {
        /// Project whose prebind.toml is applied
        #[arg(long, env = "PREBIND_PROJECT", default_value = ".")]
        project: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
