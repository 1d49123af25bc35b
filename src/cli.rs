use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "ranging", version, about = "Two-node RF time-of-flight ranging over SDR")]
pub struct Opt {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Start running as a beacon or a tag against real radio hardware.
    Record(RecordArgs),
    /// Run a beacon and a tag together against the in-process software
    /// radio simulator, with no hardware required.
    Simulate(SimulateArgs),
    /// List available radio devices and exit.
    ListDevices(ListDevicesArgs),
}

#[derive(Debug, Parser)]
pub struct SimulateArgs {
    /// How long to run the simulated exchange before stopping, in seconds.
    #[arg(long, default_value_t = 5)]
    pub duration_secs: u64,

    /// Dump the raw RX I/Q buffers as plain-text `_re`/`_im` columns for offline plotting.
    #[arg(short = 'p', long)]
    pub plot: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

impl SimulateArgs {
    pub fn resolve_config(&self) -> Result<Config, String> {
        let cfg = self.overrides.apply(Config::default());
        cfg.validate().map_err(|e| e.to_string())?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Role {
    Beacon,
    Tag,
}

#[derive(Debug, Parser)]
pub struct ListDevicesArgs {
    /// Run against the software radio simulator instead of enumerating real hardware.
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Debug, Parser)]
pub struct RecordArgs {
    /// Run as a beacon (transmits PING, measures round trip) or a tag (replies with PONG).
    #[arg(value_enum)]
    pub role: Role,

    /// Radio device index to use, as reported by `list-devices`.
    #[arg(short = 'd', long)]
    pub device: Option<usize>,

    /// Dump the raw RX I/Q buffers as plain-text `_re`/`_im` columns for offline plotting.
    #[arg(short = 'p', long)]
    pub plot: bool,

    /// Load configuration overrides from a TOML file; CLI flags below still win.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// CLI-overridable subset of [`Config`]; everything else keeps its default
/// (or the value loaded from `--config`).
#[derive(Debug, Parser, Default)]
pub struct ConfigOverrides {
    #[arg(long)]
    pub ping_frequency: Option<f64>,
    #[arg(long)]
    pub pong_frequency: Option<f64>,
    #[arg(long)]
    pub tx_gain: Option<f64>,
    #[arg(long)]
    pub rx_gain: Option<f64>,
    #[arg(long, value_parser = clap::value_parser!(u16))]
    pub novs_tx: Option<u16>,
    #[arg(long, value_parser = clap::value_parser!(u16))]
    pub novs_rx: Option<u16>,
    #[arg(long, value_parser = clap::value_parser!(u16))]
    pub d_tx: Option<u16>,
    #[arg(long, value_parser = clap::value_parser!(u16))]
    pub d_rx: Option<u16>,
    #[arg(long)]
    pub burst_period: Option<f64>,
    #[arg(long)]
    pub threshold_factor: Option<u32>,
    #[arg(long)]
    pub num_of_ping_tries: Option<u64>,
    #[arg(long)]
    pub ping_scr_code: Option<u16>,
    #[arg(long)]
    pub pong_scr_code: Option<u16>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut cfg: Config) -> Config {
        if let Some(v) = self.ping_frequency {
            cfg.ping_frequency = v;
        }
        if let Some(v) = self.pong_frequency {
            cfg.pong_frequency = v;
        }
        if let Some(v) = self.tx_gain {
            cfg.tx_gain = v;
        }
        if let Some(v) = self.rx_gain {
            cfg.rx_gain = v;
        }
        if let Some(v) = self.novs_tx {
            cfg.novs_tx = v;
        }
        if let Some(v) = self.novs_rx {
            cfg.novs_rx = v;
        }
        if let Some(v) = self.d_tx {
            cfg.d_tx = v;
        }
        if let Some(v) = self.d_rx {
            cfg.d_rx = v;
        }
        if let Some(v) = self.burst_period {
            cfg.burst_period = v;
        }
        if let Some(v) = self.threshold_factor {
            cfg.threshold_factor = v;
        }
        if let Some(v) = self.num_of_ping_tries {
            cfg.num_of_ping_tries = v;
        }
        if let Some(v) = self.ping_scr_code {
            cfg.ping_scr_code = v;
        }
        if let Some(v) = self.pong_scr_code {
            cfg.pong_scr_code = v;
        }
        cfg
    }
}

impl RecordArgs {
    /// Builds the final, validated `Config` from defaults, an optional
    /// `--config` file, and CLI flag overrides, in that precedence order.
    pub fn resolve_config(&self) -> Result<Config, String> {
        let mut cfg = if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("could not read {}: {e}", path.display()))?;
            toml::from_str(&text).map_err(|e| format!("could not parse {}: {e}", path.display()))?
        } else {
            Config::default()
        };
        cfg.is_beacon = matches!(self.role, Role::Beacon);
        cfg = self.overrides.apply(cfg);
        cfg.validate().map_err(|e| e.to_string())?;
        Ok(cfg)
    }
}
