use std::thread;

use ranging::cancel::CancelToken;
use ranging::cli;
use ranging::config::Config;
use ranging::persist;
use ranging::radio::simulator::{RadioSimulatorConfig, SimulatedRadio};
use ranging::radio::RadioDevice;

fn main() {
    env_logger::init();

    use clap::Parser;
    let opt = cli::Opt::parse();
    match opt.action {
        cli::Action::Record(record_args) => do_record_action(record_args),
        cli::Action::Simulate(simulate_args) => do_simulate_action(simulate_args),
        cli::Action::ListDevices(list_args) => do_list_devices_action(list_args),
    }
}

/// `ranging record <beacon|tag>` targets real hardware. This crate carries no
/// hardware `RadioDevice` implementation of its own (see `radio` module doc);
/// wiring one up means implementing the trait against a vendor SDK and
/// pointing this function at it.
fn do_record_action(record_args: cli::RecordArgs) {
    let _cfg = match record_args.resolve_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    eprintln!(
        "ranging record: no hardware radio driver is compiled into this binary.\n\
         Use `ranging simulate` to run a beacon and tag against the software radio,\n\
         or implement `ranging::radio::RadioDevice` against your SDR's SDK."
    );
    std::process::exit(1);
}

fn do_simulate_action(simulate_args: cli::SimulateArgs) {
    let cfg = match simulate_args.resolve_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    if let Err(err) = cancel.install_ctrlc_handler() {
        eprintln!("Warning: could not install Ctrl-C handler: {err}");
    }

    let mut beacon_cfg = cfg.clone();
    beacon_cfg.is_beacon = true;
    let mut tag_cfg = cfg;
    tag_cfg.is_beacon = false;

    let sim_cfg = RadioSimulatorConfig {
        sample_rate: beacon_cfg.sampling_rate_rx(),
        ..RadioSimulatorConfig::default()
    };
    let (beacon_radio, mut tag_radio) = SimulatedRadio::new_pair(sim_cfg);
    let beacon_radio: Box<dyn RadioDevice> = Box::new(beacon_radio);

    let duration = simulate_args.duration_secs;
    let beacon_cancel = cancel.clone();
    let beacon_handle = thread::spawn(move || {
        ranging::orchestrator::beacon::run(beacon_radio, beacon_cfg, beacon_cancel)
    });

    let tag_cancel = cancel.clone();
    let tag_handle =
        thread::spawn(move || ranging::orchestrator::tag::run(&mut tag_radio, &tag_cfg, &tag_cancel));

    thread::sleep(std::time::Duration::from_secs(duration));
    cancel.cancel();

    let tag_summary = tag_handle
        .join()
        .expect("tag thread panicked")
        .unwrap_or_else(|err| {
            eprintln!("Tag encountered a fatal error: {err}");
            std::process::exit(1);
        });
    let beacon_summary = beacon_handle
        .join()
        .expect("beacon thread panicked")
        .unwrap_or_else(|err| {
            eprintln!("Beacon encountered a fatal error: {err}");
            std::process::exit(1);
        });

    println!("beacon: {beacon_summary}");
    println!("tag:    {tag_summary}");

    if simulate_args.plot {
        let prefix = std::path::PathBuf::from("ranging_sim");
        let cfg = Config::default();
        let reference = ranging::waveform::rx_reference(&cfg, cfg.ping_scr_code);
        if let Err(err) = persist::dump_iq(&prefix, &reference) {
            eprintln!("Could not dump I/Q buffers: {err}");
        }
    }
}

fn do_list_devices_action(list_args: cli::ListDevicesArgs) {
    if list_args.simulate {
        let (radio, _peer) = SimulatedRadio::new_pair(RadioSimulatorConfig::default());
        for device in radio.list_devices() {
            println!("{device}");
        }
        return;
    }

    eprintln!(
        "No hardware radio driver is compiled into this binary; pass --simulate\n\
         to list the software radio's devices, or implement `ranging::radio::RadioDevice`\n\
         against your SDR's SDK."
    );
    std::process::exit(1);
}
