//! A software radio medium for running the full protocol without hardware.
//!
//! Two [`SimulatedRadio`] endpoints created by [`SimulatedRadio::new_pair`]
//! share one virtual ether: whatever one endpoint transmits, the other
//! eventually receives, with injected propagation delay, AWGN, and a small
//! carrier frequency offset / phase-noise walk. Used by `ranging record
//! --simulate` and by every end-to-end integration test.
//!
//! `write`/`read` take `&self` (see [`RadioDevice`]'s contract note on why);
//! the mutable simulation state (RNG, backlog, clock) lives behind one
//! `Mutex` per endpoint, so the two sides of a pair can run on independent
//! threads without contending with each other.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::radio::status::RadioStatus;
use crate::radio::RadioDevice;

#[derive(Debug, Clone)]
pub struct RadioSimulatorConfig {
    pub sample_rate: f64,
    /// Standard deviation of the additive complex Gaussian noise floor.
    pub noise_stddev: f32,
    /// One-way propagation delay between the two endpoints, in nanoseconds.
    pub propagation_delay_ns: i64,
    /// Maximum carrier frequency offset applied to received samples, in Hz.
    pub max_cfo_hz: f32,
    /// Standard deviation of the per-sample phase-noise random walk, in radians.
    pub phase_noise_stddev: f32,
    pub seed: u64,
}

impl Default for RadioSimulatorConfig {
    fn default() -> Self {
        RadioSimulatorConfig {
            sample_rate: 7.68e6,
            noise_stddev: 0.01,
            propagation_delay_ns: 200,
            max_cfo_hz: 0.0,
            phase_noise_stddev: 0.0,
            seed: 0,
        }
    }
}

struct SimState {
    rng: StdRng,
    backlog: VecDeque<Complex32>,
    clock_ns: i64,
    cum_phase: f32,
    /// Device-ns timeline position of the last sample this endpoint has
    /// handed to the medium, used to pace `write()` to the caller's
    /// requested `time_ns` instead of delivering every burst back-to-back
    /// regardless of schedule. `None` until the first write.
    tx_clock_ns: Option<i64>,
}

pub struct SimulatedRadio {
    cfg: Mutex<RadioSimulatorConfig>,
    cfo_hz: f32,
    out: Sender<Vec<Complex32>>,
    inp: Receiver<Vec<Complex32>>,
    state: Mutex<SimState>,
    started: AtomicBool,
}

impl SimulatedRadio {
    /// Builds two endpoints of one shared medium. The two endpoints are
    /// seeded from `cfg.seed` and `cfg.seed + 1` so they draw independent
    /// noise even though the channel parameters match.
    pub fn new_pair(cfg: RadioSimulatorConfig) -> (SimulatedRadio, SimulatedRadio) {
        let (tx_a_to_b, rx_a_to_b) = unbounded();
        let (tx_b_to_a, rx_b_to_a) = unbounded();

        let mut cfg_b = cfg.clone();
        cfg_b.seed = cfg.seed.wrapping_add(1);

        let a = SimulatedRadio::new_endpoint(cfg, tx_a_to_b, rx_b_to_a);
        let b = SimulatedRadio::new_endpoint(cfg_b, tx_b_to_a, rx_a_to_b);
        (a, b)
    }

    fn new_endpoint(
        cfg: RadioSimulatorConfig,
        out: Sender<Vec<Complex32>>,
        inp: Receiver<Vec<Complex32>>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        let cfo_hz = cfg.max_cfo_hz;
        SimulatedRadio {
            cfg: Mutex::new(cfg),
            cfo_hz,
            out,
            inp,
            state: Mutex::new(SimState {
                rng,
                backlog: VecDeque::new(),
                clock_ns: 0,
                cum_phase: 0.0,
                tx_clock_ns: None,
            }),
            started: AtomicBool::new(false),
        }
    }

    fn noise_sample(cfg: &RadioSimulatorConfig, state: &mut SimState) -> Complex32 {
        let dist = Normal::new(0.0, cfg.noise_stddev).unwrap();
        Complex32::new(dist.sample(&mut state.rng), dist.sample(&mut state.rng))
    }

    /// Applies carrier frequency offset rotation, a phase-noise random walk,
    /// and additive noise to one transmitted sample.
    fn apply_channel(cfo_hz: f32, cfg: &RadioSimulatorConfig, state: &mut SimState, sample: Complex32) -> Complex32 {
        if cfg.phase_noise_stddev > 0.0 {
            let walk = Normal::new(0.0, cfg.phase_noise_stddev).unwrap();
            state.cum_phase += walk.sample(&mut state.rng);
        }
        let dphi_per_sample = 2.0 * PI * cfo_hz / cfg.sample_rate as f32;
        state.cum_phase += dphi_per_sample;
        let rot = Complex32::new(state.cum_phase.cos(), state.cum_phase.sin());
        sample * rot + Self::noise_sample(cfg, state)
    }

    fn propagation_delay_samples(cfg: &RadioSimulatorConfig) -> usize {
        ((cfg.propagation_delay_ns as f64) * cfg.sample_rate / 1e9).round() as usize
    }
}

impl RadioDevice for SimulatedRadio {
    fn list_devices(&self) -> Vec<String> {
        vec!["simulator:0".to_string()]
    }

    fn connect(&mut self, _device_index: Option<usize>) -> Result<(), OrchestratorError> {
        Ok(())
    }

    fn configure(&mut self, cfg: &Config) -> Result<(), OrchestratorError> {
        self.cfg.lock().unwrap().sample_rate = cfg.sampling_rate_rx();
        Ok(())
    }

    fn start(&mut self) -> Result<(), OrchestratorError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn write(&self, samples: &[Complex32], time_ns: i64) -> RadioStatus {
        if !self.started.load(Ordering::SeqCst) {
            return RadioStatus::StreamError;
        }
        let gap_ns = {
            let cfg = self.cfg.lock().unwrap();
            let mut state = self.state.lock().unwrap();

            // Pace delivery to the caller's requested schedule instead of
            // handing every burst to the peer back-to-back: insert however
            // many noise samples separate this burst's scheduled time from
            // the end of the last one. The first write on an endpoint
            // defines its own origin rather than padding out from zero.
            let gap_ns = match state.tx_clock_ns {
                None => 0,
                Some(last_ns) => (time_ns - last_ns).max(0),
            };
            let gap_samples =
                (((gap_ns as f64) * cfg.sample_rate / 1e9).round() as i64).clamp(0, 50_000_000) as usize;

            let burst_ns = ((samples.len() as f64) * 1e9 / cfg.sample_rate).round() as i64;
            state.tx_clock_ns = Some(time_ns + burst_ns);

            let delay = Self::propagation_delay_samples(&cfg);
            let mut msg = Vec::with_capacity(gap_samples + delay + samples.len());
            for _ in 0..gap_samples {
                msg.push(Self::noise_sample(&cfg, &mut state));
            }
            for _ in 0..delay {
                msg.push(Self::noise_sample(&cfg, &mut state));
            }
            for &s in samples {
                msg.push(Self::apply_channel(self.cfo_hz, &cfg, &mut state, s));
            }
            if self.out.send(msg).is_err() {
                return RadioStatus::StreamError;
            }
            gap_ns
        };

        // A caller that schedules bursts far apart in virtual time (e.g. the
        // beacon's TX task, which never sleeps on its own and just stamps
        // successive schedule ticks) would otherwise flood the channel
        // arbitrarily far ahead of wall-clock time. Blocking here, roughly
        // proportional to the gap and capped well under any realistic
        // stream timeout, is what keeps this call honoring the "blocks up
        // to the configured timeout" contract instead of being a no-op.
        if gap_ns > 0 {
            let sleep_ns = gap_ns.min(250_000_000);
            thread::sleep(Duration::from_nanos(sleep_ns as u64));
        }
        RadioStatus::Ok
    }

    fn read(&self, buf: &mut [Complex32]) -> (RadioStatus, i64) {
        if !self.started.load(Ordering::SeqCst) {
            let capture_ns = self.state.lock().unwrap().clock_ns;
            return (RadioStatus::StreamError, capture_ns);
        }
        let capture_ns;
        let elapsed_ns;
        {
            let cfg = self.cfg.lock().unwrap();
            let mut state = self.state.lock().unwrap();
            while let Ok(samples) = self.inp.try_recv() {
                state.backlog.extend(samples);
            }
            capture_ns = state.clock_ns;
            for slot in buf.iter_mut() {
                *slot = match state.backlog.pop_front() {
                    Some(s) => s,
                    None => Self::noise_sample(&cfg, &mut state),
                };
            }
            elapsed_ns = ((buf.len() as f64) * 1e9 / cfg.sample_rate).round() as i64;
            state.clock_ns += elapsed_ns;
        }

        // A real stream only returns a buffer once that many samples have
        // actually arrived; blocking here for roughly that much wall-clock
        // time keeps the device clock from racing arbitrarily far ahead of
        // what the peer has actually transmitted, which an unthrottled
        // caller spinning on `read` would otherwise cause.
        thread::sleep(Duration::from_nanos(elapsed_ns.clamp(0, 250_000_000) as u64));
        (RadioStatus::Ok, capture_ns)
    }

    fn hardware_time_ns(&self) -> i64 {
        self.state.lock().unwrap().clock_ns
    }

    fn sample_rate(&self) -> f64 {
        self.cfg.lock().unwrap().sample_rate
    }

    fn close(&mut self) -> Result<(), OrchestratorError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}
