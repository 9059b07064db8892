use std::{
    env,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};

use gesture_config_compiler::{parse_gesture_file, validate_config, GestureConfig};
use touch_crash_trigger::{
    DetectorStep, DeviceContext, Duration, FaultTrigger, GestureTiming, Instant, InterruptLine,
    MonitorState, PolicyOutcome, GUID_MONITOR_POWER_ON, MONITOR_IS_OFF, MONITOR_IS_ON,
};

#[derive(Clone, Copy, Debug)]
enum ReplayInput {
    Irq { ms: u64 },
    Display { raw: u32 },
}

#[derive(Default)]
struct ReplayFault {
    fired: u32,
}

impl FaultTrigger for ReplayFault {
    fn trigger_fault(&mut self) {
        self.fired += 1;
    }
}

#[derive(Default)]
struct ReplayLine {
    active: bool,
}

impl InterruptLine for ReplayLine {
    fn report_active(&mut self) {
        self.active = true;
    }

    fn report_inactive(&mut self) {
        self.active = false;
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;
    let mut timing_path: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --expect".into());
                };
                expect_path = Some(PathBuf::from(path));
            }
            "--timing" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --timing".into());
                };
                timing_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let inputs = parse_trace(&trace_path)?;
    log::info!(
        "replay: trace={} inputs={}",
        trace_path.display(),
        inputs.len()
    );
    let timing = match timing_path {
        Some(path) => load_timing(&path)?,
        None => GestureTiming::default(),
    };

    let mut device: DeviceContext<ReplayFault, ReplayLine, ()> =
        DeviceContext::with_timing(timing, ReplayFault::default(), ReplayLine::default())
            .map_err(|e| format!("invalid timing: {e}"))?;

    let mut labels: Vec<&'static str> = Vec::new();
    println!("row,ms,kind,count");
    for input in &inputs {
        match *input {
            ReplayInput::Irq { ms } => {
                let step = device.process_touch_interrupt(Instant::from_millis(ms));
                log::trace!("replay: irq ms={} step={}", ms, step.label());
                if step == DetectorStep::Continued {
                    continue;
                }
                let count = device
                    .detector()
                    .attempt()
                    .map(|attempt| attempt.swipe_count)
                    .unwrap_or(0);
                println!("step,{},{},{}", ms, step.label(), count);
                labels.push(step.label());
                if step == DetectorStep::PatternComplete {
                    println!("fault,{},triggered,{}", ms, device.fault().fired);
                }
            }
            ReplayInput::Display { raw } => {
                let value = raw.to_ne_bytes();
                let outcome = device
                    .on_power_setting_change(GUID_MONITOR_POWER_ON, Some(&value))
                    .map_err(|e| format!("power notification rejected: {e}"))?;
                log::info!(
                    "replay: display raw={} outcome={}",
                    raw,
                    outcome_label(outcome)
                );
                println!(
                    "power,,{},{}",
                    outcome_label(outcome),
                    u8::from(device.interrupt().active)
                );
            }
        }
    }

    eprintln!(
        "replayed {} inputs, faults triggered: {}",
        inputs.len(),
        device.fault().fired
    );

    if let Some(expect_path) = expect_path {
        let expected = parse_expected_steps(&expect_path)?;
        if labels != expected {
            eprintln!("expected steps: {}", expected.join(","));
            eprintln!("actual steps:   {}", labels.join(","));
            return Err("step sequence mismatch".into());
        }
    }

    Ok(())
}

fn usage() -> String {
    "usage: swipe_replay <trace.csv> [--expect expected_steps.txt] [--timing gesture.toml]"
        .to_string()
}

fn load_timing(path: &Path) -> Result<GestureTiming, String> {
    let config = parse_gesture_file(path).map_err(|e| e.to_string())?;
    validate_config(&config).map_err(|e| e.to_string())?;
    Ok(timing_from_config(&config))
}

fn timing_from_config(config: &GestureConfig) -> GestureTiming {
    GestureTiming {
        pattern_max_period: Duration::from_millis(config.pattern.max_period_ms),
        swipe_max_interval: Duration::from_millis(config.swipe.max_interval_ms),
        swipe_min_period: Duration::from_millis(config.swipe.min_period_ms),
        swipe_max_period: Duration::from_millis(config.swipe.max_period_ms),
        target_swipe_count: config.pattern.target_swipe_count,
    }
}

fn parse_trace(path: &Path) -> Result<Vec<ReplayInput>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out: Vec<ReplayInput> = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        match parts[0] {
            "irq" if parts.len() == 2 => {
                let ms = parse_u64(parts[1], path, line_no, "ms")?;
                out.push(ReplayInput::Irq { ms });
            }
            "burst" if parts.len() == 4 => {
                let start_ms = parse_u64(parts[1], path, line_no, "start_ms")?;
                let end_ms = parse_u64(parts[2], path, line_no, "end_ms")?;
                let step_ms = parse_u64(parts[3], path, line_no, "step_ms")?;
                if step_ms == 0 || end_ms < start_ms {
                    return Err(format!(
                        "{}:{} invalid burst {}..{} step {}",
                        path.display(),
                        line_no,
                        start_ms,
                        end_ms,
                        step_ms
                    ));
                }
                let mut ms = start_ms;
                while ms <= end_ms {
                    out.push(ReplayInput::Irq { ms });
                    ms += step_ms;
                }
            }
            "display" if parts.len() == 2 => {
                let raw = match parts[1].to_ascii_lowercase().as_str() {
                    "on" => MONITOR_IS_ON,
                    "off" => MONITOR_IS_OFF,
                    other => parse_u32(other, path, line_no, "display")?,
                };
                out.push(ReplayInput::Display { raw });
            }
            kind => {
                return Err(format!(
                    "{}:{} invalid trace line '{}' (kind '{}')",
                    path.display(),
                    line_no,
                    trimmed,
                    kind
                ));
            }
        }
    }

    Ok(out)
}

fn parse_expected_steps(path: &Path) -> Result<Vec<&'static str>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut steps = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let normalized = normalize_step(token).ok_or_else(|| {
            format!(
                "{}:{} invalid expected step: {}",
                path.display(),
                line_no,
                token
            )
        })?;
        steps.push(normalized);
    }

    Ok(steps)
}

fn normalize_step(step: &str) -> Option<&'static str> {
    match step.trim().to_ascii_lowercase().as_str() {
        "attempt_started" => Some("attempt_started"),
        "swipe_started" => Some("swipe_started"),
        "swipe_credited" => Some("swipe_credited"),
        "pattern_complete" => Some("pattern_complete"),
        "reset_pattern_timeout" => Some("reset_pattern_timeout"),
        "reset_rest_window" => Some("reset_rest_window"),
        "reset_swipe_too_long" => Some("reset_swipe_too_long"),
        _ => None,
    }
}

fn outcome_label(outcome: PolicyOutcome) -> &'static str {
    match outcome {
        PolicyOutcome::Ignored => "ignored",
        PolicyOutcome::Unchanged(_) => "unchanged",
        PolicyOutcome::Reported(MonitorState::On) => "reported_on",
        PolicyOutcome::Reported(_) => "reported_off",
    }
}

fn parse_u64(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<u64, String> {
    raw.trim().parse::<u64>().map_err(|e| {
        format!(
            "{}:{} invalid {} '{}': {}",
            path.display(),
            line_no,
            field,
            raw.trim(),
            e
        )
    })
}

fn parse_u32(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<u32, String> {
    raw.trim().parse::<u32>().map_err(|e| {
        format!(
            "{}:{} invalid {} '{}': {}",
            path.display(),
            line_no,
            field,
            raw.trim(),
            e
        )
    })
}
